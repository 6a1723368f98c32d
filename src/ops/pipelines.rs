//! CI pipeline status reports.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::resolve::{canonical_project, ProjectRef};
use crate::session::Session;

/// Status reported for a project without any pipeline.
pub const NO_PIPELINE: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub status: String,
    pub id: u64,
    pub name: String,
}

/// The newest pipeline of a project with its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<JobReport>,
}

impl PipelineReport {
    fn none() -> Self {
        Self {
            status: NO_PIPELINE.to_string(),
            id: None,
            commit: None,
            jobs: Vec::new(),
        }
    }
}

/// Report on the most recent pipeline of a project.
pub fn last_pipeline(session: &Session<'_>, project: &ProjectRef) -> Result<PipelineReport> {
    let project = canonical_project(session, project)?;
    let pipelines = session.call("list pipelines", |api| api.list_pipelines(&project))?;
    let Some(last) = pipelines.into_iter().next() else {
        return Ok(PipelineReport::none());
    };

    let jobs = session.call("list pipeline jobs", |api| {
        api.list_pipeline_jobs(&project, last.id)
    })?;
    Ok(PipelineReport {
        status: last.status,
        id: Some(last.id),
        commit: Some(last.sha),
        jobs: jobs
            .into_iter()
            .map(|job| JobReport {
                status: job.status,
                id: job.id,
                name: job.name,
            })
            .collect(),
    })
}

/// Histogram lines (`status: count (pct%)`, most common first) plus a total.
pub fn summarize_pipelines<'a, I>(reports: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a PipelineReport>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;
    for report in reports {
        *counts.entry(report.status.as_str()).or_default() += 1;
        total += 1;
    }

    let mut by_count: Vec<(&str, usize)> = counts.into_iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut lines: Vec<String> = by_count
        .into_iter()
        .map(|(status, count)| {
            let percent = 100.0 * count as f64 / total as f64;
            format!("{}: {} ({:.0}%)", status, count, percent)
        })
        .collect();
    lines.push(format!("total: {}", total));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::fake::FakeGitLab;
    use crate::gitlab::{Job, Pipeline};
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    fn session(fake: &FakeGitLab) -> Session<'_> {
        Session::new(fake).with_retry(RetryPolicy::fixed(2, Duration::ZERO))
    }

    fn pipeline(id: u64, status: &str) -> Pipeline {
        Pipeline {
            id,
            status: status.to_string(),
            sha: format!("sha{}", id),
            reference: "master".to_string(),
        }
    }

    #[test]
    fn test_last_pipeline_reports_newest_with_jobs() {
        let fake = FakeGitLab::new();
        let project = fake.add_project("student/alpha");
        fake.add_pipeline(&project, pipeline(1, "failed"), Vec::new());
        fake.add_pipeline(
            &project,
            pipeline(2, "success"),
            vec![Job {
                id: 20,
                name: "test".to_string(),
                status: "success".to_string(),
            }],
        );

        let report = last_pipeline(&session(&fake), &(&project).into()).unwrap();

        assert_eq!(report.status, "success");
        assert_eq!(report.id, Some(2));
        assert_eq!(report.commit.as_deref(), Some("sha2"));
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].name, "test");
    }

    #[test]
    fn test_project_without_pipelines() {
        let fake = FakeGitLab::new();
        let project = fake.add_project("student/alpha");

        let report = last_pipeline(&session(&fake), &(&project).into()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json, serde_json::json!({"status": "none"}));
    }

    #[test]
    fn test_summary_histogram() {
        let status = |s: &str| PipelineReport {
            status: s.to_string(),
            ..PipelineReport::none()
        };
        let reports = vec![
            status("success"),
            status("failed"),
            status("success"),
            status("none"),
        ];

        let lines = summarize_pipelines(&reports);

        assert_eq!(
            lines,
            vec![
                "success: 2 (50%)",
                "failed: 1 (25%)",
                "none: 1 (25%)",
                "total: 4"
            ]
        );
    }
}
