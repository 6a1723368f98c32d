//! Per-commit line statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::Result;
use crate::gitlab::{CommitQuery, CommitStats};
use crate::resolve::{canonical_project, ProjectRef};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub parents: Vec<String>,
    pub subject: String,
    pub line_stats: Option<CommitStats>,
    pub author_email: String,
    pub author_date: DateTime<FixedOffset>,
}

/// Commits of one project keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub project: String,
    pub commits: BTreeMap<String, CommitRecord>,
}

/// Collect statistics for every commit on the default branch.
///
/// The listing does not carry line counts, so each commit is fetched again.
pub fn commit_stats(session: &Session<'_>, project: &ProjectRef) -> Result<ProjectStats> {
    let project = canonical_project(session, project)?;
    let listed = session.call("list commits", |api| {
        api.list_commits(&project, &CommitQuery::default())
    })?;

    let mut commits = BTreeMap::new();
    for entry in listed {
        let detail = session.call("get commit", |api| api.get_commit(&project, &entry.id))?;
        commits.insert(
            detail.id.clone(),
            CommitRecord {
                parents: detail.parent_ids,
                subject: detail.title,
                line_stats: detail.stats,
                author_email: detail.author_email,
                author_date: detail.authored_date,
            },
        );
    }

    Ok(ProjectStats {
        project: project.path_with_namespace,
        commits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::fake::{commit, FakeGitLab};
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    #[test]
    fn test_commit_stats_fetches_details() {
        let fake = FakeGitLab::new();
        let project = fake.add_project("student/alpha");
        let mut first = commit("aaa", "alpha@example.com", "2024-01-10T10:00:00Z");
        first.stats = Some(CommitStats {
            additions: 3,
            deletions: 1,
            total: 4,
        });
        let mut second = commit("bbb", "alpha@example.com", "2024-01-11T10:00:00Z");
        second.parent_ids = vec!["aaa".to_string()];
        fake.add_commits(&project, "main", vec![first, second]);

        let session = Session::new(&fake).with_retry(RetryPolicy::fixed(2, Duration::ZERO));
        let stats = commit_stats(&session, &(&project).into()).unwrap();

        assert_eq!(stats.project, "student/alpha");
        assert_eq!(stats.commits.len(), 2);
        assert_eq!(stats.commits["aaa"].line_stats.unwrap().total, 4);
        assert_eq!(stats.commits["bbb"].parents, vec!["aaa"]);
        assert_eq!(fake.call_count("get_commit"), 2);
    }
}
