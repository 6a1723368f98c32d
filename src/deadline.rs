//! # Deadline Commit Resolution
//!
//! Picks the commit that represents a student's submission at a deadline.
//!
//! The lookup order is:
//!
//! 1. If a preferred tag is named and exists, and the tag's commit was created
//!    at or before the deadline, that commit wins regardless of what else is on
//!    the branch.
//! 2. Otherwise the branch history up to the deadline is listed (newest first,
//!    filtered by the server) and the first commit accepted by the
//!    [`AuthorFilter`] is returned.
//! 3. If nothing is accepted, [`Error::NoMatchingCommit`] is returned. The batch
//!    driver reports it for the entry and continues.
//!
//! All comparisons use timezone-aware timestamps. Deadlines written without an
//! offset are interpreted as UTC, see [`parse_timestamp`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::gitlab::{Commit, CommitQuery};
use crate::resolve::{canonical_project, ProjectRef};
use crate::session::Session;

const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a deadline given on the command line.
///
/// Accepts `now`, RFC 3339, `YYYY-MM-DDTHH:MM:SS+HHMM`, the same without an
/// offset (UTC), minutes precision, and a bare date meaning midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("now") {
        return Ok(Utc::now().fixed_offset());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }
    for format in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_time(NaiveTime::default());
        return Ok(Utc.from_utc_datetime(&midnight).fixed_offset());
    }
    Err(Error::Timestamp {
        value: value.to_string(),
        message: "expected YYYY-MM-DDTHH:MM:SS with an optional UTC offset".to_string(),
    })
}

/// Predicate over commit authors.
///
/// The default accepts every commit. A blacklist rejects commits whose
/// author email matches the pattern in full.
#[derive(Debug, Clone, Default)]
pub struct AuthorFilter {
    blacklist: Option<Regex>,
}

impl AuthorFilter {
    /// Filter accepting every commit.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Reject commits whose author email fully matches `pattern`.
    pub fn blacklist(pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            blacklist: Some(anchored),
        })
    }

    /// Blacklist from an optional pattern.
    pub fn from_option(pattern: Option<&str>) -> Result<Self> {
        match pattern {
            Some(p) => Self::blacklist(p),
            None => Ok(Self::accept_all()),
        }
    }

    pub fn accepts(&self, commit: &Commit) -> bool {
        match &self.blacklist {
            Some(re) => !re.is_match(&commit.author_email),
            None => true,
        }
    }
}

/// What to look for when resolving a submission.
#[derive(Debug, Clone)]
pub struct DeadlineQuery {
    pub branch: String,
    pub deadline: DateTime<FixedOffset>,
    pub prefer_tag: Option<String>,
    pub author_filter: AuthorFilter,
}

impl DeadlineQuery {
    pub fn new(branch: impl Into<String>, deadline: DateTime<FixedOffset>) -> Self {
        Self {
            branch: branch.into(),
            deadline,
            prefer_tag: None,
            author_filter: AuthorFilter::accept_all(),
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.prefer_tag = tag;
        self
    }

    pub fn with_author_filter(mut self, filter: AuthorFilter) -> Self {
        self.author_filter = filter;
        self
    }
}

/// Find the last accepted commit at or before the deadline.
pub fn commit_before_deadline(
    session: &Session<'_>,
    reference: &ProjectRef,
    query: &DeadlineQuery,
) -> Result<Commit> {
    let project = canonical_project(session, reference)?;

    if let Some(tag_name) = &query.prefer_tag {
        let tags = session.call("list tags", |api| api.list_tags(&project))?;
        match tags.iter().find(|t| &t.name == tag_name) {
            Some(tag) if tag.commit.created_at <= query.deadline => {
                debug!(
                    "{}: using tag {} ({})",
                    project.path_with_namespace, tag.name, tag.commit.id
                );
                let sha = tag.commit.id.clone();
                return session.call("get commit", |api| api.get_commit(&project, &sha));
            }
            Some(tag) => debug!(
                "{}: tag {} is after the deadline, using branch history",
                project.path_with_namespace, tag.name
            ),
            None => debug!(
                "{}: no tag named {}",
                project.path_with_namespace, tag_name
            ),
        }
    }

    let commit_query = CommitQuery {
        reference: Some(query.branch.clone()),
        until: Some(query.deadline),
    };
    let commits = session.call("list commits", |api| {
        api.list_commits(&project, &commit_query)
    })?;

    commits
        .into_iter()
        .find(|c| query.author_filter.accepts(c))
        .ok_or_else(|| Error::NoMatchingCommit {
            project: project.path_with_namespace.clone(),
            branch: query.branch.clone(),
            deadline: query.deadline.to_rfc3339(),
        })
}

/// How the commit for a local checkout is chosen.
#[derive(Debug, Clone)]
pub enum CommitSelector {
    /// A commit id given explicitly.
    Exact(String),
    /// The submission at a deadline.
    Deadline(DeadlineQuery),
}

impl CommitSelector {
    /// Exactly one of `commit` and `deadline` must be given.
    pub fn new(commit: Option<String>, deadline: Option<DeadlineQuery>) -> Result<Self> {
        match (commit, deadline) {
            (Some(sha), None) => Ok(CommitSelector::Exact(sha)),
            (None, Some(query)) => Ok(CommitSelector::Deadline(query)),
            (Some(_), Some(_)) => Err(Error::InvalidArguments {
                message: "a commit and a deadline are mutually exclusive".to_string(),
            }),
            (None, None) => Err(Error::InvalidArguments {
                message: "either a commit or a deadline is required".to_string(),
            }),
        }
    }

    /// Resolve the selected commit in a project.
    pub fn resolve(&self, session: &Session<'_>, reference: &ProjectRef) -> Result<Commit> {
        match self {
            CommitSelector::Exact(sha) => {
                let project = canonical_project(session, reference)?;
                session.call("get commit", |api| api.get_commit(&project, sha))
            }
            CommitSelector::Deadline(query) => commit_before_deadline(session, reference, query),
        }
    }
}
