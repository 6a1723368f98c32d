//! GitLab API data types.
//!
//! Only the fields the tool reads are modelled; everything else in the JSON
//! payloads is ignored by `serde`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A project (repository) as returned by `GET projects/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
    #[serde(default)]
    pub empty_repo: bool,
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mr_default_target_self: Option<bool>,
}

/// Added/deleted line counts of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
}

/// A commit. Immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub author_email: String,
    pub authored_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub committed_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub stats: Option<CommitStats>,
}

/// The commit a tag points to, as embedded in the tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCommit {
    pub id: String,
    pub created_at: DateTime<FixedOffset>,
}

/// A repository tag. Only used as a hint for deadline resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub target: Option<String>,
    pub commit: TagCommit,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// A GitLab user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

/// A direct member of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub username: String,
    pub access_level: u32,
}

/// A CI pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default, rename = "ref")]
    pub reference: String,
}

/// A CI job of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub status: String,
}

/// One entry of a protected ref's access level list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLevelEntry {
    pub access_level: u32,
    #[serde(default)]
    pub access_level_description: String,
}

/// Protection state of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedBranch {
    pub name: String,
    #[serde(default)]
    pub push_access_levels: Vec<AccessLevelEntry>,
    #[serde(default)]
    pub merge_access_levels: Vec<AccessLevelEntry>,
}

impl ProtectedBranch {
    /// Whether the current protection grants exactly the requested levels.
    pub fn matches(&self, rules: &BranchRules) -> bool {
        single_level(&self.push_access_levels) == Some(rules.push as u32)
            && single_level(&self.merge_access_levels) == Some(rules.merge as u32)
    }
}

/// Protection state of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedTag {
    pub name: String,
    #[serde(default)]
    pub create_access_levels: Vec<AccessLevelEntry>,
}

impl ProtectedTag {
    /// Whether the current protection grants exactly the requested level.
    pub fn matches(&self, rules: &TagRules) -> bool {
        single_level(&self.create_access_levels) == Some(rules.create as u32)
    }
}

fn single_level(levels: &[AccessLevelEntry]) -> Option<u32> {
    match levels {
        [only] => Some(only.access_level),
        _ => None,
    }
}

/// GitLab role levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum AccessLevel {
    NoAccess = 0,
    Guest = 10,
    Reporter = 20,
    Developer = 30,
    Maintainer = 40,
    Owner = 50,
}

impl AccessLevel {
    /// Numeric value used by the API.
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl FromStr for AccessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "noone" | "no-access" => Ok(AccessLevel::NoAccess),
            "guest" => Ok(AccessLevel::Guest),
            "reporter" => Ok(AccessLevel::Reporter),
            "devel" | "developer" => Ok(AccessLevel::Developer),
            "maintainer" => Ok(AccessLevel::Maintainer),
            "owner" => Ok(AccessLevel::Owner),
            _ => Err(Error::InvalidAccessLevel {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessLevel::NoAccess => "none",
            AccessLevel::Guest => "guest",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
        };
        f.write_str(name)
    }
}

/// Requested push/merge levels for a protected branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchRules {
    pub push: AccessLevel,
    pub merge: AccessLevel,
}

impl BranchRules {
    /// Maintainers only, optionally opened up to developers.
    pub fn from_flags(developers_can_push: bool, developers_can_merge: bool) -> Self {
        let level = |allowed: bool| {
            if allowed {
                AccessLevel::Developer
            } else {
                AccessLevel::Maintainer
            }
        };
        Self {
            push: level(developers_can_push),
            merge: level(developers_can_merge),
        }
    }
}

/// Requested create level for a protected tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRules {
    pub create: AccessLevel,
}

/// Whether a single-file commit creates or updates the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Create,
    Update,
}

/// A commit touching exactly one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit {
    pub branch: String,
    pub path: String,
    pub content: String,
    pub message: String,
    pub action: FileAction,
}

/// Filter for listing commits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitQuery {
    /// Branch, tag or commit to list from; the default branch when `None`.
    pub reference: Option<String>,
    /// Only commits at or before this instant.
    pub until: Option<DateTime<FixedOffset>>,
}

/// Project attributes that can be changed in bulk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProjectSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mr_default_target_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectSettings {
    /// Whether nothing would be changed.
    pub fn is_empty(&self) -> bool {
        self.mr_default_target_self.is_none() && self.description.is_none()
    }

    /// Whether `project` already carries every requested value.
    pub fn is_satisfied_by(&self, project: &Project) -> bool {
        let target_ok = self
            .mr_default_target_self
            .is_none_or(|v| project.mr_default_target_self == Some(v));
        let description_ok = self
            .description
            .as_ref()
            .is_none_or(|d| project.description.as_deref() == Some(d.as_str()));
        target_ok && description_ok
    }
}
