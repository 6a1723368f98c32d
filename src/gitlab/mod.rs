//! # GitLab Client Contract
//!
//! The [`GitLabApi`] trait is the only way the rest of the crate talks to the
//! hosting service. It mirrors the REST endpoints one to one and does no
//! retrying or interpretation of its own: a 409 comes back as
//! [`Error::Conflict`](crate::error::Error::Conflict), a 304 as
//! [`Error::NotModified`](crate::error::Error::NotModified), and so on. The
//! retry engine and the idempotent mutators give those results meaning.
//!
//! [`HttpClient`] is the production implementation on top of blocking
//! `reqwest`. Unit tests use the in-memory fake from the `fake` module.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

pub use http::HttpClient;
pub use types::*;

use crate::error::Result;

/// How a project is looked up on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectId {
    Id(u64),
    Path(String),
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Id(id) => write!(f, "{}", id),
            ProjectId::Path(path) => f.write_str(path),
        }
    }
}

/// Trait for GitLab operations - allows mocking in tests
pub trait GitLabApi: Send + Sync {
    /// Fetch a project by numeric id or `namespace/name` path.
    fn get_project(&self, id: &ProjectId) -> Result<Project>;

    /// Fork `parent` into `namespace` under the given path and name.
    fn create_fork(&self, parent: &Project, namespace: &str, name: &str) -> Result<Project>;

    /// Drop the "forked from" relation of a project.
    fn delete_fork_relation(&self, project: &Project) -> Result<()>;

    /// List commits newest first.
    fn list_commits(&self, project: &Project, query: &CommitQuery) -> Result<Vec<Commit>>;

    /// Fetch one commit including its line statistics.
    fn get_commit(&self, project: &Project, sha: &str) -> Result<Commit>;

    /// List all repository tags.
    fn list_tags(&self, project: &Project) -> Result<Vec<Tag>>;

    /// Raw file content at a branch, tag or commit.
    fn get_file(&self, project: &Project, reference: &str, path: &str) -> Result<Vec<u8>>;

    /// Create a commit with a single file action.
    fn commit_file(&self, project: &Project, commit: &FileCommit) -> Result<Commit>;

    /// Look up protection of a branch; `NotFound` when unprotected.
    fn get_protected_branch(&self, project: &Project, name: &str) -> Result<ProtectedBranch>;

    /// Protect a branch with the given levels.
    fn protect_branch(
        &self,
        project: &Project,
        name: &str,
        rules: &BranchRules,
    ) -> Result<ProtectedBranch>;

    /// Remove protection from a branch.
    fn unprotect_branch(&self, project: &Project, name: &str) -> Result<()>;

    /// Look up protection of a tag; `NotFound` when unprotected.
    fn get_protected_tag(&self, project: &Project, name: &str) -> Result<ProtectedTag>;

    /// Protect a tag (name or wildcard) with the given level.
    fn protect_tag(&self, project: &Project, name: &str, rules: &TagRules)
        -> Result<ProtectedTag>;

    /// Remove protection from a tag.
    fn unprotect_tag(&self, project: &Project, name: &str) -> Result<()>;

    /// Direct members of a project.
    fn list_members(&self, project: &Project) -> Result<Vec<Member>>;

    /// Add a member; `Conflict` when already present.
    fn add_member(&self, project: &Project, user_id: u64, level: AccessLevel) -> Result<Member>;

    /// Remove a direct member.
    fn remove_member(&self, project: &Project, user_id: u64) -> Result<()>;

    /// Users with exactly this username.
    fn find_users(&self, username: &str) -> Result<Vec<User>>;

    /// Pipelines newest first.
    fn list_pipelines(&self, project: &Project) -> Result<Vec<Pipeline>>;

    /// Jobs of one pipeline.
    fn list_pipeline_jobs(&self, project: &Project, pipeline_id: u64) -> Result<Vec<Job>>;

    /// Change project attributes.
    fn update_project(&self, project: &Project, settings: &ProjectSettings) -> Result<Project>;
}
