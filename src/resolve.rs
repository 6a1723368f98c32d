//! Canonicalization of project references.
//!
//! Operations accept a [`ProjectRef`] so that callers can pass whatever they
//! have at hand: a numeric id, a `namespace/name` path, or a project fetched
//! earlier. [`canonical_project`] turns any of them into a [`Project`].
//!
//! Resolved projects are never cached between operations. Forking or adding
//! members changes server-side state (the `empty_repo` flag in particular), so
//! each operation starts from a fresh lookup unless it was handed a project it
//! can use as-is.

use std::fmt;

use crate::error::Result;
use crate::gitlab::{Project, ProjectId};
use crate::path::check_project_path;
use crate::session::Session;

/// A project identified by id, by path, or already fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(u64),
    Path(String),
    Resolved(Project),
}

impl ProjectRef {
    /// Id or path usable for a fresh server lookup.
    pub fn lookup_key(&self) -> Result<ProjectId> {
        Ok(match self {
            ProjectRef::Id(id) => ProjectId::Id(*id),
            ProjectRef::Path(path) => ProjectId::Path(check_project_path(path)?.to_string()),
            ProjectRef::Resolved(project) => {
                ProjectId::Path(project.path_with_namespace.clone())
            }
        })
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectRef::Id(id) => write!(f, "{}", id),
            ProjectRef::Path(path) => f.write_str(path),
            ProjectRef::Resolved(project) => f.write_str(&project.path_with_namespace),
        }
    }
}

impl From<u64> for ProjectRef {
    fn from(id: u64) -> Self {
        ProjectRef::Id(id)
    }
}

impl From<&str> for ProjectRef {
    fn from(path: &str) -> Self {
        ProjectRef::Path(path.to_string())
    }
}

impl From<String> for ProjectRef {
    fn from(path: String) -> Self {
        ProjectRef::Path(path)
    }
}

impl From<Project> for ProjectRef {
    fn from(project: Project) -> Self {
        ProjectRef::Resolved(project)
    }
}

impl From<&Project> for ProjectRef {
    fn from(project: &Project) -> Self {
        ProjectRef::Resolved(project.clone())
    }
}

/// Resolve a reference into a project.
///
/// An already resolved project is returned without any network call. Ids and
/// paths are looked up through the session's retry policy. An empty path is
/// rejected up front and never retried.
pub fn canonical_project(session: &Session<'_>, reference: &ProjectRef) -> Result<Project> {
    match reference {
        ProjectRef::Resolved(project) => Ok(project.clone()),
        other => fetch(session, other.lookup_key()?),
    }
}

/// Fetch the current server state of a project, ignoring any resolved copy.
pub fn fresh_project(session: &Session<'_>, reference: &ProjectRef) -> Result<Project> {
    fetch(session, reference.lookup_key()?)
}

fn fetch(session: &Session<'_>, key: ProjectId) -> Result<Project> {
    session.call(&format!("get project {}", key), |api| api.get_project(&key))
}
