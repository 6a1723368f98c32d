//! Forking a template project into per-student copies.

use log::{debug, info};

use super::Outcome;
use crate::error::{Error, Result};
use crate::gitlab::Project;
use crate::resolve::{canonical_project, fresh_project, ProjectRef};
use crate::session::Session;

/// The fork at the requested path and whether this call created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkOutcome {
    pub project: Project,
    pub created: bool,
}

impl Outcome for ForkOutcome {
    fn changed(&self) -> bool {
        self.created
    }
}

/// Fork `parent` to `namespace/name` unless that project already exists.
///
/// A conflict from the server means an earlier run already forked, so the
/// existing project at the target path is returned instead.
pub fn fork_idempotent(
    session: &Session<'_>,
    parent: &ProjectRef,
    namespace: &str,
    name: &str,
) -> Result<ForkOutcome> {
    let parent = canonical_project(session, parent)?;
    let created = session.call("create fork", |api| api.create_fork(&parent, namespace, name));

    match created {
        Ok(fork) => {
            info!(
                "Forked {} to {}",
                parent.path_with_namespace, fork.path_with_namespace
            );
            // Re-resolve: the create response may predate the import state.
            let project = fresh_project(session, &ProjectRef::Id(fork.id))?;
            Ok(ForkOutcome {
                project,
                created: true,
            })
        }
        Err(Error::Conflict { .. }) => {
            let path = format!("{}/{}", namespace, name);
            debug!("{} already exists, reusing it", path);
            let project = canonical_project(session, &ProjectRef::Path(path))?;
            Ok(ForkOutcome {
                project,
                created: false,
            })
        }
        Err(e) => Err(e),
    }
}

/// Drop the "forked from" link of a project.
///
/// Returns `false` when the project had no fork relation to begin with.
pub fn remove_fork_relationship(session: &Session<'_>, project: &ProjectRef) -> Result<bool> {
    let project = canonical_project(session, project)?;
    match session.call("remove fork relation", |api| api.delete_fork_relation(&project)) {
        Ok(()) => Ok(true),
        Err(Error::NotModified { .. }) => {
            debug!("{} has no fork relation", project.path_with_namespace);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Poll a fork until its repository is populated.
///
/// Every probe fetches the project anew; a held copy would keep reporting
/// the `empty_repo` flag it was created with.
pub fn wait_for_fork(session: &Session<'_>, fork: &ProjectRef) -> Result<Project> {
    let operation = format!("wait for fork {}", fork);
    session.fork_wait_policy().poll(&operation, |attempt| {
        let project = fresh_project(session, fork)?;
        if project.empty_repo {
            debug!(
                "{} is still empty (poll {})",
                project.path_with_namespace, attempt
            );
            Ok(None)
        } else {
            Ok(Some(project))
        }
    })
}
