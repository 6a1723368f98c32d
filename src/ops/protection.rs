//! Branch and tag protection.
//!
//! Protection is looked up before anything is written. An existing
//! protection is left alone and reported as [`ProtectOutcome::AlreadyProtected`]
//! unless the caller asks to reassert the rules; in that case a protection
//! with different levels is deleted and created again with the requested ones.

use log::{error, info};

use super::Outcome;
use crate::error::{Error, Result};
use crate::gitlab::{BranchRules, GitLabApi, Project, TagRules};
use crate::resolve::{canonical_project, ProjectRef};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectOutcome {
    Protected,
    AlreadyProtected,
    /// Existing protection had different rules and was replaced.
    Reasserted,
}

impl Outcome for ProtectOutcome {
    fn changed(&self) -> bool {
        !matches!(self, ProtectOutcome::AlreadyProtected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnprotectOutcome {
    Unprotected,
    NotProtected,
}

impl Outcome for UnprotectOutcome {
    fn changed(&self) -> bool {
        matches!(self, UnprotectOutcome::Unprotected)
    }
}

/// Protect a branch with the given push and merge levels.
pub fn protect_branch(
    session: &Session<'_>,
    project: &ProjectRef,
    branch: &str,
    rules: &BranchRules,
    reassert: bool,
) -> Result<ProtectOutcome> {
    let project = canonical_project(session, project)?;
    ensure_protected(
        session,
        &project,
        &format!("branch {}", branch),
        |api| api.get_protected_branch(&project, branch).map(|p| p.matches(rules)),
        |api| api.protect_branch(&project, branch, rules).map(|_| ()),
        |api| api.unprotect_branch(&project, branch),
        reassert,
    )
}

/// Protect a tag name or wildcard with the given create level.
pub fn protect_tag(
    session: &Session<'_>,
    project: &ProjectRef,
    tag: &str,
    rules: &TagRules,
    reassert: bool,
) -> Result<ProtectOutcome> {
    let project = canonical_project(session, project)?;
    ensure_protected(
        session,
        &project,
        &format!("tag {}", tag),
        |api| api.get_protected_tag(&project, tag).map(|p| p.matches(rules)),
        |api| api.protect_tag(&project, tag, rules).map(|_| ()),
        |api| api.unprotect_tag(&project, tag),
        reassert,
    )
}

/// Remove protection from a branch if there is any.
pub fn unprotect_branch(
    session: &Session<'_>,
    project: &ProjectRef,
    branch: &str,
) -> Result<UnprotectOutcome> {
    let project = canonical_project(session, project)?;
    ensure_unprotected(
        session,
        &project,
        &format!("branch {}", branch),
        |api| api.get_protected_branch(&project, branch).map(|_| ()),
        |api| api.unprotect_branch(&project, branch),
    )
}

/// Remove protection from a tag if there is any.
pub fn unprotect_tag(
    session: &Session<'_>,
    project: &ProjectRef,
    tag: &str,
) -> Result<UnprotectOutcome> {
    let project = canonical_project(session, project)?;
    ensure_unprotected(
        session,
        &project,
        &format!("tag {}", tag),
        |api| api.get_protected_tag(&project, tag).map(|_| ()),
        |api| api.unprotect_tag(&project, tag),
    )
}

/// `lookup` reports whether the current protection matches the request.
fn ensure_protected<L, C, D>(
    session: &Session<'_>,
    project: &Project,
    what: &str,
    mut lookup: L,
    mut create: C,
    mut delete: D,
    reassert: bool,
) -> Result<ProtectOutcome>
where
    L: FnMut(&dyn GitLabApi) -> Result<bool>,
    C: FnMut(&dyn GitLabApi) -> Result<()>,
    D: FnMut(&dyn GitLabApi) -> Result<()>,
{
    let path = &project.path_with_namespace;
    let current = match session.call(&format!("get protected {}", what), &mut lookup) {
        Ok(matches) => Some(matches),
        Err(Error::NotFound { .. }) => None,
        Err(e) => return Err(e),
    };

    match current {
        None => match session.call(&format!("protect {}", what), &mut create) {
            Ok(()) => Ok(ProtectOutcome::Protected),
            Err(Error::Conflict { .. }) => {
                info!("{} in {} is already protected", what, path);
                Ok(ProtectOutcome::AlreadyProtected)
            }
            Err(e) => Err(e),
        },
        Some(false) if reassert => {
            info!("Replacing protection of {} in {}", what, path);
            session.call(&format!("unprotect {}", what), &mut delete)?;
            if let Err(e) = session.call(&format!("protect {}", what), &mut create) {
                error!("{} in {} is left unprotected: {}", what, path, e);
                return Err(Error::ProtectionLost {
                    resource: format!("{} in {}", what, path),
                    last: Box::new(e),
                });
            }
            Ok(ProtectOutcome::Reasserted)
        }
        Some(_) => {
            info!("{} in {} is already protected", what, path);
            Ok(ProtectOutcome::AlreadyProtected)
        }
    }
}

fn ensure_unprotected<L, D>(
    session: &Session<'_>,
    project: &Project,
    what: &str,
    mut lookup: L,
    mut delete: D,
) -> Result<UnprotectOutcome>
where
    L: FnMut(&dyn GitLabApi) -> Result<()>,
    D: FnMut(&dyn GitLabApi) -> Result<()>,
{
    let nothing_to_do = || -> Result<UnprotectOutcome> {
        info!(
            "{} in {} is not protected, nothing to do",
            what, project.path_with_namespace
        );
        Ok(UnprotectOutcome::NotProtected)
    };

    match session.call(&format!("get protected {}", what), &mut lookup) {
        Ok(()) => {}
        Err(Error::NotFound { .. }) => return nothing_to_do(),
        Err(e) => return Err(e),
    }
    match session.call(&format!("unprotect {}", what), &mut delete) {
        Ok(()) => Ok(UnprotectOutcome::Unprotected),
        Err(Error::NotFound { .. }) => nothing_to_do(),
        Err(e) => Err(e),
    }
}
