//! Project membership.

use log::info;

use super::Outcome;
use crate::error::{Error, Result};
use crate::gitlab::{AccessLevel, User};
use crate::resolve::{canonical_project, ProjectRef};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOutcome {
    Added,
    AlreadyMember,
    Removed,
    NotMember,
}

impl Outcome for MemberOutcome {
    fn changed(&self) -> bool {
        matches!(self, MemberOutcome::Added | MemberOutcome::Removed)
    }
}

/// Add `user` to a project; an existing membership is left as it is.
pub fn add_member(
    session: &Session<'_>,
    project: &ProjectRef,
    user: &User,
    level: AccessLevel,
) -> Result<MemberOutcome> {
    let project = canonical_project(session, project)?;
    let added = session.call("add member", |api| {
        api.add_member(&project, user.id, level)
    });
    match added {
        Ok(_) => Ok(MemberOutcome::Added),
        Err(Error::Conflict { .. }) => {
            info!(
                "{} is already a member of {}",
                user.username, project.path_with_namespace
            );
            Ok(MemberOutcome::AlreadyMember)
        }
        Err(e) => Err(e),
    }
}

/// Remove the direct member with the given user id, if present.
pub fn remove_member(
    session: &Session<'_>,
    project: &ProjectRef,
    user_id: u64,
) -> Result<MemberOutcome> {
    let project = canonical_project(session, project)?;
    let members = session.call("list members", |api| api.list_members(&project))?;
    let Some(member) = members.iter().find(|m| m.id == user_id) else {
        info!(
            "User {} is not a member of {}",
            user_id, project.path_with_namespace
        );
        return Ok(MemberOutcome::NotMember);
    };

    match session.call("remove member", |api| api.remove_member(&project, member.id)) {
        Ok(()) => Ok(MemberOutcome::Removed),
        Err(Error::NotFound { .. }) => Ok(MemberOutcome::NotMember),
        Err(e) => Err(e),
    }
}
