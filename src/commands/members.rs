//! # Membership Command Implementations
//!
//! `add-member` gives each student access to their project; `remove-member`
//! takes it away again. Students without a GitLab account are skipped with a
//! warning. A student who is already (or no longer) a member is not an error.

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::error::Error;
use teachers_gitlab::gitlab::{AccessLevel, User};
use teachers_gitlab::ops::{add_member, remove_member, Outcome};
use teachers_gitlab::roster::{lookup_users, RosterUser};
use teachers_gitlab::suggestions;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Add students as members of their projects
#[derive(Args, Debug)]
pub struct AddMemberArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Access level: devel, reporter, maintainer, ...
    #[arg(long, value_name = "LEVEL")]
    pub access_level: String,

    /// Only log what would be done.
    #[arg(long)]
    pub dry_run: bool,
}

/// Remove students from their projects
#[derive(Args, Debug)]
pub struct RemoveMemberArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Only log what would be done.
    #[arg(long)]
    pub dry_run: bool,
}

fn account(user: &RosterUser) -> Result<&User, Error> {
    user.account.as_ref().ok_or_else(|| Error::NotFound {
        resource: format!("user {}", user.login()),
    })
}

/// Execute the `add-member` command.
pub fn execute_add(args: AddMemberArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let level: AccessLevel = args
        .access_level
        .parse()
        .map_err(|_| suggestions::unknown_access_level(&args.access_level))?;

    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, true);
    let report = Batch::new(session).for_each_project(users, &args.project, |user, project| {
        let account = account(user)?;
        if args.dry_run {
            info!(
                "Would add {} to {} (as {})",
                account.username, project.path_with_namespace, level
            );
            return Ok(false);
        }
        info!(
            "Adding {} to {} (as {})",
            account.username, project.path_with_namespace, level
        );
        add_member(&session, &project.into(), account, level).map(|o| o.changed())
    })?;

    finish(&out, "add-member", &report)
}

/// Execute the `remove-member` command.
pub fn execute_remove(args: RemoveMemberArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, true);
    let report = Batch::new(session).for_each_project(users, &args.project, |user, project| {
        let account = account(user)?;
        if args.dry_run {
            info!(
                "Would remove {} from {}",
                account.username, project.path_with_namespace
            );
            return Ok(false);
        }
        info!(
            "Removing {} from {}",
            account.username, project.path_with_namespace
        );
        remove_member(&session, &project.into(), account.id).map(|o| o.changed())
    })?;

    finish(&out, "remove-member", &report)
}
