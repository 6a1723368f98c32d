//! # Fork Command Implementation
//!
//! Forks one template project into a per-student copy. Forks that already
//! exist from an earlier run are reused, so the command can be repeated after
//! an interruption. Each new fork is awaited until GitLab has populated it.

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::ops::{fork_idempotent, remove_fork_relationship, wait_for_fork};
use teachers_gitlab::path::split_project_path;
use teachers_gitlab::resolve::{canonical_project, ProjectRef};
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::template::expand;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Fork one project for every student
#[derive(Args, Debug)]
pub struct ForkArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Parent project path.
    #[arg(long = "from", value_name = "REPO_PATH")]
    pub from: String,

    /// Target project path, formatted from CSV columns.
    #[arg(long = "to", value_name = "REPO_PATH_WITH_FORMAT")]
    pub to: String,

    /// Remove the fork relationship once the fork exists.
    #[arg(long)]
    pub hide_fork: bool,

    /// Do not wait for GitLab to populate new forks.
    #[arg(long)]
    pub no_wait: bool,
}

/// Execute the `fork` command.
pub fn execute(args: ForkArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let parent = canonical_project(&session, &ProjectRef::from(args.from.as_str()))?;
    let parent = ProjectRef::from(parent);

    let users = lookup_users(session, args.roster.open()?, true);
    let report = Batch::new(session).for_each_user(users, |user| {
        let target = expand(&args.to, &user.variables())?;
        let (namespace, name) = split_project_path(&target)?;
        info!(
            "Forking {} to {}/{} for user {}",
            parent,
            namespace,
            name,
            user.login()
        );

        let outcome = fork_idempotent(&session, &parent, namespace, name)?;
        let fork = ProjectRef::Id(outcome.project.id);
        if !args.no_wait {
            wait_for_fork(&session, &fork)?;
        }
        if args.hide_fork && remove_fork_relationship(&session, &fork)? {
            info!("Removed fork relationship of {}", target);
        }
        Ok(outcome)
    })?;

    finish(&out, "fork", &report)
}
