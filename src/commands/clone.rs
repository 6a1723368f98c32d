//! # Clone Command Implementation
//!
//! Clones every student project (or fetches into an existing clone) with the
//! system `git` and resets the working copy to the selected commit: either a
//! commit given with `--commit`, or the submission at `--deadline`.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::deadline::CommitSelector;
use teachers_gitlab::error::Error;
use teachers_gitlab::git::{clone_or_fetch, reset_to_commit};
use teachers_gitlab::resolve::ProjectRef;
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::suggestions;
use teachers_gitlab::template::expand;

use super::common::{finish, DeadlineArgs, GlobalArgs, RosterArgs};

/// Clone or fetch every project and reset it to the selected commit
#[derive(Args, Debug)]
pub struct CloneArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Local repository path, formatted from CSV columns.
    #[arg(long = "to", value_name = "LOCAL_PATH_WITH_FORMAT")]
    pub to: String,

    /// Commit to reset to after clone, formatted from CSV columns.
    #[arg(long, value_name = "COMMIT_WITH_FORMAT")]
    pub commit: Option<String>,

    #[command(flatten)]
    pub deadline: DeadlineArgs,
}

/// Execute the `clone` command.
pub fn execute(args: CloneArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    if args.commit.is_some() && args.deadline.deadline.is_some() {
        return Err(suggestions::commit_and_deadline());
    }
    let query = match args.commit {
        Some(_) => None,
        None => Some(args.deadline.query()?),
    };

    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).for_each_project(users, &args.project, |user, project| {
        let vars = user.variables();
        let exact = match &args.commit {
            Some(template) => Some(expand(template, &vars)?),
            None => None,
        };
        let selector = CommitSelector::new(exact, query.clone())?;
        let reference = ProjectRef::from(project);
        let commit = selector.resolve(&session, &reference)?;

        let url = project
            .ssh_url_to_repo
            .as_deref()
            .ok_or_else(|| Error::NotFound {
                resource: format!("SSH URL of {}", project.path_with_namespace),
            })?;
        let local_path = expand(&args.to, &vars.with_commit(&commit))?;
        let action = clone_or_fetch(url, Path::new(&local_path))?;
        reset_to_commit(Path::new(&local_path), &commit.id)?;
        info!(
            "{:?} {} into {} at {}",
            action, project.path_with_namespace, local_path, commit.short_id
        );
        Ok(())
    })?;

    finish(&out, "clone", &report)
}
