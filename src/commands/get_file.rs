//! # Get-File Command Implementation
//!
//! Downloads one file from every student project, taken from the commit each
//! student had at the deadline.

use std::fs;

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::deadline::commit_before_deadline;
use teachers_gitlab::error::Error;
use teachers_gitlab::ops::get_file_contents;
use teachers_gitlab::resolve::ProjectRef;
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::template::expand;

use super::common::{finish, DeadlineArgs, GlobalArgs, RosterArgs};

/// Download a file from every project as of a deadline
#[derive(Args, Debug)]
pub struct GetFileArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// File path inside the repository, formatted from CSV columns.
    #[arg(long, value_name = "REMOTE_PATH_WITH_FORMAT")]
    pub remote_file: String,

    /// Local file to write, formatted from CSV columns and `{commit.*}`.
    #[arg(long, value_name = "LOCAL_PATH_WITH_FORMAT")]
    pub local_file: String,

    #[command(flatten)]
    pub deadline: DeadlineArgs,
}

/// Execute the `get-file` command.
pub fn execute(args: GetFileArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let query = args.deadline.query()?;
    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, true);
    let report = Batch::new(session).for_each_project(users, &args.project, |user, project| {
        let reference = ProjectRef::from(project);
        let commit = commit_before_deadline(&session, &reference, &query)?;
        let vars = user.variables().with_commit(&commit);
        let remote_file = expand(&args.remote_file, &vars)?;
        let local_file = expand(&args.local_file, &vars)?;

        let content = get_file_contents(&session, &reference, &commit.id, &remote_file)?
            .ok_or_else(|| Error::NotFound {
                resource: format!(
                    "file {} in {} at {}",
                    remote_file, project.path_with_namespace, commit.short_id
                ),
            })?;
        info!(
            "File {} in {} has {}B.",
            remote_file,
            project.path_with_namespace,
            content.len()
        );
        fs::write(&local_file, content)?;
        Ok(())
    })?;

    finish(&out, "get-file", &report)
}
