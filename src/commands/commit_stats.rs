//! # Commit-Stats Command Implementation
//!
//! Dumps every commit of every project with its parents, subject, author and
//! added/removed line counts as one JSON document.

use anyhow::Result;
use clap::Args;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::ops::{commit_stats, ProjectStats};
use teachers_gitlab::roster::lookup_users;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Print per-commit line statistics of every project as JSON
#[derive(Args, Debug)]
pub struct CommitStatsArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,
}

/// Execute the `commit-stats` command.
pub fn execute(args: CommitStatsArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let mut stats: Vec<ProjectStats> = Vec::new();
    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |_, project| {
            stats.push(commit_stats(&session, &project.into())?);
            Ok(())
        },
    )?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    finish(&out, "commit-stats", &report)
}
