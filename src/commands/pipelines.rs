//! # Get-Last-Pipeline Command Implementation
//!
//! Prints the newest CI pipeline of every project as JSON, keyed by project
//! path. With `--summary-only` only a histogram of pipeline states is printed.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::ops::{last_pipeline, summarize_pipelines, PipelineReport};
use teachers_gitlab::roster::lookup_users;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Report the newest CI pipeline of every project
#[derive(Args, Debug)]
pub struct GetLastPipelineArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Print only the ratio of pipeline states across projects.
    #[arg(long)]
    pub summary_only: bool,
}

/// Execute the `get-last-pipeline` command.
pub fn execute(args: GetLastPipelineArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let mut reports: BTreeMap<String, PipelineReport> = BTreeMap::new();
    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |_, project| {
            let pipeline = last_pipeline(&session, &project.into())?;
            reports.insert(project.path_with_namespace.clone(), pipeline);
            Ok(())
        },
    )?;

    if args.summary_only {
        for line in summarize_pipelines(reports.values()) {
            println!("{}", line);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    finish(&out, "get-last-pipeline", &report)
}
