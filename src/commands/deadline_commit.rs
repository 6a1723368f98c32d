//! # Deadline-Commit Command Implementation
//!
//! Prints one line per student with the commit they had at the deadline,
//! formatted from the roster columns and `{commit.*}` values. The output is
//! CSV by default (`login,commit`) and is typically fed to grading scripts.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::debug;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::deadline::commit_before_deadline;
use teachers_gitlab::defaults;
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::template::expand;

use super::common::{finish, DeadlineArgs, GlobalArgs, RosterArgs};

/// Print the last commit before a deadline for every project
#[derive(Args, Debug)]
pub struct DeadlineCommitArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    #[command(flatten)]
    pub deadline: DeadlineArgs,

    /// First line of the output.
    #[arg(
        long = "first-line",
        value_name = "OUTPUT_HEADER",
        default_value = defaults::DEFAULT_DEADLINE_HEADER
    )]
    pub first_line: String,

    /// Output row, formatted from CSV columns and `{commit.*}`.
    #[arg(
        long,
        value_name = "OUTPUT_ROW_WITH_FORMAT",
        default_value = defaults::DEFAULT_DEADLINE_FORMAT
    )]
    pub format: String,

    /// Output file, defaults to stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `deadline-commit` command.
pub fn execute(args: DeadlineCommitArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let query = args.deadline.query()?;
    let client = global.client()?;
    let session = global.session(&client)?;

    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    writeln!(output, "{}", args.first_line)?;

    let users = lookup_users(session, args.roster.open()?, true);
    let report = Batch::new(session).for_each_project(users, &args.project, |user, project| {
        let commit = commit_before_deadline(&session, &project.into(), &query)?;
        debug!("{} at {}", project.path_with_namespace, commit.id);

        let line = expand(&args.format, &user.variables().with_commit(&commit))?;
        writeln!(output, "{}", line)?;
        Ok(())
    })?;
    output.flush()?;

    finish(&out, "deadline-commit", &report)
}
