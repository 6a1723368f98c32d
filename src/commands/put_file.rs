//! # Put-File Command Implementation
//!
//! Commits a local file into every student project. Unless `--force-commit`
//! is given the remote content is compared first and unchanged files produce
//! no commit; with `--once` an existing file is never overwritten.

use std::fs;

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::defaults;
use teachers_gitlab::error::Error;
use teachers_gitlab::ops::{upload, FileUpload, Outcome, PutOutcome, UploadPolicy};
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::suggestions;
use teachers_gitlab::template::expand;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Upload a file to every project
#[derive(Args, Debug)]
pub struct PutFileArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Local file path, formatted from CSV columns.
    #[arg(long = "from", value_name = "LOCAL_FILE_PATH_WITH_FORMAT")]
    pub from: String,

    /// Remote file path, formatted from CSV columns.
    #[arg(long = "to", value_name = "REMOTE_FILE_PATH_WITH_FORMAT")]
    pub to: String,

    /// Branch to commit to.
    #[arg(long, value_name = "BRANCH", default_value = defaults::DEFAULT_BRANCH)]
    pub branch: String,

    /// Commit message, formatted from CSV columns and `{target_file}`.
    #[arg(
        long,
        value_name = "COMMIT_MESSAGE_WITH_FORMAT",
        default_value = defaults::DEFAULT_COMMIT_MESSAGE
    )]
    pub message: String,

    /// Do not check current file content, always upload.
    #[arg(long)]
    pub force_commit: bool,

    /// Upload file only if it is not present.
    #[arg(long)]
    pub once: bool,

    /// Only log what would be done.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `put-file` command.
pub fn execute(args: PutFileArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let policy = UploadPolicy::from_flags(args.force_commit, args.once).map_err(|e| match e {
        Error::InvalidArguments { .. } => suggestions::force_and_once(),
        other => other.into(),
    })?;

    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, true);
    let report = Batch::new(session).for_each_project(users, &args.project, |user, project| {
        let vars = user.variables();
        let from_file = expand(&args.from, &vars)?;
        let to_file = expand(&args.to, &vars)?;
        let message = expand(&args.message, &vars.with("target_file", to_file.clone()))?;
        let content = fs::read_to_string(&from_file)?;

        if args.dry_run {
            info!(
                "Would upload {} to {} as {}",
                from_file, project.path_with_namespace, to_file
            );
            return Ok(false);
        }

        let file = FileUpload {
            branch: args.branch.clone(),
            path: to_file,
            content,
            message,
        };
        let outcome = upload(&session, &project.into(), &file, policy)?;
        match outcome {
            PutOutcome::Created | PutOutcome::Updated => info!(
                "Uploaded {} to {} as {}",
                from_file, project.path_with_namespace, file.path
            ),
            PutOutcome::Skipped => info!(
                "Not overwriting {} at {}.",
                file.path, project.path_with_namespace
            ),
            PutOutcome::Unchanged => info!(
                "No change in {} at {}.",
                from_file, project.path_with_namespace
            ),
        }
        Ok(outcome.changed())
    })?;

    finish(&out, "put-file", &report)
}
