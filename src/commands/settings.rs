//! # Project-Settings Command Implementation
//!
//! Changes selected attributes of every project. Projects that already carry
//! the requested values are not touched.

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::gitlab::ProjectSettings;
use teachers_gitlab::ops::{apply_settings, Outcome};
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::template::expand;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Change settings of multiple projects
#[derive(Args, Debug)]
pub struct ProjectSettingsArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Target merge requests at the fork itself instead of its parent.
    #[arg(long, value_name = "BOOL")]
    pub mr_default_target_self: Option<bool>,

    /// Project description, formatted from CSV columns.
    #[arg(long, value_name = "TEXT_WITH_FORMAT")]
    pub description: Option<String>,

    /// Only log what would be done.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `project-settings` command.
pub fn execute(args: ProjectSettingsArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |user, project| {
            let description = match &args.description {
                Some(template) => Some(expand(template, &user.variables())?),
                None => None,
            };
            let settings = ProjectSettings {
                mr_default_target_self: args.mr_default_target_self,
                description,
            };
            if args.dry_run {
                info!(
                    "Would update {} with {:?}",
                    project.path_with_namespace, settings
                );
                return Ok(false);
            }
            let outcome = apply_settings(&session, &project.into(), &settings)?;
            info!("{}: {:?}", project.path_with_namespace, outcome);
            Ok(outcome.changed())
        },
    )?;

    finish(&out, "project-settings", &report)
}
