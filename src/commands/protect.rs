//! # Protection Command Implementations
//!
//! `protect`, `unprotect`, `protect-tag` and `unprotect-tag`. Every project
//! is visited once even when several students share it. Existing protection
//! is reported and left alone unless `--reassert` is given.

use anyhow::Result;
use clap::Args;
use log::info;

use teachers_gitlab::batch::Batch;
use teachers_gitlab::gitlab::{AccessLevel, BranchRules, TagRules};
use teachers_gitlab::ops::{protect_branch, protect_tag, unprotect_branch, unprotect_tag};
use teachers_gitlab::roster::lookup_users;
use teachers_gitlab::suggestions;

use super::common::{finish, GlobalArgs, RosterArgs};

/// Protect a branch in multiple projects
#[derive(Args, Debug)]
pub struct ProtectArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Git branch name to set protection on.
    #[arg(long, value_name = "GIT_BRANCH")]
    pub branch: String,

    /// Allow developers to push into this branch.
    #[arg(long)]
    pub developers_can_push: bool,

    /// Allow developers to merge into this branch.
    #[arg(long)]
    pub developers_can_merge: bool,

    /// Replace existing protection whose rules differ.
    #[arg(long)]
    pub reassert: bool,
}

/// Remove branch protection in multiple projects
#[derive(Args, Debug)]
pub struct UnprotectArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Git branch name to unprotect.
    #[arg(long, value_name = "GIT_BRANCH")]
    pub branch: String,
}

/// Protect a tag in multiple projects
#[derive(Args, Debug)]
pub struct ProtectTagArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Tag name or wildcard such as `v*`.
    #[arg(long, value_name = "TAG")]
    pub tag: String,

    /// Who may create matching tags (developer, maintainer, none, ...).
    #[arg(long, value_name = "LEVEL", default_value = "maintainer")]
    pub create_access_level: String,

    /// Replace existing protection whose rules differ.
    #[arg(long)]
    pub reassert: bool,
}

/// Remove tag protection in multiple projects
#[derive(Args, Debug)]
pub struct UnprotectTagArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Project path, formatted from CSV columns.
    #[arg(long, value_name = "PROJECT_PATH_WITH_FORMAT")]
    pub project: String,

    /// Tag name or wildcard.
    #[arg(long, value_name = "TAG")]
    pub tag: String,
}

/// Execute the `protect` command.
pub fn execute_protect(args: ProtectArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;
    let rules = BranchRules::from_flags(args.developers_can_push, args.developers_can_merge);

    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |_, project| {
            info!(
                "Protecting branch {} in {}",
                args.branch, project.path_with_namespace
            );
            protect_branch(&session, &project.into(), &args.branch, &rules, args.reassert)
        },
    )?;

    finish(&out, "protect", &report)
}

/// Execute the `unprotect` command.
pub fn execute_unprotect(args: UnprotectArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |_, project| {
            info!(
                "Unprotecting branch {} in {}",
                args.branch, project.path_with_namespace
            );
            unprotect_branch(&session, &project.into(), &args.branch)
        },
    )?;

    finish(&out, "unprotect", &report)
}

/// Execute the `protect-tag` command.
pub fn execute_protect_tag(args: ProtectTagArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let create: AccessLevel = args
        .create_access_level
        .parse()
        .map_err(|_| suggestions::unknown_access_level(&args.create_access_level))?;
    let rules = TagRules { create };

    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |_, project| {
            info!(
                "Protecting tag {} in {} (create: {})",
                args.tag, project.path_with_namespace, create
            );
            protect_tag(&session, &project.into(), &args.tag, &rules, args.reassert)
        },
    )?;

    finish(&out, "protect-tag", &report)
}

/// Execute the `unprotect-tag` command.
pub fn execute_unprotect_tag(args: UnprotectTagArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let users = lookup_users(session, args.roster.open()?, false);
    let report = Batch::new(session).skip_duplicates().for_each_project(
        users,
        &args.project,
        |_, project| {
            info!(
                "Unprotecting tag {} in {}",
                args.tag, project.path_with_namespace
            );
            unprotect_tag(&session, &project.into(), &args.tag)
        },
    )?;

    finish(&out, "unprotect-tag", &report)
}
