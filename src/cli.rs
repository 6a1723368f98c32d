//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;
use crate::commands::common::GlobalArgs;

/// Teachers GitLab - Mass actions on per-student GitLab repositories
#[derive(Parser, Debug)]
#[command(name = "teachers-gitlab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List roster logins that have no GitLab account
    Accounts(commands::accounts::AccountsArgs),

    /// Fork one project for every student
    Fork(commands::fork::ForkArgs),

    /// Protect a branch in multiple projects
    Protect(commands::protect::ProtectArgs),

    /// Remove branch protection in multiple projects
    Unprotect(commands::protect::UnprotectArgs),

    /// Protect a tag (or tag wildcard) in multiple projects
    ProtectTag(commands::protect::ProtectTagArgs),

    /// Remove tag protection in multiple projects
    UnprotectTag(commands::protect::UnprotectTagArgs),

    /// Add students as members of their projects
    AddMember(commands::members::AddMemberArgs),

    /// Remove students from their projects
    RemoveMember(commands::members::RemoveMemberArgs),

    /// Download a file from every project as of a deadline
    GetFile(commands::get_file::GetFileArgs),

    /// Upload a file to every project
    PutFile(commands::put_file::PutFileArgs),

    /// Report the newest CI pipeline of every project
    GetLastPipeline(commands::pipelines::GetLastPipelineArgs),

    /// Clone or fetch every project and reset it to the selected commit
    Clone(commands::clone::CloneArgs),

    /// Print the last commit before a deadline for every project
    DeadlineCommit(commands::deadline_commit::DeadlineCommitArgs),

    /// Print per-commit line statistics of every project as JSON
    CommitStats(commands::commit_stats::CommitStatsArgs),

    /// Change settings of multiple projects
    ProjectSettings(commands::settings::ProjectSettingsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global);
        let global = &self.global;

        match self.command {
            Commands::Accounts(args) => commands::accounts::execute(args, global),
            Commands::Fork(args) => commands::fork::execute(args, global),
            Commands::Protect(args) => commands::protect::execute_protect(args, global),
            Commands::Unprotect(args) => commands::protect::execute_unprotect(args, global),
            Commands::ProtectTag(args) => commands::protect::execute_protect_tag(args, global),
            Commands::UnprotectTag(args) => {
                commands::protect::execute_unprotect_tag(args, global)
            }
            Commands::AddMember(args) => commands::members::execute_add(args, global),
            Commands::RemoveMember(args) => commands::members::execute_remove(args, global),
            Commands::GetFile(args) => commands::get_file::execute(args, global),
            Commands::PutFile(args) => commands::put_file::execute(args, global),
            Commands::GetLastPipeline(args) => commands::pipelines::execute(args, global),
            Commands::Clone(args) => commands::clone::execute(args, global),
            Commands::DeadlineCommit(args) => commands::deadline_commit::execute(args, global),
            Commands::CommitStats(args) => commands::commit_stats::execute(args, global),
            Commands::ProjectSettings(args) => commands::settings::execute(args, global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` wins; otherwise `--debug` or `--log-level` decide.
fn init_logging(global: &GlobalArgs) {
    let level = if global.debug {
        LevelFilter::Debug
    } else {
        global.log_level.parse().unwrap_or(LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_target(true);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}
