//! # CLI Command Implementations
//!
//! One module per `teachers-gitlab` subcommand (related subcommands such as
//! `protect` and `unprotect` share a module).
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct with the command-specific options, derived using `clap`.
//!   Options shared by most commands (the roster, deadline selection) are
//!   flattened in from [`common`].
//! - An `execute` function that builds the GitLab session from the global
//!   options, drives the roster through the library's batch driver and prints
//!   the summary line.

pub mod accounts;
pub mod clone;
pub mod commit_stats;
pub mod common;
pub mod completions;
pub mod deadline_commit;
pub mod fork;
pub mod get_file;
pub mod members;
pub mod pipelines;
pub mod protect;
pub mod put_file;
pub mod settings;
