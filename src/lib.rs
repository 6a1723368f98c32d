//! # Teachers GitLab Library
//!
//! This library performs mass actions on per-student GitLab repositories:
//! forking a template project for every student, protecting branches,
//! managing membership, uploading and collecting files, and finding the commit
//! each student had at a submission deadline. It is used by the
//! `teachers-gitlab` command-line tool but the core works against any
//! implementation of [`gitlab::GitLabApi`].
//!
//! ## Quick Example
//!
//! ```
//! use teachers_gitlab::roster::Roster;
//! use teachers_gitlab::template::expand;
//!
//! let csv = "login,group\nalpha,g1\nbeta,g2\n";
//! let paths: Vec<String> = Roster::from_reader(csv.as_bytes(), "login")
//!     .unwrap()
//!     .map(|entry| expand("student/{group}-{login}", &entry.unwrap().variables()).unwrap())
//!     .collect();
//!
//! assert_eq!(paths, vec!["student/g1-alpha", "student/g2-beta"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Session (`session`, `retry`)**: a client plus the retry budgets every
//!   remote call runs under. Transient failures are retried; anything else is
//!   returned to the caller on first occurrence.
//! - **Project references (`resolve`)**: a project given by id, by path, or
//!   already fetched, turned into a full project record.
//! - **Deadline resolution (`deadline`)**: the commit that represents a
//!   student's submission, preferring a tag and skipping blacklisted authors.
//! - **Idempotent operations (`ops`)**: fork, file upload, protection and
//!   membership changes that can be re-run after a partial failure.
//! - **Batches (`roster`, `template`, `batch`)**: the CSV roster expanded into
//!   per-student project paths, driven one entry at a time with per-entry
//!   failure isolation.
//!
//! ## Execution Flow
//!
//! A command loads the [`config`], builds an HTTP client and a session, reads
//! the roster lazily and hands each entry to [`batch::Batch`], which expands
//! the project template, resolves the project and runs the operation. The
//! batch report tells how many entries changed the server, how many were
//! already done and how many failed.

pub mod batch;
pub mod config;
pub mod deadline;
pub mod defaults;
pub mod error;
pub mod git;
pub mod gitlab;
pub mod ops;
pub mod output;
pub mod path;
pub mod resolve;
pub mod retry;
pub mod roster;
pub mod session;
pub mod suggestions;
pub mod template;
