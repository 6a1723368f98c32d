//! # Error Handling
//!
//! This module defines the centralized error type for `teachers-gitlab`.
//! It uses the `thiserror` library to build a single `Error` enum that covers
//! the failure modes of the GitLab operations, the roster and template
//! plumbing, and the local `git` invocations.
//!
//! ## Classification
//!
//! The variants fall into four groups, and the batch driver treats each group
//! differently:
//!
//! - **Transient**: transport failures (connection refused, read timeouts) and
//!   HTTP 5xx responses. [`Error::is_retryable`] returns `true` for these and
//!   the retry engine absorbs them until its budget runs out.
//! - **Expected conditions**: `Conflict`, `NotModified`, `NotFound` and
//!   `BadRequest` are returned by the client as-is; the idempotent mutators
//!   decide which of them mean "already done".
//! - **Per-entry failures**: everything else that concerns a single roster
//!   row (`NoMatchingCommit`, `Timeout`, `Template`, ...). These are logged and
//!   the batch continues.
//! - **Fatal**: configuration and contract violations. [`Error::is_fatal`]
//!   returns `true` and the batch aborts immediately.

use thiserror::Error;

/// Main error type for teachers-gitlab operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested GitLab resource does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The resource already exists (HTTP 409).
    #[error("Conflict on {resource}: {message}")]
    Conflict { resource: String, message: String },

    /// GitLab rejected the request as invalid (HTTP 400).
    #[error("Bad request for {resource}: {message}")]
    BadRequest { resource: String, message: String },

    /// The request did not change anything (HTTP 304).
    #[error("Not modified: {resource}")]
    NotModified { resource: String },

    /// GitLab answered with a server-side error (HTTP 5xx).
    #[error("Server error {status} for {resource}: {message}")]
    Server {
        status: u16,
        resource: String,
        message: String,
    },

    /// Any other unsuccessful HTTP status.
    #[error("HTTP error {status} for {resource}: {message}")]
    Http {
        status: u16,
        resource: String,
        message: String,
    },

    /// A transport-level failure from the HTTP client.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A retried operation kept failing with transient errors.
    #[error("{operation}: timed out after {attempts} attempts (last error: {last})")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<Error>,
    },

    /// A polling loop never observed the awaited state.
    #[error("{operation}: timed out after {attempts} attempts")]
    Timeout { operation: String, attempts: u32 },

    /// No commit on the branch satisfied the deadline and author filter.
    #[error("No matching commit in {project} on {branch} before {deadline}")]
    NoMatchingCommit {
        project: String,
        branch: String,
        deadline: String,
    },

    /// Reasserting a protection removed it and creating it again failed.
    #[error("{resource} is no longer protected: {last}")]
    ProtectionLost { resource: String, last: Box<Error> },

    /// A retry policy was built without any budget.
    #[error("Invalid retry policy: {message}")]
    InvalidRetryPolicy { message: String },

    /// A repository reference that cannot be resolved by construction.
    #[error("Invalid project reference: {message}")]
    InvalidReference { message: String },

    /// An access level name that GitLab does not know.
    #[error("Unsupported access level: {value}")]
    InvalidAccessLevel { value: String },

    /// Mutually exclusive or otherwise inconsistent arguments.
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// A timestamp that could not be parsed.
    #[error("Cannot parse timestamp '{value}': {message}")]
    Timestamp { value: String, message: String },

    /// The GitLab connection configuration is incomplete or unreadable.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The roster CSV is missing required structure.
    #[error("Roster error: {message}")]
    Roster { message: String },

    /// An error occurred during template processing.
    ///
    /// May include the name of the problematic variable when applicable.
    #[error("Template processing error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {path}: {command} - {stderr}")]
    GitCommand {
        command: String,
        path: String,
        stderr: String,
    },

    /// A local path is in a state the operation cannot work with.
    #[error("Local path error: {path}: {message}")]
    LocalPath { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A CSV parsing error, wrapped from `csv::Error`.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A JSON (de)serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the retry engine should try the failed call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Server { .. } => true,
            Error::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Whether the error must abort the whole batch instead of a single entry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidRetryPolicy { .. }
                | Error::InvalidReference { .. }
                | Error::InvalidAccessLevel { .. }
                | Error::InvalidArguments { .. }
                | Error::Config { .. }
                | Error::Roster { .. }
        )
    }

    /// Whether the error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
