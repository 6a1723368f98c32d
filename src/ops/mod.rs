//! Idempotent operations on student projects.
//!
//! Every operation here can be re-run after a partial earlier run. Server
//! answers that mean "already done" (a conflict on create, a 304 on delete, a
//! missing protection on unprotect) are turned into an outcome value instead
//! of an error, so the batch driver can tell apart entries that changed
//! something from entries that were already in the requested state.

pub mod files;
pub mod fork;
pub mod members;
pub mod pipelines;
pub mod protection;
pub mod settings;
pub mod stats;

pub use files::{get_file_contents, put_file, upload, FileUpload, PutOutcome, UploadPolicy};
pub use fork::{fork_idempotent, remove_fork_relationship, wait_for_fork, ForkOutcome};
pub use members::{add_member, remove_member, MemberOutcome};
pub use pipelines::{last_pipeline, summarize_pipelines, PipelineReport};
pub use protection::{
    protect_branch, protect_tag, unprotect_branch, unprotect_tag, ProtectOutcome,
    UnprotectOutcome,
};
pub use settings::{apply_settings, SettingsOutcome};
pub use stats::{commit_stats, CommitRecord, ProjectStats};

/// Result of an operation that may or may not have changed server state.
pub trait Outcome {
    /// Whether the server was modified.
    fn changed(&self) -> bool;
}

/// Actions without a distinct no-op result (reports, downloads) count as done.
impl Outcome for () {
    fn changed(&self) -> bool {
        true
    }
}

/// `true` for a change, `false` for a skipped entry such as a dry run.
impl Outcome for bool {
    fn changed(&self) -> bool {
        *self
    }
}
