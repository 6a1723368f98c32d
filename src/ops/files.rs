//! Reading and writing single files in student repositories.

use log::{debug, info};

use super::Outcome;
use crate::error::{Error, Result};
use crate::gitlab::{FileAction, FileCommit};
use crate::resolve::{canonical_project, ProjectRef};
use crate::session::Session;

/// A file to be committed to one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub branch: String,
    pub path: String,
    pub content: String,
    pub message: String,
}

/// What happened to an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Updated,
    /// The file exists and overwriting was not allowed.
    Skipped,
    /// The remote content already equals the upload.
    Unchanged,
}

impl Outcome for PutOutcome {
    fn changed(&self) -> bool {
        matches!(self, PutOutcome::Created | PutOutcome::Updated)
    }
}

/// When an upload should turn into a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPolicy {
    /// Commit without looking at the current content.
    Force,
    /// Commit when the file is missing or differs.
    IfChanged,
    /// Commit only when the file does not exist yet.
    OnlyOnce,
}

impl UploadPolicy {
    /// Policy from the `--force-commit` and `--once` switches.
    pub fn from_flags(force_commit: bool, only_once: bool) -> Result<Self> {
        match (force_commit, only_once) {
            (true, true) => Err(Error::InvalidArguments {
                message: "--force-commit and --once cannot be combined".to_string(),
            }),
            (true, false) => Ok(UploadPolicy::Force),
            (false, true) => Ok(UploadPolicy::OnlyOnce),
            (false, false) => Ok(UploadPolicy::IfChanged),
        }
    }
}

/// Commit a file, creating it or, when `overwrite` is set, updating it.
///
/// The create action is tried first. GitLab answers 400 when the file
/// already exists; with `overwrite` the same commit is sent again as an
/// update, otherwise [`PutOutcome::Skipped`] is returned.
pub fn put_file(
    session: &Session<'_>,
    project: &ProjectRef,
    upload: &FileUpload,
    overwrite: bool,
) -> Result<PutOutcome> {
    let project = canonical_project(session, project)?;
    let mut commit = FileCommit {
        branch: upload.branch.clone(),
        path: upload.path.clone(),
        content: upload.content.clone(),
        message: upload.message.clone(),
        action: FileAction::Create,
    };

    match session.call("create file", |api| api.commit_file(&project, &commit)) {
        Ok(_) => Ok(PutOutcome::Created),
        Err(Error::BadRequest { .. }) if overwrite => {
            debug!(
                "{} exists in {}, updating",
                upload.path, project.path_with_namespace
            );
            commit.action = FileAction::Update;
            session.call("update file", |api| api.commit_file(&project, &commit))?;
            Ok(PutOutcome::Updated)
        }
        Err(Error::BadRequest { .. }) => Ok(PutOutcome::Skipped),
        Err(e) => Err(e),
    }
}

/// Raw content of a file at a branch, tag or commit; `None` when absent.
pub fn get_file_contents(
    session: &Session<'_>,
    project: &ProjectRef,
    reference: &str,
    path: &str,
) -> Result<Option<Vec<u8>>> {
    let project = canonical_project(session, project)?;
    match session.call("get file", |api| api.get_file(&project, reference, path)) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Upload a file honouring `policy`.
///
/// Unless forced, the current content is read first so unchanged files do
/// not produce empty commits.
pub fn upload(
    session: &Session<'_>,
    project: &ProjectRef,
    file: &FileUpload,
    policy: UploadPolicy,
) -> Result<PutOutcome> {
    let project = canonical_project(session, project)?;
    let reference = ProjectRef::Resolved(project.clone());

    if policy == UploadPolicy::Force {
        return put_file(session, &reference, file, true);
    }

    let current = get_file_contents(session, &reference, &file.branch, &file.path)?;
    match current {
        Some(_) if policy == UploadPolicy::OnlyOnce => {
            info!(
                "Not overwriting {} in {}",
                file.path, project.path_with_namespace
            );
            Ok(PutOutcome::Skipped)
        }
        Some(content) if content == file.content.as_bytes() => {
            debug!(
                "{} in {} is up to date",
                file.path, project.path_with_namespace
            );
            Ok(PutOutcome::Unchanged)
        }
        Some(_) => put_file(session, &reference, file, true),
        None => put_file(session, &reference, file, policy != UploadPolicy::OnlyOnce),
    }
}
