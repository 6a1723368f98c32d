//! Local working copies, driven through the system `git` binary.
//!
//! Using the installed client means SSH keys, credential helpers and
//! `~/.gitconfig` all apply exactly as they do for the user's own checkouts.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::{Error, Result};

/// What [`clone_or_fetch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutAction {
    Cloned,
    Fetched,
}

/// Clone `url` into `local_path`, or fetch if it is already a repository.
///
/// A non-empty directory that is not a Git repository is left untouched and
/// reported as an error.
pub fn clone_or_fetch(url: &str, local_path: &Path) -> Result<CheckoutAction> {
    if local_path.join(".git").is_dir() {
        debug!("Fetching into {}", local_path.display());
        run_git(&["fetch"], Some(local_path), url)?;
        return Ok(CheckoutAction::Fetched);
    }

    if local_path.is_dir() && fs::read_dir(local_path)?.next().is_some() {
        return Err(Error::LocalPath {
            path: local_path.display().to_string(),
            message: "directory is not empty and is not a Git repository".to_string(),
        });
    }

    fs::create_dir_all(local_path)?;
    info!("Cloning {} into {}", url, local_path.display());
    let target = local_path.to_string_lossy();
    run_git(&["clone", url, target.as_ref()], None, url)?;
    Ok(CheckoutAction::Cloned)
}

/// Hard-reset the working copy to `commit`.
pub fn reset_to_commit(local_path: &Path, commit: &str) -> Result<()> {
    debug!("Resetting {} to {}", local_path.display(), commit);
    run_git(&["reset", "--hard", commit], Some(local_path), commit)?;
    Ok(())
}

/// Run git in `cwd`, or in the current directory when `None`.
fn run_git(args: &[&str], cwd: Option<&Path>, subject: &str) -> Result<()> {
    let command = format!("git {}", args.join(" "));
    let location = cwd.unwrap_or(Path::new(".")).display().to_string();
    let mut git = Command::new("git");
    git.args(args);
    if let Some(cwd) = cwd {
        git.current_dir(cwd);
    }
    let output = git.output().map_err(|e| Error::GitCommand {
        command: command.clone(),
        path: location.clone(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        let stderr = if stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "cannot access {}. Make sure your SSH key is loaded and has access.\n{}",
                subject, stderr
            )
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::GitCommand {
            command,
            path: location,
            stderr,
        });
    }

    Ok(())
}
