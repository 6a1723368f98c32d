//! Default values for teachers-gitlab.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Attempts for a single GitLab API call before giving up.
pub const API_RETRY_ATTEMPTS: u32 = 6;

/// Pause between two attempts of a GitLab API call.
pub const API_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Polls of a freshly created fork before giving up.
///
/// 120 polls at 5 seconds is ten minutes, enough to fork even large
/// repositories on a slow instance.
pub const FORK_WAIT_ATTEMPTS: u32 = 120;

/// Pause between two fork-completion polls.
pub const FORK_WAIT_INTERVAL: Duration = Duration::from_secs(5);

/// HTTP request timeout.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Branch used when a command does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Roster column holding the GitLab login.
pub const DEFAULT_LOGIN_COLUMN: &str = "login";

/// Commit message used by `put-file`.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Updating {target_file}";

/// Header line printed by `deadline-commit`.
pub const DEFAULT_DEADLINE_HEADER: &str = "login,commit";

/// Row template printed by `deadline-commit`.
pub const DEFAULT_DEADLINE_FORMAT: &str = "{login},{commit.id}";

/// Retry policy for individual API calls.
pub const fn api_retry_policy() -> RetryPolicy {
    RetryPolicy::fixed(API_RETRY_ATTEMPTS, API_RETRY_INTERVAL)
}

/// Polling policy for fork completion.
pub const fn fork_wait_policy() -> RetryPolicy {
    RetryPolicy::fixed(FORK_WAIT_ATTEMPTS, FORK_WAIT_INTERVAL)
}

/// Configuration files read when no `--config-file` is given.
///
/// Mirrors the lookup order of python-gitlab so existing setups keep working:
/// `$PYTHON_GITLAB_CFG`, `~/.python-gitlab.cfg`, `/etc/python-gitlab.cfg`.
/// Files that do not exist are skipped by the loader.
pub fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(path) = std::env::var_os("PYTHON_GITLAB_CFG") {
        files.push(PathBuf::from(path));
    }
    if let Some(home) = dirs::home_dir() {
        files.push(home.join(".python-gitlab.cfg"));
    }
    files.push(PathBuf::from("/etc/python-gitlab.cfg"));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_fork_wait_covers_ten_minutes() {
        let policy = fork_wait_policy();
        assert_eq!(
            policy.interval() * policy.max_attempts(),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_api_retry_policy() {
        let policy = api_retry_policy();
        assert_eq!(policy.max_attempts(), 6);
        assert_eq!(policy.interval(), Duration::from_secs(3));
    }

    #[test]
    #[serial]
    fn test_default_config_files_honours_env() {
        std::env::set_var("PYTHON_GITLAB_CFG", "/tmp/custom.cfg");
        let files = default_config_files();
        std::env::remove_var("PYTHON_GITLAB_CFG");

        assert_eq!(files[0], PathBuf::from("/tmp/custom.cfg"));
        assert!(files.iter().any(|f| f.ends_with("python-gitlab.cfg")));
    }
}
