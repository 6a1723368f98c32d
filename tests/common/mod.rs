//! Shared test utilities for the CLI end-to-end tests.
//!
//! Every test runs the real binary against a `mockito` server standing in for
//! GitLab. The fixture keeps the roster, the python-gitlab configuration and
//! any local files in one temporary directory and isolates the binary from the
//! user's own configuration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let mut server = mockito::Server::new();
//! mock_user(&mut server, "alpha", 5);
//! let fixture = TestFixture::new(&server).with_roster("login\nalpha\n");
//! fixture.command().arg("accounts").args(fixture.roster_args()).assert().success();
//! ```

use assert_fs::prelude::*;
use mockito::{Matcher, Mock, Server};
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{commit_json, mock_project, mock_user, project_json, TestFixture};
}

/// Minimal project payload.
pub fn project_json(id: u64, path: &str) -> String {
    format!(
        r#"{{"id": {id}, "path_with_namespace": "{path}", "empty_repo": false,
            "ssh_url_to_repo": "git@gitlab.example.com:{path}.git"}}"#
    )
}

/// Minimal commit payload.
pub fn commit_json(id: &str, author_email: &str, authored_date: &str) -> String {
    format!(
        r#"{{"id": "{id}", "short_id": "{short}", "title": "Work",
            "author_email": "{author_email}", "authored_date": "{authored_date}",
            "parent_ids": []}}"#,
        short = &id[..id.len().min(8)]
    )
}

/// `GET users?username=<login>` answering with one account.
pub fn mock_user(server: &mut Server, login: &str, id: u64) -> Mock {
    server
        .mock("GET", "/api/v4/users")
        .match_query(Matcher::UrlEncoded("username".into(), login.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"[{{"id": {id}, "username": "{login}", "name": "Student {login}"}}]"#
        ))
        .create()
}

/// `GET projects/<encoded path>` answering with the project.
pub fn mock_project(server: &mut Server, path: &str, id: u64) -> Mock {
    server
        .mock(
            "GET",
            format!("/api/v4/projects/{}", path.replace('/', "%2F")).as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(project_json(id, path))
        .create()
}

/// A temporary working directory wired to a mock GitLab instance.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture whose configuration points at `server`.
    pub fn new(server: &Server) -> Self {
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture
            .temp_dir
            .child("gitlab.cfg")
            .write_str(&format!(
                "[global]\ndefault = test\n\n[test]\nurl = {}\nprivate_token = secret\n",
                server.url()
            ))
            .expect("Failed to write configuration");
        fixture
    }

    /// Add the roster CSV as `users.csv`.
    pub fn with_roster(self, csv: &str) -> Self {
        self.with_file("users.csv", csv)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// `--users` pointing at the roster.
    #[allow(dead_code)]
    pub fn roster_args(&self) -> Vec<String> {
        vec![
            "--users".to_string(),
            self.path().join("users.csv").display().to_string(),
        ]
    }

    /// The binary, isolated from the user's environment, with no colors and
    /// the default retry budget.
    pub fn bare_command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("teachers-gitlab");
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("GITLAB_URL")
            .env_remove("GITLAB_TOKEN")
            .env_remove("PYTHON_GITLAB_CFG")
            .env_remove("RUST_LOG")
            .arg("--config-file")
            .arg(self.path().join("gitlab.cfg"))
            .args(["--color", "never"]);
        cmd
    }

    /// Like [`TestFixture::bare_command`], with one attempt per API call.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = self.bare_command();
        cmd.args(["--retries", "1", "--retry-interval", "0"]);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_configuration() {
        let server = Server::new();
        let fixture = TestFixture::new(&server).with_roster("login\nalpha\n");
        assert!(fixture.path().join("gitlab.cfg").exists());
        assert!(fixture.path().join("users.csv").exists());
    }

    #[test]
    fn test_commit_json_short_id() {
        let json = commit_json("0123456789abcdef", "a@example.com", "2024-01-15T20:00:00Z");
        assert!(json.contains(r#""short_id": "01234567""#));
    }
}
