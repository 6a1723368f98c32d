//! GitLab REST API v4 client on top of blocking `reqwest`.
//!
//! Every method maps to exactly one endpoint (plus pagination for listings).
//! HTTP statuses are translated into the matching [`Error`] variants so that
//! callers can tell "already exists" from "server hiccup" without looking at
//! raw status codes.

use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::types::*;
use super::{GitLabApi, ProjectId};
use crate::error::{Error, Result};
use crate::path::encode_segment;

const PER_PAGE: &str = "100";

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    PrivateToken(String),
    OAuthToken(String),
    JobToken(String),
    Anonymous,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Auth::PrivateToken(_) => "PrivateToken(***)",
            Auth::OAuthToken(_) => "OAuthToken(***)",
            Auth::JobToken(_) => "JobToken(***)",
            Auth::Anonymous => "Anonymous",
        };
        f.write_str(kind)
    }
}

/// Blocking GitLab API client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    api_base: Url,
    auth: Auth,
    http: Client,
}

impl HttpClient {
    /// Create a client for the instance at `base_url` (without `/api/v4`).
    pub fn new(base_url: &str, auth: Auth, timeout: Duration, verify_tls: bool) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        let api_base = base.join("api/v4/")?;

        let http = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .user_agent(concat!("teachers-gitlab/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_base,
            auth,
            http,
        })
    }

    /// The `.../api/v4/` URL all requests are relative to.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.api_base.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::PrivateToken(token) => request.header("PRIVATE-TOKEN", token),
            Auth::OAuthToken(token) => request.bearer_auth(token),
            Auth::JobToken(token) => request.header("JOB-TOKEN", token),
            Auth::Anonymous => request,
        }
    }

    fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()?;
        debug!("{} -> {}", resource, response.status());
        check_status(response, resource)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.http.get(self.url(path)?), path)?;
        Ok(response.json()?)
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self.send(self.http.post(self.url(path)?).json(body), path)?;
        Ok(response.json()?)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.send(self.http.delete(self.url(path)?), path)?;
        Ok(())
    }

    /// Fetch one page of a listing; returns the items and the next page number.
    fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        page: &str,
    ) -> Result<(Vec<T>, Option<String>)> {
        let request = self
            .http
            .get(self.url(path)?)
            .query(query)
            .query(&[("per_page", PER_PAGE), ("page", page)]);
        let response = self.send(request, path)?;
        let next = response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok((response.json()?, next))
    }

    /// Fetch every page of a listing, following `X-Next-Page`.
    fn get_all<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = Some("1".to_string());
        while let Some(current) = page {
            let (mut batch, next) = self.get_page(path, query, &current)?;
            items.append(&mut batch);
            page = next;
        }
        Ok(items)
    }
}

fn project_path(project: &Project) -> String {
    format!("projects/{}", project.id)
}

/// Translate a non-2xx response into an error variant.
fn check_status(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let resource = resource.to_string();
    if status == StatusCode::NOT_MODIFIED {
        return Err(Error::NotModified { resource });
    }

    let message = error_message(response);
    Err(match status.as_u16() {
        400 => Error::BadRequest { resource, message },
        404 => Error::NotFound { resource },
        409 => Error::Conflict { resource, message },
        code @ 500..=599 => Error::Server {
            status: code,
            resource,
            message,
        },
        code => Error::Http {
            status: code,
            resource,
            message,
        },
    })
}

/// GitLab reports errors as `{"message": ...}` or `{"error": ...}`.
fn error_message(response: Response) -> String {
    let body = response.text().unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .map(|m| match m {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or(body)
}

impl GitLabApi for HttpClient {
    fn get_project(&self, id: &ProjectId) -> Result<Project> {
        let path = match id {
            ProjectId::Id(id) => format!("projects/{}", id),
            ProjectId::Path(path) => format!("projects/{}", encode_segment(path)),
        };
        self.get_json(&path)
    }

    fn create_fork(&self, parent: &Project, namespace: &str, name: &str) -> Result<Project> {
        let body = json!({
            "namespace_path": namespace,
            "path": name,
            "name": name,
        });
        self.post_json(&format!("{}/fork", project_path(parent)), &body)
    }

    fn delete_fork_relation(&self, project: &Project) -> Result<()> {
        self.delete(&format!("{}/fork", project_path(project)))
    }

    fn list_commits(&self, project: &Project, query: &CommitQuery) -> Result<Vec<Commit>> {
        let mut params = Vec::new();
        if let Some(reference) = &query.reference {
            params.push(("ref_name", reference.clone()));
        }
        if let Some(until) = &query.until {
            params.push(("until", until.to_rfc3339()));
        }
        self.get_all(
            &format!("{}/repository/commits", project_path(project)),
            &params,
        )
    }

    fn get_commit(&self, project: &Project, sha: &str) -> Result<Commit> {
        self.get_json(&format!(
            "{}/repository/commits/{}",
            project_path(project),
            encode_segment(sha)
        ))
    }

    fn list_tags(&self, project: &Project) -> Result<Vec<Tag>> {
        self.get_all(&format!("{}/repository/tags", project_path(project)), &[])
    }

    fn get_file(&self, project: &Project, reference: &str, path: &str) -> Result<Vec<u8>> {
        let resource = format!(
            "{}/repository/files/{}/raw",
            project_path(project),
            encode_segment(path)
        );
        let request = self
            .http
            .get(self.url(&resource)?)
            .query(&[("ref", reference)]);
        let response = self.send(request, &resource)?;
        Ok(response.bytes()?.to_vec())
    }

    fn commit_file(&self, project: &Project, commit: &FileCommit) -> Result<Commit> {
        let body = json!({
            "branch": commit.branch,
            "commit_message": commit.message,
            "actions": [{
                "action": commit.action,
                "file_path": commit.path,
                "content": commit.content,
            }],
        });
        self.post_json(
            &format!("{}/repository/commits", project_path(project)),
            &body,
        )
    }

    fn get_protected_branch(&self, project: &Project, name: &str) -> Result<ProtectedBranch> {
        self.get_json(&format!(
            "{}/protected_branches/{}",
            project_path(project),
            encode_segment(name)
        ))
    }

    fn protect_branch(
        &self,
        project: &Project,
        name: &str,
        rules: &BranchRules,
    ) -> Result<ProtectedBranch> {
        let body = json!({
            "name": name,
            "push_access_level": rules.push.value(),
            "merge_access_level": rules.merge.value(),
        });
        self.post_json(
            &format!("{}/protected_branches", project_path(project)),
            &body,
        )
    }

    fn unprotect_branch(&self, project: &Project, name: &str) -> Result<()> {
        self.delete(&format!(
            "{}/protected_branches/{}",
            project_path(project),
            encode_segment(name)
        ))
    }

    fn get_protected_tag(&self, project: &Project, name: &str) -> Result<ProtectedTag> {
        self.get_json(&format!(
            "{}/protected_tags/{}",
            project_path(project),
            encode_segment(name)
        ))
    }

    fn protect_tag(
        &self,
        project: &Project,
        name: &str,
        rules: &TagRules,
    ) -> Result<ProtectedTag> {
        let body = json!({
            "name": name,
            "create_access_level": rules.create.value(),
        });
        self.post_json(&format!("{}/protected_tags", project_path(project)), &body)
    }

    fn unprotect_tag(&self, project: &Project, name: &str) -> Result<()> {
        self.delete(&format!(
            "{}/protected_tags/{}",
            project_path(project),
            encode_segment(name)
        ))
    }

    fn list_members(&self, project: &Project) -> Result<Vec<Member>> {
        self.get_all(&format!("{}/members", project_path(project)), &[])
    }

    fn add_member(&self, project: &Project, user_id: u64, level: AccessLevel) -> Result<Member> {
        let body = json!({
            "user_id": user_id,
            "access_level": level.value(),
        });
        self.post_json(&format!("{}/members", project_path(project)), &body)
    }

    fn remove_member(&self, project: &Project, user_id: u64) -> Result<()> {
        self.delete(&format!("{}/members/{}", project_path(project), user_id))
    }

    fn find_users(&self, username: &str) -> Result<Vec<User>> {
        self.get_all("users", &[("username", username.to_string())])
    }

    fn list_pipelines(&self, project: &Project) -> Result<Vec<Pipeline>> {
        // Only the most recent page; callers look at the newest pipeline.
        let (pipelines, _) = self.get_page(
            &format!("{}/pipelines", project_path(project)),
            &[],
            "1",
        )?;
        Ok(pipelines)
    }

    fn list_pipeline_jobs(&self, project: &Project, pipeline_id: u64) -> Result<Vec<Job>> {
        self.get_all(
            &format!("{}/pipelines/{}/jobs", project_path(project), pipeline_id),
            &[],
        )
    }

    fn update_project(&self, project: &Project, settings: &ProjectSettings) -> Result<Project> {
        let path = project_path(project);
        let response = self.send(self.http.put(self.url(&path)?).json(settings), &path)?;
        Ok(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const PROJECT_JSON: &str =
        r#"{"id": 21, "path_with_namespace": "student/alpha", "empty_repo": false}"#;

    fn client(server: &Server) -> HttpClient {
        HttpClient::new(
            &server.url(),
            Auth::PrivateToken("secret".to_string()),
            Duration::from_secs(5),
            true,
        )
        .unwrap()
    }

    fn project() -> Project {
        serde_json::from_str(PROJECT_JSON).unwrap()
    }

    #[test]
    fn test_api_base_appends_api_v4() {
        let client = HttpClient::new(
            "https://gitlab.example.com/prefix",
            Auth::Anonymous,
            Duration::from_secs(5),
            true,
        )
        .unwrap();
        assert_eq!(
            client.api_base().as_str(),
            "https://gitlab.example.com/prefix/api/v4/"
        );
    }

    #[test]
    fn test_get_project_by_path_encodes_slash_and_sends_token() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/v4/projects/student%2Falpha")
            .match_header("private-token", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PROJECT_JSON)
            .create();

        let project = client(&server)
            .get_project(&ProjectId::Path("student/alpha".to_string()))
            .unwrap();

        mock.assert();
        assert_eq!(project.id, 21);
        assert!(!project.empty_repo);
    }

    #[test]
    fn test_status_codes_map_to_error_variants() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/v4/projects/21/fork")
            .with_status(409)
            .with_body(r#"{"message": {"name": ["has already been taken"]}}"#)
            .create();
        server
            .mock("DELETE", "/api/v4/projects/21/fork")
            .with_status(304)
            .create();
        server
            .mock("GET", "/api/v4/projects/21/protected_branches/main")
            .with_status(404)
            .with_body(r#"{"message": "404 Not found"}"#)
            .create();
        server
            .mock("GET", "/api/v4/projects/99")
            .with_status(503)
            .with_body("unavailable")
            .create();

        let client = client(&server);
        let project = project();

        let fork = client.create_fork(&project, "forks", "alpha");
        assert!(matches!(fork, Err(Error::Conflict { ref message, .. }) if message.contains("already been taken")));

        let unfork = client.delete_fork_relation(&project);
        assert!(matches!(unfork, Err(Error::NotModified { .. })));

        let protection = client.get_protected_branch(&project, "main");
        assert!(matches!(protection, Err(Error::NotFound { .. })));

        let server_error = client.get_project(&ProjectId::Id(99));
        match server_error {
            Err(e @ Error::Server { status: 503, .. }) => assert!(e.is_retryable()),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_listing_follows_next_page_header() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/v4/projects/21/members")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("x-next-page", "2")
            .with_body(r#"[{"id": 1, "username": "teacher", "access_level": 50}]"#)
            .create();
        server
            .mock("GET", "/api/v4/projects/21/members")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("x-next-page", "")
            .with_body(r#"[{"id": 2, "username": "alpha", "access_level": 30}]"#)
            .create();

        let members = client(&server).list_members(&project()).unwrap();
        let names: Vec<_> = members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["teacher", "alpha"]);
    }

    #[test]
    fn test_list_commits_sends_branch_and_until() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/v4/projects/21/repository/commits")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ref_name".into(), "main".into()),
                Matcher::UrlEncoded("until".into(), "2024-01-15T23:59:00+00:00".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[{"id": "c1", "author_email": "alpha@example.com",
                     "authored_date": "2024-01-15T20:00:00Z"}]"#,
            )
            .create();

        let until = chrono::DateTime::parse_from_rfc3339("2024-01-15T23:59:00+00:00").unwrap();
        let commits = client(&server)
            .list_commits(
                &project(),
                &CommitQuery {
                    reference: Some("main".to_string()),
                    until: Some(until),
                },
            )
            .unwrap();

        mock.assert();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].id, "c1");
    }

    #[test]
    fn test_get_file_returns_raw_bytes() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/v4/projects/21/repository/files/src%2Fmain.c/raw")
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .with_status(200)
            .with_body("int main() {}\n")
            .create();

        let content = client(&server)
            .get_file(&project(), "main", "src/main.c")
            .unwrap();
        assert_eq!(content, b"int main() {}\n");
    }

    #[test]
    fn test_commit_file_posts_single_action() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/v4/projects/21/repository/commits")
            .match_body(Matcher::PartialJson(json!({
                "branch": "main",
                "commit_message": "Add README",
                "actions": [{"action": "create", "file_path": "README.md", "content": "hello"}],
            })))
            .with_status(201)
            .with_body(
                r#"{"id": "abc", "author_email": "teacher@example.com",
                    "authored_date": "2024-01-10T10:00:00Z"}"#,
            )
            .create();

        let commit = client(&server)
            .commit_file(
                &project(),
                &FileCommit {
                    branch: "main".to_string(),
                    path: "README.md".to_string(),
                    content: "hello".to_string(),
                    message: "Add README".to_string(),
                    action: FileAction::Create,
                },
            )
            .unwrap();

        mock.assert();
        assert_eq!(commit.id, "abc");
    }

    #[test]
    fn test_debug_hides_token() {
        let auth = Auth::PrivateToken("very-secret".to_string());
        assert!(!format!("{:?}", auth).contains("very-secret"));
    }
}
