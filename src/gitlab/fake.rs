//! In-memory GitLab for unit tests.
//!
//! `FakeGitLab` keeps projects, commits, files, protections and members in a
//! `Mutex`-guarded state and answers with the same error variants the HTTP
//! client produces. Every mutating call is appended to a write log so tests can
//! assert how many side effects an operation had. Errors can be injected per
//! operation name to simulate transient failures.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use chrono::DateTime;

use super::types::*;
use super::{GitLabApi, ProjectId};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    projects: BTreeMap<u64, Project>,
    forked_from: HashMap<u64, u64>,
    /// Remaining `get_project` calls before a fresh fork is populated.
    populating: HashMap<u64, u32>,
    fork_delay: u32,
    commits: HashMap<(u64, String), Vec<Commit>>,
    tags: HashMap<u64, Vec<Tag>>,
    files: HashMap<(u64, String, String), Vec<u8>>,
    protected_branches: HashMap<(u64, String), ProtectedBranch>,
    protected_tags: HashMap<(u64, String), ProtectedTag>,
    members: HashMap<u64, Vec<Member>>,
    users: Vec<User>,
    pipelines: HashMap<u64, Vec<Pipeline>>,
    jobs: HashMap<u64, Vec<Job>>,
    failures: HashMap<String, VecDeque<Error>>,
    writes: Vec<String>,
    calls: Vec<String>,
}

/// In-memory stand-in for a GitLab instance.
#[derive(Debug, Default)]
pub struct FakeGitLab {
    state: Mutex<State>,
}

pub fn commit(id: &str, author_email: &str, authored: &str) -> Commit {
    Commit {
        id: id.to_string(),
        short_id: id.chars().take(8).collect(),
        title: format!("Commit {}", id),
        message: format!("Commit {}\n", id),
        parent_ids: Vec::new(),
        author_email: author_email.to_string(),
        authored_date: DateTime::parse_from_rfc3339(authored).unwrap(),
        committed_date: None,
        created_at: None,
        stats: None,
    }
}

impl FakeGitLab {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Register a populated project and return it.
    pub fn add_project(&self, path: &str) -> Project {
        let mut state = self.state();
        state.next_id += 1;
        let project = Project {
            id: state.next_id,
            path_with_namespace: path.to_string(),
            empty_repo: false,
            ssh_url_to_repo: Some(format!("git@gitlab.example.com:{}.git", path)),
            http_url_to_repo: None,
            description: None,
            mr_default_target_self: None,
        };
        state.projects.insert(project.id, project.clone());
        project
    }

    /// Number of `get_project` polls before a new fork stops being empty.
    pub fn set_fork_delay(&self, polls: u32) {
        self.state().fork_delay = polls;
    }

    /// Add commits to a branch; order does not matter.
    pub fn add_commits(&self, project: &Project, branch: &str, commits: Vec<Commit>) {
        self.state()
            .commits
            .entry((project.id, branch.to_string()))
            .or_default()
            .extend(commits);
    }

    pub fn add_tag(&self, project: &Project, name: &str, commit: &Commit) {
        let tag = Tag {
            name: name.to_string(),
            target: Some(commit.id.clone()),
            commit: TagCommit {
                id: commit.id.clone(),
                created_at: commit.authored_date,
            },
            created_at: None,
        };
        self.state().tags.entry(project.id).or_default().push(tag);
    }

    pub fn add_file(&self, project: &Project, reference: &str, path: &str, content: &[u8]) {
        self.state().files.insert(
            (project.id, reference.to_string(), path.to_string()),
            content.to_vec(),
        );
    }

    pub fn file(&self, project: &Project, reference: &str, path: &str) -> Option<Vec<u8>> {
        self.state()
            .files
            .get(&(project.id, reference.to_string(), path.to_string()))
            .cloned()
    }

    pub fn add_user(&self, id: u64, username: &str) -> User {
        let user = User {
            id,
            username: username.to_string(),
            name: username.to_string(),
        };
        self.state().users.push(user.clone());
        user
    }

    pub fn add_member(&self, project: &Project, user: &User, level: AccessLevel) {
        self.state().members.entry(project.id).or_default().push(Member {
            id: user.id,
            username: user.username.clone(),
            access_level: level.value(),
        });
    }

    pub fn members(&self, project: &Project) -> Vec<Member> {
        self.state()
            .members
            .get(&project.id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_protected_branch(&self, project: &Project, name: &str, rules: &BranchRules) {
        let protection = branch_protection(name, rules);
        self.state()
            .protected_branches
            .insert((project.id, name.to_string()), protection);
    }

    pub fn protected_branch(&self, project: &Project, name: &str) -> Option<ProtectedBranch> {
        self.state()
            .protected_branches
            .get(&(project.id, name.to_string()))
            .cloned()
    }

    pub fn protected_tag(&self, project: &Project, name: &str) -> Option<ProtectedTag> {
        self.state()
            .protected_tags
            .get(&(project.id, name.to_string()))
            .cloned()
    }

    pub fn add_pipeline(&self, project: &Project, pipeline: Pipeline, jobs: Vec<Job>) {
        let mut state = self.state();
        state.jobs.insert(pipeline.id, jobs);
        // Newest first.
        state
            .pipelines
            .entry(project.id)
            .or_default()
            .insert(0, pipeline);
    }

    pub fn is_fork(&self, project: &Project) -> bool {
        self.state().forked_from.contains_key(&project.id)
    }

    pub fn mark_fork(&self, project: &Project, parent: &Project) {
        self.state().forked_from.insert(project.id, parent.id);
    }

    /// Make the next call(s) of `operation` fail with `error`.
    pub fn fail_next(&self, operation: &str, error: Error) {
        self.state()
            .failures
            .entry(operation.to_string())
            .or_default()
            .push_back(error);
    }

    /// Log of mutating calls in order.
    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }

    /// Number of calls of one operation, reads included.
    pub fn call_count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    fn enter(&self, operation: &str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(operation.to_string());
        if let Some(error) = state
            .failures
            .get_mut(operation)
            .and_then(|queue| queue.pop_front())
        {
            return Err(error);
        }
        Ok(state)
    }
}

fn not_found(resource: impl Into<String>) -> Error {
    Error::NotFound {
        resource: resource.into(),
    }
}

fn level_entry(level: AccessLevel) -> AccessLevelEntry {
    AccessLevelEntry {
        access_level: level.value(),
        access_level_description: level.to_string(),
    }
}

fn branch_protection(name: &str, rules: &BranchRules) -> ProtectedBranch {
    ProtectedBranch {
        name: name.to_string(),
        push_access_levels: vec![level_entry(rules.push)],
        merge_access_levels: vec![level_entry(rules.merge)],
    }
}

impl GitLabApi for FakeGitLab {
    fn get_project(&self, id: &ProjectId) -> Result<Project> {
        let mut state = self.enter("get_project")?;
        let found = match id {
            ProjectId::Id(id) => state.projects.get(id).cloned(),
            ProjectId::Path(path) => state
                .projects
                .values()
                .find(|p| &p.path_with_namespace == path)
                .cloned(),
        };
        let mut project = found.ok_or_else(|| not_found(format!("projects/{}", id)))?;

        match state.populating.get(&project.id).copied() {
            Some(0) => {
                state.populating.remove(&project.id);
                project.empty_repo = false;
                state.projects.insert(project.id, project.clone());
            }
            Some(remaining) => {
                state.populating.insert(project.id, remaining - 1);
            }
            None => {}
        }
        Ok(project)
    }

    fn create_fork(&self, parent: &Project, namespace: &str, name: &str) -> Result<Project> {
        let mut state = self.enter("create_fork")?;
        let path = format!("{}/{}", namespace, name);
        if state
            .projects
            .values()
            .any(|p| p.path_with_namespace == path)
        {
            return Err(Error::Conflict {
                resource: format!("projects/{}/fork", parent.id),
                message: "has already been taken".to_string(),
            });
        }
        state.next_id += 1;
        let fork = Project {
            id: state.next_id,
            path_with_namespace: path.clone(),
            empty_repo: true,
            ssh_url_to_repo: Some(format!("git@gitlab.example.com:{}.git", path)),
            http_url_to_repo: None,
            description: None,
            mr_default_target_self: None,
        };
        let delay = state.fork_delay;
        state.populating.insert(fork.id, delay);
        state.projects.insert(fork.id, fork.clone());
        state.forked_from.insert(fork.id, parent.id);
        state.writes.push(format!("create_fork {}", path));
        Ok(fork)
    }

    fn delete_fork_relation(&self, project: &Project) -> Result<()> {
        let mut state = self.enter("delete_fork_relation")?;
        if state.forked_from.remove(&project.id).is_none() {
            return Err(Error::NotModified {
                resource: format!("projects/{}/fork", project.id),
            });
        }
        state
            .writes
            .push(format!("delete_fork_relation {}", project.path_with_namespace));
        Ok(())
    }

    fn list_commits(&self, project: &Project, query: &CommitQuery) -> Result<Vec<Commit>> {
        let state = self.enter("list_commits")?;
        let branch = query.reference.clone().unwrap_or_else(|| "main".to_string());
        let mut commits: Vec<Commit> = state
            .commits
            .get(&(project.id, branch))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| query.until.is_none_or(|until| c.authored_date <= until))
            .collect();
        commits.sort_by(|a, b| b.authored_date.cmp(&a.authored_date));
        Ok(commits)
    }

    fn get_commit(&self, project: &Project, sha: &str) -> Result<Commit> {
        let state = self.enter("get_commit")?;
        state
            .commits
            .iter()
            .filter(|((id, _), _)| *id == project.id)
            .flat_map(|(_, commits)| commits.iter())
            .find(|c| c.id == sha)
            .cloned()
            .ok_or_else(|| not_found(format!("projects/{}/repository/commits/{}", project.id, sha)))
    }

    fn list_tags(&self, project: &Project) -> Result<Vec<Tag>> {
        let state = self.enter("list_tags")?;
        Ok(state.tags.get(&project.id).cloned().unwrap_or_default())
    }

    fn get_file(&self, project: &Project, reference: &str, path: &str) -> Result<Vec<u8>> {
        let state = self.enter("get_file")?;
        state
            .files
            .get(&(project.id, reference.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("projects/{}/repository/files/{}", project.id, path)))
    }

    fn commit_file(&self, project: &Project, commit: &FileCommit) -> Result<Commit> {
        let mut state = self.enter("commit_file")?;
        let key = (project.id, commit.branch.clone(), commit.path.clone());
        let exists = state.files.contains_key(&key);
        match (commit.action, exists) {
            (FileAction::Create, true) => {
                return Err(Error::BadRequest {
                    resource: format!("projects/{}/repository/commits", project.id),
                    message: "A file with this name already exists".to_string(),
                })
            }
            (FileAction::Update, false) => {
                return Err(Error::BadRequest {
                    resource: format!("projects/{}/repository/commits", project.id),
                    message: "A file with this name doesn't exist".to_string(),
                })
            }
            _ => {}
        }
        state.files.insert(key, commit.content.as_bytes().to_vec());
        state.writes.push(format!(
            "commit_file {:?} {} {}",
            commit.action, project.path_with_namespace, commit.path
        ));
        let sha = format!("sha{}", state.writes.len());
        Ok(self::commit(&sha, "teacher@example.com", "2024-01-01T00:00:00Z"))
    }

    fn get_protected_branch(&self, project: &Project, name: &str) -> Result<ProtectedBranch> {
        let state = self.enter("get_protected_branch")?;
        state
            .protected_branches
            .get(&(project.id, name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("projects/{}/protected_branches/{}", project.id, name)))
    }

    fn protect_branch(
        &self,
        project: &Project,
        name: &str,
        rules: &BranchRules,
    ) -> Result<ProtectedBranch> {
        let mut state = self.enter("protect_branch")?;
        let key = (project.id, name.to_string());
        if state.protected_branches.contains_key(&key) {
            return Err(Error::Conflict {
                resource: format!("projects/{}/protected_branches", project.id),
                message: "Protected branch already exists".to_string(),
            });
        }
        let protection = branch_protection(name, rules);
        state.protected_branches.insert(key, protection.clone());
        state.writes.push(format!("protect_branch {}", name));
        Ok(protection)
    }

    fn unprotect_branch(&self, project: &Project, name: &str) -> Result<()> {
        let mut state = self.enter("unprotect_branch")?;
        state
            .protected_branches
            .remove(&(project.id, name.to_string()))
            .ok_or_else(|| not_found(format!("projects/{}/protected_branches/{}", project.id, name)))?;
        state.writes.push(format!("unprotect_branch {}", name));
        Ok(())
    }

    fn get_protected_tag(&self, project: &Project, name: &str) -> Result<ProtectedTag> {
        let state = self.enter("get_protected_tag")?;
        state
            .protected_tags
            .get(&(project.id, name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("projects/{}/protected_tags/{}", project.id, name)))
    }

    fn protect_tag(
        &self,
        project: &Project,
        name: &str,
        rules: &TagRules,
    ) -> Result<ProtectedTag> {
        let mut state = self.enter("protect_tag")?;
        let protection = ProtectedTag {
            name: name.to_string(),
            create_access_levels: vec![level_entry(rules.create)],
        };
        state
            .protected_tags
            .insert((project.id, name.to_string()), protection.clone());
        state.writes.push(format!("protect_tag {}", name));
        Ok(protection)
    }

    fn unprotect_tag(&self, project: &Project, name: &str) -> Result<()> {
        let mut state = self.enter("unprotect_tag")?;
        state
            .protected_tags
            .remove(&(project.id, name.to_string()))
            .ok_or_else(|| not_found(format!("projects/{}/protected_tags/{}", project.id, name)))?;
        state.writes.push(format!("unprotect_tag {}", name));
        Ok(())
    }

    fn list_members(&self, project: &Project) -> Result<Vec<Member>> {
        let state = self.enter("list_members")?;
        Ok(state.members.get(&project.id).cloned().unwrap_or_default())
    }

    fn add_member(&self, project: &Project, user_id: u64, level: AccessLevel) -> Result<Member> {
        let mut state = self.enter("add_member")?;
        let username = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| not_found(format!("users/{}", user_id)))?;
        let members = state.members.entry(project.id).or_default();
        if members.iter().any(|m| m.id == user_id) {
            return Err(Error::Conflict {
                resource: format!("projects/{}/members", project.id),
                message: "Member already exists".to_string(),
            });
        }
        let member = Member {
            id: user_id,
            username,
            access_level: level.value(),
        };
        members.push(member.clone());
        state.writes.push(format!(
            "add_member {} {}",
            project.path_with_namespace, user_id
        ));
        Ok(member)
    }

    fn remove_member(&self, project: &Project, user_id: u64) -> Result<()> {
        let mut state = self.enter("remove_member")?;
        let members = state.members.entry(project.id).or_default();
        let before = members.len();
        members.retain(|m| m.id != user_id);
        if members.len() == before {
            return Err(not_found(format!(
                "projects/{}/members/{}",
                project.id, user_id
            )));
        }
        state.writes.push(format!(
            "remove_member {} {}",
            project.path_with_namespace, user_id
        ));
        Ok(())
    }

    fn find_users(&self, username: &str) -> Result<Vec<User>> {
        let state = self.enter("find_users")?;
        Ok(state
            .users
            .iter()
            .filter(|u| u.username == username)
            .cloned()
            .collect())
    }

    fn list_pipelines(&self, project: &Project) -> Result<Vec<Pipeline>> {
        let state = self.enter("list_pipelines")?;
        Ok(state.pipelines.get(&project.id).cloned().unwrap_or_default())
    }

    fn list_pipeline_jobs(&self, _project: &Project, pipeline_id: u64) -> Result<Vec<Job>> {
        let state = self.enter("list_pipeline_jobs")?;
        Ok(state.jobs.get(&pipeline_id).cloned().unwrap_or_default())
    }

    fn update_project(&self, project: &Project, settings: &ProjectSettings) -> Result<Project> {
        let mut state = self.enter("update_project")?;
        let stored = state
            .projects
            .get_mut(&project.id)
            .ok_or_else(|| not_found(format!("projects/{}", project.id)))?;
        if let Some(value) = settings.mr_default_target_self {
            stored.mr_default_target_self = Some(value);
        }
        if let Some(description) = &settings.description {
            stored.description = Some(description.clone());
        }
        let updated = stored.clone();
        state
            .writes
            .push(format!("update_project {}", project.path_with_namespace));
        Ok(updated)
    }
}
