//! A GitLab client bundled with the retry budgets used to talk to it.

use crate::defaults;
use crate::error::Result;
use crate::gitlab::GitLabApi;
use crate::retry::RetryPolicy;

/// Client plus retry policies, passed to every core operation.
///
/// Every remote call made by the core goes through [`Session::call`], so
/// transient failures are retried uniformly.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    api: &'a dyn GitLabApi,
    retry: RetryPolicy,
    fork_wait: RetryPolicy,
}

impl<'a> Session<'a> {
    /// Session with the default retry and fork-wait policies.
    pub fn new(api: &'a dyn GitLabApi) -> Self {
        Self {
            api,
            retry: defaults::api_retry_policy(),
            fork_wait: defaults::fork_wait_policy(),
        }
    }

    /// Replace the policy used for individual API calls.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Replace the policy used while waiting for forks to populate.
    pub fn with_fork_wait(mut self, policy: RetryPolicy) -> Self {
        self.fork_wait = policy;
        self
    }

    /// The underlying client, without retries.
    pub fn api(&self) -> &'a dyn GitLabApi {
        self.api
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn fork_wait_policy(&self) -> &RetryPolicy {
        &self.fork_wait
    }

    /// Run one API call under the retry policy.
    pub fn call<T, F>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut(&dyn GitLabApi) -> Result<T>,
    {
        self.retry.run(operation, |_| f(self.api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::gitlab::fake::FakeGitLab;
    use crate::gitlab::ProjectId;
    use std::time::Duration;

    #[test]
    fn test_call_retries_transient_errors() {
        let fake = FakeGitLab::new();
        fake.add_project("student/alpha");
        fake.fail_next(
            "get_project",
            Error::Server {
                status: 502,
                resource: "projects/student%2Falpha".to_string(),
                message: "Bad Gateway".to_string(),
            },
        );

        let session = Session::new(&fake).with_retry(RetryPolicy::fixed(3, Duration::ZERO));
        let project = session
            .call("get project", |api| {
                api.get_project(&ProjectId::Path("student/alpha".to_string()))
            })
            .unwrap();

        assert_eq!(project.path_with_namespace, "student/alpha");
        assert_eq!(fake.call_count("get_project"), 2);
    }
}
