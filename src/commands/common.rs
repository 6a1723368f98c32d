//! Flags and plumbing shared by all GitLab commands.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use log::debug;

use teachers_gitlab::batch::BatchReport;
use teachers_gitlab::config::{ConfigFiles, Overrides};
use teachers_gitlab::deadline::{parse_timestamp, AuthorFilter, DeadlineQuery};
use teachers_gitlab::defaults;
use teachers_gitlab::error::Error;
use teachers_gitlab::gitlab::HttpClient;
use teachers_gitlab::output::{summary_line, OutputConfig};
use teachers_gitlab::retry::RetryPolicy;
use teachers_gitlab::roster::Roster;
use teachers_gitlab::session::Session;
use teachers_gitlab::suggestions;

/// Options accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// python-gitlab style configuration file; may be repeated, later files win.
    ///
    /// Defaults to $PYTHON_GITLAB_CFG, ~/.python-gitlab.cfg and
    /// /etc/python-gitlab.cfg.
    #[arg(long = "config-file", global = true, value_name = "FILE")]
    pub config_files: Vec<PathBuf>,

    /// Configuration section to use instead of `[global] default`.
    #[arg(long, global = true, value_name = "NAME")]
    pub instance: Option<String>,

    /// GitLab URL, overrides the configuration file.
    #[arg(long, global = true, value_name = "URL", env = "GITLAB_URL")]
    pub url: Option<String>,

    /// Private access token, overrides the configuration file.
    #[arg(
        long,
        global = true,
        value_name = "TOKEN",
        env = "GITLAB_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Shortcut for --log-level debug
    #[arg(long, global = true)]
    pub debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Attempts per GitLab API call before giving up.
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Seconds between two attempts of a GitLab API call.
    #[arg(long, global = true, value_name = "SECONDS")]
    pub retry_interval: Option<u64>,

    /// Seconds to wait for a new fork to be populated.
    #[arg(long, global = true, value_name = "SECONDS")]
    pub fork_timeout: Option<u64>,
}

impl GlobalArgs {
    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// HTTP client for the configured instance.
    pub fn client(&self) -> Result<HttpClient> {
        let files = ConfigFiles::load(&self.config_files)?;
        for path in files.loaded() {
            debug!("Loaded configuration from {}", path.display());
        }
        let overrides = Overrides {
            url: self.url.clone(),
            token: self.token.clone(),
        };
        let instance = files.instance(self.instance.as_deref(), &overrides)?;
        debug!("Using GitLab at {}", instance.url);

        let client = HttpClient::new(
            &instance.url,
            instance.auth,
            instance.timeout,
            instance.ssl_verify,
        )?;
        Ok(client)
    }

    /// Session over `client` with the retry flags applied.
    pub fn session<'a>(&self, client: &'a HttpClient) -> Result<Session<'a>> {
        let mut session = Session::new(client);

        if self.retries.is_some() || self.retry_interval.is_some() {
            let policy = RetryPolicy::attempts(
                self.retries.unwrap_or(defaults::API_RETRY_ATTEMPTS),
                self.retry_interval
                    .map(Duration::from_secs)
                    .unwrap_or(defaults::API_RETRY_INTERVAL),
            )?;
            session = session.with_retry(policy);
        }

        if let Some(seconds) = self.fork_timeout {
            let policy =
                RetryPolicy::timeout(Duration::from_secs(seconds), defaults::FORK_WAIT_INTERVAL)?;
            session = session.with_fork_wait(policy);
        }

        Ok(session)
    }
}

/// The student list.
#[derive(Args, Debug)]
pub struct RosterArgs {
    /// CSV file with a header line and one student per row.
    #[arg(long, value_name = "LIST.csv")]
    pub users: PathBuf,

    /// Column holding the GitLab login.
    #[arg(long, value_name = "COLUMN", default_value = defaults::DEFAULT_LOGIN_COLUMN)]
    pub login_column: String,
}

impl RosterArgs {
    pub fn open(&self) -> Result<Roster<File>> {
        if !self.users.is_file() {
            return Err(suggestions::roster_not_found(&self.users));
        }
        Ok(Roster::from_path(&self.users, &self.login_column)?)
    }
}

/// Options selecting a submission by deadline.
#[derive(Args, Debug)]
pub struct DeadlineArgs {
    /// Branch holding the submissions.
    #[arg(long, value_name = "BRANCH", default_value = defaults::DEFAULT_BRANCH)]
    pub branch: String,

    /// Submission deadline, e.g. 2024-01-15T23:59:00+0100 (defaults to now).
    #[arg(long, value_name = "YYYY-MM-DDTHH:MM:SS")]
    pub deadline: Option<String>,

    /// Prefer the commit with this tag when it predates the deadline.
    #[arg(long, value_name = "TAG")]
    pub prefer_tag: Option<String>,

    /// Commit authors to ignore (regular expression over the e-mail).
    #[arg(long, value_name = "REGEX")]
    pub blacklist: Option<String>,
}

impl DeadlineArgs {
    /// Query for the given deadline, `now` when none was passed.
    pub fn query(&self) -> Result<DeadlineQuery> {
        let deadline = parse_timestamp(self.deadline.as_deref().unwrap_or("now"))?;
        Ok(DeadlineQuery::new(self.branch.clone(), deadline)
            .with_tag(self.prefer_tag.clone())
            .with_author_filter(author_filter(self.blacklist.as_deref())?))
    }
}

/// Author filter with a readable error for a broken pattern.
pub fn author_filter(pattern: Option<&str>) -> Result<AuthorFilter> {
    AuthorFilter::from_option(pattern).map_err(|e| match (pattern, e) {
        (Some(pattern), Error::Regex(error)) => suggestions::invalid_blacklist(pattern, &error),
        (_, other) => other.into(),
    })
}

/// Print the summary line and fail when any entry failed.
pub fn finish(out: &OutputConfig, command: &str, report: &BatchReport) -> Result<()> {
    eprintln!("{}", summary_line(out, command, report));
    if report.has_failures() {
        anyhow::bail!(
            "{} of {} entries failed, see the log above",
            report.failed,
            report.total()
        );
    }
    Ok(())
}
