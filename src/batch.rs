//! # Batch Driver
//!
//! Runs one operation per roster entry and keeps score.
//!
//! Each entry ends in one of three outcomes: the server was changed
//! ([`EntryOutcome::Done`]), it was already in the requested state
//! ([`EntryOutcome::Unchanged`]), or the entry failed. A failing entry is
//! logged with the affected path and the batch moves on; only errors for
//! which [`Error::is_fatal`] holds stop the run.
//!
//! Entries are processed sequentially, one roster row at a time.

use std::collections::HashSet;
use std::fmt;

use log::{error, warn};

use crate::error::{Error, Result};
use crate::gitlab::Project;
use crate::ops::Outcome;
use crate::resolve::{canonical_project, ProjectRef};
use crate::roster::RosterUser;
use crate::session::Session;
use crate::template::expand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Done,
    Unchanged,
    Failed,
}

/// Counts of entry outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub done: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Done => self.done += 1,
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.done + self.unchanged + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries: {} done, {} unchanged, {} failed",
            self.total(),
            self.done,
            self.unchanged,
            self.failed
        )
    }
}

/// Drives an action over roster users.
pub struct Batch<'a> {
    session: Session<'a>,
    skip_duplicates: bool,
    seen: HashSet<String>,
    report: BatchReport,
}

impl<'a> Batch<'a> {
    pub fn new(session: Session<'a>) -> Self {
        Self {
            session,
            skip_duplicates: false,
            seen: HashSet::new(),
            report: BatchReport::default(),
        }
    }

    /// Process every project path at most once.
    pub fn skip_duplicates(mut self) -> Self {
        self.skip_duplicates = true;
        self
    }

    pub fn session(&self) -> Session<'a> {
        self.session
    }

    pub fn report(&self) -> BatchReport {
        self.report
    }

    /// Run `action` for every user whose templated project exists.
    ///
    /// Projects that cannot be found are reported as failed entries.
    pub fn for_each_project<I, F, O>(
        &mut self,
        users: I,
        project_template: &str,
        mut action: F,
    ) -> Result<BatchReport>
    where
        I: IntoIterator<Item = Result<RosterUser>>,
        F: FnMut(&RosterUser, &Project) -> Result<O>,
        O: Outcome,
    {
        let session = self.session;
        for user in users {
            let user = match self.admit(user)? {
                Some(user) => user,
                None => continue,
            };
            let path = match expand(project_template, &user.variables()) {
                Ok(path) => path,
                Err(e) => {
                    self.fail(user.login(), e)?;
                    continue;
                }
            };
            if self.skip_duplicates && !self.seen.insert(path.clone()) {
                continue;
            }

            let project = match canonical_project(&session, &ProjectRef::Path(path.clone())) {
                Ok(project) => project,
                Err(e) if e.is_not_found() => {
                    warn!("Project {} not found.", path);
                    self.report.record(EntryOutcome::Failed);
                    continue;
                }
                Err(e) => {
                    self.fail(&path, e)?;
                    continue;
                }
            };

            let result = action(&user, &project);
            self.settle(&path, result)?;
        }
        Ok(self.report)
    }

    /// Run `action` for every user, labelling log lines with the login.
    pub fn for_each_user<I, F, O>(&mut self, users: I, mut action: F) -> Result<BatchReport>
    where
        I: IntoIterator<Item = Result<RosterUser>>,
        F: FnMut(&RosterUser) -> Result<O>,
        O: Outcome,
    {
        for user in users {
            let user = match self.admit(user)? {
                Some(user) => user,
                None => continue,
            };
            let result = action(&user);
            let login = user.login().to_string();
            self.settle(&login, result)?;
        }
        Ok(self.report)
    }

    fn admit(&mut self, user: Result<RosterUser>) -> Result<Option<RosterUser>> {
        match user {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                self.fail("roster", e)?;
                Ok(None)
            }
        }
    }

    fn settle<O: Outcome>(&mut self, label: &str, result: Result<O>) -> Result<()> {
        match result {
            Ok(outcome) if outcome.changed() => self.report.record(EntryOutcome::Done),
            Ok(_) => self.report.record(EntryOutcome::Unchanged),
            Err(e) => self.fail(label, e)?,
        }
        Ok(())
    }

    /// Record a failed entry; fatal errors are handed back to abort the run.
    fn fail(&mut self, label: &str, e: Error) -> Result<()> {
        if e.is_fatal() {
            return Err(e);
        }
        error!("{}: {}", label, e);
        self.report.record(EntryOutcome::Failed);
        Ok(())
    }
}
