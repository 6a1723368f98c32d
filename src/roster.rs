//! # Student Roster
//!
//! The roster is a CSV file with a header line; one column holds the GitLab
//! login and every column is available to templates. Rows are read lazily so
//! that a batch starts working before the whole file is parsed.
//!
//! [`lookup_users`] pairs each roster entry with the GitLab account of the same
//! username. Commands that act on behalf of a user drop entries without an
//! account (with a warning); the others keep them with `account: None`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::warn;

use crate::error::{Error, Result};
use crate::gitlab::User;
use crate::session::Session;
use crate::template::Variables;

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub login: String,
    pub row: BTreeMap<String, String>,
}

impl RosterEntry {
    /// Template variables: every column plus `login`.
    pub fn variables(&self) -> Variables {
        let mut vars: Variables = self
            .row
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        vars.set("login", self.login.clone());
        vars
    }
}

/// Lazy reader over roster rows.
pub struct Roster<R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    login_index: usize,
    record: StringRecord,
}

impl Roster<File> {
    /// Open a roster file.
    pub fn from_path(path: &Path, login_column: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::Roster {
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
        Self::from_reader(file, login_column)
    }
}

impl<R: Read> Roster<R> {
    /// Read the header line and locate the login column.
    pub fn from_reader(input: R, login_column: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(input);
        let headers = reader.headers()?.clone();
        let login_index = headers
            .iter()
            .position(|h| h == login_column)
            .ok_or_else(|| Error::Roster {
                message: format!(
                    "column '{}' not found (columns: {})",
                    login_column,
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            })?;

        Ok(Self {
            reader,
            headers,
            login_index,
            record: StringRecord::new(),
        })
    }
}

impl<R: Read> Iterator for Roster<R> {
    type Item = Result<RosterEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
                Ok(true) => {}
            }

            let login = self.record.get(self.login_index).unwrap_or("").to_string();
            if login.is_empty() {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                warn!("Skipping roster line {} without a login", line);
                continue;
            }

            let row = self
                .headers
                .iter()
                .zip(self.record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect();
            return Some(Ok(RosterEntry { login, row }));
        }
    }
}

/// A roster entry with its GitLab account, if one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterUser {
    pub entry: RosterEntry,
    pub account: Option<User>,
}

impl RosterUser {
    pub fn login(&self) -> &str {
        &self.entry.login
    }

    /// Roster variables plus `id` and `name` of the account when known.
    pub fn variables(&self) -> Variables {
        let mut vars = self.entry.variables();
        if let Some(account) = &self.account {
            vars.set("id", account.id.to_string());
            vars.set("name", account.name.clone());
        }
        vars
    }
}

/// Attach GitLab accounts to roster entries.
///
/// With `require_account` entries whose login has no account are logged and
/// skipped. The lookup happens lazily as the iterator is consumed.
pub fn lookup_users<'a, I>(
    session: Session<'a>,
    entries: I,
    require_account: bool,
) -> impl Iterator<Item = Result<RosterUser>> + 'a
where
    I: IntoIterator<Item = Result<RosterEntry>>,
    I::IntoIter: 'a,
{
    entries.into_iter().filter_map(move |entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let found = session.call(&format!("find user {}", entry.login), |api| {
            api.find_users(&entry.login)
        });
        let account = match found {
            Ok(users) => users.into_iter().find(|u| u.username == entry.login),
            Err(e) => return Some(Err(e)),
        };
        if account.is_none() && require_account {
            warn!("User {} not found.", entry.login);
            return None;
        }
        Some(Ok(RosterUser { entry, account }))
    })
}
