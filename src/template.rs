//! # Path Templates
//!
//! Project paths, local paths, commit messages and output lines are written as
//! templates such as `student/{login}` and expanded once per roster entry.
//!
//! - `{name}` is replaced by the value of the variable `name`. Roster columns
//!   are available under their header names; values computed during a command
//!   use dotted names such as `{commit.id}` or `{target_file}`.
//! - `{{` and `}}` produce literal braces.
//! - An unknown variable or an unbalanced brace is an
//!   [`Error::Template`](crate::error::Error::Template) naming the offending
//!   variable. It fails the entry being expanded, not the whole batch.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::gitlab::Commit;

/// Values available to a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`Variables::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Expose a commit as `commit.id`, `commit.short_id`, `commit.title`,
    /// `commit.message`, `commit.author_email` and `commit.authored_date`.
    pub fn with_commit(self, commit: &Commit) -> Self {
        self.with("commit.id", commit.id.clone())
            .with("commit.short_id", commit.short_id.clone())
            .with("commit.title", commit.title.clone())
            .with("commit.message", commit.message.clone())
            .with("commit.author_email", commit.author_email.clone())
            .with("commit.authored_date", commit.authored_date.to_rfc3339())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Expand `template` with `vars`.
pub fn expand(template: &str, vars: &Variables) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(Error::Template {
                        message: format!("unterminated placeholder in '{}'", template),
                        variable: Some(name),
                    });
                }
                let name = name.trim();
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(Error::Template {
                            message: format!("unknown variable in '{}'", template),
                            variable: Some(name.to_string()),
                        })
                    }
                }
            }
            '}' => {
                return Err(Error::Template {
                    message: format!("single '}}' in '{}'", template),
                    variable: None,
                })
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
