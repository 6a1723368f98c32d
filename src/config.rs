//! # GitLab Connection Configuration
//!
//! Connection settings are read from python-gitlab style INI files so that an
//! existing `~/.python-gitlab.cfg` works unchanged:
//!
//! ```ini
//! [global]
//! default = school
//!
//! [school]
//! url = https://gitlab.example.com
//! private_token = glpat-xxxxxxxx
//! timeout = 30
//! ssl_verify = true
//! ```
//!
//! Several files can be given; keys from later files override earlier ones.
//! The instance section is chosen explicitly or through `[global] default`.
//! Command-line values for the URL and token take precedence over any file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use log::debug;

use crate::defaults;
use crate::error::{Error, Result};
use crate::gitlab::http::Auth;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Settings for one GitLab instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    pub url: String,
    pub auth: Auth,
    pub timeout: Duration,
    pub ssl_verify: bool,
}

/// Values given on the command line or in the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Merged contents of the configuration files.
#[derive(Debug, Clone, Default)]
pub struct ConfigFiles {
    sections: Sections,
    loaded: Vec<PathBuf>,
}

impl ConfigFiles {
    /// Load explicitly named files; each of them must exist.
    pub fn load_explicit(paths: &[PathBuf]) -> Result<Self> {
        let mut files = Self::default();
        for path in paths {
            if !path.is_file() {
                return Err(Error::Config {
                    message: format!("configuration file {} does not exist", path.display()),
                    hint: Some("check the path given to --config-file".to_string()),
                });
            }
            files.merge_file(path)?;
        }
        Ok(files)
    }

    /// Load whichever of the default locations exist.
    pub fn load_defaults() -> Result<Self> {
        let mut files = Self::default();
        for path in defaults::default_config_files() {
            if path.is_file() {
                files.merge_file(&path)?;
            }
        }
        Ok(files)
    }

    /// Explicit files when any are given, the default locations otherwise.
    pub fn load(explicit: &[PathBuf]) -> Result<Self> {
        if explicit.is_empty() {
            Self::load_defaults()
        } else {
            Self::load_explicit(explicit)
        }
    }

    /// Parse configuration text, as if it came from a file.
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let ini = Ini::load_from_str(content).map_err(|e| Error::Config {
            message: format!("cannot parse configuration: {}", e),
            hint: None,
        })?;
        for (section, properties) in ini.iter() {
            let Some(section) = section else { continue };
            let target = self.sections.entry(section.to_string()).or_default();
            for (key, value) in properties.iter() {
                target.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        self.merge_str(&content).map_err(|e| match e {
            Error::Config { message, hint } => Error::Config {
                message: format!("{}: {}", path.display(), message),
                hint,
            },
            other => other,
        })?;
        self.loaded.push(path.to_path_buf());
        Ok(())
    }

    /// Files that contributed to the configuration.
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Name of the instance to use.
    fn instance_name(&self, requested: Option<&str>) -> Option<String> {
        requested.map(str::to_string).or_else(|| {
            self.sections
                .get("global")
                .and_then(|g| g.get("default"))
                .cloned()
        })
    }

    /// Settings for the requested (or default) instance with overrides applied.
    pub fn instance(&self, requested: Option<&str>, overrides: &Overrides) -> Result<InstanceConfig> {
        let name = self.instance_name(requested);
        let empty = BTreeMap::new();
        let section = match &name {
            Some(name) => match self.sections.get(name) {
                Some(section) => section,
                None if requested.is_some() => {
                    return Err(Error::Config {
                        message: format!("instance '{}' is not configured", name),
                        hint: Some(format!(
                            "add a [{}] section with url and private_token",
                            name
                        )),
                    })
                }
                None => &empty,
            },
            None => &empty,
        };

        let url = overrides
            .url
            .clone()
            .or_else(|| section.get("url").cloned())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: "no GitLab URL configured".to_string(),
                hint: Some(
                    "pass --url, set GITLAB_URL, or create ~/.python-gitlab.cfg".to_string(),
                ),
            })?;

        let auth = match &overrides.token {
            Some(token) => Auth::PrivateToken(token.clone()),
            None => auth_from_section(section),
        };

        let timeout = match section.get("timeout") {
            Some(value) => {
                let seconds: u64 = value.trim().parse().map_err(|_| Error::Config {
                    message: format!("timeout '{}' is not a number of seconds", value),
                    hint: None,
                })?;
                Duration::from_secs(seconds)
            }
            None => defaults::HTTP_TIMEOUT,
        };

        let ssl_verify = section
            .get("ssl_verify")
            .map(|v| parse_bool(v))
            .unwrap_or(true);

        Ok(InstanceConfig {
            url,
            auth,
            timeout,
            ssl_verify,
        })
    }
}

fn auth_from_section(section: &BTreeMap<String, String>) -> Auth {
    if let Some(token) = section.get("private_token") {
        Auth::PrivateToken(token.clone())
    } else if let Some(token) = section.get("oauth_token") {
        Auth::OAuthToken(token.clone())
    } else if let Some(token) = section.get("job_token") {
        Auth::JobToken(token.clone())
    } else {
        Auth::Anonymous
    }
}

/// python-gitlab also allows a CA bundle path here; anything but an explicit
/// false keeps verification on.
fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "no" | "off" | "0"
    )
}
