//! Bulk project settings.

use log::debug;

use super::Outcome;
use crate::error::Result;
use crate::gitlab::ProjectSettings;
use crate::resolve::{fresh_project, ProjectRef};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    Updated,
    Unchanged,
}

impl Outcome for SettingsOutcome {
    fn changed(&self) -> bool {
        matches!(self, SettingsOutcome::Updated)
    }
}

/// Apply `settings` unless the project already carries them.
pub fn apply_settings(
    session: &Session<'_>,
    project: &ProjectRef,
    settings: &ProjectSettings,
) -> Result<SettingsOutcome> {
    let project = fresh_project(session, project)?;
    if settings.is_empty() || settings.is_satisfied_by(&project) {
        debug!("{} already has the requested settings", project.path_with_namespace);
        return Ok(SettingsOutcome::Unchanged);
    }
    session.call("update project", |api| api.update_project(&project, settings))?;
    Ok(SettingsOutcome::Updated)
}
