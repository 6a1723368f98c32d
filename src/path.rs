//! Project path utilities for teachers-gitlab

use crate::error::{Error, Result};

/// Encode a project path or file path for use as a single URL path segment
///
/// GitLab accepts `namespace/name` wherever a project id is expected, as long
/// as the slashes are percent-encoded.
pub fn encode_segment(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

/// Split `group/subgroup/name` into the namespace and the project name
///
/// The namespace is everything before the last slash, which allows nested
/// groups. A path without a namespace is rejected.
pub fn split_project_path(full_path: &str) -> Result<(&str, &str)> {
    let trimmed = full_path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace, name))
        }
        _ => Err(Error::InvalidReference {
            message: format!(
                "project path '{}' must have the form namespace/name",
                full_path
            ),
        }),
    }
}

/// Validate a project path used as a lookup key
pub fn check_project_path(path: &str) -> Result<&str> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidReference {
            message: "empty project path".to_string(),
        });
    }
    Ok(trimmed)
}
