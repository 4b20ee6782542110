//! Input rules shared by the add and edit flows.
//!
//! Every function returns the normalised value on success and a
//! [`SettingsError::Validation`] otherwise.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::SettingsError;
use crate::paths;
use crate::registry::{Registry, RepositoryId};

pub const MAX_NAME_LEN: usize = 100;

fn invalid(message: impl Into<String>) -> SettingsError {
    SettingsError::Validation(message.into())
}

/// Trimmed, 1..=100 characters, unique. `editing` is the entry being
/// renamed; its own current name is accepted.
pub fn validate_name(
    registry: &Registry,
    raw: &str,
    editing: Option<RepositoryId>,
) -> Result<String, SettingsError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    match registry.find_by_name(name) {
        Some(existing) if Some(existing.id) != editing => Err(invalid("name already exists")),
        _ => Ok(name.to_string()),
    }
}

fn url_regex() -> Option<&'static Regex> {
    static URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    URL_REGEX
        .get_or_init(|| {
            Regex::new(concat!(
                r"^(?:",
                r"https?://[A-Za-z0-9.-]+(?::\d+)?/\S+",
                r"|ssh://(?:[A-Za-z0-9._-]+@)?[A-Za-z0-9.-]+(?::\d+)?/\S+",
                r"|[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:\S+",
                r"|file:///\S+",
                r")$"
            ))
            .ok()
        })
        .as_ref()
}

/// Well-formed remote URL not already tracked by another entry.
pub fn validate_url(registry: &Registry, raw: &str) -> Result<String, SettingsError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(invalid("URL cannot be empty"));
    }
    let Some(re) = url_regex() else {
        return Err(invalid("URL pattern failed to compile"));
    };
    if !re.is_match(url) {
        return Err(invalid(format!("malformed repository URL: {url}")));
    }
    if registry.find_by_url(url).is_some() {
        return Err(invalid("URL is already registered"));
    }
    Ok(url.to_string())
}

/// Empty input means the remote's default branch and yields `None`.
pub fn validate_branch(raw: &str) -> Result<Option<String>, SettingsError> {
    let branch = raw.trim();
    if branch.is_empty() {
        return Ok(None);
    }

    let problem = if branch.chars().any(char::is_whitespace) {
        Some("must not contain spaces")
    } else if branch.contains("..") {
        Some("must not contain '..'")
    } else if branch.starts_with('-') || branch.starts_with('/') {
        Some("must not start with '-' or '/'")
    } else if branch.ends_with('/') || branch.ends_with(".lock") || branch.ends_with('.') {
        Some("must not end with '/', '.' or '.lock'")
    } else if branch.contains("@{") || branch.contains("//") {
        Some("must not contain '@{' or '//'")
    } else if branch
        .chars()
        .any(|c| matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\') || c.is_control())
    {
        Some("contains a character git does not allow")
    } else {
        None
    };

    match problem {
        Some(reason) => Err(invalid(format!("invalid branch name '{branch}': {reason}"))),
        None => Ok(Some(branch.to_string())),
    }
}

/// Expanded, writable and not used by any entry other than `editing`.
pub fn validate_path(
    registry: &Registry,
    raw: &str,
    editing: Option<RepositoryId>,
) -> Result<PathBuf, SettingsError> {
    if raw.trim().is_empty() {
        return Err(invalid("path cannot be empty"));
    }
    let path = paths::expand(raw);
    paths::validate_storage_path(&path).map_err(|e| invalid(e.to_string()))?;

    match registry.find_by_path(&path) {
        Some(existing) if Some(existing.id) != editing => Err(invalid(format!(
            "path is already used by {}",
            existing.name
        ))),
        _ => Ok(path),
    }
}

/// A clone target must be missing or empty.
pub fn require_empty_target(path: &Path) -> Result<(), SettingsError> {
    if paths::has_git_dir(path) {
        return Err(invalid(format!(
            "{} already contains a git repository",
            path.display()
        )));
    }
    match paths::is_directory_empty(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(invalid(format!("{} is not empty", path.display()))),
        Err(e) => Err(invalid(format!("cannot read {}: {e}", path.display()))),
    }
}
