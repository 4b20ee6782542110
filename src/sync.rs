//! One-shot synchronisation of every Remote entry with its origin.
//!
//! Missing working trees are cloned, existing ones are fetched and
//! fast-forwarded. Local entries are left alone.

use std::fmt;

use tracing::{info, warn};

use crate::credentials::CredentialManager;
use crate::git::{GitBackend, GitSource};
use crate::paths;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Updated,
    Skipped,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cloned => "cloned",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
        })
    }
}

#[derive(Debug)]
pub struct SyncResult {
    pub name: String,
    pub outcome: Result<SyncAction, String>,
}

impl SyncResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(action) => write!(f, "✓ {}: {action}", self.name),
            Err(e) => write!(f, "✗ {}: {e}", self.name),
        }
    }
}

/// Sync every entry in registry order. Failures are collected, not fatal.
pub fn sync_all(
    registry: &Registry,
    git: &dyn GitBackend,
    credentials: &dyn CredentialManager,
) -> Vec<SyncResult> {
    let token = match credentials.get() {
        Ok(token) => token,
        Err(e) => {
            warn!("Failed to read stored token: {e:#}");
            None
        }
    };

    registry
        .entries()
        .iter()
        .map(|entry| {
            let outcome = match GitSource::for_entry(entry, token.clone()) {
                None => Ok(SyncAction::Skipped),
                Some(source) if !paths::has_git_dir(&source.path) => git
                    .clone_repository(&source)
                    .map(|()| SyncAction::Cloned)
                    .map_err(|e| format!("{e:#}")),
                Some(source) => git
                    .fetch_updates(&source)
                    .map(|()| SyncAction::Updated)
                    .map_err(|e| format!("{e:#}")),
            };
            match &outcome {
                Ok(action) => info!("Synced {}: {action}", entry.name),
                Err(e) => warn!("Failed to sync {}: {e}", entry.name),
            }
            SyncResult {
                name: entry.name.clone(),
                outcome,
            }
        })
        .collect()
}
