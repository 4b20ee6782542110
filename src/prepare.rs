//! Derive the decorated repository list shown in the settings main menu.

use std::path::PathBuf;

use crate::git::{self, GitBackend};
use crate::registry::{RepositoryEntry, RepositoryId, RepositoryKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Local directory exists, or the remote is cloned at its path.
    Ready,
    /// Remote entry whose clone target has no working tree yet.
    NotCloned,
    /// Local entry whose directory is gone.
    Missing,
    /// Not inspected; the last prepare pass failed.
    Unknown,
}

impl Readiness {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NotCloned => "not cloned",
            Self::Missing => "missing",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRepository {
    pub id: RepositoryId,
    pub title: String,
    pub description: String,
    pub readiness: Readiness,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareError {
    #[error("{name}: {path} holds a clone of {found}, expected {expected}")]
    ForeignRepository {
        name: String,
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("{name}: failed to inspect {path}: {reason}")]
    Inspect {
        name: String,
        path: PathBuf,
        reason: String,
    },
}

impl PrepareError {
    /// Name of the entry that could not be prepared.
    pub fn entry_name(&self) -> &str {
        match self {
            Self::ForeignRepository { name, .. } | Self::Inspect { name, .. } => name,
        }
    }
}

pub fn prepare_repositories(
    entries: &[RepositoryEntry],
    git: &dyn GitBackend,
) -> Result<Vec<PreparedRepository>, PrepareError> {
    entries.iter().map(|e| prepare_one(e, git)).collect()
}

/// Undecorated list used when [`prepare_repositories`] fails after an edit.
pub fn unchecked(entries: &[RepositoryEntry]) -> Vec<PreparedRepository> {
    entries
        .iter()
        .map(|entry| PreparedRepository {
            id: entry.id,
            title: entry.name.clone(),
            description: describe(entry),
            readiness: Readiness::Unknown,
        })
        .collect()
}

fn describe(entry: &RepositoryEntry) -> String {
    match entry.kind {
        RepositoryKind::Local => format!("Local · {}", entry.path.display()),
        RepositoryKind::Remote => format!(
            "Remote · {} @ {} → {}",
            entry.remote_url.as_deref().unwrap_or_default(),
            entry.branch_label(),
            entry.path.display()
        ),
    }
}

fn prepare_one(entry: &RepositoryEntry, git: &dyn GitBackend) -> Result<PreparedRepository, PrepareError> {
    let readiness = match entry.kind {
        RepositoryKind::Local if entry.path.is_dir() => Readiness::Ready,
        RepositoryKind::Local => Readiness::Missing,
        RepositoryKind::Remote => {
            let url = entry.remote_url.as_deref().unwrap_or_default();
            remote_readiness(entry, url, git)?
        }
    };

    Ok(PreparedRepository {
        id: entry.id,
        title: entry.name.clone(),
        description: describe(entry),
        readiness,
    })
}

fn remote_readiness(
    entry: &RepositoryEntry,
    url: &str,
    git: &dyn GitBackend,
) -> Result<Readiness, PrepareError> {
    if !crate::paths::has_git_dir(&entry.path) {
        return Ok(Readiness::NotCloned);
    }

    let origin = git.origin_url(&entry.path).map_err(|e| PrepareError::Inspect {
        name: entry.name.clone(),
        path: entry.path.clone(),
        reason: e.to_string(),
    })?;

    match origin {
        Some(found) if !git::same_remote(&found, url) => Err(PrepareError::ForeignRepository {
            name: entry.name.clone(),
            path: entry.path.clone(),
            expected: url.to_string(),
            found,
        }),
        _ => Ok(Readiness::Ready),
    }
}

/// "1 repository", "3 repositories", "0 repositories".
pub fn repository_count_label(count: usize) -> String {
    if count == 1 {
        "1 repository".to_string()
    } else {
        format!("{count} repositories")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitSource;
    use crate::registry::Registry;
    use std::path::Path;

    struct OriginGit(Option<String>);

    impl GitBackend for OriginGit {
        fn fetch_updates(&self, _: &GitSource) -> anyhow::Result<()> {
            Ok(())
        }
        fn clone_repository(&self, _: &GitSource) -> anyhow::Result<()> {
            Ok(())
        }
        fn is_working_tree_dirty(&self, _: &Path) -> anyhow::Result<bool> {
            Ok(false)
        }
        fn branch_exists_on_remote(&self, _: &GitSource, _: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
        fn probe_remote(&self, _: &str, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn origin_url(&self, _: &Path) -> anyhow::Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    fn remote_at(path: &Path) -> RepositoryEntry {
        RepositoryEntry {
            id: Registry::generate_id("r", 1),
            name: "r".into(),
            kind: RepositoryKind::Remote,
            path: path.to_path_buf(),
            remote_url: Some("https://host/r.git".into()),
            branch: None,
            created_at: 1,
        }
    }

    #[test]
    fn local_readiness_tracks_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut entry = remote_at(temp.path());
        entry.kind = RepositoryKind::Local;
        entry.remote_url = None;

        let prepared = prepare_repositories(&[entry.clone()], &OriginGit(None)).unwrap();
        assert_eq!(prepared[0].readiness, Readiness::Ready);

        entry.path = temp.path().join("gone");
        let prepared = prepare_repositories(&[entry], &OriginGit(None)).unwrap();
        assert_eq!(prepared[0].readiness, Readiness::Missing);
    }

    #[test]
    fn remote_without_clone_is_not_cloned() {
        let temp = tempfile::TempDir::new().unwrap();
        let prepared =
            prepare_repositories(&[remote_at(&temp.path().join("r"))], &OriginGit(None)).unwrap();
        assert_eq!(prepared[0].readiness, Readiness::NotCloned);
        assert!(prepared[0].description.contains("@ default"));
    }

    #[test]
    fn remote_with_matching_origin_is_ready() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let git = OriginGit(Some("https://host/r".into()));
        let prepared = prepare_repositories(&[remote_at(temp.path())], &git).unwrap();
        assert_eq!(prepared[0].readiness, Readiness::Ready);
    }

    #[test]
    fn remote_with_foreign_origin_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let git = OriginGit(Some("https://host/other.git".into()));
        let err = prepare_repositories(&[remote_at(temp.path())], &git).unwrap_err();
        assert!(matches!(err, PrepareError::ForeignRepository { .. }));
    }

    #[test]
    fn unchecked_marks_every_entry_unknown() {
        let temp = tempfile::TempDir::new().unwrap();
        let prepared = unchecked(&[remote_at(temp.path())]);
        assert_eq!(prepared[0].readiness, Readiness::Unknown);
        assert_eq!(prepared[0].title, "r");
    }

    #[test]
    fn count_label_pluralises() {
        assert_eq!(repository_count_label(0), "0 repositories");
        assert_eq!(repository_count_label(1), "1 repository");
        assert_eq!(repository_count_label(2), "2 repositories");
    }
}
