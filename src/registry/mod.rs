//! The repository registry: the persistent list of rule repositories.
//!
//! Entries are addressed by a stable [`RepositoryId`]. The registry enforces
//! nothing on its own; uniqueness rules live with the settings flows that
//! mutate it.

mod store;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace UUID for deriving repository IDs from `(name, created_at)`.
const REPOSITORY_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x3d, 0x1f, 0x8a, 0x52, 0x94, 0x0b, 0x5e, 0x67, 0xa1, 0x2c, 0x7b, 0x44, 0xe9, 0x08, 0x6d, 0xf3,
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(Uuid);

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    Local,
    Remote,
}

impl RepositoryKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Remote => "Remote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub id: RepositoryId,
    pub name: String,
    pub kind: RepositoryKind,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub created_at: u64,
}

impl RepositoryEntry {
    pub fn is_remote(&self) -> bool {
        self.kind == RepositoryKind::Remote
    }

    /// Branch shown to the user: the tracked branch or "default".
    pub fn branch_label(&self) -> &str {
        self.branch.as_deref().unwrap_or("default")
    }
}

/// Lookup by ID failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("repository {0} not found")]
pub struct NotFound(pub RepositoryId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    path: PathBuf,
    entries: Vec<RepositoryEntry>,
}

impl Registry {
    /// An empty registry that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Load the registry stored at `path`. A missing file is an empty registry.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let entries = store::load_entries(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Write the registry to its file atomically.
    pub fn persist(&self) -> anyhow::Result<()> {
        store::save_entries(&self.path, &self.entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[RepositoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_id(&self, id: RepositoryId) -> Option<&RepositoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: RepositoryId) -> Option<&mut RepositoryEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RepositoryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Matches ignoring a trailing `/` or `.git`.
    pub fn find_by_url(&self, url: &str) -> Option<&RepositoryEntry> {
        self.entries.iter().find(|e| {
            e.remote_url
                .as_deref()
                .is_some_and(|existing| crate::git::same_remote(existing, url))
        })
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&RepositoryEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RepositoryEntry> {
        self.entries.iter().filter(|e| e.is_remote())
    }

    pub fn append(&mut self, entry: RepositoryEntry) {
        self.entries.push(entry);
    }

    pub fn remove(&mut self, id: RepositoryId) -> Result<RepositoryEntry, NotFound> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(NotFound(id))?;
        Ok(self.entries.remove(pos))
    }

    /// Derive the ID for an entry created with `name` at `created_at`.
    pub fn generate_id(name: &str, created_at: u64) -> RepositoryId {
        let seed = format!("{name}\0{created_at}");
        RepositoryId(Uuid::new_v5(&REPOSITORY_ID_NAMESPACE, seed.as_bytes()))
    }

    /// A creation stamp later than every existing entry's.
    pub fn next_created_at(&self) -> u64 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let latest = self.entries.iter().map(|e| e.created_at).max().unwrap_or(0);
        now.max(latest.saturating_add(1))
    }
}
