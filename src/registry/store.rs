use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RepositoryEntry;

#[derive(Debug, Default, Deserialize, Serialize)]
struct RegistryFile {
    #[serde(default)]
    repositories: Vec<RepositoryEntry>,
}

/// Load entries from disk. Returns an empty list if the file doesn't exist.
pub(super) fn load_entries(path: &Path) -> anyhow::Result<Vec<RepositoryEntry>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let file: RegistryFile = toml::from_str(&contents)
                .with_context(|| format!("failed to parse registry at {}", path.display()))?;
            Ok(file.repositories)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to read registry at {}", path.display()))
        }
    }
}

/// Save entries atomically.
///
/// Writes to a temporary file with a PID suffix, syncs it, then renames it
/// over the target.
pub(super) fn save_entries(path: &Path, entries: &[RepositoryEntry]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = RegistryFile {
        repositories: entries.to_vec(),
    };
    let serialized = toml::to_string_pretty(&file).context("failed to serialize registry")?;

    let temp_path = PathBuf::from(format!("{}.tmp.{}", path.display(), std::process::id()));

    let write = || -> io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)
    };

    if let Err(e) = write() {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("failed to write registry to {}", path.display()));
    }

    debug!("Saved registry to {}", path.display());

    Ok(())
}
