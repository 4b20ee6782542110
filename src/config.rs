//! Application configuration loaded from `config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Directory new remote clones are suggested under.
    #[serde(default)]
    pub clone_root: Option<PathBuf>,
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields defaults. A malformed file is logged and also
    /// yields defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {e}", path.display());
                return Self::default();
            }
        };

        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load from the resolved config path, or defaults if none resolves.
    pub fn load_default() -> Self {
        crate::paths::config_file()
            .map(|p| Self::load(&p))
            .unwrap_or_default()
    }

    /// Effective clone root: configured value (expanded) or the XDG default.
    pub fn clone_root(&self) -> Option<PathBuf> {
        match &self.clone_root {
            Some(root) => Some(crate::paths::expand(&root.to_string_lossy())),
            None => crate::paths::default_clone_root(),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::TestPathGuard;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("config.toml"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn parses_all_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "clone_root = \"/srv/rules\"\nlog_filter = \"rulebox=debug\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.clone_root(), Some(PathBuf::from("/srv/rules")));
        assert_eq!(config.log_filter(), "rulebox=debug");
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "clone_root = [").unwrap();
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn clone_root_falls_back_to_data_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let _guard = TestPathGuard::new(temp.path());
        assert_eq!(
            AppConfig::default().clone_root(),
            Some(temp.path().join("repos"))
        );
    }
}
