//! Access token storage and validation.
//!
//! One global token authenticates every Remote repository. The settings
//! controller only holds it in scratch fields during validation; the
//! [`CredentialManager`] owns its lifetime.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::debug;
use zeroize::Zeroize;

use crate::git::{self, GitBackend};
use crate::registry::RepositoryEntry;

pub trait CredentialManager: Send + Sync {
    fn validate_token_format(&self, token: &str) -> Result<()>;

    fn validate_token_against_url(&self, token: &str, url: &str) -> Result<()>;

    /// Validate `token` against every Remote entry whose URL carries it. The
    /// first rejection wins and names the offending URL.
    fn validate_token_against_entries(&self, token: &str, entries: &[RepositoryEntry]) -> Result<()> {
        let urls = entries
            .iter()
            .filter_map(|e| e.remote_url.as_deref())
            .filter(|url| git::uses_token(url));
        for url in urls {
            self.validate_token_against_url(token, url)
                .with_context(|| format!("token rejected for {url}"))?;
        }
        Ok(())
    }

    fn store(&self, token: &str) -> Result<()>;

    /// The stored token, or `None` if none has been stored yet.
    fn get(&self) -> Result<Option<String>>;
}

/// GitHub personal access token shapes (classic and fine-grained).
pub fn validate_github_token_format(token: &str) -> Result<()> {
    static TOKEN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    if token.trim().is_empty() {
        bail!("token cannot be empty");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("token cannot contain whitespace");
    }

    let regex = TOKEN_REGEX
        .get_or_init(|| Regex::new(r"^(ghp_|gho_|ghu_|ghs_|ghr_|github_pat_)[A-Za-z0-9_]{20,}$").ok());
    match regex {
        Some(re) if re.is_match(token) => Ok(()),
        Some(_) => bail!("token does not look like a GitHub access token"),
        None => bail!("token pattern failed to compile"),
    }
}

/// Token kept in a single file under the config directory.
pub struct FileCredentialStore {
    path: PathBuf,
    git: Arc<dyn GitBackend>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, git: Arc<dyn GitBackend>) -> Self {
        Self {
            path: path.into(),
            git,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialManager for FileCredentialStore {
    fn validate_token_format(&self, token: &str) -> Result<()> {
        validate_github_token_format(token)
    }

    fn validate_token_against_url(&self, token: &str, url: &str) -> Result<()> {
        self.git.probe_remote(url, token)
    }

    fn store(&self, token: &str) -> Result<()> {
        write_secret(&self.path, token)
            .with_context(|| format!("failed to store token at {}", self.path.display()))?;
        debug!("Stored access token at {}", self.path.display());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(mut contents) => {
                let token = contents.trim().to_string();
                contents.zeroize();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }
}

/// Atomic write with owner-only permissions.
fn write_secret(path: &Path, secret: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = PathBuf::from(format!("{}.tmp.{}", path.display(), std::process::id()));

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let result = (|| {
        let mut file = options.open(&temp_path)?;
        file.write_all(secret.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
