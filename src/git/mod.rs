//! Git access for remote rule repositories.
//!
//! [`GitBackend`] is the seam the settings controller talks through.
//! [`CliGit`] implements it by shelling out to the `git` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

use crate::registry::RepositoryEntry;

/// Everything needed to talk to one remote repository.
#[derive(Clone)]
pub struct GitSource {
    pub url: String,
    pub branch: Option<String>,
    pub path: PathBuf,
    pub token: Option<String>,
}

impl GitSource {
    /// Build a source for a Remote entry. Returns `None` for Local entries.
    pub fn for_entry(entry: &RepositoryEntry, token: Option<String>) -> Option<Self> {
        let url = entry.remote_url.clone()?;
        Some(Self {
            url,
            branch: entry.branch.clone(),
            path: entry.path.clone(),
            token,
        })
    }

    /// URL with the token embedded for HTTPS remotes.
    fn authenticated_url(&self) -> String {
        authenticated_url(&self.url, self.token.as_deref())
    }
}

impl std::fmt::Debug for GitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitSource")
            .field("url", &self.url)
            .field("branch", &self.branch)
            .field("path", &self.path)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub trait GitBackend: Send + Sync {
    /// Bring the working copy up to date, cloning it first if absent.
    fn fetch_updates(&self, source: &GitSource) -> Result<()>;

    fn clone_repository(&self, source: &GitSource) -> Result<()>;

    /// Whether the working tree at `path` has uncommitted modifications.
    /// A path without a working tree is clean.
    fn is_working_tree_dirty(&self, path: &Path) -> Result<bool>;

    fn branch_exists_on_remote(&self, source: &GitSource, branch: &str) -> Result<bool>;

    /// Check that `url` is reachable with `token`.
    fn probe_remote(&self, url: &str, token: &str) -> Result<()>;

    /// The `origin` URL of the working tree at `path`, if any.
    fn origin_url(&self, path: &Path) -> Result<Option<String>>;
}

/// Whether remotes at `url` authenticate with the access token.
pub fn uses_token(url: &str) -> bool {
    url.starts_with("https://")
}

/// Embed `token` into an HTTPS URL as `x-access-token:<token>@host`.
pub fn authenticated_url(url: &str, token: Option<&str>) -> String {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return url.to_string();
    };
    match url.strip_prefix("https://") {
        Some(rest) if !rest.contains('@') => format!("https://x-access-token:{token}@{rest}"),
        _ => url.to_string(),
    }
}

/// Replace any embedded credentials in git output before it reaches logs or the UI.
fn redact(text: &str, token: Option<&str>) -> String {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => text.replace(token, "<redacted>"),
        None => text.to_string(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CliGit;

impl CliGit {
    pub fn new() -> Self {
        Self
    }

    fn git(&self, cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new("git");
        cmd.env("GIT_TERMINAL_PROMPT", "0").stdin(Stdio::null());
        if std::env::var_os("GIT_SSH_COMMAND").is_none() {
            cmd.env("GIT_SSH_COMMAND", "ssh -o BatchMode=yes");
        }
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str, token: Option<&str>) -> Result<Output> {
        let output = cmd
            .output()
            .with_context(|| format!("failed to run git {what}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {what} failed: {}", redact(stderr.trim(), token));
        }

        Ok(output)
    }

    fn current_branch(&self, path: &Path) -> Result<String> {
        let mut cmd = self.git(Some(path));
        cmd.args(["rev-parse", "--abbrev-ref", "HEAD"]);
        let output = self.run(cmd, "rev-parse", None)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitBackend for CliGit {
    fn fetch_updates(&self, source: &GitSource) -> Result<()> {
        if !crate::paths::has_git_dir(&source.path) {
            return self.clone_repository(source);
        }

        let token = source.token.as_deref();
        let mut fetch = self.git(Some(&source.path));
        fetch.args(["fetch", &source.authenticated_url()]);
        if let Some(branch) = &source.branch {
            fetch.arg(branch);
        }
        self.run(fetch, "fetch", token)?;

        let switch_branch = match &source.branch {
            Some(branch) => self.current_branch(&source.path)? != *branch,
            None => false,
        };

        let mut update = self.git(Some(&source.path));
        match (&source.branch, switch_branch) {
            (Some(branch), true) => {
                update.args(["checkout", "-B", branch, "FETCH_HEAD"]);
                self.run(update, "checkout", token)?;
            }
            _ => {
                update.args(["merge", "--ff-only", "FETCH_HEAD"]);
                self.run(update, "merge", token)?;
            }
        }

        Ok(())
    }

    fn clone_repository(&self, source: &GitSource) -> Result<()> {
        if let Some(parent) = source.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let token = source.token.as_deref();
        let mut clone = self.git(None);
        clone.arg("clone");
        if let Some(branch) = &source.branch {
            clone.args(["--branch", branch]);
        }
        clone.arg(source.authenticated_url()).arg(&source.path);
        self.run(clone, "clone", token)?;

        // Keep the token out of .git/config.
        let mut set_url = self.git(Some(&source.path));
        set_url.args(["remote", "set-url", "origin", &source.url]);
        self.run(set_url, "remote set-url", token)?;

        Ok(())
    }

    fn is_working_tree_dirty(&self, path: &Path) -> Result<bool> {
        if !crate::paths::has_git_dir(path) {
            return Ok(false);
        }

        let mut cmd = self.git(Some(path));
        cmd.args(["status", "--porcelain"]);
        let output = self.run(cmd, "status", None)?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    fn branch_exists_on_remote(&self, source: &GitSource, branch: &str) -> Result<bool> {
        let mut cmd = self.git(None);
        cmd.args(["ls-remote", "--heads", &source.authenticated_url(), branch]);
        let output = self.run(cmd, "ls-remote", source.token.as_deref())?;
        let wanted = format!("refs/heads/{branch}");
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(wanted.as_str())))
    }

    fn probe_remote(&self, url: &str, token: &str) -> Result<()> {
        let mut cmd = self.git(None);
        cmd.args(["ls-remote", "--heads", &authenticated_url(url, Some(token))]);
        self.run(cmd, "ls-remote", Some(token))?;
        Ok(())
    }

    fn origin_url(&self, path: &Path) -> Result<Option<String>> {
        if !crate::paths::has_git_dir(path) {
            return Ok(None);
        }

        let output = self
            .git(Some(path))
            .args(["remote", "get-url", "origin"])
            .stderr(Stdio::null())
            .output()
            .context("failed to run git remote get-url")?;

        if !output.status.success() {
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!url.is_empty()).then_some(url))
    }
}

/// Compare two remote URLs ignoring a trailing `.git` and `/`.
pub fn same_remote(a: &str, b: &str) -> bool {
    fn normalize(url: &str) -> &str {
        let url = url.trim().trim_end_matches('/');
        url.strip_suffix(".git").unwrap_or(url)
    }
    normalize(a) == normalize(b)
}
