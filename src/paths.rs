//! Centralized path resolution and path utilities.
//!
//! This module provides a unified interface for resolving paths to:
//! - Config file (`~/.config/rulebox[-dev]/config.toml`)
//! - Repository registry (`~/.config/rulebox[-dev]/repositories.toml`)
//! - Access token (`~/.config/rulebox[-dev]/token`)
//! - Logs and default clone root (`~/.local/share/rulebox[-dev]/`)
//!
//! Dev builds (`0.0.0-dev`) use `rulebox-dev` subdirectories to avoid
//! interfering with an installed release binary.
//!
//! ## Testing Behavior
//!
//! Tests can override path resolution using `TestPathGuard`:
//! ```ignore
//! let temp_dir = tempfile::TempDir::new().unwrap();
//! let _guard = TestPathGuard::new(temp_dir.path());
//! assert_eq!(registry_file().unwrap(), temp_dir.path().join("repositories.toml"));
//! ```

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

/// Returns "rulebox-dev" for dev builds, "rulebox" for release builds.
fn app_dir_name() -> &'static str {
    if cfg!(dev_build) {
        "rulebox-dev"
    } else {
        "rulebox"
    }
}

/// Categories of application paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `~/.config/rulebox/config.toml`
    Config,
    /// `~/.config/rulebox/repositories.toml`
    Registry,
    /// `~/.config/rulebox/token`
    Token,
    /// `~/.local/share/rulebox/`
    LogDir,
    /// `~/.local/share/rulebox/repos/`
    CloneRoot,
}

/// Path resolution strategy (thread-local).
#[derive(Debug, PartialEq)]
enum PathStrategy {
    /// Production: Use XDG Base Directory Specification.
    Xdg,
    /// Testing: Use custom base directory for all paths.
    Override(PathBuf),
}

thread_local! {
    static PATH_STRATEGY: RefCell<PathStrategy> = const { RefCell::new(PathStrategy::Xdg) };
}

/// Resolve a path based on the current strategy.
///
/// Returns `None` if the path cannot be resolved (e.g. HOME not set in XDG mode).
pub fn resolve(kind: PathKind) -> Option<PathBuf> {
    PATH_STRATEGY.with(|strategy| {
        let s = strategy.borrow();
        match *s {
            PathStrategy::Xdg => resolve_xdg(kind),
            PathStrategy::Override(ref base) => Some(resolve_override(base, kind)),
        }
    })
}

fn xdg_base(var: &str, fallback: &[&str]) -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os(var) {
        return Some(PathBuf::from(xdg).join(app_dir_name()));
    }

    std::env::var_os("HOME").map(|h| {
        let mut p = PathBuf::from(h);
        for part in fallback {
            p.push(part);
        }
        p.push(app_dir_name());
        p
    })
}

fn resolve_xdg(kind: PathKind) -> Option<PathBuf> {
    match kind {
        PathKind::Config => {
            xdg_base("XDG_CONFIG_HOME", &[".config"]).map(|p| p.join("config.toml"))
        }
        PathKind::Registry => {
            xdg_base("XDG_CONFIG_HOME", &[".config"]).map(|p| p.join("repositories.toml"))
        }
        PathKind::Token => xdg_base("XDG_CONFIG_HOME", &[".config"]).map(|p| p.join("token")),
        PathKind::LogDir => xdg_base("XDG_DATA_HOME", &[".local", "share"]),
        PathKind::CloneRoot => {
            xdg_base("XDG_DATA_HOME", &[".local", "share"]).map(|p| p.join("repos"))
        }
    }
}

/// Resolve a path using a custom base directory (for testing).
fn resolve_override(base: &Path, kind: PathKind) -> PathBuf {
    match kind {
        PathKind::Config => base.join("config.toml"),
        PathKind::Registry => base.join("repositories.toml"),
        PathKind::Token => base.join("token"),
        PathKind::LogDir => base.to_path_buf(),
        PathKind::CloneRoot => base.join("repos"),
    }
}

pub fn config_file() -> Option<PathBuf> {
    resolve(PathKind::Config)
}

pub fn registry_file() -> Option<PathBuf> {
    resolve(PathKind::Registry)
}

pub fn token_file() -> Option<PathBuf> {
    resolve(PathKind::Token)
}

pub fn log_directory() -> Option<PathBuf> {
    resolve(PathKind::LogDir)
}

/// Directory under which new remote clones are suggested.
pub fn default_clone_root() -> Option<PathBuf> {
    resolve(PathKind::CloneRoot)
}

/// Override path resolution for all paths to use a custom base directory.
///
/// This change is thread-local and affects only the current thread.
/// Use `reset_to_xdg()` or `TestPathGuard` to restore XDG behavior.
pub fn set_test_dir(base: impl Into<PathBuf>) {
    PATH_STRATEGY.with(|strategy| {
        *strategy.borrow_mut() = PathStrategy::Override(base.into());
    });
}

/// Reset path resolution back to XDG Base Directory Specification.
pub fn reset_to_xdg() {
    PATH_STRATEGY.with(|strategy| {
        *strategy.borrow_mut() = PathStrategy::Xdg;
    });
}

/// RAII guard for test path overrides. Resets to XDG behavior when dropped.
pub struct TestPathGuard;

impl TestPathGuard {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        set_test_dir(base_dir);
        TestPathGuard
    }
}

impl Drop for TestPathGuard {
    fn drop(&mut self) {
        reset_to_xdg();
    }
}

// ── Path utilities ──────────────────────────────────────────────────────────

/// Expand a leading `~` and `$VAR` / `${VAR}` references in a user-typed path.
///
/// Unknown variables are left untouched. Surrounding whitespace is trimmed.
pub fn expand(input: &str) -> PathBuf {
    let input = input.trim();

    let tilde_expanded = match input.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            match std::env::var_os("HOME") {
                Some(home) => format!("{}{rest}", home.to_string_lossy()),
                None => input.to_string(),
            }
        }
        _ => input.to_string(),
    };

    PathBuf::from(expand_vars(&tilde_expanded))
}

fn expand_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), std::env::var(name)) {
            (false, Ok(value)) => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}

/// Why a path cannot host a repository.
#[derive(Debug, thiserror::Error)]
pub enum StoragePathError {
    #[error("path must be absolute: {0}")]
    NotAbsolute(PathBuf),
    #[error("path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("directory is not writable: {0}")]
    NotWritable(PathBuf),
    #[error("no existing parent directory for {0}")]
    NoExistingAncestor(PathBuf),
}

/// Check that `path` can be used as a repository directory.
///
/// The path must be absolute. If it exists it must be a directory; the
/// nearest existing ancestor (the path itself included) must accept writes.
pub fn validate_storage_path(path: &Path) -> Result<(), StoragePathError> {
    if !path.is_absolute() {
        return Err(StoragePathError::NotAbsolute(path.to_path_buf()));
    }

    if path.exists() && !path.is_dir() {
        return Err(StoragePathError::NotADirectory(path.to_path_buf()));
    }

    let ancestor = path
        .ancestors()
        .find(|p| p.exists())
        .ok_or_else(|| StoragePathError::NoExistingAncestor(path.to_path_buf()))?;

    if !ancestor.is_dir() {
        return Err(StoragePathError::NotADirectory(ancestor.to_path_buf()));
    }

    if !is_writable_dir(ancestor) {
        return Err(StoragePathError::NotWritable(ancestor.to_path_buf()));
    }

    Ok(())
}

/// Probe writability by creating and removing a marker file.
fn is_writable_dir(dir: &Path) -> bool {
    let probe = dir.join(format!(".rulebox-write-probe-{}", std::process::id()));
    match std::fs::File::create(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Whether `path` has no entries. A missing directory counts as empty.
pub fn is_directory_empty(path: &Path) -> io::Result<bool> {
    match std::fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

/// Whether `path` holds a Git working tree (a `.git` directory or file).
pub fn has_git_dir(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Find the longest common prefix among a slice of strings.
fn longest_common_prefix(strings: &[String]) -> String {
    if strings.is_empty() {
        return String::new();
    }
    let first = &strings[0];
    let mut prefix_len = first.len();
    for s in &strings[1..] {
        prefix_len = prefix_len.min(s.len());
        for (i, (a, b)) in first.bytes().zip(s.bytes()).enumerate() {
            if a != b {
                prefix_len = prefix_len.min(i);
                break;
            }
        }
    }
    while !first.is_char_boundary(prefix_len) {
        prefix_len -= 1;
    }
    first[..prefix_len].to_string()
}

/// Fish-style directory path completion.
///
/// Given a partial path input, returns the suffix to complete it. `~` and
/// environment variables are expanded for the lookup only; the returned
/// suffix is meant to be appended to the raw input. Hidden entries are
/// included only when the typed prefix starts with `.`.
///
/// - Input `"/home/us"` with `/home/user/` existing → `Some("er/")`
/// - Input `"/nonexistent"` → `None`
pub fn complete_directory_path(input: &str) -> Option<String> {
    if input.trim().is_empty() {
        return None;
    }

    let expanded = expand(input);
    let expanded_str = expanded.to_string_lossy().into_owned();
    let path = Path::new(&expanded_str);

    let (parent, prefix) = if expanded_str.ends_with('/') {
        (path.to_path_buf(), String::new())
    } else {
        let parent = path.parent()?.to_path_buf();
        let file_name = path.file_name()?.to_str()?;
        (parent, file_name.to_string())
    };

    let entries = std::fs::read_dir(&parent).ok()?;

    let show_hidden = prefix.starts_with('.');

    let matches: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            if !show_hidden && name.starts_with('.') {
                return None;
            }
            name.starts_with(&prefix).then_some(name)
        })
        .collect();

    if matches.is_empty() {
        return None;
    }

    let common = longest_common_prefix(&matches);
    let beyond_typed = &common[prefix.len()..];
    if beyond_typed.is_empty() && matches.len() > 1 {
        return None;
    }

    let completed = parent.join(&common);
    let suffix = if completed.is_dir() {
        format!("{beyond_typed}/")
    } else {
        beyond_typed.to_string()
    };

    if suffix.is_empty() {
        None
    } else {
        Some(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_xdg() {
        reset_to_xdg();
        PATH_STRATEGY.with(|s| {
            assert_eq!(*s.borrow(), PathStrategy::Xdg);
        });
    }

    #[test]
    fn override_isolates_paths() {
        let base = PathBuf::from("/test/base");
        let _guard = TestPathGuard::new(&base);

        assert_eq!(config_file(), Some(base.join("config.toml")));
        assert_eq!(registry_file(), Some(base.join("repositories.toml")));
        assert_eq!(token_file(), Some(base.join("token")));
        assert_eq!(log_directory(), Some(base.clone()));
        assert_eq!(default_clone_root(), Some(base.join("repos")));
    }

    #[test]
    fn guard_resets_on_drop() {
        {
            let _guard = TestPathGuard::new("/test/base");
        }
        PATH_STRATEGY.with(|s| {
            assert_eq!(*s.borrow(), PathStrategy::Xdg);
        });
    }

    #[test]
    fn thread_local_isolation() {
        let _guard = TestPathGuard::new("/test/base1");

        let handle = std::thread::spawn(|| {
            PATH_STRATEGY.with(|s| matches!(*s.borrow(), PathStrategy::Xdg))
        });

        assert!(handle.join().unwrap());
        assert_eq!(
            registry_file(),
            Some(PathBuf::from("/test/base1/repositories.toml"))
        );
    }

    #[test]
    fn expand_plain_path_is_trimmed() {
        assert_eq!(expand("  /srv/rules  "), PathBuf::from("/srv/rules"));
    }

    #[test]
    fn expand_tilde_uses_home() {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let home = PathBuf::from(home);
        assert_eq!(expand("~"), home);
        assert_eq!(expand("~/rules"), home.join("rules"));
    }

    #[test]
    fn expand_tilde_user_is_left_alone() {
        assert_eq!(expand("~other/x"), PathBuf::from("~other/x"));
    }

    #[test]
    fn expand_unknown_variable_is_kept() {
        assert_eq!(
            expand("/a/$RULEBOX_SURELY_UNSET_VAR/b"),
            PathBuf::from("/a/$RULEBOX_SURELY_UNSET_VAR/b")
        );
        assert_eq!(
            expand("/a/${RULEBOX_SURELY_UNSET_VAR}/b"),
            PathBuf::from("/a/${RULEBOX_SURELY_UNSET_VAR}/b")
        );
    }

    #[test]
    fn expand_known_variable() {
        let Ok(home) = std::env::var("HOME") else {
            return;
        };
        assert_eq!(expand("$HOME/x"), PathBuf::from(format!("{home}/x")));
        assert_eq!(expand("${HOME}/x"), PathBuf::from(format!("{home}/x")));
    }

    #[test]
    fn validate_storage_path_rejects_relative() {
        assert!(matches!(
            validate_storage_path(Path::new("relative/dir")),
            Err(StoragePathError::NotAbsolute(_))
        ));
    }

    #[test]
    fn validate_storage_path_accepts_missing_child_of_writable_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = temp.path().join("not").join("yet");
        assert!(validate_storage_path(&target).is_ok());
        assert!(!target.exists());
    }

    #[test]
    fn validate_storage_path_rejects_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            validate_storage_path(&file),
            Err(StoragePathError::NotADirectory(_))
        ));
        assert!(matches!(
            validate_storage_path(&file.join("child")),
            Err(StoragePathError::NotADirectory(_))
        ));
    }

    #[test]
    fn is_directory_empty_cases() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(is_directory_empty(temp.path()).unwrap());
        assert!(is_directory_empty(&temp.path().join("missing")).unwrap());

        std::fs::write(temp.path().join("a"), "x").unwrap();
        assert!(!is_directory_empty(temp.path()).unwrap());
    }

    #[test]
    fn has_git_dir_detects_working_tree() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(!has_git_dir(temp.path()));
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(has_git_dir(temp.path()));
    }

    #[test]
    fn longest_common_prefix_cases() {
        assert_eq!(longest_common_prefix(&[]), "");
        assert_eq!(longest_common_prefix(&["hello".to_string()]), "hello");
        assert_eq!(
            longest_common_prefix(&[
                "foobar".to_string(),
                "foobaz".to_string(),
                "fooqux".to_string(),
            ]),
            "foo"
        );
        assert_eq!(
            longest_common_prefix(&["ab".to_string(), "abcdef".to_string()]),
            "ab"
        );
    }

    #[test]
    fn complete_directory_path_empty_input() {
        assert_eq!(complete_directory_path(""), None);
    }

    #[test]
    fn complete_directory_path_nonexistent() {
        assert_eq!(complete_directory_path("/nonexistent_dir_xyz_123"), None);
    }

    #[test]
    fn complete_directory_path_with_tempdir() {
        let temp = tempfile::TempDir::new().unwrap();
        let base = temp.path();

        std::fs::create_dir(base.join("rules_alpha")).unwrap();
        std::fs::create_dir(base.join("rules_beta")).unwrap();
        std::fs::create_dir(base.join("other")).unwrap();

        let input = format!("{}/rules_", base.display());
        assert_eq!(complete_directory_path(&input), None);

        let input = format!("{}/rules_a", base.display());
        assert_eq!(complete_directory_path(&input), Some("lpha/".to_string()));

        let input = format!("{}/oth", base.display());
        assert_eq!(complete_directory_path(&input), Some("er/".to_string()));
    }

    #[test]
    fn complete_directory_path_skips_hidden_and_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let base = temp.path();

        std::fs::create_dir(base.join(".hidden")).unwrap();
        std::fs::create_dir(base.join("visible")).unwrap();
        std::fs::write(base.join("vfile"), "content").unwrap();

        let input = format!("{}/", base.display());
        assert_eq!(complete_directory_path(&input), Some("visible/".to_string()));

        let input = format!("{}/.hid", base.display());
        assert_eq!(complete_directory_path(&input), Some("den/".to_string()));
    }
}
