//! Fakes and a fixture for driving the controller in unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use tempfile::TempDir;

use super::{Command, SettingsController, SettingsMessage, SettingsState};
use crate::config::AppConfig;
use crate::credentials::CredentialManager;
use crate::git::{GitBackend, GitSource};
use crate::registry::{Registry, RepositoryEntry, RepositoryId, RepositoryKind};

#[derive(Default)]
pub(crate) struct FakeGit {
    dirty: AtomicBool,
    dirty_error: Mutex<Option<String>>,
    missing_branches: Mutex<Vec<String>>,
    fetch_error: Mutex<Option<String>>,
    origin: Mutex<Option<String>>,
    dirty_checks: AtomicUsize,
    fetches: AtomicUsize,
    branch_checks: AtomicUsize,
}

impl FakeGit {
    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::SeqCst);
    }

    pub(crate) fn fail_dirty_check(&self, message: &str) {
        *self.dirty_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn remove_branch(&self, branch: &str) {
        self.missing_branches.lock().unwrap().push(branch.to_string());
    }

    pub(crate) fn fail_fetch(&self, message: &str) {
        *self.fetch_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn set_origin(&self, url: &str) {
        *self.origin.lock().unwrap() = Some(url.to_string());
    }

    pub(crate) fn dirty_checks(&self) -> usize {
        self.dirty_checks.load(Ordering::SeqCst)
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn branch_checks(&self) -> usize {
        self.branch_checks.load(Ordering::SeqCst)
    }
}

impl GitBackend for FakeGit {
    fn fetch_updates(&self, _: &GitSource) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.fetch_error.lock().unwrap().clone() {
            Some(message) => bail!(message),
            None => Ok(()),
        }
    }

    fn clone_repository(&self, _: &GitSource) -> Result<()> {
        Ok(())
    }

    fn is_working_tree_dirty(&self, _: &Path) -> Result<bool> {
        self.dirty_checks.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.dirty_error.lock().unwrap().clone() {
            bail!(message);
        }
        Ok(self.dirty.load(Ordering::SeqCst))
    }

    fn branch_exists_on_remote(&self, _: &GitSource, branch: &str) -> Result<bool> {
        self.branch_checks.fetch_add(1, Ordering::SeqCst);
        Ok(!self
            .missing_branches
            .lock()
            .unwrap()
            .iter()
            .any(|b| b == branch))
    }

    fn probe_remote(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn origin_url(&self, _: &Path) -> Result<Option<String>> {
        Ok(self.origin.lock().unwrap().clone())
    }
}

/// Accepts any non-empty token without whitespace.
#[derive(Default)]
pub(crate) struct FakeCredentials {
    stored: Mutex<Option<String>>,
    rejected_urls: Mutex<Vec<String>>,
    fail_store: AtomicBool,
    fail_get: AtomicBool,
    stores: Mutex<Vec<String>>,
    probes: AtomicUsize,
}

impl FakeCredentials {
    pub(crate) fn with_token(token: &str) -> Self {
        let creds = Self::default();
        *creds.stored.lock().unwrap() = Some(token.to_string());
        creds
    }

    pub(crate) fn reject_url(&self, url: &str) {
        self.rejected_urls.lock().unwrap().push(url.to_string());
    }

    pub(crate) fn fail_store(&self) {
        self.fail_store.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_get(&self) {
        self.fail_get.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stores(&self) -> Vec<String> {
        self.stores.lock().unwrap().clone()
    }

    pub(crate) fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl CredentialManager for FakeCredentials {
    fn validate_token_format(&self, token: &str) -> Result<()> {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            bail!("malformed token");
        }
        Ok(())
    }

    fn validate_token_against_url(&self, _: &str, url: &str) -> Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.rejected_urls.lock().unwrap().iter().any(|u| u == url) {
            bail!("401 Unauthorized");
        }
        Ok(())
    }

    fn store(&self, token: &str) -> Result<()> {
        if self.fail_store.load(Ordering::SeqCst) {
            bail!("keyring locked");
        }
        self.stores.lock().unwrap().push(token.to_string());
        *self.stored.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>> {
        if self.fail_get.load(Ordering::SeqCst) {
            bail!("keyring unavailable");
        }
        Ok(self.stored.lock().unwrap().clone())
    }
}

pub(crate) fn key(code: KeyCode) -> SettingsMessage {
    SettingsMessage::KeyPress(code, KeyModifiers::NONE)
}

pub(crate) struct Fixture {
    pub(crate) temp: TempDir,
    pub(crate) git: Arc<FakeGit>,
    pub(crate) credentials: Arc<FakeCredentials>,
    pub(crate) controller: SettingsController,
    created: u64,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_credentials(FakeCredentials::default())
    }

    pub(crate) fn with_credentials(credentials: FakeCredentials) -> Self {
        let temp = TempDir::new().unwrap();
        let git = Arc::new(FakeGit::default());
        let credentials = Arc::new(credentials);
        let config = AppConfig {
            clone_root: Some(temp.path().join("clones")),
            log_filter: None,
        };
        let registry = Registry::new(temp.path().join("repositories.toml"));
        let controller =
            SettingsController::new(registry, git.clone(), credentials.clone(), &config);
        Self {
            temp,
            git,
            credentials,
            controller,
            created: 0,
        }
    }

    pub(crate) fn root(&self) -> &Path {
        self.temp.path()
    }

    fn insert(&mut self, entry: RepositoryEntry) -> RepositoryId {
        let id = entry.id;
        self.controller.registry.append(entry);
        self.controller.registry.persist().unwrap();
        id
    }

    fn next_stamp(&mut self) -> u64 {
        self.created += 1;
        self.created
    }

    /// Local entry whose directory exists.
    pub(crate) fn add_local(&mut self, name: &str) -> RepositoryId {
        let path = self.root().join("local").join(name);
        std::fs::create_dir_all(&path).unwrap();
        let created_at = self.next_stamp();
        self.insert(RepositoryEntry {
            id: Registry::generate_id(name, created_at),
            name: name.to_string(),
            kind: RepositoryKind::Local,
            path,
            remote_url: None,
            branch: None,
            created_at,
        })
    }

    /// Remote entry whose clone target does not exist yet.
    pub(crate) fn add_remote(&mut self, name: &str, url: &str) -> RepositoryId {
        let path = self.root().join("clones").join(name);
        let created_at = self.next_stamp();
        self.insert(RepositoryEntry {
            id: Registry::generate_id(name, created_at),
            name: name.to_string(),
            kind: RepositoryKind::Remote,
            path,
            remote_url: Some(url.to_string()),
            branch: None,
            created_at,
        })
    }

    /// Re-read the registry file and rebuild menus, as after `Complete`.
    pub(crate) fn reload(&mut self) {
        let registry = self.disk_registry();
        self.controller
            .update(SettingsMessage::RegistryLoaded(Ok(registry)));
    }

    pub(crate) fn disk_registry(&self) -> Registry {
        Registry::load(self.controller.registry.path()).unwrap()
    }

    /// Select `id` and open its actions menu.
    pub(crate) fn open_actions(&mut self, id: RepositoryId) {
        self.controller.selected_repository_id = Some(id);
        self.controller.reseed_actions();
        self.controller.state = SettingsState::RepositoryActions;
    }

    /// Open `id`'s actions and move the cursor to the action labelled `label`.
    pub(crate) fn choose_action(&mut self, id: RepositoryId, label: &str) {
        self.open_actions(id);
        let index = self
            .controller
            .actions_menu
            .items()
            .iter()
            .position(|a| a.label() == label)
            .unwrap_or_else(|| panic!("action {label} not offered"));
        self.controller.actions_menu.select(index);
        self.press(KeyCode::Enter);
    }

    pub(crate) fn press(&mut self, code: KeyCode) {
        let cmd = self.controller.update(key(code));
        self.pump(cmd);
    }

    /// Run commands inline until the chain ends.
    pub(crate) fn pump(&mut self, mut cmd: Option<Command>) {
        while let Some(c) = cmd {
            cmd = self.controller.update(c.run());
        }
    }

    pub(crate) fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// Replace the input's contents with `text`.
    pub(crate) fn retype(&mut self, text: &str) {
        self.controller.input.set("");
        self.type_text(text);
    }

    pub(crate) fn submit(&mut self, text: &str) {
        self.retype(text);
        self.press(KeyCode::Enter);
    }

    pub(crate) fn path_string(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    pub(crate) fn fresh_dir(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }
}
