//! Settings screen controller.
//!
//! The controller is a state machine over [`SettingsState`]. Every state other
//! than `MainMenu` and `Complete` belongs to exactly one [`Flow`], and every
//! asynchronous result comes back as a message scoped to the flow that asked
//! for it. [`SettingsController::update`] is the single entry point: it takes a
//! message and optionally returns a [`Command`] for the host to run on a
//! worker thread.

mod add_local;
mod add_remote;
mod delete;
mod dirty_check;
mod edit_branch;
mod edit_path;
mod error;
mod key_handlers;
mod message;
mod navigation;
mod refresh;
mod rename;
pub mod state;
mod token;
pub mod validation;
mod view;

#[cfg(test)]
mod test_support;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, error, info, warn};
use zeroize::Zeroize;

use crate::config::AppConfig;
use crate::credentials::CredentialManager;
use crate::git::GitBackend;
use crate::prepare::{self, PrepareError, PreparedRepository};
use crate::registry::{Registry, RepositoryEntry, RepositoryId, RepositoryKind};
use crate::ui::input::{EchoMode, TextInput};
use crate::ui::layout::ScreenLayout;
use crate::ui::list::SelectList;

pub use error::{ErrorKind, SettingsError};
pub use message::SettingsMessage;
pub use state::{can_transition, SettingsState};

/// A group of states forming one linear interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    MainMenu,
    RepositoryActions,
    AddLocal,
    AddRemote,
    UpdateToken,
    Rename,
    EditBranch,
    EditPath,
    Refresh,
    Delete,
}

/// Deferred work that produces exactly one message when run.
pub struct Command(Box<dyn FnOnce() -> SettingsMessage + Send>);

impl Command {
    pub fn new(f: impl FnOnce() -> SettingsMessage + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn run(self) -> SettingsMessage {
        (self.0)()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Command(..)")
    }
}

/// Which edit is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Name,
    Branch,
    Path,
    Refresh,
    Delete,
    Token,
    AddLocal,
    AddRemote,
}

/// Values entered during the current flow.
#[derive(Debug, Default)]
pub struct Scratch {
    pub name: String,
    pub path: Option<PathBuf>,
    pub url: String,
    /// Empty means the remote's default branch.
    pub branch: String,
    pub token: String,
}

impl Scratch {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.path.is_none()
            && self.url.is_empty()
            && self.branch.is_empty()
            && self.token.is_empty()
    }

    /// Replace the token, wiping the previous one.
    pub fn set_token(&mut self, token: String) {
        self.token.zeroize();
        self.token = token;
    }

    fn wipe(&mut self) {
        self.token.zeroize();
        self.name.clear();
        self.path = None;
        self.url.clear();
        self.branch.clear();
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMenuItem {
    Repository(RepositoryId),
    AddRepository,
    UpdateToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryAction {
    EditBranch,
    EditClonePath,
    Rename,
    ManualRefresh,
    Delete,
    Back,
}

impl RepositoryAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::EditBranch => "Edit Branch",
            Self::EditClonePath => "Edit Clone Path",
            Self::Rename => "Rename",
            Self::ManualRefresh => "Manual Refresh",
            Self::Delete => "Delete",
            Self::Back => "Back",
        }
    }

    /// Actions offered for an entry of `kind` in a registry of `count` entries.
    pub fn for_entry(kind: RepositoryKind, count: usize) -> Vec<RepositoryAction> {
        let mut actions = match kind {
            RepositoryKind::Local => vec![Self::Rename],
            RepositoryKind::Remote => vec![
                Self::EditBranch,
                Self::EditClonePath,
                Self::Rename,
                Self::ManualRefresh,
            ],
        };
        if count >= 2 {
            actions.push(Self::Delete);
        }
        actions.push(Self::Back);
        actions
    }
}

pub struct SettingsController {
    registry: Registry,
    git: Arc<dyn GitBackend>,
    credentials: Arc<dyn CredentialManager>,
    clone_root: Option<PathBuf>,

    state: SettingsState,
    previous_state: Option<SettingsState>,
    selected_repository_id: Option<RepositoryId>,
    change_kind: Option<ChangeKind>,
    scratch: Scratch,
    has_changes: bool,
    is_dirty: bool,
    refresh_in_progress: bool,
    last_refresh_error: Option<String>,
    in_flight: Option<Flow>,
    flow_error: Option<SettingsError>,

    layout: ScreenLayout,
    prepared: Vec<PreparedRepository>,
    main_menu: SelectList<MainMenuItem>,
    actions_menu: SelectList<RepositoryAction>,
    type_menu: SelectList<RepositoryKind>,
    input: TextInput,
    rebuild_count: u64,
    viewport: (u16, u16),
    should_quit: bool,
}

impl SettingsController {
    pub fn new(
        registry: Registry,
        git: Arc<dyn GitBackend>,
        credentials: Arc<dyn CredentialManager>,
        config: &AppConfig,
    ) -> Self {
        let prepared = match prepare::prepare_repositories(registry.entries(), git.as_ref()) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("Failed to prepare repositories: {e}");
                prepare::unchecked(registry.entries())
            }
        };

        let mut controller = Self {
            registry,
            git,
            credentials,
            clone_root: config.clone_root(),
            state: SettingsState::MainMenu,
            previous_state: None,
            selected_repository_id: None,
            change_kind: None,
            scratch: Scratch::default(),
            has_changes: false,
            is_dirty: false,
            refresh_in_progress: false,
            last_refresh_error: None,
            in_flight: None,
            flow_error: None,
            layout: ScreenLayout::default(),
            prepared,
            main_menu: SelectList::default(),
            actions_menu: SelectList::default(),
            type_menu: SelectList::new(vec![RepositoryKind::Local, RepositoryKind::Remote]),
            input: TextInput::new(),
            rebuild_count: 0,
            viewport: (0, 0),
            should_quit: false,
        };
        controller.reseed_menus();
        controller
    }

    /// Feed one message through the state machine.
    pub fn update(&mut self, msg: SettingsMessage) -> Option<Command> {
        match msg {
            SettingsMessage::KeyPress(KeyCode::Char('c'), mods)
                if mods.contains(KeyModifiers::CONTROL) =>
            {
                self.should_quit = true;
                None
            }
            SettingsMessage::KeyPress(code, mods) => self.handle_key(code, mods),
            SettingsMessage::Resize(cols, rows) => {
                self.viewport = (cols, rows);
                None
            }
            SettingsMessage::RegistryLoaded(result) => {
                self.on_registry_loaded(result);
                None
            }
            SettingsMessage::BranchFetched(result) => {
                match result {
                    Ok(()) => info!("Fetched updated branch"),
                    Err(e) => warn!("Background fetch after branch edit failed: {e:#}"),
                }
                None
            }
            msg => self.route(msg),
        }
    }

    fn route(&mut self, msg: SettingsMessage) -> Option<Command> {
        let flow = msg.flow()?;
        if self.in_flight == Some(flow) {
            self.in_flight = None;
        }
        if self.state.flow() != Some(flow) {
            debug!(
                "Dropping {} for {flow:?} while in {:?}",
                msg.name(),
                self.state
            );
            let mut msg = msg;
            msg.zeroize_secrets();
            return None;
        }

        use SettingsMessage::*;
        match msg {
            EditBranchDirtyChecked(result) => self.on_edit_branch_dirty_checked(result),
            BranchVerified(result) => self.on_branch_verified(result),
            EditPathDirtyChecked(result) => self.on_edit_path_dirty_checked(result),
            RefreshDirtyChecked(result) => self.on_refresh_dirty_checked(result),
            RefreshCompleted(result) => self.on_refresh_completed(result),
            DeleteDirtyChecked(result) => self.on_delete_dirty_checked(result),
            AddRemoteTokenNeeded(reason) => self.on_add_remote_token_needed(reason),
            AddRemoteTokenReady(token) => self.on_add_remote_token_ready(token),
            AddRemoteFailed(err) => self.fail(Flow::AddRemote, err),
            AddRemoteTokenValidated(result) => self.on_add_remote_token_validated(result),
            UpdateTokenValidated(result) => self.on_update_token_validated(result),
            UpdateTokenRevalidated(result) => self.on_update_token_revalidated(result),
            KeyPress(..) | Resize(..) | RegistryLoaded(_) | BranchFetched(_) => None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn state(&self) -> SettingsState {
        self.state
    }

    pub fn previous_state(&self) -> Option<SettingsState> {
        self.previous_state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn selected_repository_id(&self) -> Option<RepositoryId> {
        self.selected_repository_id
    }

    pub fn change_kind(&self) -> Option<ChangeKind> {
        self.change_kind
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn refresh_in_progress(&self) -> bool {
        self.refresh_in_progress
    }

    pub fn last_refresh_error(&self) -> Option<&str> {
        self.last_refresh_error.as_deref()
    }

    /// The error shown by the current error state.
    pub fn flow_error(&self) -> Option<&SettingsError> {
        self.flow_error.as_ref()
    }

    /// The inline error of the current input screen.
    pub fn inline_error(&self) -> Option<&str> {
        self.layout.error()
    }

    pub fn prepared(&self) -> &[PreparedRepository] {
        &self.prepared
    }

    pub fn main_menu(&self) -> &SelectList<MainMenuItem> {
        &self.main_menu
    }

    pub fn actions_menu(&self) -> &SelectList<RepositoryAction> {
        &self.actions_menu
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    /// How many times the repository list has been rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    pub fn viewport(&self) -> (u16, u16) {
        self.viewport
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    fn transition(&mut self, to: SettingsState) {
        if !can_transition(self.state, to) {
            warn!("Transition {:?} -> {to:?} leaves the flow map", self.state);
        }
        if to != self.state {
            self.previous_state = Some(self.state);
        }
        self.state = to;
        self.layout.clear_error();
        self.input.blur();
    }

    /// Move to an input state, configuring the shared text input for it.
    fn enter_input(&mut self, to: SettingsState) {
        let (placeholder, limit, echo) = self.input_config(to);
        let prefill = self.input_prefill(to);
        self.transition(to);
        self.input.configure(&placeholder, limit, echo);
        self.input.set(&prefill);
        self.input.focus();
    }

    fn input_config(&self, state: SettingsState) -> (String, Option<usize>, EchoMode) {
        use SettingsState::*;
        let name_limit = Some(validation::MAX_NAME_LEN);
        match state {
            AddLocalName | AddRemoteName | UpdateRepoName => {
                ("team-rules".into(), name_limit, EchoMode::Normal)
            }
            AddLocalPath => ("~/rules".into(), None, EchoMode::Normal),
            AddRemoteUrl => (
                "https://github.com/org/rules".into(),
                None,
                EchoMode::Normal,
            ),
            AddRemoteBranch | UpdateGitHubBranch => {
                ("default branch".into(), None, EchoMode::Normal)
            }
            AddRemotePath | UpdateGitHubPath => (
                self.default_clone_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "/path/to/clone".into()),
                None,
                EchoMode::Normal,
            ),
            AddRemoteToken | UpdateGitHubPat => ("ghp_…".into(), None, EchoMode::Password),
            _ => (String::new(), None, EchoMode::Normal),
        }
    }

    /// Pre-filled text: the scratch value once the flow has one, else the
    /// selected entry's current value.
    fn input_prefill(&self, state: SettingsState) -> String {
        use SettingsState::*;
        let entry = self.selected_entry();
        let scratch_path = self
            .scratch
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match state {
            AddLocalName | AddRemoteName => self.scratch.name.clone(),
            AddLocalPath | AddRemotePath => scratch_path,
            AddRemoteUrl => self.scratch.url.clone(),
            AddRemoteBranch => self.scratch.branch.clone(),
            UpdateRepoName if self.has_changes => self.scratch.name.clone(),
            UpdateRepoName => entry.map(|e| e.name.clone()).unwrap_or_default(),
            UpdateGitHubBranch if self.has_changes => self.scratch.branch.clone(),
            UpdateGitHubBranch => entry.and_then(|e| e.branch.clone()).unwrap_or_default(),
            UpdateGitHubPath if self.has_changes => scratch_path,
            UpdateGitHubPath => entry
                .map(|e| e.path.display().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// `<clone_root>/<name>` for the repository being added.
    fn default_clone_path(&self) -> Option<PathBuf> {
        let root = self.clone_root.as_ref()?;
        let name = if self.scratch.name.is_empty() {
            self.selected_entry()?.name.clone()
        } else {
            self.scratch.name.clone()
        };
        Some(root.join(name))
    }

    /// Empty every scratch field and the per-flow flags.
    pub fn reset_scratch(&mut self) {
        self.scratch.wipe();
        self.input.clear();
        self.has_changes = false;
        self.is_dirty = false;
        self.change_kind = None;
        self.flow_error = None;
        self.layout.clear_error();
    }

    /// End `flow` in its error state.
    fn fail(&mut self, flow: Flow, err: SettingsError) -> Option<Command> {
        match err.kind() {
            ErrorKind::Persistence => error!("{flow:?} failed: {err}"),
            _ => warn!("{flow:?} failed: {err}"),
        }
        self.in_flight = None;
        match flow.error_state() {
            Some(error_state) => {
                self.transition(error_state);
                self.flow_error = Some(err);
            }
            None => self.layout.set_error(err.to_string()),
        }
        None
    }

    /// Show a validation failure on the current input screen.
    fn reject_input(&mut self, err: SettingsError) -> Option<Command> {
        debug!("Rejected input in {:?}: {err}", self.state);
        self.layout.set_error(err.to_string());
        None
    }

    fn finish_complete(&mut self, summary: &str) {
        info!("{summary}");
        self.reset_scratch();
        self.in_flight = None;
        self.transition(SettingsState::Complete);
    }

    fn selected_entry(&self) -> Option<&RepositoryEntry> {
        self.registry.find_by_id(self.selected_repository_id?)
    }

    // ── Mutation & reconciliation ───────────────────────────────────────────

    /// Mutate the registry and save it. Returns the pre-mutation snapshot; on
    /// any failure the snapshot is restored so memory matches disk.
    fn commit<F>(&mut self, mutate: F) -> Result<Registry, SettingsError>
    where
        F: FnOnce(&mut Registry) -> Result<(), SettingsError>,
    {
        let snapshot = self.registry.clone();
        if let Err(e) = mutate(&mut self.registry) {
            self.registry = snapshot;
            return Err(e);
        }
        if let Err(e) = self.registry.persist() {
            error!(
                "Failed to save registry to {}: {e:#}",
                self.registry.path().display()
            );
            self.registry = snapshot;
            return Err(SettingsError::persistence("failed to save registry", &e));
        }
        Ok(snapshot)
    }

    /// Undo a committed creation whose list could not be prepared.
    fn roll_back(&mut self, snapshot: Registry) {
        self.registry = snapshot;
        if let Err(e) = self.registry.persist() {
            error!("Failed to roll back registry: {e:#}");
        }
    }

    /// Rebuild the list after appending the entry named `created`. Only a
    /// failure to prepare that entry is reported; failures on older entries
    /// fall back to the undecorated list.
    fn reconcile_created(&mut self, created: &str) -> Result<(), PrepareError> {
        match prepare::prepare_repositories(self.registry.entries(), self.git.as_ref()) {
            Ok(prepared) => self.install_prepared(prepared),
            Err(e) if e.entry_name() == created => return Err(e),
            Err(e) => {
                warn!("Failed to prepare existing repository after adding {created}: {e}");
                self.install_prepared(prepare::unchecked(self.registry.entries()));
            }
        }
        Ok(())
    }

    /// Rebuild the list, falling back to undecorated entries after an edit.
    fn reconcile(&mut self) {
        match prepare::prepare_repositories(self.registry.entries(), self.git.as_ref()) {
            Ok(prepared) => self.install_prepared(prepared),
            Err(e) => {
                warn!("Failed to prepare repositories after edit: {e}");
                self.install_prepared(prepare::unchecked(self.registry.entries()));
            }
        }
    }

    fn install_prepared(&mut self, prepared: Vec<PreparedRepository>) {
        self.prepared = prepared;
        self.reseed_menus();
        self.rebuild_count += 1;
    }

    /// Re-seed the main menu and, if an entry is selected, its actions.
    fn reseed_menus(&mut self) {
        let mut items: Vec<MainMenuItem> = self
            .prepared
            .iter()
            .map(|p| MainMenuItem::Repository(p.id))
            .collect();
        items.push(MainMenuItem::AddRepository);
        items.push(MainMenuItem::UpdateToken);
        self.main_menu.set_items(items);
        self.reseed_actions();
    }

    fn reseed_actions(&mut self) {
        let actions = match self.selected_entry() {
            Some(entry) => RepositoryAction::for_entry(entry.kind, self.registry.len()),
            None => Vec::new(),
        };
        self.actions_menu = SelectList::new(actions);
    }

    /// The stored token, or `None` when absent or unreadable. Runs on workers.
    fn stored_token(credentials: &dyn CredentialManager) -> Option<String> {
        match credentials.get() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored token: {e:#}");
                None
            }
        }
    }
}
