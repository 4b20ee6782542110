use crossterm::event::KeyCode;
use tracing::{info, warn};
use zeroize::Zeroize;

use super::key_handlers::{list_key, ListKey};
use super::{
    ChangeKind, Command, Flow, MainMenuItem, RepositoryAction, SettingsController,
    SettingsMessage, SettingsState,
};
use crate::registry::{Registry, RepositoryKind};

impl SettingsController {
    pub(crate) fn main_menu_key(&mut self, code: KeyCode) -> Option<Command> {
        if code == KeyCode::Char('q') {
            self.should_quit = true;
            return None;
        }
        match list_key(&mut self.main_menu, code) {
            ListKey::Select => {}
            ListKey::Back => {
                self.should_quit = true;
                return None;
            }
            ListKey::Other => return None,
        }

        match self.main_menu.selected().copied() {
            Some(MainMenuItem::Repository(id)) => {
                self.reset_scratch();
                self.selected_repository_id = Some(id);
                self.reseed_actions();
                self.transition(SettingsState::RepositoryActions);
            }
            Some(MainMenuItem::AddRepository) => {
                self.reset_scratch();
                self.selected_repository_id = None;
                self.type_menu.select(0);
                self.transition(SettingsState::AddRepositoryType);
            }
            Some(MainMenuItem::UpdateToken) => {
                self.reset_scratch();
                self.selected_repository_id = None;
                self.change_kind = Some(ChangeKind::Token);
                self.enter_input(SettingsState::UpdateGitHubPat);
            }
            None => {}
        }
        None
    }

    pub(crate) fn add_type_key(&mut self, code: KeyCode) -> Option<Command> {
        match list_key(&mut self.type_menu, code) {
            ListKey::Select => match self.type_menu.selected().copied() {
                Some(RepositoryKind::Local) => {
                    self.change_kind = Some(ChangeKind::AddLocal);
                    self.enter_input(SettingsState::AddLocalName);
                }
                Some(RepositoryKind::Remote) => {
                    self.change_kind = Some(ChangeKind::AddRemote);
                    self.enter_input(SettingsState::AddRemoteName);
                }
                None => {}
            },
            ListKey::Back => self.back_to_main_menu(),
            ListKey::Other => {}
        }
        None
    }

    pub(crate) fn repository_actions_key(&mut self, code: KeyCode) -> Option<Command> {
        match list_key(&mut self.actions_menu, code) {
            ListKey::Select => {}
            ListKey::Back => {
                self.back_to_main_menu();
                return None;
            }
            ListKey::Other => return None,
        }

        if self.selected_entry().is_none() {
            warn!("Selected repository disappeared; returning to the main menu");
            self.back_to_main_menu();
            return None;
        }

        match self.actions_menu.selected().copied() {
            Some(RepositoryAction::EditBranch) => {
                self.change_kind = Some(ChangeKind::Branch);
                self.enter_input(SettingsState::UpdateGitHubBranch);
            }
            Some(RepositoryAction::EditClonePath) => {
                self.change_kind = Some(ChangeKind::Path);
                self.enter_input(SettingsState::UpdateGitHubPath);
            }
            Some(RepositoryAction::Rename) => {
                self.change_kind = Some(ChangeKind::Name);
                self.enter_input(SettingsState::UpdateRepoName);
            }
            Some(RepositoryAction::ManualRefresh) => {
                self.change_kind = Some(ChangeKind::Refresh);
                self.transition(SettingsState::ManualRefresh);
            }
            Some(RepositoryAction::Delete) => {
                self.change_kind = Some(ChangeKind::Delete);
                self.transition(SettingsState::ConfirmDelete);
            }
            Some(RepositoryAction::Back) => self.back_to_main_menu(),
            None => {}
        }
        None
    }

    pub(crate) fn back_to_main_menu(&mut self) {
        self.reset_scratch();
        self.selected_repository_id = None;
        self.transition(SettingsState::MainMenu);
    }

    /// Leave a per-repository flow, keeping the selection.
    pub(crate) fn back_to_actions(&mut self) {
        self.reset_scratch();
        self.reseed_actions();
        self.transition(SettingsState::RepositoryActions);
    }

    /// Any key on an error screen returns to where the flow started.
    pub(crate) fn dismiss_error(&mut self) {
        let Some(flow) = self.state.flow() else {
            return;
        };
        self.flow_error = None;
        match flow {
            // Scratch survives so the user can pick another clone path.
            Flow::AddRemote => {
                self.scratch.token.zeroize();
                self.enter_input(SettingsState::AddRemotePath);
            }
            Flow::Refresh => {
                self.last_refresh_error = None;
                self.back_to_actions();
            }
            flow if flow.is_per_repository() => self.back_to_actions(),
            _ => self.back_to_main_menu(),
        }
    }

    /// Reload the registry from disk; the result re-enters as `RegistryLoaded`.
    pub(crate) fn reload_registry(&self) -> Command {
        let path = self.registry.path().to_path_buf();
        Command::new(move || SettingsMessage::RegistryLoaded(Registry::load(&path)))
    }

    pub(crate) fn on_registry_loaded(&mut self, result: anyhow::Result<Registry>) {
        let reselect = self.selected_repository_id;
        let load_error = match result {
            Ok(registry) => {
                info!(
                    "Loaded {} repositories from {}",
                    registry.len(),
                    registry.path().display()
                );
                self.registry = registry;
                None
            }
            Err(e) => {
                warn!("Failed to reload registry: {e:#}");
                Some(format!("failed to reload registry: {e:#}"))
            }
        };

        self.in_flight = None;
        self.refresh_in_progress = false;
        self.reconcile();
        self.back_to_main_menu();

        if let Some(index) = reselect.and_then(|id| {
            self.main_menu
                .items()
                .iter()
                .position(|item| *item == MainMenuItem::Repository(id))
        }) {
            self.main_menu.select(index);
        }
        if let Some(message) = load_error {
            self.layout.set_error(message);
        }
    }
}
