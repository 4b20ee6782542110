//! Key routing for the settings screen.
//!
//! One handler per state. Lists, text inputs and confirmations share the
//! small decoders at the bottom of this file.

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, info};

use super::{Command, SettingsController, SettingsState};
use crate::paths;
use crate::ui::list::SelectList;

pub(crate) enum InputKey {
    Submit,
    Back,
    Edited,
    Ignored,
}

pub(crate) enum ConfirmKey {
    Yes,
    No,
    Other,
}

pub(crate) enum ListKey {
    Select,
    Back,
    Other,
}

impl SettingsController {
    /// Route a key press to the handler of the current state.
    pub(crate) fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers) -> Option<Command> {
        use SettingsState::*;

        if self.state == RefreshInProgress {
            if code == KeyCode::Esc {
                info!("Refresh cancellation requested; a running refresh cannot be cancelled");
            }
            return None;
        }

        if let Some(flow) = self.in_flight {
            if self.state.flow() == Some(flow) {
                debug!("Ignoring {code:?} while a {flow:?} command is running");
                return None;
            }
        }

        match self.state {
            MainMenu => self.main_menu_key(code),
            RepositoryActions => self.repository_actions_key(code),
            AddRepositoryType => self.add_type_key(code),

            AddLocalName => self.add_local_name_key(code, mods),
            AddLocalPath => self.add_local_path_key(code, mods),

            AddRemoteName => self.add_remote_name_key(code, mods),
            AddRemoteUrl => self.add_remote_url_key(code, mods),
            AddRemoteBranch => self.add_remote_branch_key(code, mods),
            AddRemotePath => self.add_remote_path_key(code, mods),
            AddRemoteToken => self.add_remote_token_key(code, mods),

            UpdateRepoName => self.rename_input_key(code, mods),
            EditNameConfirm => self.rename_confirm_key(code),

            UpdateGitHubBranch => self.edit_branch_input_key(code, mods),
            EditBranchConfirm => self.edit_branch_confirm_key(code),

            UpdateGitHubPath => self.edit_path_input_key(code, mods),
            EditClonePathConfirm => self.edit_path_confirm_key(code),

            ManualRefresh => self.manual_refresh_key(code),
            RefreshInProgress => None,

            ConfirmDelete => self.confirm_delete_key(code),

            UpdateGitHubPat => self.update_token_input_key(code, mods),
            UpdatePatConfirm => self.update_token_confirm_key(code),

            AddLocalError | AddRemoteError | EditNameError | EditBranchError
            | EditClonePathError | RefreshError | DeleteError | UpdatePatError => {
                self.dismiss_error();
                None
            }

            Complete => Some(self.reload_registry()),
        }
    }

    /// Apply an editing key to the shared input.
    pub(crate) fn edit_input(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
        complete_paths: bool,
    ) -> InputKey {
        match code {
            KeyCode::Enter => return InputKey::Submit,
            KeyCode::Esc => return InputKey::Back,
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.home(),
            KeyCode::End => self.input.end(),
            KeyCode::Tab if complete_paths => {
                if let Some(suffix) = paths::complete_directory_path(self.input.value()) {
                    self.input.end();
                    self.input.insert_str(&suffix);
                }
            }
            KeyCode::Char(c)
                if !mods.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.insert(c)
            }
            _ => return InputKey::Ignored,
        }
        self.layout.clear_error();
        InputKey::Edited
    }

    /// Take the typed value out of the input, wiping its buffer.
    pub(crate) fn take_input(&mut self) -> String {
        let value = self.input.value().to_string();
        self.input.clear();
        value
    }
}

pub(crate) fn confirm_key(code: KeyCode) -> ConfirmKey {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => ConfirmKey::Yes,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => ConfirmKey::No,
        _ => ConfirmKey::Other,
    }
}

/// Navigate `list`; report selection and back.
pub(crate) fn list_key<T>(list: &mut SelectList<T>, code: KeyCode) -> ListKey {
    match code {
        KeyCode::Up | KeyCode::Char('k') => list.move_up(),
        KeyCode::Down | KeyCode::Char('j') => list.move_down(),
        KeyCode::Enter => return ListKey::Select,
        KeyCode::Esc => return ListKey::Back,
        _ => {}
    }
    ListKey::Other
}
