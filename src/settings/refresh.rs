use crossterm::event::KeyCode;
use tracing::info;

use super::key_handlers::{confirm_key, ConfirmKey};
use super::{Command, Flow, SettingsController, SettingsError, SettingsMessage, SettingsState};
use crate::git::GitSource;

impl SettingsController {
    pub(crate) fn manual_refresh_key(&mut self, code: KeyCode) -> Option<Command> {
        match confirm_key(code) {
            ConfirmKey::Yes => match self.dirty_check(SettingsMessage::RefreshDirtyChecked) {
                Some(cmd) => {
                    self.in_flight = Some(Flow::Refresh);
                    Some(cmd)
                }
                None => self.fail(
                    Flow::Refresh,
                    SettingsError::Validation("repository no longer exists".into()),
                ),
            },
            ConfirmKey::No => {
                self.back_to_actions();
                None
            }
            ConfirmKey::Other => None,
        }
    }

    pub(crate) fn on_refresh_dirty_checked(
        &mut self,
        result: anyhow::Result<bool>,
    ) -> Option<Command> {
        match result {
            Ok(false) => self.start_refresh(),
            Ok(true) => {
                self.is_dirty = true;
                let name = self.selected_entry().map(|e| e.name.clone()).unwrap_or_default();
                self.fail(Flow::Refresh, SettingsError::uncommitted_changes(&name))
            }
            Err(e) => self.fail(Flow::Refresh, SettingsError::dirty_check_failed(&e)),
        }
    }

    fn start_refresh(&mut self) -> Option<Command> {
        let Some(entry) = self.selected_entry().cloned() else {
            return self.fail(
                Flow::Refresh,
                SettingsError::Validation("repository no longer exists".into()),
            );
        };

        info!("Refreshing {} from {}", entry.name, entry.branch_label());
        self.is_dirty = false;
        self.refresh_in_progress = true;
        self.last_refresh_error = None;
        self.transition(SettingsState::RefreshInProgress);
        self.in_flight = Some(Flow::Refresh);

        let git = self.git.clone();
        let credentials = self.credentials.clone();
        Some(Command::new(move || {
            let token = Self::stored_token(credentials.as_ref());
            let result = match GitSource::for_entry(&entry, token) {
                Some(source) => git.fetch_updates(&source),
                None => Err(anyhow::anyhow!("{} is not a remote repository", entry.name)),
            };
            SettingsMessage::RefreshCompleted(result)
        }))
    }

    pub(crate) fn on_refresh_completed(&mut self, result: anyhow::Result<()>) -> Option<Command> {
        self.refresh_in_progress = false;
        match result {
            Ok(()) => {
                info!("Refresh finished");
                self.last_refresh_error = None;
                self.reconcile();
                self.back_to_main_menu();
                None
            }
            Err(e) => {
                self.last_refresh_error = Some(format!("{e:#}"));
                self.fail(Flow::Refresh, SettingsError::remote_check("refresh failed", &e))
            }
        }
    }
}
