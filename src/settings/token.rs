//! Update Token: replace the access token shared by every remote.

use crossterm::event::{KeyCode, KeyModifiers};
use zeroize::Zeroize;

use super::key_handlers::{confirm_key, ConfirmKey, InputKey};
use super::{Command, Flow, SettingsController, SettingsError, SettingsMessage, SettingsState};
use crate::registry::RepositoryEntry;

impl SettingsController {
    pub(crate) fn update_token_input_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.back_to_main_menu();
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        if let Err(e) = self.credentials.validate_token_format(self.input.value()) {
            self.input.clear();
            return self.fail(
                Flow::UpdateToken,
                SettingsError::Validation(format!("invalid token: {e:#}")),
            );
        }

        let token = self.take_input();
        self.scratch.set_token(token);
        self.has_changes = true;
        Some(self.validate_token(SettingsMessage::UpdateTokenValidated, false))
    }

    pub(crate) fn on_update_token_validated(
        &mut self,
        result: Result<(), SettingsError>,
    ) -> Option<Command> {
        match result {
            Ok(()) => {
                self.transition(SettingsState::UpdatePatConfirm);
                None
            }
            Err(e) => {
                self.scratch.token.zeroize();
                self.fail(Flow::UpdateToken, e)
            }
        }
    }

    pub(crate) fn update_token_confirm_key(&mut self, code: KeyCode) -> Option<Command> {
        match confirm_key(code) {
            ConfirmKey::Yes => Some(
                self.validate_token(SettingsMessage::UpdateTokenRevalidated, true),
            ),
            ConfirmKey::No => {
                self.scratch.token.zeroize();
                self.enter_input(SettingsState::UpdateGitHubPat);
                None
            }
            ConfirmKey::Other => None,
        }
    }

    pub(crate) fn on_update_token_revalidated(
        &mut self,
        result: Result<(), SettingsError>,
    ) -> Option<Command> {
        match result {
            Ok(()) => {
                self.reconcile();
                self.finish_complete("Updated access token");
                None
            }
            Err(e) => {
                self.scratch.token.zeroize();
                self.fail(Flow::UpdateToken, e)
            }
        }
    }

    /// Probe the scratch token against every remote, storing it after a clean
    /// pass when `store` is set.
    fn validate_token<F>(&mut self, done: F, store: bool) -> Command
    where
        F: FnOnce(Result<(), SettingsError>) -> SettingsMessage + Send + 'static,
    {
        self.in_flight = Some(Flow::UpdateToken);
        let credentials = self.credentials.clone();
        let remotes: Vec<RepositoryEntry> = self.registry.remotes().cloned().collect();
        let token = self.scratch.token.clone();

        Command::new(move || {
            let mut token = token;
            let mut result = credentials
                .validate_token_against_entries(&token, &remotes)
                .map_err(|e| SettingsError::RemoteCheck(format!("{e:#}")));
            if store && result.is_ok() {
                result = credentials
                    .store(&token)
                    .map_err(|e| SettingsError::persistence("failed to store token", &e));
            }
            token.zeroize();
            done(result)
        })
    }
}
