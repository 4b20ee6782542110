//! Add Remote: name, URL, branch and clone path, then an optional token step.

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, info};
use zeroize::Zeroize;

use super::key_handlers::InputKey;
use super::{
    validation, Command, Flow, SettingsController, SettingsError, SettingsMessage, SettingsState,
};
use crate::git;
use crate::prepare::PrepareError;
use crate::registry::{Registry, RepositoryEntry, RepositoryKind};

impl SettingsController {
    pub(crate) fn add_remote_name_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.reset_scratch();
                self.transition(SettingsState::AddRepositoryType);
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        match validation::validate_name(&self.registry, self.input.value(), None) {
            Ok(name) => {
                self.scratch.name = name;
                self.has_changes = true;
                self.enter_input(SettingsState::AddRemoteUrl);
                None
            }
            Err(e) => self.reject_input(e),
        }
    }

    pub(crate) fn add_remote_url_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.scratch.url.clear();
                self.enter_input(SettingsState::AddRemoteName);
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        match validation::validate_url(&self.registry, self.input.value()) {
            Ok(url) => {
                self.scratch.url = url;
                self.enter_input(SettingsState::AddRemoteBranch);
                None
            }
            Err(e) => self.reject_input(e),
        }
    }

    pub(crate) fn add_remote_branch_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.scratch.branch.clear();
                self.enter_input(SettingsState::AddRemoteUrl);
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        match validation::validate_branch(self.input.value()) {
            Ok(branch) => {
                self.scratch.branch = branch.unwrap_or_default();
                self.enter_input(SettingsState::AddRemotePath);
                None
            }
            Err(e) => self.reject_input(e),
        }
    }

    pub(crate) fn add_remote_path_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, true) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.scratch.path = None;
                self.enter_input(SettingsState::AddRemoteBranch);
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        // An empty submit accepts the suggested `<clone_root>/<name>`.
        let raw = match self.input.value() {
            "" => self
                .default_clone_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            typed => typed.to_string(),
        };

        let path = match validation::validate_path(&self.registry, &raw, None)
            .and_then(|path| validation::require_empty_target(&path).map(|()| path))
        {
            Ok(path) => path,
            Err(e) => return self.reject_input(e),
        };

        self.scratch.path = Some(path);
        Some(self.create_remote())
    }

    /// Look up the stored token and check it against the new URL.
    fn create_remote(&mut self) -> Command {
        self.in_flight = Some(Flow::AddRemote);
        let credentials = self.credentials.clone();
        let url = self.scratch.url.clone();

        Command::new(move || {
            if !git::uses_token(&url) {
                return SettingsMessage::AddRemoteTokenReady(None);
            }
            match credentials.get() {
                Ok(None) => SettingsMessage::AddRemoteTokenNeeded(None),
                Ok(Some(token)) => match credentials.validate_token_against_url(&token, &url) {
                    Ok(()) => SettingsMessage::AddRemoteTokenReady(Some(token)),
                    Err(e) => SettingsMessage::AddRemoteTokenNeeded(Some(format!(
                        "stored token was rejected for {url}: {e:#}"
                    ))),
                },
                Err(e) => SettingsMessage::AddRemoteFailed(SettingsError::remote_check(
                    "failed to read stored token",
                    &e,
                )),
            }
        })
    }

    pub(crate) fn on_add_remote_token_needed(&mut self, reason: Option<String>) -> Option<Command> {
        debug!("No usable token for {}", self.scratch.url);
        self.enter_input(SettingsState::AddRemoteToken);
        if let Some(reason) = reason {
            self.layout.set_error(reason);
        }
        None
    }

    pub(crate) fn on_add_remote_token_ready(&mut self, token: Option<String>) -> Option<Command> {
        if let Some(token) = token {
            self.scratch.set_token(token);
        }
        self.create_remote_with_token()
    }

    pub(crate) fn add_remote_token_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.scratch.token.zeroize();
                self.enter_input(SettingsState::AddRemotePath);
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        if let Err(e) = self.credentials.validate_token_format(self.input.value()) {
            return self.reject_input(SettingsError::Validation(format!("invalid token: {e:#}")));
        }

        let token = self.take_input();
        self.scratch.set_token(token);
        self.in_flight = Some(Flow::AddRemote);
        let credentials = self.credentials.clone();
        let url = self.scratch.url.clone();
        let token = self.scratch.token.clone();

        Some(Command::new(move || {
            let result = credentials
                .validate_token_against_url(&token, &url)
                .map_err(|e| SettingsError::remote_check(&format!("token rejected for {url}"), &e))
                .and_then(|()| {
                    credentials
                        .store(&token)
                        .map_err(|e| SettingsError::persistence("failed to store token", &e))
                });
            let mut token = token;
            token.zeroize();
            SettingsMessage::AddRemoteTokenValidated(result)
        }))
    }

    pub(crate) fn on_add_remote_token_validated(
        &mut self,
        result: Result<(), SettingsError>,
    ) -> Option<Command> {
        match result {
            Ok(()) => {
                info!("Stored access token for {}", self.scratch.url);
                self.create_remote_with_token()
            }
            Err(e) => self.fail(Flow::AddRemote, e),
        }
    }

    /// Append the new entry, persist, and rebuild. The token has been stored
    /// or found by now.
    fn create_remote_with_token(&mut self) -> Option<Command> {
        let Some(path) = self.scratch.path.clone() else {
            return self.fail(
                Flow::AddRemote,
                SettingsError::Validation("no clone path entered".into()),
            );
        };
        let name = self.scratch.name.clone();
        let url = self.scratch.url.clone();
        let created_at = self.registry.next_created_at();
        let entry = RepositoryEntry {
            id: Registry::generate_id(&name, created_at),
            name: name.clone(),
            kind: RepositoryKind::Remote,
            path,
            remote_url: Some(url.clone()),
            branch: (!self.scratch.branch.is_empty()).then(|| self.scratch.branch.clone()),
            created_at,
        };

        let snapshot = match self.commit(|registry| {
            registry.append(entry);
            Ok(())
        }) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(Flow::AddRemote, e),
        };

        if let Err(e) = self.reconcile_created(&name) {
            self.roll_back(snapshot);
            let message = match e {
                PrepareError::ForeignRepository { .. } => format!(
                    "directory contains a different git repository than {url}; choose another clone path"
                ),
                other => other.to_string(),
            };
            return self.fail(Flow::AddRemote, SettingsError::Reconciliation(message));
        }

        self.finish_complete(&format!("Added remote repository {name} ({url})"));
        None
    }
}
