use crossterm::event::{KeyCode, KeyModifiers};

use super::key_handlers::{confirm_key, ConfirmKey, InputKey};
use super::{validation, Command, Flow, SettingsController, SettingsError, SettingsState};

impl SettingsController {
    pub(crate) fn rename_input_key(&mut self, code: KeyCode, mods: KeyModifiers) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.back_to_actions();
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        let editing = self.selected_repository_id;
        match validation::validate_name(&self.registry, self.input.value(), editing) {
            Ok(name) => {
                self.scratch.name = name;
                self.has_changes = true;
                self.transition(SettingsState::EditNameConfirm);
                None
            }
            Err(e) => self.reject_input(e),
        }
    }

    pub(crate) fn rename_confirm_key(&mut self, code: KeyCode) -> Option<Command> {
        match confirm_key(code) {
            ConfirmKey::Yes => self.apply_rename(),
            ConfirmKey::No => {
                self.enter_input(SettingsState::UpdateRepoName);
                None
            }
            ConfirmKey::Other => None,
        }
    }

    fn apply_rename(&mut self) -> Option<Command> {
        let Some(id) = self.selected_repository_id else {
            return self.fail(
                Flow::Rename,
                SettingsError::Validation("no repository selected".into()),
            );
        };

        // The registry may have changed since the name was typed.
        let name = match validation::validate_name(&self.registry, &self.scratch.name, Some(id)) {
            Ok(name) => name,
            Err(e) => return self.fail(Flow::Rename, e),
        };

        let new_name = name.clone();
        let result = self.commit(move |registry| {
            let entry = registry
                .find_by_id_mut(id)
                .ok_or_else(|| SettingsError::Validation("repository no longer exists".into()))?;
            entry.name = new_name;
            Ok(())
        });
        if let Err(e) = result {
            return self.fail(Flow::Rename, e);
        }

        self.reconcile();
        self.finish_complete(&format!("Renamed repository to {name}"));
        None
    }
}
