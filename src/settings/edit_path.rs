use crossterm::event::{KeyCode, KeyModifiers};

use super::key_handlers::{confirm_key, ConfirmKey, InputKey};
use super::{
    validation, Command, Flow, SettingsController, SettingsError, SettingsMessage, SettingsState,
};

impl SettingsController {
    pub(crate) fn edit_path_input_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, true) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.back_to_actions();
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        let editing = self.selected_repository_id;
        let path = match validation::validate_path(&self.registry, self.input.value(), editing) {
            Ok(path) => path,
            Err(e) => return self.reject_input(e),
        };
        self.scratch.path = Some(path);
        self.has_changes = true;

        // Checked against the current clone, which is what gets abandoned.
        match self.dirty_check(SettingsMessage::EditPathDirtyChecked) {
            Some(cmd) => {
                self.in_flight = Some(Flow::EditPath);
                Some(cmd)
            }
            None => self.fail(
                Flow::EditPath,
                SettingsError::Validation("repository no longer exists".into()),
            ),
        }
    }

    pub(crate) fn on_edit_path_dirty_checked(
        &mut self,
        result: anyhow::Result<bool>,
    ) -> Option<Command> {
        match result {
            Ok(false) => {
                self.is_dirty = false;
                self.transition(SettingsState::EditClonePathConfirm);
                None
            }
            Ok(true) => {
                self.is_dirty = true;
                let name = self.selected_entry().map(|e| e.name.clone()).unwrap_or_default();
                self.fail(Flow::EditPath, SettingsError::uncommitted_changes(&name))
            }
            Err(e) => self.fail(Flow::EditPath, SettingsError::dirty_check_failed(&e)),
        }
    }

    pub(crate) fn edit_path_confirm_key(&mut self, code: KeyCode) -> Option<Command> {
        match confirm_key(code) {
            ConfirmKey::Yes => self.apply_path(),
            ConfirmKey::No => {
                self.enter_input(SettingsState::UpdateGitHubPath);
                None
            }
            ConfirmKey::Other => None,
        }
    }

    /// Point the entry at the new directory. The old clone stays on disk.
    fn apply_path(&mut self) -> Option<Command> {
        let (Some(id), Some(path)) = (self.selected_repository_id, self.scratch.path.clone()) else {
            return self.fail(
                Flow::EditPath,
                SettingsError::Validation("no repository or path selected".into()),
            );
        };

        let new_path = path.clone();
        let result = self.commit(move |registry| {
            let entry = registry
                .find_by_id_mut(id)
                .ok_or_else(|| SettingsError::Validation("repository no longer exists".into()))?;
            entry.path = new_path;
            Ok(())
        });
        if let Err(e) = result {
            return self.fail(Flow::EditPath, e);
        }

        self.reconcile();
        self.finish_complete(&format!("Moved clone path to {}", path.display()));
        None
    }
}
