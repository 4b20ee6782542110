use crossterm::event::KeyCode;

use super::key_handlers::{confirm_key, ConfirmKey};
use super::{Command, Flow, SettingsController, SettingsError, SettingsMessage};
use crate::registry::RepositoryKind;

impl SettingsController {
    pub(crate) fn confirm_delete_key(&mut self, code: KeyCode) -> Option<Command> {
        match confirm_key(code) {
            ConfirmKey::Yes => {}
            ConfirmKey::No => {
                self.back_to_actions();
                return None;
            }
            ConfirmKey::Other => return None,
        }

        if self.registry.len() < 2 {
            return self.fail(
                Flow::Delete,
                SettingsError::Validation("cannot delete the last repository".into()),
            );
        }

        let Some(kind) = self.selected_entry().map(|e| e.kind) else {
            return self.fail(
                Flow::Delete,
                SettingsError::Validation("repository no longer exists".into()),
            );
        };
        match kind {
            RepositoryKind::Local => self.perform_delete(),
            RepositoryKind::Remote => {
                let cmd = self.dirty_check(SettingsMessage::DeleteDirtyChecked);
                if cmd.is_some() {
                    self.in_flight = Some(Flow::Delete);
                }
                cmd
            }
        }
    }

    pub(crate) fn on_delete_dirty_checked(
        &mut self,
        result: anyhow::Result<bool>,
    ) -> Option<Command> {
        match result {
            Ok(false) => self.perform_delete(),
            Ok(true) => {
                self.is_dirty = true;
                let name = self.selected_entry().map(|e| e.name.clone()).unwrap_or_default();
                self.fail(Flow::Delete, SettingsError::uncommitted_changes(&name))
            }
            Err(e) => self.fail(Flow::Delete, SettingsError::dirty_check_failed(&e)),
        }
    }

    /// Drop the entry from the registry. Its directory is left on disk.
    fn perform_delete(&mut self) -> Option<Command> {
        let Some(id) = self.selected_repository_id else {
            return self.fail(
                Flow::Delete,
                SettingsError::Validation("no repository selected".into()),
            );
        };

        let mut removed = None;
        let result = self.commit(|registry| {
            if registry.len() < 2 {
                return Err(SettingsError::Validation(
                    "cannot delete the last repository".into(),
                ));
            }
            let entry = registry
                .remove(id)
                .map_err(|e| SettingsError::Validation(e.to_string()))?;
            removed = Some(entry.name);
            Ok(())
        });
        if let Err(e) = result {
            return self.fail(Flow::Delete, e);
        }

        self.selected_repository_id = None;
        self.reconcile();
        let name = removed.unwrap_or_default();
        self.finish_complete(&format!("Deleted repository {name}"));
        None
    }
}
