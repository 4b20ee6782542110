use crossterm::event::{KeyCode, KeyModifiers};

use super::key_handlers::InputKey;
use super::{validation, Command, Flow, SettingsController, SettingsError, SettingsState};
use crate::registry::{Registry, RepositoryEntry, RepositoryKind};

impl SettingsController {
    pub(crate) fn add_local_name_key(
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
                self.enter_input(SettingsState::AddLocalPath);
                None
            }
            Err(e) => self.reject_input(e),
        }
    }

    pub(crate) fn add_local_path_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, true) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.scratch.path = None;
                self.enter_input(SettingsState::AddLocalName);
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        match validation::validate_path(&self.registry, self.input.value(), None) {
            Ok(path) => {
                self.scratch.path = Some(path);
                self.create_local()
            }
            Err(e) => self.reject_input(e),
        }
    }

    fn create_local(&mut self) -> Option<Command> {
        let Some(path) = self.scratch.path.clone() else {
            return self.fail(
                Flow::AddLocal,
                SettingsError::Validation("no path entered".into()),
            );
        };
        let name = self.scratch.name.clone();
        let created_at = self.registry.next_created_at();
        let entry = RepositoryEntry {
            id: Registry::generate_id(&name, created_at),
            name: name.clone(),
            kind: RepositoryKind::Local,
            path,
            remote_url: None,
            branch: None,
            created_at,
        };

        let snapshot = match self.commit(|registry| {
            registry.append(entry);
            Ok(())
        }) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(Flow::AddLocal, e),
        };

        if let Err(e) = self.reconcile_created(&name) {
            self.roll_back(snapshot);
            return self.fail(Flow::AddLocal, SettingsError::Reconciliation(e.to_string()));
        }

        self.finish_complete(&format!("Added local repository {name}"));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::prepare::Readiness;
    use crate::settings::{ErrorKind, MainMenuItem};

    fn open_add_local(fx: &mut Fixture) {
        fx.reload();
        let index = fx
            .controller
            .main_menu()
            .items()
            .iter()
            .position(|i| *i == MainMenuItem::AddRepository)
            .unwrap();
        fx.controller.main_menu.select(index);
        fx.press(KeyCode::Enter);
        fx.press(KeyCode::Enter);
        assert_eq!(fx.controller.state(), SettingsState::AddLocalName);
    }

    #[test]
    fn adds_local_repository_and_persists() {
        let mut fx = Fixture::new();
        open_add_local(&mut fx);
        let dir = fx.fresh_dir("my-rules");
        std::fs::create_dir(&dir).unwrap();

        fx.submit("  My Rules ");
        assert_eq!(fx.controller.state(), SettingsState::AddLocalPath);
        let before = fx.controller.rebuild_count();
        fx.submit(&Fixture::path_string(&dir));

        assert_eq!(fx.controller.state(), SettingsState::Complete);
        assert_eq!(fx.controller.rebuild_count(), before + 1);
        let entry = &fx.controller.registry().entries()[0];
        assert_eq!(entry.name, "My Rules");
        assert_eq!(entry.path, dir);
        assert_eq!(fx.disk_registry(), *fx.controller.registry());
        assert!(fx.controller.scratch().is_empty());
    }

    #[test]
    fn foreign_clone_in_another_entry_does_not_block_adding() {
        let mut fx = Fixture::new();
        let old = fx.add_remote("Old", "https://h/old");
        let old_path = fx.controller.registry().find_by_id(old).unwrap().path.clone();
        std::fs::create_dir_all(old_path.join(".git")).unwrap();
        fx.git.set_origin("https://h/someone-else");

        open_add_local(&mut fx);
        let dir = fx.fresh_dir("new-rules");
        std::fs::create_dir(&dir).unwrap();
        fx.submit("New");
        fx.submit(&Fixture::path_string(&dir));

        assert_eq!(fx.controller.state(), SettingsState::Complete);
        assert_eq!(fx.disk_registry().len(), 2);
        let readiness: Vec<_> = fx.controller.prepared().iter().map(|p| p.readiness).collect();
        assert_eq!(readiness, vec![Readiness::Unknown, Readiness::Unknown]);
    }

    #[test]
    fn invalid_name_stays_on_input_with_inline_error() {
        let mut fx = Fixture::new();
        fx.add_local("Taken");
        open_add_local(&mut fx);

        fx.submit("Taken");
        assert_eq!(fx.controller.state(), SettingsState::AddLocalName);
        assert_eq!(fx.controller.inline_error(), Some("name already exists"));

        fx.type_text("2");
        assert_eq!(fx.controller.inline_error(), None);
    }

    #[test]
    fn relative_path_is_rejected_inline() {
        let mut fx = Fixture::new();
        open_add_local(&mut fx);
        fx.submit("Rules");
        fx.submit("relative/path");
        assert_eq!(fx.controller.state(), SettingsState::AddLocalPath);
        assert!(fx.controller.inline_error().unwrap().contains("absolute"));
        assert!(fx.controller.registry().is_empty());
    }

    #[test]
    fn esc_from_path_returns_to_name_with_value() {
        let mut fx = Fixture::new();
        open_add_local(&mut fx);
        fx.submit("Rules");
        fx.press(KeyCode::Esc);
        assert_eq!(fx.controller.state(), SettingsState::AddLocalName);
        assert_eq!(fx.controller.input().value(), "Rules");
    }

    #[test]
    fn persistence_failure_ends_in_error_and_restores_registry() {
        let mut fx = Fixture::new();
        open_add_local(&mut fx);
        let dir = fx.fresh_dir("rules");
        // A directory where the registry file should be makes the rename fail.
        std::fs::create_dir_all(fx.controller.registry().path()).unwrap();

        fx.submit("Rules");
        fx.submit(&Fixture::path_string(&dir));

        assert_eq!(fx.controller.state(), SettingsState::AddLocalError);
        assert_eq!(
            fx.controller.flow_error().map(|e| e.kind()),
            Some(ErrorKind::Persistence)
        );
        assert!(fx.controller.registry().is_empty());

        fx.press(KeyCode::Char('x'));
        assert_eq!(fx.controller.state(), SettingsState::MainMenu);
    }
}
