use crossterm::event::{KeyCode, KeyModifiers};

use super::key_handlers::{confirm_key, ConfirmKey, InputKey};
use super::{
    validation, Command, Flow, SettingsController, SettingsError, SettingsMessage, SettingsState,
};
use crate::git::GitSource;

impl SettingsController {
    pub(crate) fn edit_branch_input_key(
        &mut self,
        code: KeyCode,
        mods: KeyModifiers,
    ) -> Option<Command> {
        match self.edit_input(code, mods, false) {
            InputKey::Submit => {}
            InputKey::Back => {
                self.back_to_actions();
                return None;
            }
            InputKey::Edited | InputKey::Ignored => return None,
        }

        let branch = match validation::validate_branch(self.input.value()) {
            Ok(branch) => branch,
            Err(e) => return self.reject_input(e),
        };
        self.scratch.branch = branch.unwrap_or_default();
        self.has_changes = true;

        match self.dirty_check(SettingsMessage::EditBranchDirtyChecked) {
            Some(cmd) => {
                self.in_flight = Some(Flow::EditBranch);
                Some(cmd)
            }
            None => self.fail(Flow::EditBranch, missing_selection()),
        }
    }

    pub(crate) fn on_edit_branch_dirty_checked(
        &mut self,
        result: anyhow::Result<bool>,
    ) -> Option<Command> {
        match result {
            Ok(false) => {
                self.is_dirty = false;
                self.transition(SettingsState::EditBranchConfirm);
                None
            }
            Ok(true) => {
                self.is_dirty = true;
                let name = self.selected_entry().map(|e| e.name.clone()).unwrap_or_default();
                self.fail(Flow::EditBranch, SettingsError::uncommitted_changes(&name))
            }
            Err(e) => self.fail(Flow::EditBranch, SettingsError::dirty_check_failed(&e)),
        }
    }

    pub(crate) fn edit_branch_confirm_key(&mut self, code: KeyCode) -> Option<Command> {
        match confirm_key(code) {
            ConfirmKey::Yes => {}
            ConfirmKey::No => {
                self.enter_input(SettingsState::UpdateGitHubBranch);
                return None;
            }
            ConfirmKey::Other => return None,
        }

        // Reverting to the default branch needs no remote lookup.
        if self.scratch.branch.is_empty() {
            return self.apply_branch();
        }

        let Some(entry) = self.selected_entry() else {
            return self.fail(Flow::EditBranch, missing_selection());
        };
        let entry = entry.clone();
        let branch = self.scratch.branch.clone();
        let git = self.git.clone();
        let credentials = self.credentials.clone();
        self.in_flight = Some(Flow::EditBranch);

        Some(Command::new(move || {
            let token = Self::stored_token(credentials.as_ref());
            let result = match GitSource::for_entry(&entry, token) {
                Some(source) => git.branch_exists_on_remote(&source, &branch),
                None => Err(anyhow::anyhow!("{} is not a remote repository", entry.name)),
            };
            SettingsMessage::BranchVerified(result)
        }))
    }

    pub(crate) fn on_branch_verified(&mut self, result: anyhow::Result<bool>) -> Option<Command> {
        match result {
            Ok(true) => self.apply_branch(),
            Ok(false) => {
                let url = self
                    .selected_entry()
                    .and_then(|e| e.remote_url.clone())
                    .unwrap_or_default();
                let message = format!(
                    "branch '{}' does not exist on {url}",
                    self.scratch.branch
                );
                self.fail(Flow::EditBranch, SettingsError::RemoteCheck(message))
            }
            Err(e) => self.fail(
                Flow::EditBranch,
                SettingsError::remote_check("could not verify branch", &e),
            ),
        }
    }

    /// Save the new branch and kick off a fetch of it in the background.
    fn apply_branch(&mut self) -> Option<Command> {
        let Some(id) = self.selected_repository_id else {
            return self.fail(Flow::EditBranch, missing_selection());
        };
        let branch = (!self.scratch.branch.is_empty()).then(|| self.scratch.branch.clone());

        let new_branch = branch.clone();
        let result = self.commit(move |registry| {
            let entry = registry.find_by_id_mut(id).ok_or_else(missing_selection)?;
            entry.branch = new_branch;
            Ok(())
        });
        if let Err(e) = result {
            return self.fail(Flow::EditBranch, e);
        }

        self.reconcile();
        let fetch = self.selected_entry().cloned().map(|entry| {
            let git = self.git.clone();
            let credentials = self.credentials.clone();
            Command::new(move || {
                let token = Self::stored_token(credentials.as_ref());
                let result = match GitSource::for_entry(&entry, token) {
                    Some(source) => git.fetch_updates(&source),
                    None => Ok(()),
                };
                SettingsMessage::BranchFetched(result)
            })
        });

        let label = branch.as_deref().unwrap_or("the default branch");
        self.finish_complete(&format!("Switched repository to {label}"));
        fetch
    }
}

fn missing_selection() -> SettingsError {
    SettingsError::Validation("repository no longer exists".into())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{key, Fixture};
    use super::*;
    use crate::settings::ErrorKind;

    fn remote_fixture() -> (Fixture, crate::registry::RepositoryId) {
        let mut fx = Fixture::new();
        fx.add_local("Local");
        let r = fx.add_remote("R", "https://h/r");
        fx.reload();
        (fx, r)
    }

    #[test]
    fn dirty_tree_blocks_branch_edit() {
        let (mut fx, r) = remote_fixture();
        fx.git.set_dirty(true);
        fx.choose_action(r, "Edit Branch");
        fx.submit("develop");

        assert_eq!(fx.controller.state(), SettingsState::EditBranchError);
        let err = fx.controller.flow_error().unwrap();
        assert_eq!(err.kind(), ErrorKind::PreFlight);
        assert!(err.message().contains("uncommitted changes"));
        assert!(fx.controller.is_dirty());
        assert_eq!(fx.disk_registry().find_by_id(r).unwrap().branch, None);
    }

    #[test]
    fn clean_tree_confirms_then_verifies_and_fetches() {
        let (mut fx, r) = remote_fixture();
        fx.choose_action(r, "Edit Branch");
        fx.submit("develop");
        assert_eq!(fx.controller.state(), SettingsState::EditBranchConfirm);

        fx.press(KeyCode::Char('y'));
        assert_eq!(fx.controller.state(), SettingsState::Complete);
        assert_eq!(fx.git.branch_checks(), 1);
        assert_eq!(fx.git.fetches(), 1);
        assert_eq!(
            fx.disk_registry().find_by_id(r).unwrap().branch.as_deref(),
            Some("develop")
        );
    }

    #[test]
    fn missing_remote_branch_is_a_remote_check_error() {
        let (mut fx, r) = remote_fixture();
        fx.git.remove_branch("ghost");
        fx.choose_action(r, "Edit Branch");
        fx.submit("ghost");
        fx.press(KeyCode::Enter);

        assert_eq!(fx.controller.state(), SettingsState::EditBranchError);
        assert_eq!(
            fx.controller.flow_error().map(|e| e.kind()),
            Some(ErrorKind::RemoteCheck)
        );
        assert_eq!(fx.git.fetches(), 0);
    }

    #[test]
    fn empty_branch_reverts_to_default_without_lookup() {
        let (mut fx, r) = remote_fixture();
        fx.choose_action(r, "Edit Branch");
        fx.submit("develop");
        fx.press(KeyCode::Char('y'));
        fx.press(KeyCode::Char('x'));

        fx.choose_action(r, "Edit Branch");
        assert_eq!(fx.controller.input().value(), "develop");
        fx.submit("");
        fx.press(KeyCode::Char('y'));

        assert_eq!(fx.controller.state(), SettingsState::Complete);
        assert_eq!(fx.git.branch_checks(), 1);
        assert_eq!(fx.disk_registry().find_by_id(r).unwrap().branch, None);
    }

    #[test]
    fn malformed_branch_stays_on_input() {
        let (mut fx, r) = remote_fixture();
        fx.choose_action(r, "Edit Branch");
        fx.submit("has space");
        assert_eq!(fx.controller.state(), SettingsState::UpdateGitHubBranch);
        assert_eq!(fx.git.dirty_checks(), 0);
    }

    #[test]
    fn failed_dirty_check_blocks_the_flow() {
        let (mut fx, r) = remote_fixture();
        fx.git.fail_dirty_check("permission denied");
        fx.choose_action(r, "Edit Branch");
        fx.submit("develop");
        assert_eq!(fx.controller.state(), SettingsState::EditBranchError);
        assert!(fx
            .controller
            .flow_error()
            .unwrap()
            .message()
            .contains("permission denied"));
    }

    #[test]
    fn other_flows_dirty_results_are_ignored() {
        let (mut fx, r) = remote_fixture();
        fx.choose_action(r, "Edit Branch");
        fx.retype("develop");
        let cmd = fx.controller.update(key(KeyCode::Enter));
        assert!(cmd.is_some());

        fx.controller
            .update(SettingsMessage::EditPathDirtyChecked(Ok(true)));
        fx.controller
            .update(SettingsMessage::DeleteDirtyChecked(Ok(true)));
        assert_eq!(fx.controller.state(), SettingsState::UpdateGitHubBranch);

        fx.pump(cmd);
        assert_eq!(fx.controller.state(), SettingsState::EditBranchConfirm);
    }
}
