use super::{MainMenuItem, SettingsController, SettingsState};
use crate::prepare::repository_count_label;
use crate::ui::layout::{Screen, ScreenLayout};

const LIST_HELP: &str = "↑/↓ move · Enter select · Esc back";
const INPUT_HELP: &str = "Enter submit · Esc back";
const PATH_HELP: &str = "Enter submit · Tab complete · Esc back";
const CONFIRM_HELP: &str = "y confirm · n cancel";
const DISMISS_HELP: &str = "any key to continue";

impl SettingsController {
    /// Describe the current screen. Pure: reads state, never mutates it.
    pub fn view(&self) -> Screen {
        let (body, help) = self.body();
        let mut layout = ScreenLayout::new(format!(
            "Rulebox Settings v{}",
            env!("RULEBOX_VERSION")
        ))
        .with_subtitle(repository_count_label(self.registry.len()))
        .with_help(help);
        if let Some(error) = self.layout.error() {
            layout.set_error(error);
        }
        Screen {
            layout,
            body,
            editing: self.state.is_input(),
        }
    }

    fn body(&self) -> (String, &'static str) {
        use SettingsState::*;
        let name = self
            .selected_entry()
            .map(|e| e.name.as_str())
            .unwrap_or("repository");

        match self.state {
            MainMenu => (self.main_menu_body(), "↑/↓ move · Enter select · q quit"),
            RepositoryActions => (
                format!(
                    "{name}\n\n{}",
                    self.actions_menu.render(|action| action.label().to_string())
                ),
                LIST_HELP,
            ),
            AddRepositoryType => (
                format!(
                    "What kind of repository?\n\n{}",
                    self.type_menu.render(|kind| kind.label().to_string())
                ),
                LIST_HELP,
            ),

            AddLocalName | AddRemoteName => (self.prompt("Repository name"), INPUT_HELP),
            AddLocalPath => (self.prompt("Directory holding the rules"), PATH_HELP),
            AddRemoteUrl => (self.prompt("Remote URL"), INPUT_HELP),
            AddRemoteBranch => (
                self.prompt("Branch to track (empty for the remote default)"),
                INPUT_HELP,
            ),
            AddRemotePath => (
                self.prompt("Clone directory (empty for the suggestion)"),
                PATH_HELP,
            ),
            AddRemoteToken => (
                self.prompt(&format!("Access token for {}", self.scratch.url)),
                INPUT_HELP,
            ),

            UpdateRepoName => (self.prompt(&format!("New name for {name}")), INPUT_HELP),
            EditNameConfirm => (
                format!("Rename {name} to {}?", self.scratch.name),
                CONFIRM_HELP,
            ),

            UpdateGitHubBranch => (
                self.prompt(&format!(
                    "Branch for {name} (empty for the remote default)"
                )),
                INPUT_HELP,
            ),
            EditBranchConfirm => {
                let branch = match self.scratch.branch.as_str() {
                    "" => "the default branch",
                    b => b,
                };
                (format!("Switch {name} to {branch}?"), CONFIRM_HELP)
            }

            UpdateGitHubPath => (self.prompt(&format!("New clone path for {name}")), PATH_HELP),
            EditClonePathConfirm => {
                let from = self
                    .selected_entry()
                    .map(|e| e.path.display().to_string())
                    .unwrap_or_default();
                let to = self
                    .scratch
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                (
                    format!(
                        "Move {name}\n  from {from}\n  to   {to}\n\n\
                         The old directory is not deleted. Remove it manually once it is no longer needed."
                    ),
                    CONFIRM_HELP,
                )
            }

            ManualRefresh => {
                let branch = self
                    .selected_entry()
                    .map(|e| e.branch_label())
                    .unwrap_or("default");
                (
                    format!("Pull the latest {branch} branch into {name}?"),
                    CONFIRM_HELP,
                )
            }
            RefreshInProgress => (format!("Refreshing {name}…"), "please wait"),

            ConfirmDelete => {
                let path = self
                    .selected_entry()
                    .map(|e| e.path.display().to_string())
                    .unwrap_or_default();
                (
                    format!(
                        "Remove {name} from the registry?\n\nIts directory at {path} is not deleted."
                    ),
                    CONFIRM_HELP,
                )
            }

            UpdateGitHubPat => (
                self.prompt("New access token for every remote repository"),
                INPUT_HELP,
            ),
            UpdatePatConfirm => {
                let remotes = self.registry.remotes().count();
                (
                    format!(
                        "Token accepted for {}. Save it?",
                        repository_count_label(remotes)
                    ),
                    CONFIRM_HELP,
                )
            }

            RefreshError => {
                let message = self
                    .flow_error
                    .as_ref()
                    .map(|e| e.message().to_string())
                    .or_else(|| self.last_refresh_error.clone())
                    .unwrap_or_default();
                (format!("Refresh failed\n\n✗ {message}"), DISMISS_HELP)
            }
            AddLocalError | AddRemoteError | EditNameError | EditBranchError
            | EditClonePathError | DeleteError | UpdatePatError => {
                let (kind, message) = self
                    .flow_error
                    .as_ref()
                    .map(|e| (e.kind().to_string(), e.message().to_string()))
                    .unwrap_or_default();
                (format!("Failed ({kind})\n\n✗ {message}"), DISMISS_HELP)
            }

            Complete => ("✓ Changes saved.".to_string(), "any key to return to the main menu"),
        }
    }

    fn main_menu_body(&self) -> String {
        self.main_menu.render(|item| match item {
            MainMenuItem::Repository(id) => self
                .prepared
                .iter()
                .find(|p| p.id == *id)
                .map(|p| format!("{} [{}]  {}", p.title, p.readiness.label(), p.description))
                .unwrap_or_else(|| id.to_string()),
            MainMenuItem::AddRepository => "Add Repository".to_string(),
            MainMenuItem::UpdateToken => "Update Token".to_string(),
        })
    }

    fn prompt(&self, label: &str) -> String {
        format!("{label}\n\n{}", self.input.render())
    }
}
