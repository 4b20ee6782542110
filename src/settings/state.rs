// Settings screen states and the flow map.
//
// Every state except `MainMenu` and `Complete` belongs to exactly one flow,
// so a key handler never has to ask which edit is in progress.

use super::Flow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsState {
    MainMenu,
    RepositoryActions,
    AddRepositoryType,
    AddLocalName,
    AddLocalPath,
    AddLocalError,
    AddRemoteName,
    AddRemoteUrl,
    AddRemoteBranch,
    AddRemotePath,
    AddRemoteToken,
    AddRemoteError,
    UpdateRepoName,
    EditNameConfirm,
    EditNameError,
    UpdateGitHubBranch,
    EditBranchConfirm,
    EditBranchError,
    UpdateGitHubPath,
    EditClonePathConfirm,
    EditClonePathError,
    ManualRefresh,
    RefreshInProgress,
    RefreshError,
    ConfirmDelete,
    DeleteError,
    UpdateGitHubPat,
    UpdatePatConfirm,
    UpdatePatError,
    Complete,
}

impl SettingsState {
    pub const ALL: [SettingsState; 30] = [
        Self::MainMenu,
        Self::RepositoryActions,
        Self::AddRepositoryType,
        Self::AddLocalName,
        Self::AddLocalPath,
        Self::AddLocalError,
        Self::AddRemoteName,
        Self::AddRemoteUrl,
        Self::AddRemoteBranch,
        Self::AddRemotePath,
        Self::AddRemoteToken,
        Self::AddRemoteError,
        Self::UpdateRepoName,
        Self::EditNameConfirm,
        Self::EditNameError,
        Self::UpdateGitHubBranch,
        Self::EditBranchConfirm,
        Self::EditBranchError,
        Self::UpdateGitHubPath,
        Self::EditClonePathConfirm,
        Self::EditClonePathError,
        Self::ManualRefresh,
        Self::RefreshInProgress,
        Self::RefreshError,
        Self::ConfirmDelete,
        Self::DeleteError,
        Self::UpdateGitHubPat,
        Self::UpdatePatConfirm,
        Self::UpdatePatError,
        Self::Complete,
    ];

    /// The flow owning this state. `Complete` is shared by every flow.
    pub fn flow(self) -> Option<Flow> {
        use SettingsState::*;
        Some(match self {
            MainMenu | AddRepositoryType => Flow::MainMenu,
            RepositoryActions => Flow::RepositoryActions,
            AddLocalName | AddLocalPath | AddLocalError => Flow::AddLocal,
            AddRemoteName | AddRemoteUrl | AddRemoteBranch | AddRemotePath | AddRemoteToken
            | AddRemoteError => Flow::AddRemote,
            UpdateRepoName | EditNameConfirm | EditNameError => Flow::Rename,
            UpdateGitHubBranch | EditBranchConfirm | EditBranchError => Flow::EditBranch,
            UpdateGitHubPath | EditClonePathConfirm | EditClonePathError => Flow::EditPath,
            ManualRefresh | RefreshInProgress | RefreshError => Flow::Refresh,
            ConfirmDelete | DeleteError => Flow::Delete,
            UpdateGitHubPat | UpdatePatConfirm | UpdatePatError => Flow::UpdateToken,
            Complete => return None,
        })
    }

    pub fn is_shared(self) -> bool {
        matches!(self, Self::MainMenu | Self::Complete)
    }

    pub fn is_error(self) -> bool {
        Flow::ALL.iter().any(|f| f.error_state() == Some(self))
    }

    /// States that open other flows.
    pub fn is_launcher(self) -> bool {
        matches!(
            self,
            Self::MainMenu | Self::AddRepositoryType | Self::RepositoryActions
        )
    }

    /// Whether this state edits text through the shared input component.
    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::AddLocalName
                | Self::AddLocalPath
                | Self::AddRemoteName
                | Self::AddRemoteUrl
                | Self::AddRemoteBranch
                | Self::AddRemotePath
                | Self::AddRemoteToken
                | Self::UpdateRepoName
                | Self::UpdateGitHubBranch
                | Self::UpdateGitHubPath
                | Self::UpdateGitHubPat
        )
    }

    /// Where `Esc` leads from this state.
    pub fn back_target(self) -> SettingsState {
        use SettingsState::*;
        match self {
            MainMenu | Complete => MainMenu,
            RepositoryActions | AddRepositoryType | UpdateGitHubPat | UpdatePatError
            | AddLocalError => MainMenu,
            AddLocalName | AddRemoteName => AddRepositoryType,
            AddLocalPath => AddLocalName,
            AddRemoteUrl => AddRemoteName,
            AddRemoteBranch => AddRemoteUrl,
            AddRemotePath => AddRemoteBranch,
            AddRemoteToken | AddRemoteError => AddRemotePath,
            EditNameConfirm => UpdateRepoName,
            EditBranchConfirm => UpdateGitHubBranch,
            EditClonePathConfirm => UpdateGitHubPath,
            UpdatePatConfirm => UpdateGitHubPat,
            UpdateRepoName | EditNameError | UpdateGitHubBranch | EditBranchError
            | UpdateGitHubPath | EditClonePathError | ManualRefresh | RefreshInProgress
            | RefreshError | ConfirmDelete | DeleteError => RepositoryActions,
        }
    }
}

impl Flow {
    pub const ALL: [Flow; 10] = [
        Flow::MainMenu,
        Flow::RepositoryActions,
        Flow::AddLocal,
        Flow::AddRemote,
        Flow::UpdateToken,
        Flow::Rename,
        Flow::EditBranch,
        Flow::EditPath,
        Flow::Refresh,
        Flow::Delete,
    ];

    pub fn entry_state(self) -> SettingsState {
        match self {
            Flow::MainMenu => SettingsState::MainMenu,
            Flow::RepositoryActions => SettingsState::RepositoryActions,
            Flow::AddLocal => SettingsState::AddLocalName,
            Flow::AddRemote => SettingsState::AddRemoteName,
            Flow::UpdateToken => SettingsState::UpdateGitHubPat,
            Flow::Rename => SettingsState::UpdateRepoName,
            Flow::EditBranch => SettingsState::UpdateGitHubBranch,
            Flow::EditPath => SettingsState::UpdateGitHubPath,
            Flow::Refresh => SettingsState::ManualRefresh,
            Flow::Delete => SettingsState::ConfirmDelete,
        }
    }

    pub fn error_state(self) -> Option<SettingsState> {
        match self {
            Flow::MainMenu | Flow::RepositoryActions => None,
            Flow::AddLocal => Some(SettingsState::AddLocalError),
            Flow::AddRemote => Some(SettingsState::AddRemoteError),
            Flow::UpdateToken => Some(SettingsState::UpdatePatError),
            Flow::Rename => Some(SettingsState::EditNameError),
            Flow::EditBranch => Some(SettingsState::EditBranchError),
            Flow::EditPath => Some(SettingsState::EditClonePathError),
            Flow::Refresh => Some(SettingsState::RefreshError),
            Flow::Delete => Some(SettingsState::DeleteError),
        }
    }

    /// The state this flow hands control back to when it ends in an error.
    pub fn origin(self) -> SettingsState {
        match self {
            Flow::MainMenu
            | Flow::RepositoryActions
            | Flow::AddLocal
            | Flow::UpdateToken => SettingsState::MainMenu,
            Flow::AddRemote => SettingsState::AddRemotePath,
            Flow::Rename | Flow::EditBranch | Flow::EditPath | Flow::Refresh | Flow::Delete => {
                SettingsState::RepositoryActions
            }
        }
    }

    /// Flows that act on the selected repository.
    pub fn is_per_repository(self) -> bool {
        matches!(
            self,
            Flow::Rename | Flow::EditBranch | Flow::EditPath | Flow::Refresh | Flow::Delete
        )
    }
}

/// Whether moving from `from` to `to` respects the flow map.
pub fn can_transition(from: SettingsState, to: SettingsState) -> bool {
    if to.is_shared() || from == to {
        return true;
    }

    let (Some(from_flow), Some(to_flow)) = (from.flow(), to.flow()) else {
        return false;
    };

    if from_flow == to_flow {
        return true;
    }

    // Back to the screen the flow was launched from.
    if to == from_flow.origin() || to == from.back_target() {
        return true;
    }

    from.is_launcher() && to == to_flow.entry_state()
}
