use crossterm::event::{KeyCode, KeyModifiers};
use zeroize::Zeroize;

use super::{Flow, SettingsError};
use crate::registry::Registry;

/// Everything the controller reacts to: key events, resizes, and the results
/// of commands it issued earlier.
#[derive(Debug)]
pub enum SettingsMessage {
    KeyPress(KeyCode, KeyModifiers),
    Resize(u16, u16),
    RegistryLoaded(anyhow::Result<Registry>),
    /// Background fetch issued after a branch edit.
    BranchFetched(anyhow::Result<()>),

    EditBranchDirtyChecked(anyhow::Result<bool>),
    EditPathDirtyChecked(anyhow::Result<bool>),
    RefreshDirtyChecked(anyhow::Result<bool>),
    DeleteDirtyChecked(anyhow::Result<bool>),

    BranchVerified(anyhow::Result<bool>),
    RefreshCompleted(anyhow::Result<()>),

    /// No usable stored token; the optional text says why.
    AddRemoteTokenNeeded(Option<String>),
    /// Creation may proceed. `None` for remotes that do not use a token.
    AddRemoteTokenReady(Option<String>),
    AddRemoteFailed(SettingsError),
    AddRemoteTokenValidated(Result<(), SettingsError>),

    UpdateTokenValidated(Result<(), SettingsError>),
    UpdateTokenRevalidated(Result<(), SettingsError>),
}

impl SettingsMessage {
    /// The flow a message belongs to, or `None` for universal messages.
    pub fn flow(&self) -> Option<Flow> {
        use SettingsMessage::*;
        match self {
            KeyPress(..) | Resize(..) | RegistryLoaded(_) | BranchFetched(_) => None,
            EditBranchDirtyChecked(_) | BranchVerified(_) => Some(Flow::EditBranch),
            EditPathDirtyChecked(_) => Some(Flow::EditPath),
            RefreshDirtyChecked(_) | RefreshCompleted(_) => Some(Flow::Refresh),
            DeleteDirtyChecked(_) => Some(Flow::Delete),
            AddRemoteTokenNeeded(_)
            | AddRemoteTokenReady(_)
            | AddRemoteFailed(_)
            | AddRemoteTokenValidated(_) => Some(Flow::AddRemote),
            UpdateTokenValidated(_) | UpdateTokenRevalidated(_) => Some(Flow::UpdateToken),
        }
    }

    /// Wipe any token the message carries before it is discarded.
    pub fn zeroize_secrets(&mut self) {
        if let Self::AddRemoteTokenReady(Some(token)) = self {
            token.zeroize();
        }
    }

    /// Short name for logs. Never includes payloads, which may hold a token.
    pub fn name(&self) -> &'static str {
        use SettingsMessage::*;
        match self {
            KeyPress(..) => "KeyPress",
            Resize(..) => "Resize",
            RegistryLoaded(_) => "RegistryLoaded",
            BranchFetched(_) => "BranchFetched",
            EditBranchDirtyChecked(_) => "EditBranchDirtyChecked",
            EditPathDirtyChecked(_) => "EditPathDirtyChecked",
            RefreshDirtyChecked(_) => "RefreshDirtyChecked",
            DeleteDirtyChecked(_) => "DeleteDirtyChecked",
            BranchVerified(_) => "BranchVerified",
            RefreshCompleted(_) => "RefreshCompleted",
            AddRemoteTokenNeeded(_) => "AddRemoteTokenNeeded",
            AddRemoteTokenReady(_) => "AddRemoteTokenReady",
            AddRemoteFailed(_) => "AddRemoteFailed",
            AddRemoteTokenValidated(_) => "AddRemoteTokenValidated",
            UpdateTokenValidated(_) => "UpdateTokenValidated",
            UpdateTokenRevalidated(_) => "UpdateTokenRevalidated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universal_messages_have_no_flow() {
        assert_eq!(
            SettingsMessage::KeyPress(KeyCode::Enter, KeyModifiers::NONE).flow(),
            None
        );
        assert_eq!(SettingsMessage::BranchFetched(Ok(())).flow(), None);
    }

    #[test]
    fn zeroize_secrets_empties_a_carried_token() {
        let mut msg = SettingsMessage::AddRemoteTokenReady(Some("ghp_secret".into()));
        msg.zeroize_secrets();
        assert!(matches!(
            msg,
            SettingsMessage::AddRemoteTokenReady(Some(ref token)) if token.is_empty()
        ));
    }

    #[test]
    fn dirty_check_messages_are_flow_scoped() {
        assert_eq!(
            SettingsMessage::EditBranchDirtyChecked(Ok(false)).flow(),
            Some(Flow::EditBranch)
        );
        assert_eq!(
            SettingsMessage::EditPathDirtyChecked(Ok(false)).flow(),
            Some(Flow::EditPath)
        );
        assert_eq!(
            SettingsMessage::RefreshDirtyChecked(Ok(false)).flow(),
            Some(Flow::Refresh)
        );
        assert_eq!(
            SettingsMessage::DeleteDirtyChecked(Ok(false)).flow(),
            Some(Flow::Delete)
        );
    }
}
