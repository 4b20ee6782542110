use std::fmt;

/// Which stage of a flow produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User input broke a rule; shown inline, the flow stays put.
    Validation,
    /// The working tree has uncommitted changes.
    PreFlight,
    /// A branch or token probe returned a negative answer.
    RemoteCheck,
    /// Saving the registry or the token failed.
    Persistence,
    /// Re-preparing the repository list after a mutation failed.
    Reconciliation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::PreFlight => "pre-flight",
            Self::RemoteCheck => "remote check",
            Self::Persistence => "persistence",
            Self::Reconciliation => "reconciliation",
        };
        f.write_str(label)
    }
}

/// A user-facing flow error. Carries rendered text so it can be held by the
/// controller and shown on an error screen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    PreFlight(String),
    #[error("{0}")]
    RemoteCheck(String),
    #[error("{0}")]
    Persistence(String),
    #[error("{0}")]
    Reconciliation(String),
}

impl SettingsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::PreFlight(_) => ErrorKind::PreFlight,
            Self::RemoteCheck(_) => ErrorKind::RemoteCheck,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Reconciliation(_) => ErrorKind::Reconciliation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::PreFlight(m)
            | Self::RemoteCheck(m)
            | Self::Persistence(m)
            | Self::Reconciliation(m) => m,
        }
    }

    pub fn persistence(context: &str, err: &anyhow::Error) -> Self {
        Self::Persistence(format!("{context}: {err:#}"))
    }

    pub fn remote_check(context: &str, err: &anyhow::Error) -> Self {
        Self::RemoteCheck(format!("{context}: {err:#}"))
    }

    pub fn uncommitted_changes(name: &str) -> Self {
        Self::PreFlight(format!(
            "{name} has uncommitted changes; commit or stash them and try again"
        ))
    }

    /// A failed working tree inspection blocks the flow like a dirty tree.
    pub fn dirty_check_failed(err: &anyhow::Error) -> Self {
        Self::PreFlight(format!("could not inspect working tree: {err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            SettingsError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SettingsError::uncommitted_changes("rules").kind(),
            ErrorKind::PreFlight
        );
    }

    #[test]
    fn contextual_constructors_keep_the_chain() {
        let err = anyhow::anyhow!("disk full").context("write failed");
        let settings = SettingsError::persistence("failed to save registry", &err);
        assert_eq!(
            settings.message(),
            "failed to save registry: write failed: disk full"
        );
        assert_eq!(settings.to_string(), settings.message());
    }
}
