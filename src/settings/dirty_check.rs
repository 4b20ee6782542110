use tracing::debug;

use super::{Command, SettingsController, SettingsMessage};
use crate::registry::RepositoryKind;

impl SettingsController {
    /// Check the selected entry's working tree and wrap the answer with `done`.
    ///
    /// Local entries are never inspected and report clean. Returns `None` when
    /// nothing is selected.
    pub(crate) fn dirty_check<F>(&self, done: F) -> Option<Command>
    where
        F: FnOnce(anyhow::Result<bool>) -> SettingsMessage + Send + 'static,
    {
        let entry = self.selected_entry()?;
        match entry.kind {
            RepositoryKind::Local => Some(Command::new(move || done(Ok(false)))),
            RepositoryKind::Remote => {
                let git = self.git.clone();
                let path = entry.path.clone();
                debug!("Checking working tree at {}", path.display());
                Some(Command::new(move || done(git.is_working_tree_dirty(&path))))
            }
        }
    }
}
