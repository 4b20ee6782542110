//! Rulebox: a terminal settings manager for local and remote rule repositories.

pub mod config;
pub mod credentials;
pub mod git;
pub mod host;
pub mod paths;
pub mod prepare;
pub mod registry;
pub mod settings;
pub mod sync;
pub mod ui;
