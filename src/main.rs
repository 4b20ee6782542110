//! Rulebox: manage local and remote rule repositories from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use rulebox::config::AppConfig;
use rulebox::credentials::FileCredentialStore;
use rulebox::git::{CliGit, GitBackend};
use rulebox::prepare;
use rulebox::registry::Registry;
use rulebox::settings::SettingsController;

#[derive(Parser, Debug)]
#[command(name = "rulebox", version = env!("RULEBOX_VERSION"))]
struct Cli {
    /// Config file to read instead of the default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository registry file to use instead of the default.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Open the interactive settings screen (default).
    Settings,
    /// Print the registered repositories.
    List,
    /// Clone or update every remote repository.
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    };
    let _log_guard = init_logging(&config);

    let registry_path = match cli.registry.clone() {
        Some(path) => path,
        None => rulebox::paths::registry_file()
            .context("Cannot resolve registry path (is HOME set?)")?,
    };
    let registry = Registry::load(&registry_path)?;
    tracing::info!(
        "Loaded {} from {}",
        prepare::repository_count_label(registry.len()),
        registry_path.display()
    );

    let git: Arc<dyn GitBackend> = Arc::new(CliGit::new());
    let token_path =
        rulebox::paths::token_file().context("Cannot resolve token path (is HOME set?)")?;
    let credentials = Arc::new(FileCredentialStore::new(token_path, git.clone()));

    match cli.command.unwrap_or(Mode::Settings) {
        Mode::Settings => {
            let controller = SettingsController::new(registry, git, credentials, &config);
            let mut terminal = ratatui::init();
            let result = rulebox::host::run(&mut terminal, controller).await;
            ratatui::restore();
            result
        }
        Mode::List => {
            list(&registry, git.as_ref());
            Ok(())
        }
        Mode::Sync => {
            let results = tokio::task::spawn_blocking(move || {
                rulebox::sync::sync_all(&registry, git.as_ref(), credentials.as_ref())
            })
            .await?;
            for result in &results {
                println!("{result}");
            }
            let failed = results.iter().filter(|r| !r.is_ok()).count();
            if failed > 0 {
                anyhow::bail!("{failed} of {} failed to sync", results.len());
            }
            Ok(())
        }
    }
}

fn list(registry: &Registry, git: &dyn GitBackend) {
    let prepared = match prepare::prepare_repositories(registry.entries(), git) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::warn!("Failed to prepare repositories: {e}");
            eprintln!("warning: {e}");
            prepare::unchecked(registry.entries())
        }
    };
    for repo in &prepared {
        println!(
            "{} [{}]  {}",
            repo.title,
            repo.readiness.label(),
            repo.description
        );
    }
    println!("{}", prepare::repository_count_label(prepared.len()));
}

/// Log to `rulebox.log` in the data directory; the TUI owns stdout.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let dir = rulebox::paths::log_directory()?;
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("warning: cannot create log directory {}: {e}", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::never(&dir, "rulebox.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_settings() {
        let cli = Cli::parse_from(["rulebox"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.command.unwrap_or(Mode::Settings), Mode::Settings);
    }

    #[test]
    fn global_paths_parse_after_subcommand() {
        let cli = Cli::parse_from(["rulebox", "sync", "--registry", "/tmp/r.toml"]);
        assert_eq!(cli.command, Some(Mode::Sync));
        assert_eq!(cli.registry, Some(PathBuf::from("/tmp/r.toml")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
