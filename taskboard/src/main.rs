//! `taskboard` — kanban task board on the command line.
//!
//! Talks to a task service over HTTP, or to a throwaway in-memory board
//! with `--offline` (optionally seeded from a JSON file with `--seed`).
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Show the board from a local taskboard-server
//! cargo run --bin taskboard
//!
//! # Against another service
//! TASKBOARD_URL=http://tasks.internal:5000 cargo run --bin taskboard -- list
//!
//! # Try commands against a local board file, nothing is saved
//! cargo run --bin taskboard -- --offline --seed board.json board
//!
//! # Move a card
//! cargo run --bin taskboard -- move 0190f3c2-... done
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::client::{MemoryService, TaskClient, TaskService};
use taskboard::commands::execute;
use taskboard::config::{BoardConfig, CliArgs, Command};
use taskboard::tasks::{StoreError, TaskStore};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let config = match BoardConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(base_url = %config.service.base_url, offline = cli.offline, "configuration loaded");

    let command = cli.command.clone().unwrap_or(Command::Board);

    if cli.offline {
        let service = match cli.seed.as_deref() {
            Some(path) => match MemoryService::from_seed_file(path) {
                Ok(service) => service,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            },
            None => MemoryService::new(),
        };
        let store = TaskStore::new(service).with_max_title_len(config.max_title_len);
        let result = execute(&store, &command).await;
        return report(&store, result);
    }

    let client = match TaskClient::new(&config.service) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let store = TaskStore::new(client).with_max_title_len(config.max_title_len);
    let result = execute(&store, &command).await;
    report(&store, result)
}

/// Prints the command output, or the error the store recorded.
fn report<S: TaskService>(store: &TaskStore<S>, result: Result<String, StoreError>) -> ExitCode {
    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = store.error().unwrap_or_else(|| e.to_string());
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing to a file when `--log-file` is given, else stderr.
///
/// Returns the appender guard for file output; it must be held until exit.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some(log_path) = file_path else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        return None;
    };

    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
