//! # CLI Behavior
//!
//! This is **one possible UI client** for studysync, not the application itself.
//! It is the only place that knows about terminal I/O, exit codes and output
//! formatting.
//!
//! ## Runtime
//!
//! The library is single-threaded and async. The CLI builds a current-thread
//! tokio runtime, runs one command on it, and drops it. A current-thread
//! runtime only polls spawned tasks while it is blocked on something, so after
//! the command the CLI waits up to [`BADGE_FLUSH_TIMEOUT`] for the badge checks
//! it fired. Checks still pending after that are abandoned.
//!
//! ## Output
//!
//! - Results go to stdout, formatted by `render`, or as JSON with `--json`.
//! - Success and warning notices go to stderr.
//! - Errors are returned to `main`, which prints `Error: ...` and exits 1.
//!
//! ## Logging
//!
//! `tracing` output goes to stderr. `RUST_LOG` wins when set; otherwise the level
//! is `warn`, or `debug` with `--verbose`.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Per-command handlers that call the API and print results
//! - `render`: Output formatting

mod commands;
mod render;
pub mod setup;

use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use studysyncapp::api::StudyApi;
use studysyncapp::config::StudyConfig;
use tracing_subscriber::EnvFilter;

use commands::{CliContext, TerminalNotifier};
use setup::{CollectionCommands, Commands, KindArg};

pub const BADGE_FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

pub fn run() -> Result<()> {
    let cli = setup::Cli::parse();
    init_logging(cli.verbose);

    let config = StudyConfig::load(cli.config.as_deref())?;
    let notifier = Rc::new(TerminalNotifier::new(cli.json));
    let api = StudyApi::from_config(&config, notifier)?;
    let ctx = CliContext {
        api,
        config,
        json: cli.json,
    };

    // Naked `studysync` lists notes.
    let command = cli
        .command
        .unwrap_or(Commands::Collection(CollectionCommands::List {
            kind: KindArg::Note,
        }));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let result = commands::dispatch(&ctx, command).await;
        if tokio::time::timeout(BADGE_FLUSH_TIMEOUT, ctx.api.badges().flush())
            .await
            .is_err()
        {
            tracing::debug!("Gave up waiting for badge evaluation");
        }
        result
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be set when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
