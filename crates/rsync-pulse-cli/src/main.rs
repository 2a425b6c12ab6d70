mod commands;
mod config;
mod logging;
mod plain;
mod progress;

use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, SyncArgs};
use crate::config::AppConfig;
use dotenv::dotenv;
use plain::PlainObserver;
use progress::CliObserver;
use rsync_pulse_core::{RunObserver, RunOutcome, SyncSession};
use tracing::{error, info, warn};

const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let guard = logging::init_logger();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(EXIT_FAILURE);
        }
    };

    let args = Cli::parse();

    let exit_code = match args.command {
        Some(Commands::Sync(sync_args)) => match run_sync(&config, &sync_args).await {
            Ok(outcome) if outcome.succeeded() => 0,
            Ok(outcome) => {
                warn!(
                    "rsync did not finish cleanly: {:?}, exit code {:?}",
                    outcome.end,
                    outcome.exit_code()
                );
                EXIT_FAILURE
            }
            Err(err) => report_error(&err),
        },
        Some(Commands::ShowCommand(sync_args)) => match show_command(&config, &sync_args) {
            Ok(()) => 0,
            Err(err) => report_error(&err),
        },
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            0
        }
        None => {
            let _ = Cli::command().print_long_help();
            0
        }
    };

    if exit_code != 0 {
        drop(guard);
        process::exit(exit_code);
    }

    Ok(())
}

async fn run_sync(config: &AppConfig, args: &SyncArgs) -> anyhow::Result<RunOutcome> {
    let options = config.sync_options(args)?;
    let command = config.sync_command(args, &options);
    info!(
        "Syncing {} -> {} (dry run: {}, delete: {})",
        options.source_path(),
        options.dest_path(),
        options.dry_run(),
        options.delete()
    );

    let session = SyncSession::new(command).with_pulse_interval(config.pulse_interval());
    let observer: Box<dyn RunObserver> = if args.plain {
        Box::new(PlainObserver)
    } else {
        Box::new(CliObserver::new())
    };

    session
        .run_until(observer.as_ref(), interrupted())
        .await
        .with_context(|| format!("Could not run '{}'", session.command().program))
}

fn show_command(config: &AppConfig, args: &SyncArgs) -> anyhow::Result<()> {
    let options = config.sync_options(args)?;
    let command = config.sync_command(args, &options);
    println!("{}", command);
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the run simply
/// cannot be interrupted.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Interrupted, stopping rsync");
}

fn report_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<rsync_pulse_core::Error>() {
        Some(rsync_pulse_core::Error::Config(notice)) => {
            eprintln!("{}", notice.yellow().bold());
            EXIT_CONFIG
        }
        _ => {
            error!("Error: {:#}", err);
            EXIT_FAILURE
        }
    }
}
