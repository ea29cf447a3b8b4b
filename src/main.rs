mod cli;
mod commands;
mod config;
mod meta;
mod operation;
mod paths;
mod repository;
mod runner;
mod ssh;
mod status;
mod task;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use commands::Runtime;
use operation::OperationKind;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let rt = Runtime::load(cli.home.as_deref(), cli.jobs)?;

    match cli.command {
        Command::Upgrade(args) => commands::upgrade::run(&rt, args),
        Command::ScaleIn(args) => commands::scale_in::run(&rt, args),
        Command::Start(args) => {
            commands::lifecycle::run(&rt, &args.cluster, OperationKind::Start, false)
        }
        Command::Stop(args) => {
            commands::lifecycle::run(&rt, &args.cluster, OperationKind::Stop, args.force)
        }
        Command::Restart(args) => {
            commands::lifecycle::run(&rt, &args.cluster, OperationKind::Restart, args.force)
        }
        Command::Status(args) => commands::status::run(&rt, &args.cluster),
        Command::Destroy(args) => commands::destroy::run(&rt, args),
    }
}
