//! hri - Hybrid Resume Intelligence CLI
//!
//! Ingest extracted resumes and search them with structured, fuzzy and
//! semantic matching.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hri::Result;
use hri::app::AppContext;
use hri::cli::commands::{completions, config, init};
use hri::cli::output::robot_error;
use hri::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let robot = cli.robot_requested();
    init_tracing(&cli, robot);

    match run(&cli, robot) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if robot {
                // Robot mode: JSON error output to stdout
                println!(
                    "{}",
                    serde_json::to_string(&robot_error(&e)).unwrap_or_default()
                );
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, robot: bool) -> Result<()> {
    // These work before `hri init` has created any store.
    match &cli.command {
        Commands::Init(args) => {
            return init::run_without_context(robot, cli.config.as_deref(), args);
        }
        Commands::Config(args) => {
            return config::run_without_context(robot, cli.config.as_deref(), args);
        }
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }
    let ctx = AppContext::from_cli(cli)?;
    hri::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli, robot: bool) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,hri=info",
        1 => "info,hri=debug",
        2 => "debug,hri=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
