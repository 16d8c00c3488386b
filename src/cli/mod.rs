//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

pub mod colors;
pub mod commands;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "hri", version, about = "Hybrid resume search over structured and semantic stores")]
pub struct Cli {
    /// Emit JSON on stdout for machine consumption
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use this config file instead of the layered defaults
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `--robot`, or `HRI_ROBOT` set to a truthy value.
    #[must_use]
    pub fn robot_requested(&self) -> bool {
        self.robot
            || std::env::var("HRI_ROBOT").is_ok_and(|value| {
                matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
            })
    }
}
