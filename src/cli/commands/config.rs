//! hri config - Inspect configuration

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::{AppContext, find_hri_root};
use crate::cli::output::{emit_json, robot_ok};
use crate::config::{CONFIG_FILENAME, Config};
use crate::error::{HriError, Result};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration after layering and env overrides
    Show,
    /// Print the path of the data root's config file
    Path,
}

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    root: &'a Path,
    config_path: &'a Path,
    config: &'a Config,
}

/// Config is readable before `hri init` has created any store.
pub fn run_without_context(robot: bool, explicit: Option<&Path>, args: &ConfigArgs) -> Result<()> {
    let root = find_hri_root()?;
    let config = Config::load(explicit, &root)?;
    let config_path = explicit.map_or_else(|| root.join(CONFIG_FILENAME), PathBuf::from);
    render(robot, &root, &config_path, &config, &args.command)
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    render(
        ctx.robot_mode,
        &ctx.hri_root,
        &ctx.config_path,
        &ctx.config,
        &args.command,
    )
}

fn render(
    robot: bool,
    root: &Path,
    config_path: &Path,
    config: &Config,
    command: &ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Show if robot => emit_json(&robot_ok(ConfigView {
            root,
            config_path,
            config,
        })),
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| HriError::Serialization(format!("render config: {e}")))?;
            println!("# root: {}", root.display());
            println!("# file: {}", config_path.display());
            print!("{rendered}");
            Ok(())
        }
        ConfigCommand::Path if robot => emit_json(&robot_ok(config_path)),
        ConfigCommand::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}
