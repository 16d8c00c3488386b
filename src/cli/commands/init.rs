//! hri init - Create the data root, an empty store and an empty index

use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::app::{AppContext, ROOT_DIRNAME};
use crate::cli::commands::lock_data_root;
use crate::cli::output::{emit_json, robot_ok};
use crate::config::{CONFIG_FILENAME, Config};
use crate::error::{HriError, Result};
use crate::search::HashEmbedder;
use crate::storage::{Database, VectorIndex, VectorStore};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Initialize in the per-user data directory instead of ./.hri
    #[arg(long)]
    pub global: bool,

    /// Overwrite an existing config.toml with the defaults
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    config_path: PathBuf,
    config_written: bool,
    database_path: PathBuf,
    vector_path: PathBuf,
    candidates: usize,
    embedded: usize,
}

/// `init` runs before anything exists, so it cannot use an [`AppContext`].
pub fn run_without_context(robot: bool, explicit_config: Option<&Path>, args: &InitArgs) -> Result<()> {
    let root = init_root(args.global)?;
    let report = initialize(&root, explicit_config, args.force)?;
    render(robot, &report)
}

pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<()> {
    let explicit = (ctx.config_path != ctx.hri_root.join(CONFIG_FILENAME))
        .then_some(ctx.config_path.as_path());
    let report = initialize(&ctx.hri_root, explicit, args.force)?;
    render(ctx.robot_mode, &report)
}

fn init_root(global: bool) -> Result<PathBuf> {
    if let Ok(root) = std::env::var("HRI_ROOT") {
        return Ok(PathBuf::from(root));
    }
    if global {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| HriError::MissingConfig("data directory not found".to_string()))?;
        return Ok(data_dir.join("hri"));
    }
    Ok(std::env::current_dir()?.join(ROOT_DIRNAME))
}

fn initialize(root: &Path, explicit_config: Option<&Path>, force: bool) -> Result<InitReport> {
    let _lock = lock_data_root(root)?;

    let config_path = root.join(CONFIG_FILENAME);
    let config_written = force || !config_path.exists();
    if config_written {
        std::fs::write(&config_path, Config::default_toml()?)?;
    }

    let config = Config::load(explicit_config, root)?;
    let database_path = config.storage.database_path(root);
    let vector_path = config.storage.vector_path(root);

    let db = Database::open(&database_path)?;
    let vectors = VectorStore::open(
        &vector_path,
        &config.storage.collection,
        std::sync::Arc::new(HashEmbedder::new(config.embedding.dims as usize)),
    )?;

    let report = InitReport {
        root: root.to_path_buf(),
        config_path,
        config_written,
        database_path,
        vector_path,
        candidates: db.count_candidates()?,
        embedded: vectors.len()?,
    };
    info!(root = %root.display(), "initialized data root");
    Ok(report)
}

fn render(robot: bool, report: &InitReport) -> Result<()> {
    if robot {
        return emit_json(&robot_ok(report));
    }
    println!(
        "{} Initialized hri at {}",
        "✓".green().bold(),
        report.root.display()
    );
    println!("  database: {}", report.database_path.display());
    println!("  index:    {}", report.vector_path.display());
    if report.config_written {
        println!("  config:   {} (defaults)", report.config_path.display());
    } else {
        println!("  config:   {} (kept)", report.config_path.display());
    }
    if report.candidates > 0 {
        println!(
            "  {} candidates already stored, {} embedded",
            report.candidates, report.embedded
        );
    }
    Ok(())
}
