//! hri reindex - Rebuild every embedding from the structured store

use std::time::Instant;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::AppContext;
use crate::cli::commands::lock_data_root;
use crate::cli::output::{emit_json, robot_partial};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ReindexArgs {}

pub fn run(ctx: &AppContext, _args: &ReindexArgs) -> Result<()> {
    let _lock = lock_data_root(&ctx.hri_root)?;
    // A fresh collection also replaces a snapshot that no longer loads.
    let ingestor = ctx.reindexer()?;

    if ctx.robot_mode {
        let report = ingestor.reindex(|_, _| {})?;
        return emit_json(&robot_partial(report, report.indexed, report.failed, Vec::new()));
    }

    let start = Instant::now();
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    let report = ingestor.reindex(|done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    println!(
        "{} Reindexed {} candidates in {:.2}s ({} failed)",
        "✓".green().bold(),
        report.indexed,
        start.elapsed().as_secs_f64(),
        report.failed
    );
    Ok(())
}
