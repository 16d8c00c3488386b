//! hri ingest - Load extracted candidate JSON into both stores

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::commands::lock_data_root;
use crate::cli::output::{emit_json, robot_partial};
use crate::error::Result;
use crate::ingest::{IngestReport, Ingestor, Rejected};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON files or directories containing extraction output
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct IngestSummary {
    files: usize,
    #[serde(flatten)]
    report: IngestReport,
}

pub fn run(ctx: &AppContext, args: &IngestArgs) -> Result<()> {
    let _lock = lock_data_root(&ctx.hri_root)?;

    let mut files = Vec::new();
    for path in &args.paths {
        files.extend(Ingestor::discover(path)?);
    }
    let ingestor = ctx.ingestor();

    if ctx.robot_mode {
        ingest_robot(&ingestor, &files)
    } else {
        ingest_human(&ingestor, &files)
    }
}

/// A file that cannot be read or is not JSON is rejected as a whole.
fn ingest_one(ingestor: &Ingestor, path: &std::path::Path, report: &mut IngestReport) -> Result<()> {
    match ingestor.ingest_file(path) {
        Ok(file_report) => {
            report.ingested.extend(file_report.ingested);
            report.warnings.extend(file_report.warnings);
            report.rejected.extend(file_report.rejected);
            report.vector_failures.extend(file_report.vector_failures);
            Ok(())
        }
        Err(err @ (crate::HriError::Validation(_) | crate::HriError::Io(_))) => {
            report.rejected.push(Rejected {
                source: path.display().to_string(),
                index: 0,
                reason: err.to_string(),
            });
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn ingest_human(ingestor: &Ingestor, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        println!("{}", "No JSON files found".yellow());
        return Ok(());
    }

    let start = Instant::now();
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    let mut report = IngestReport::default();
    for path in files {
        pb.set_message(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let rejected_before = report.rejected.len();
        ingest_one(ingestor, path, &mut report)?;
        for rejected in &report.rejected[rejected_before..] {
            pb.println(format!(
                "{} {}#{} - {}",
                "✗".red(),
                rejected.source,
                rejected.index,
                rejected.reason
            ));
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{} Ingested {} candidates from {} files in {:.2}s ({} rejected)",
        "✓".green().bold(),
        report.ingested.len(),
        files.len(),
        start.elapsed().as_secs_f64(),
        report.rejected.len()
    );
    if !report.warnings.is_empty() {
        println!(
            "{} {} fields missing or unparseable (-v for details)",
            "!".yellow(),
            report.warnings.len()
        );
    }
    if !report.vector_failures.is_empty() {
        println!(
            "{} {} candidates were not embedded; run `hri reindex`",
            "!".yellow(),
            report.vector_failures.len()
        );
    }
    Ok(())
}

fn ingest_robot(ingestor: &Ingestor, files: &[PathBuf]) -> Result<()> {
    let mut report = IngestReport::default();
    for path in files {
        ingest_one(ingestor, path, &mut report)?;
    }

    let mut warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
    warnings.extend(
        report
            .vector_failures
            .iter()
            .map(|id| format!("{id}: embedding not stored")),
    );
    let completed = report.ingested.len();
    let failed = report.rejected.len();
    emit_json(&robot_partial(
        IngestSummary {
            files: files.len(),
            report,
        },
        completed,
        failed,
        warnings,
    ))
}
