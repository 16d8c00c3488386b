//! hri delete - Remove a candidate from both stores

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::commands::lock_data_root;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::{HriError, Result};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Candidate id
    pub id: String,
}

pub fn run(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    let _lock = lock_data_root(&ctx.hri_root)?;
    let report = ctx.ingestor().delete(&args.id)?;
    if !report.existed {
        return Err(HriError::NotFound(format!("candidate {}", args.id)));
    }

    if ctx.robot_mode {
        let mut response = robot_ok(json!({ "deleted": args.id }));
        if let Some(reason) = &report.vector_failure {
            response
                .warnings
                .push(format!("embedding not removed ({reason}); run `hri reindex`"));
        }
        return emit_json(&response);
    }
    println!("{} Deleted {}", "✓".green().bold(), args.id);
    if let Some(reason) = &report.vector_failure {
        println!(
            "{} embedding not removed ({reason}); run `hri reindex`",
            "!".yellow().bold()
        );
    }
    Ok(())
}
