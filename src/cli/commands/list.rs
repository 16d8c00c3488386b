//! hri list - List stored candidates

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::colors::{ColorSupport, HriStyles, styled};
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum number of candidates
    #[arg(long, short, default_value = "50")]
    pub limit: usize,

    /// Skip this many candidates
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    id: String,
    name: String,
    skills: usize,
    experience: usize,
    education: usize,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    total: usize,
    offset: usize,
    candidates: Vec<ListEntry>,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let total = ctx.db.count_candidates()?;
    let candidates: Vec<ListEntry> = ctx
        .db
        .list_candidates(args.limit, args.offset)?
        .into_iter()
        .map(|c| ListEntry {
            skills: c.skills.len(),
            experience: c.work_experience.len(),
            education: c.education.len(),
            id: c.id,
            name: c.name,
        })
        .collect();

    if ctx.robot_mode {
        return emit_json(&robot_ok(ListOutput {
            total,
            offset: args.offset,
            candidates,
        }));
    }

    let support = ColorSupport::detect();
    if candidates.is_empty() {
        println!("{}", styled("No candidates stored", HriStyles::warning, support));
        return Ok(());
    }
    for entry in &candidates {
        println!(
            "{} {}  {}",
            styled(&entry.id, HriStyles::candidate_id, support),
            entry.name,
            styled(
                format!(
                    "{} jobs, {} degrees, {} skills",
                    entry.experience, entry.education, entry.skills
                ),
                HriStyles::muted,
                support
            )
        );
    }
    println!(
        "{}",
        styled(
            format!(
                "showing {}-{} of {total}",
                args.offset + 1,
                args.offset + candidates.len()
            ),
            HriStyles::muted,
            support
        )
    );
    Ok(())
}
