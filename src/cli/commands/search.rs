//! hri search - Hybrid search over candidates

use clap::Args;

use crate::app::AppContext;
use crate::cli::colors::{ColorSupport, HriStyles, format_score, styled};
use crate::cli::output::{RobotResponse, emit_json, robot_ok};
use crate::error::Result;
use crate::search::{SearchControl, SearchQuery, SearchResult, Weights};
use crate::tools::HybridHit;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free text matched semantically against work experience
    pub text: Option<String>,

    /// Skill to match (repeatable)
    #[arg(long = "skill", value_name = "SKILL")]
    pub skills: Vec<String>,

    /// Company to match (repeatable)
    #[arg(long = "company", value_name = "COMPANY")]
    pub companies: Vec<String>,

    /// Role or responsibility to match (repeatable)
    #[arg(long = "role", value_name = "ROLE")]
    pub roles: Vec<String>,

    /// Institution to match (repeatable)
    #[arg(long = "institution", value_name = "NAME")]
    pub institutions: Vec<String>,

    /// Degree to match (repeatable)
    #[arg(long = "degree", value_name = "DEGREE")]
    pub degrees: Vec<String>,

    /// Require every --skill instead of any
    #[arg(long)]
    pub match_all: bool,

    /// Treat --company as an exact, required filter
    #[arg(long)]
    pub exact_company: bool,

    /// Require a match on every given filter instead of any
    #[arg(long)]
    pub require_all: bool,

    /// Maximum number of results (1-100)
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Skip this many ranked results
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    #[arg(long)]
    pub semantic_weight: Option<f32>,

    #[arg(long)]
    pub fuzzy_weight: Option<f32>,

    #[arg(long)]
    pub exact_weight: Option<f32>,

    /// Minimum fuzzy similarity in [0, 1]
    #[arg(long)]
    pub threshold: Option<f32>,
}

impl SearchArgs {
    fn to_query(&self, defaults: Weights) -> SearchQuery {
        let mut query = SearchQuery::new()
            .with_skills(self.skills.iter().cloned())
            .with_companies(self.companies.iter().cloned())
            .with_roles(self.roles.iter().cloned())
            .with_education(self.institutions.iter().cloned())
            .with_degrees(self.degrees.iter().cloned())
            .match_all_skills(self.match_all)
            .exact_companies(self.exact_company)
            .require_all_filters(self.require_all)
            .with_offset(self.offset);
        if let Some(text) = &self.text {
            query = query.with_text(text.clone());
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        if self.semantic_weight.is_some() || self.fuzzy_weight.is_some() || self.exact_weight.is_some() {
            query = query.with_weights(Weights::new(
                self.semantic_weight.unwrap_or(defaults.semantic_weight),
                self.fuzzy_weight.unwrap_or(defaults.fuzzy_weight),
                self.exact_weight.unwrap_or(defaults.exact_weight),
            ));
        }
        if let Some(threshold) = self.threshold {
            query = query.with_fuzzy_threshold(threshold);
        }
        query
    }
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let query = args.to_query(ctx.search.settings().weights);
    let mut control = SearchControl::new();
    if let Some(timeout) = ctx.config.search.timeout() {
        control = control.with_timeout(timeout);
    }
    let results = ctx.search.search_with(&query, &control)?;

    if ctx.robot_mode {
        let degraded = results.iter().any(|r| r.degraded);
        let hits: Vec<HybridHit> = results.into_iter().map(HybridHit::from).collect();
        let mut response: RobotResponse<_> = robot_ok(hits);
        if degraded {
            response
                .warnings
                .push("vector store unavailable; semantic scores are zero".to_string());
        }
        return emit_json(&response);
    }

    render_human(&results);
    Ok(())
}

fn render_human(results: &[SearchResult]) {
    let support = ColorSupport::detect();
    if results.is_empty() {
        println!("{}", styled("No matching candidates", HriStyles::warning, support));
        return;
    }
    if results.iter().any(|r| r.degraded) {
        println!(
            "{}",
            styled(
                "! vector store unavailable; ranking uses structured matches only",
                HriStyles::warning,
                support
            )
        );
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>3}. {} {} {}",
            rank + 1,
            format_score(result.score, support),
            styled(&result.candidate.name, HriStyles::bold, support),
            styled(
                format!("({})", result.candidate.id),
                HriStyles::candidate_id,
                support
            ),
        );
        let summary = result.explanation.summary();
        if !summary.is_empty() {
            println!("     {}", styled(summary, HriStyles::muted, support));
        }
    }
}
