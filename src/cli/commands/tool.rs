//! hri tool - Invoke a recruiter tool directly

use clap::Args;
use serde_json::Value;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::{HriError, Result};

#[derive(Args, Debug)]
pub struct ToolArgs {
    /// Tool name, e.g. find_skill_combinations
    pub name: String,

    /// Arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,
}

pub fn run(ctx: &AppContext, args: &ToolArgs) -> Result<()> {
    let arguments: Value = serde_json::from_str(&args.args)
        .map_err(|e| HriError::Validation(format!("--args is not valid JSON: {e}")))?;
    let value = ctx.tools().call(&args.name, &arguments)?;

    if ctx.robot_mode {
        emit_json(&robot_ok(value))
    } else {
        emit_json(&value)
    }
}
