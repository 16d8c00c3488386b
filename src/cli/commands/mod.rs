//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod completions;
pub mod config;
pub mod delete;
pub mod ingest;
pub mod init;
pub mod list;
pub mod mcp;
pub mod reindex;
pub mod search;
pub mod show;
pub mod tool;

use std::path::Path;
use std::time::Duration;

use crate::app::AppContext;
use crate::error::{HriError, Result};
use crate::storage::locks::GlobalLock;

const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Hold the data root exclusively for a mutating command.
pub(crate) fn lock_data_root(root: &Path) -> Result<GlobalLock> {
    GlobalLock::acquire_timeout(root, LOCK_TIMEOUT)?.ok_or_else(|| {
        let holder = GlobalLock::holder(root).map_or_else(
            || "another process".to_string(),
            |info| format!("pid {} on {}", info.pid, info.hostname),
        );
        HriError::structured(format!("data root {} is locked by {holder}", root.display()))
    })
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data root with an empty store, index and config
    Init(init::InitArgs),

    /// Ingest extracted candidate JSON files or directories
    Ingest(ingest::IngestArgs),

    /// Hybrid search over candidates
    Search(search::SearchArgs),

    /// Show one candidate
    Show(show::ShowArgs),

    /// List stored candidates
    List(list::ListArgs),

    /// Delete a candidate from both stores
    Delete(delete::DeleteArgs),

    /// Rebuild the vector index from the structured store
    Reindex(reindex::ReindexArgs),

    /// Invoke a recruiter tool directly
    Tool(tool::ToolArgs),

    /// MCP server over stdio
    Mcp(mcp::McpArgs),

    /// Inspect configuration
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(ctx, args),
        Commands::Ingest(args) => ingest::run(ctx, args),
        Commands::Search(args) => search::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Delete(args) => delete::run(ctx, args),
        Commands::Reindex(args) => reindex::run(ctx, args),
        Commands::Tool(args) => tool::run(ctx, args),
        Commands::Mcp(args) => mcp::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
        Commands::Completions(args) => completions::run(args),
    }
}
