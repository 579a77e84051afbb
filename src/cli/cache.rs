//! Conversion cache commands.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::convert::ConversionCache;
use clap::{Args, Subcommand};
use serde::Serialize;

/// Inspect or clear the conversion cache
#[derive(Debug, Clone, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum CacheCommand {
    /// Show cache location and size
    Info(CacheInfoArgs),
    /// Delete every cached conversion
    Clear,
}

/// Show cache location and size
#[derive(Debug, Clone, Args)]
pub struct CacheInfoArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearResponse {
    success: bool,
    cache_dir: String,
}

impl CacheArgs {
    /// Execute cache subcommand
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let cache = ConversionCache::open(config.cache_dir());

        match &self.command {
            CacheCommand::Info(args) => {
                let info = cache.info();
                if args.json {
                    print_json(&info)?;
                } else {
                    println!("Cache directory: {}", info.cache_dir);
                    println!("Entries:         {}", cache.len());
                    println!("Files:           {}", info.file_count);
                    println!("Size:            {} bytes", info.total_size);
                    if !info.complete {
                        println!("(some cache files could not be read; counts are partial)");
                    }
                }
                Ok(())
            }
            CacheCommand::Clear => {
                cache
                    .clear()
                    .map_err(|e| CliError::io(format!("Failed to clear cache: {e}")))?;
                print_json(&ClearResponse {
                    success: true,
                    cache_dir: cache.dir().display().to_string(),
                })
            }
        }
    }
}
