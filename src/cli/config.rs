//! Configuration management CLI commands.

use crate::cli::common::{load_config, split_list, CliError, CliResult};
use crate::config::{Config, SettingsStore};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Configuration management commands
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display current configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug, Clone)]
pub struct ConfigSetArgs {
    /// Converter executable
    #[arg(long, value_name = "FILE")]
    tool: Option<PathBuf>,

    /// Mapping file handed to the converter
    #[arg(long, value_name = "FILE")]
    usmap: Option<PathBuf>,

    /// Conversion cache directory
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Include keywords (comma-separated, replaces the list)
    #[arg(long, value_name = "K,...")]
    include: Option<String>,

    /// Exclude keywords (comma-separated, replaces the list)
    #[arg(long, value_name = "K,...")]
    exclude: Option<String>,

    /// Struct field names treated as colors (comma-separated, replaces the list)
    #[arg(long, value_name = "N,...")]
    color_props: Option<String>,

    /// Batch worker threads (0 = processor count)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Set(args) => args.execute(),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;

        if self.json {
            let json = serde_json::to_string_pretty(&config).map_err(|e| {
                CliError::unexpected(format!("Failed to serialize configuration to JSON: {e}"))
            })?;
            println!("{json}");
        } else {
            output_human_readable(&config);
        }

        Ok(())
    }
}

impl ConfigSetArgs {
    fn is_empty(&self) -> bool {
        self.tool.is_none()
            && self.usmap.is_none()
            && self.cache_dir.is_none()
            && self.include.is_none()
            && self.exclude.is_none()
            && self.color_props.is_none()
            && self.workers.is_none()
    }

    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.tool {
            config.paths.converter_tool = Some(path.clone());
        }
        if let Some(path) = &self.usmap {
            config.paths.mapping_file = Some(path.clone());
        }
        if let Some(path) = &self.cache_dir {
            config.paths.cache_dir = Some(path.clone());
        }
        if let Some(list) = &self.include {
            config.filter.include_keywords = split_list(list);
        }
        if let Some(list) = &self.exclude {
            config.filter.exclude_keywords = split_list(list);
        }
        if let Some(list) = &self.color_props {
            config.filter.color_property_names = split_list(list);
        }
        if let Some(workers) = self.workers {
            config.conversion.workers = workers;
        }
    }

    /// Execute set command
    pub fn execute(&self) -> CliResult<()> {
        if self.is_empty() {
            return Err(CliError::validation(
                "At least one configuration option must be specified: --tool, --usmap, --cache-dir, --include, --exclude, --color-props or --workers",
            ));
        }

        if let Some(path) = self.tool.as_ref().filter(|p| !p.is_file()) {
            return Err(CliError::validation(format!(
                "Converter tool does not exist: {}",
                path.display()
            )));
        }
        if let Some(path) = self.usmap.as_ref().filter(|p| !p.is_file()) {
            return Err(CliError::validation(format!(
                "Mapping file does not exist: {}",
                path.display()
            )));
        }

        let store = SettingsStore::new(load_config()?);
        store.subscribe(|config| {
            debug!(
                "Configuration changed: {} include / {} exclude keyword(s)",
                config.filter.include_keywords.len(),
                config.filter.exclude_keywords.len()
            );
        });
        store
            .update(|config| self.apply(config))
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e:#}")))?;
        store
            .get()
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");

        Ok(())
    }
}

fn display_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "(not configured)".to_string(), |p| p.display().to_string())
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config) {
    println!("RVFXE Configuration");
    println!("===================");
    println!();

    println!("Paths:");
    println!("  Converter Tool: {}", display_path(config.paths.converter_tool.as_ref()));
    println!("  Mapping File:   {}", display_path(config.paths.mapping_file.as_ref()));
    println!("  Cache:          {}", config.cache_dir().display());
    println!();

    println!("Conversion:");
    println!("  Workers:        {}", config.conversion.workers);
    println!("  Timeout:        {}s", config.conversion.unit_timeout_secs);
    println!("  Use Cache:      {}", config.conversion.use_cache);
    println!("  Auto Clear:     {}", config.conversion.auto_clear_cache);
    println!();

    println!("Filter:");
    println!("  Include:        {}", config.filter.include_keywords.join(", "));
    println!("  Exclude:        {}", config.filter.exclude_keywords.join(", "));
    println!("  Color Props:    {}", config.filter.color_property_names.join(", "));
    println!();

    println!("Editing:");
    println!("  Preserve Intensity: {}", config.editing.preserve_intensity);
    println!("  Ignore Grayscale:   {}", config.editing.ignore_grayscale);
    println!("  History Limit:      {}", config.editing.history_limit);
    println!("  Shuffle Palette:    {}", config.editing.shuffle_palette.join(", "));
    println!();
}
