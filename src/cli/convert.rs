//! Conversion commands: single-file and batch translation through the
//! external converter tool.
//!
//! Batch commands stream JSON-lines progress on stderr and print one summary
//! record on stdout.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::config::Config;
use crate::convert::units::{derive_output_name, parse_unit_list};
use crate::convert::{
    BatchPipeline, CancelToken, ConversionCache, ConversionDirection, ConvertError,
    ExternalCodec, JsonLinesSink, MappingResource, PipelineOptions,
};
use clap::Args;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Options shared by every conversion command.
#[derive(Debug, Clone, Args)]
pub struct CodecOptions {
    /// Mapping file handed to the converter (overrides the configured one)
    #[arg(long, value_name = "FILE")]
    pub usmap: Option<PathBuf>,

    /// Converter executable (overrides the configured one)
    #[arg(long, value_name = "FILE")]
    pub tool: Option<PathBuf>,

    /// Bypass the conversion cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Convert one binary asset to JSON
#[derive(Debug, Clone, Args)]
pub struct ToJsonArgs {
    /// Binary asset to convert
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON file to write
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub codec: CodecOptions,
}

/// Convert one JSON document back to a binary asset
#[derive(Debug, Clone, Args)]
pub struct FromJsonArgs {
    /// JSON document to convert
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Binary asset to write
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub codec: CodecOptions,
}

/// Convert every file of a unit list
#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// Newline-delimited unit list (`path` or `path,outputRelativePath`)
    #[arg(value_name = "LIST")]
    pub list: PathBuf,

    /// Directory receiving the outputs
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub codec: CodecOptions,

    /// Worker threads (defaults to the configured count, 0 = processor count)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-file timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Name outputs after their location under this directory
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SingleOutput {
    success: bool,
    command: &'static str,
    input_path: String,
    output_path: String,
    cached: bool,
}

impl ToJsonArgs {
    /// Execute the to-json command
    pub fn execute(&self) -> CliResult<()> {
        convert_single(ConversionDirection::ToJson, &self.input, &self.output, &self.codec)
    }
}

impl FromJsonArgs {
    /// Execute the from-json command
    pub fn execute(&self) -> CliResult<()> {
        convert_single(ConversionDirection::FromJson, &self.input, &self.output, &self.codec)
    }
}

impl BatchArgs {
    /// Execute a batch command in `direction`.
    ///
    /// Returns the process exit code: non-zero when any unit failed, even
    /// though the batch itself completed.
    pub fn execute(&self, direction: ConversionDirection) -> CliResult<i32> {
        let config = load_config()?;

        let text = fs::read_to_string(&self.list).map_err(|e| {
            CliError::input_not_found(format!("List file not found: {}", self.list.display()))
                .with_details(e.to_string())
        })?;
        let mut units = parse_unit_list(&text);
        if let Some(root) = &self.root {
            for unit in units.iter_mut().filter(|u| u.output.is_none()) {
                unit.output = Some(derive_output_name(
                    &unit.input,
                    root,
                    direction.output_extension(),
                ));
            }
        }

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            CliError::io(format!(
                "Failed to create output directory {}",
                self.output_dir.display()
            ))
            .with_details(e.to_string())
        })?;

        let codec = resolve_codec(&self.codec, &config)?;
        let mapping = resolve_mapping(&self.codec, &config)?;
        let cache = open_cache(&self.codec, &config)?;

        let options = PipelineOptions {
            workers: self.workers.unwrap_or(config.conversion.workers),
            unit_timeout: match self.timeout {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => config.conversion.unit_timeout(),
            },
            use_cache: cache.is_some(),
        };
        let pipeline = BatchPipeline::new(&codec, cache.as_ref(), options);

        let mut sink = JsonLinesSink::stderr();
        let summary = pipeline.run(
            direction,
            &units,
            &self.output_dir,
            &mapping,
            &mut sink,
            &CancelToken::new(),
        );

        print_json(&summary)?;
        Ok(summary.exit_code())
    }
}

fn convert_single(
    direction: ConversionDirection,
    input: &Path,
    output: &Path,
    options: &CodecOptions,
) -> CliResult<()> {
    if !input.is_file() {
        return Err(CliError::input_not_found(format!(
            "File not found: {}",
            input.display()
        )));
    }

    let config = load_config()?;
    let codec = resolve_codec(options, &config)?;
    let mapping = resolve_mapping(options, &config)?;
    let cache = open_cache(options, &config)?;

    let pipeline = BatchPipeline::new(
        &codec,
        cache.as_ref(),
        PipelineOptions {
            unit_timeout: config.conversion.unit_timeout(),
            use_cache: cache.is_some(),
            ..PipelineOptions::default()
        },
    );
    let result = pipeline
        .convert_one(direction, input, output, &mapping)
        .map_err(|e| conversion_error(direction, &e))?;

    if let Some(cache) = &cache {
        if let Err(e) = cache.flush() {
            warn!("Failed to persist cache index: {}", e);
        }
    }

    print_json(&SingleOutput {
        success: true,
        command: direction.command(),
        input_path: result.input_path,
        output_path: result.output_path.unwrap_or_default(),
        cached: result.cached,
    })
}

fn conversion_error(direction: ConversionDirection, err: &ConvertError) -> CliError {
    match err {
        ConvertError::InputNotFound(_) => CliError::input_not_found(err.to_string()),
        ConvertError::Mapping { .. }
        | ConvertError::InvalidOutput(_)
        | ConvertError::DuplicateOutput { .. } => CliError::validation(err.to_string()),
        ConvertError::Io { .. } => CliError::io(err.to_string()),
        ConvertError::Codec(_) | ConvertError::Timeout(_) => match direction {
            ConversionDirection::ToJson => CliError::parse(err.to_string()),
            ConversionDirection::FromJson => CliError::io(err.to_string()),
        },
        ConvertError::Cancelled => CliError::unexpected(err.to_string()),
    }
}

fn resolve_codec(options: &CodecOptions, config: &Config) -> CliResult<ExternalCodec> {
    options
        .tool
        .clone()
        .or_else(|| config.paths.converter_tool.clone())
        .map(ExternalCodec::new)
        .ok_or_else(|| {
            CliError::validation("No converter tool configured")
                .with_details("pass --tool or run `rvfxe config set --tool <FILE>`")
        })
}

fn resolve_mapping(options: &CodecOptions, config: &Config) -> CliResult<MappingResource> {
    let path = options.usmap.as_ref().or(config.paths.mapping_file.as_ref());
    MappingResource::load(path.map(PathBuf::as_path)).map_err(|e| match e {
        ConvertError::Mapping { .. } => CliError::input_not_found(e.to_string()),
        other => CliError::unexpected(other.to_string()),
    })
}

fn open_cache(options: &CodecOptions, config: &Config) -> CliResult<Option<ConversionCache>> {
    if options.no_cache || !config.conversion.use_cache {
        return Ok(None);
    }

    let cache = ConversionCache::open(config.cache_dir());
    if config.conversion.auto_clear_cache {
        info!("Clearing conversion cache at {}", cache.dir().display());
        cache
            .clear()
            .map_err(|e| CliError::io(format!("Failed to clear cache: {e}")))?;
    }
    Ok(Some(cache))
}
