//! Batch translation between binary assets and their JSON projection.
//!
//! The binary codec is an external collaborator behind [`AssetCodec`]. This
//! module owns everything around it:
//!
//! - unit lists and output naming ([`units`])
//! - the content-addressed conversion cache ([`cache`])
//! - progress reporting ([`progress`])
//! - the parallel worker pool and batch summary ([`pipeline`])

pub mod cache;
pub mod codec;
pub mod pipeline;
pub mod progress;
pub mod units;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use cache::{CacheInfo, ConversionCache};
pub use codec::{AssetCodec, ExternalCodec, MappingResource, MockCodec};
pub use pipeline::{BatchPipeline, BatchSummary, CancelToken, PipelineOptions, UnitResult};
pub use progress::{ChannelSink, JsonLinesSink, NullSink, ProgressEvent, ProgressSink};
pub use units::ConversionUnit;

/// Errors raised while converting one unit.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),
    /// The mapping resource could not be read.
    #[error("Failed to load mapping {}: {source}", path.display())]
    Mapping {
        /// Mapping file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Filesystem failure around the conversion.
    #[error("{context}: {source}")]
    Io {
        /// What was being done
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The codec rejected the input.
    #[error("{0}")]
    Codec(String),
    /// The codec exceeded its deadline.
    #[error("Conversion timed out after {0}s")]
    Timeout(u64),
    /// The batch was cancelled before this unit started.
    #[error("cancelled")]
    Cancelled,
    /// The unit's output path is absolute or leaves the output directory.
    #[error("Output path must stay inside the output directory: {0}")]
    InvalidOutput(String),
    /// An earlier unit of the same batch already writes this output.
    #[error("Output {output} is already produced by {first}")]
    DuplicateOutput {
        /// Output path relative to the output directory
        output: String,
        /// Input of the unit that claimed the path first
        first: String,
    },
}

impl ConvertError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Which way a conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionDirection {
    /// Binary asset to JSON
    ToJson,
    /// JSON back to binary asset
    FromJson,
}

impl ConversionDirection {
    /// Single-file command name understood by the converter tool.
    pub const fn command(self) -> &'static str {
        match self {
            Self::ToJson => "to-json",
            Self::FromJson => "from-json",
        }
    }

    /// Batch command name reported in summaries.
    pub const fn batch_command(self) -> &'static str {
        match self {
            Self::ToJson => "batch-to-json",
            Self::FromJson => "batch-from-json",
        }
    }

    /// Extension of produced files.
    pub const fn output_extension(self) -> &'static str {
        match self {
            Self::ToJson => "json",
            Self::FromJson => "uasset",
        }
    }
}

impl fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}
