//! CLI command handlers for RVFXE.
//!
//! Every command prints machine-readable JSON on stdout and maps failures
//! onto the process exit codes in [`ExitCode`].

pub mod cache;
pub mod common;
pub mod config;
pub mod convert;
pub mod project;
pub mod recolor;
pub mod scan;
pub mod version;

// Re-export types used by main.rs and tests
pub use cache::CacheArgs;
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use convert::{BatchArgs, FromJsonArgs, ToJsonArgs};
pub use project::ProjectArgs;
pub use recolor::RecolorArgs;
pub use scan::ScanArgs;
