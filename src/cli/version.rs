//! Version command.

use crate::cli::common::{print_json, CliResult};
use crate::constants::APP_BINARY_NAME;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct VersionOutput {
    success: bool,
    tool: &'static str,
    version: &'static str,
}

/// Prints `{success, tool, version}`.
pub fn execute() -> CliResult<()> {
    print_json(&VersionOutput {
        success: true,
        tool: APP_BINARY_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}
