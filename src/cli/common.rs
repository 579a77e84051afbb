//! Shared CLI plumbing: exit codes, the error type every command returns,
//! and JSON output helpers.

use crate::config::Config;
use serde::Serialize;
use std::fmt;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Bad arguments or configuration
    Usage = 1,
    /// An input file or list does not exist
    InputNotFound = 2,
    /// Input could not be parsed, or a to-json batch had failures
    ParseFailure = 4,
    /// Output could not be written, or a from-json batch had failures
    WriteFailure = 5,
    /// Anything else
    Unexpected = 99,
}

impl ExitCode {
    /// Numeric process exit code.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by command handlers.
#[derive(Debug, Clone)]
pub struct CliError {
    /// Exit code to terminate with
    pub kind: ExitCode,
    /// Human-readable message
    pub message: String,
    /// Optional extra context
    pub details: Option<String>,
}

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn new(kind: ExitCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches extra context.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Invalid arguments or configuration.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ExitCode::Usage, message)
    }

    /// Missing input file.
    pub fn input_not_found(message: impl Into<String>) -> Self {
        Self::new(ExitCode::InputNotFound, message)
    }

    /// Input could not be read or parsed.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ExitCode::ParseFailure, message)
    }

    /// Output could not be written.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ExitCode::WriteFailure, message)
    }

    /// Unexpected failure.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ExitCode::Unexpected, message)
    }

    /// Exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        self.kind.code()
    }

    /// Prints the `{success:false, error, details}` record on stdout.
    pub fn report(&self) {
        let record = ErrorRecord {
            success: false,
            error: &self.message,
            details: self.details.as_deref(),
        };
        match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(_) => println!("{}", self.message),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    success: bool,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

/// Prints `value` as a single JSON line on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let line = serde_json::to_string(value)
        .map_err(|e| CliError::unexpected(format!("Failed to serialize JSON: {e}")))?;
    println!("{line}");
    Ok(())
}

/// Loads the persisted configuration.
pub fn load_config() -> CliResult<Config> {
    Config::load().map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))
}

/// Splits a comma-separated option value, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
