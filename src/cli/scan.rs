//! Scan command: extract and list the color parameters of a directory of
//! JSON documents.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::services::{Session, SessionError, ViewFilter};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extract and list color parameters
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Directory of JSON documents (searched recursively)
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Only list parameters whose name or file name contains this text
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Only list parameters in these folders (repeatable)
    #[arg(long = "folder", value_name = "FOLDER")]
    pub folders: Vec<String>,

    /// Leave out grayscale parameters
    #[arg(long)]
    pub hide_grayscale: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterItem {
    id: String,
    relative_path: String,
    param_name: String,
    folder: String,
    path: String,
    hex: String,
    rgba: [f64; 4],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanResponse {
    success: bool,
    files: usize,
    folders: Vec<String>,
    failures: Vec<FailureItem>,
    count: usize,
    parameters: Vec<ParameterItem>,
}

/// A file that could not be loaded.
#[derive(Debug, Serialize)]
pub(crate) struct FailureItem {
    pub(crate) file: String,
    pub(crate) error: String,
}

impl ScanArgs {
    /// Execute the scan command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let mut session = Session::new(config.filter.clone(), config.editing.history_limit);
        let report = load_session(&mut session, &self.dir)?;

        let filter = ViewFilter {
            folders: self.folders.clone(),
            show_grayscale: !self.hide_grayscale,
            search: self.search.clone().unwrap_or_default(),
        };
        let parameters: Vec<ParameterItem> = session
            .view(&filter)
            .into_iter()
            .map(|p| ParameterItem {
                id: p.id.clone(),
                relative_path: p.relative_path.clone(),
                param_name: p.param_name.clone(),
                folder: p.folder().to_string(),
                path: p.path.to_string(),
                hex: p.rgba.display_hex(),
                rgba: [p.rgba.r, p.rgba.g, p.rgba.b, p.rgba.a],
            })
            .collect();

        let response = ScanResponse {
            success: true,
            files: report.loaded,
            folders: session.folders(),
            failures: failure_items(&report.failures),
            count: parameters.len(),
            parameters,
        };

        if self.json {
            return print_json(&response);
        }

        println!(
            "Scanned {} file(s), {} color parameter(s) shown",
            response.files, response.count
        );
        for failure in &response.failures {
            println!("  skipped {}: {}", failure.file, failure.error);
        }
        if !response.parameters.is_empty() {
            println!();
        }
        for item in &response.parameters {
            println!(
                "  {}  {:<40} {}",
                item.hex, item.param_name, item.relative_path
            );
        }
        Ok(())
    }
}

/// Loads `dir` into `session`, mapping load errors onto exit codes.
pub(crate) fn load_session(
    session: &mut Session,
    dir: &Path,
) -> CliResult<crate::services::LoadReport> {
    if !dir.is_dir() {
        return Err(CliError::input_not_found(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }
    session.load_directory(dir, false).map_err(|e| match e {
        SessionError::Io { .. } => CliError::input_not_found(format!("Failed to scan directory: {e}")),
        other => CliError::parse(format!("Failed to load documents: {other}")),
    })
}

pub(crate) fn failure_items(failures: &[(String, String)]) -> Vec<FailureItem> {
    failures
        .iter()
        .map(|(file, error)| FailureItem {
            file: file.clone(),
            error: error.clone(),
        })
        .collect()
}
