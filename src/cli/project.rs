//! Project commands: save a directory's colors to a project file and apply a
//! project file to another copy of the documents.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::cli::scan::load_session;
use crate::services::project::{load_project, save_project};
use crate::services::{export_project, import_project, Session};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Export or import project files
#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Project subcommand
    #[command(subcommand)]
    pub command: ProjectCommand,
}

/// Project subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ProjectCommand {
    /// Save every color parameter of a directory to a project file
    Export(ProjectExportArgs),
    /// Apply a project file to a directory and write the patched documents
    Import(ProjectImportArgs),
}

/// Save every color parameter of a directory to a project file
#[derive(Debug, Clone, Args)]
pub struct ProjectExportArgs {
    /// Directory of JSON documents
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Project file to write
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Apply a project file to a directory and write the patched documents
#[derive(Debug, Clone, Args)]
pub struct ProjectImportArgs {
    /// Directory of JSON documents
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Project file to apply
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory receiving the patched documents
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    success: bool,
    project_file: String,
    count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    success: bool,
    matched: usize,
    fallback_matched: usize,
    unmatched: usize,
    written: usize,
}

impl ProjectArgs {
    /// Execute the project command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ProjectCommand::Export(args) => args.execute(),
            ProjectCommand::Import(args) => args.execute(),
        }
    }
}

impl ProjectExportArgs {
    /// Execute the export command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let mut session = Session::new(config.filter.clone(), config.editing.history_limit);
        load_session(&mut session, &self.dir)?;

        let entries = export_project(session.parameters());
        save_project(&self.file, &entries).map_err(|e| CliError::io(format!("{e:#}")))?;

        print_json(&ExportResponse {
            success: true,
            project_file: self.file.display().to_string(),
            count: entries.len(),
        })
    }
}

impl ProjectImportArgs {
    /// Execute the import command
    pub fn execute(&self) -> CliResult<()> {
        if !self.file.is_file() {
            return Err(CliError::input_not_found(format!(
                "Project file not found: {}",
                self.file.display()
            )));
        }
        let entries = load_project(&self.file).map_err(|e| CliError::parse(format!("{e:#}")))?;

        let config = load_config()?;
        let mut session = Session::new(config.filter.clone(), config.editing.history_limit);
        load_session(&mut session, &self.dir)?;

        let report = import_project(&mut session, &entries);
        let saved = session
            .save(&self.output)
            .map_err(|e| CliError::io(format!("Failed to save documents: {e}")))?;
        if let Some((file, error)) = saved.failures.first() {
            return Err(CliError::io(format!(
                "Failed to save {} document(s)",
                saved.failures.len()
            ))
            .with_details(format!("{file}: {error}")));
        }

        print_json(&ImportResponse {
            success: true,
            matched: report.matched,
            fallback_matched: report.fallback_matched,
            unmatched: report.unmatched,
            written: saved.written.len(),
        })
    }
}
