//! Recolor command: bulk-edit the color parameters of a directory and write
//! the patched documents elsewhere.

use crate::cli::common::{load_config, print_json, split_list, CliError, CliResult};
use crate::cli::scan::{failure_items, load_session, FailureItem};
use crate::models::RgbColor;
use crate::services::project::{export_project, save_project};
use crate::services::{Session, SessionError, ViewFilter};
use clap::{ArgGroup, Args};
use serde::Serialize;
use std::path::PathBuf;

/// Recolor the parameters of a directory of JSON documents
#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("edit")
        .required(true)
        .args(["color", "hue_shift", "shuffle"])
))]
pub struct RecolorArgs {
    /// Directory of JSON documents (searched recursively)
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Directory receiving the patched documents
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Apply one color (#RGB or #RRGGBB)
    #[arg(long, value_name = "HEX")]
    pub color: Option<String>,

    /// Rotate the hue by this many degrees
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub hue_shift: Option<f64>,

    /// Give each file a palette color (comma-separated; defaults to the configured palette)
    #[arg(long, value_name = "HEX,...", num_args = 0..=1)]
    pub shuffle: Option<Option<String>>,

    /// Only edit parameters whose name or file name contains this text
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Only edit parameters in these folders (repeatable)
    #[arg(long = "folder", value_name = "FOLDER")]
    pub folders: Vec<String>,

    /// Leave grayscale parameters out of the selection
    #[arg(long)]
    pub hide_grayscale: bool,

    /// Replace colors outright instead of keeping each parameter's brightness
    #[arg(long)]
    pub no_preserve_intensity: bool,

    /// Also edit grayscale parameters
    #[arg(long)]
    pub include_grayscale: bool,

    /// Write the edited colors to this project file
    #[arg(long, value_name = "FILE")]
    pub export_project: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecolorResponse {
    success: bool,
    selected: usize,
    changed: usize,
    written: Vec<String>,
    load_failures: Vec<FailureItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_file: Option<String>,
}

impl RecolorArgs {
    /// Execute the recolor command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let mut opts = config.editing.edit_options();
        if self.no_preserve_intensity {
            opts.preserve_intensity = false;
        }
        if self.include_grayscale {
            opts.ignore_grayscale = false;
        }

        let mut session = Session::new(config.filter.clone(), config.editing.history_limit);
        let report = load_session(&mut session, &self.dir)?;

        let filter = ViewFilter {
            folders: self.folders.clone(),
            show_grayscale: !self.hide_grayscale,
            search: self.search.clone().unwrap_or_default(),
        };
        session.select_all(&filter);
        let selected = session.selection().len();

        let edited = if let Some(hex) = &self.color {
            let color = parse_color(hex)?;
            session.apply_color(color, opts)
        } else if let Some(degrees) = self.hue_shift {
            session.hue_shift(degrees, opts)
        } else {
            let palette = match self.shuffle.as_ref().and_then(Option::as_deref) {
                Some(list) => split_list(list)
                    .iter()
                    .map(|hex| parse_color(hex))
                    .collect::<CliResult<Vec<_>>>()?,
                None => config
                    .editing
                    .palette()
                    .map_err(|e| CliError::validation(format!("Invalid configured palette: {e:#}")))?,
            };
            session.shuffle(&palette, opts)
        };
        let changed = edited.map_err(|e| match e {
            SessionError::NothingSelected => {
                CliError::validation("No color parameters matched the selection")
            }
            other => CliError::validation(other.to_string()),
        })?;

        let saved = session
            .save(&self.output)
            .map_err(|e| CliError::io(format!("Failed to save documents: {e}")))?;
        if !saved.failures.is_empty() {
            let details = saved
                .failures
                .iter()
                .map(|(file, error)| format!("{file}: {error}"))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CliError::io(format!(
                "Failed to save {} document(s)",
                saved.failures.len()
            ))
            .with_details(details));
        }

        if let Some(path) = &self.export_project {
            save_project(path, &export_project(session.parameters()))
                .map_err(|e| CliError::io(format!("{e:#}")))?;
        }

        print_json(&RecolorResponse {
            success: true,
            selected,
            changed,
            written: saved
                .written
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            load_failures: failure_items(&report.failures),
            project_file: self
                .export_project
                .as_ref()
                .map(|p| p.display().to_string()),
        })
    }
}

fn parse_color(hex: &str) -> CliResult<RgbColor> {
    RgbColor::from_hex(hex).map_err(|e| CliError::validation(format!("Invalid color '{hex}': {e}")))
}
