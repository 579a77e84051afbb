//! Project files: a portable list of parameter colors that can be re-applied
//! to a freshly loaded session.
//!
//! The format is a JSON array of
//! `{ "relativePath": "1011/fx/fire", "paramName": "BaseColor", "rgba": { "R", "G", "B", "A" } }`
//! with the file extension stripped from `relativePath`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::session::Session;
use crate::models::{ColorParameter, LinearColor};

/// One saved parameter color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    /// Owning document path without extension
    pub relative_path: String,
    /// Parameter display name
    pub param_name: String,
    /// Saved color
    pub rgba: LinearColor,
}

/// Outcome of an import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Entries matched by full path
    pub matched: usize,
    /// Entries matched only by bare file name
    pub fallback_matched: usize,
    /// Entries with no counterpart in the session
    pub unmatched: usize,
}

/// Normalizes a relative path for matching: forward slashes, no leading
/// `./`, no extension, lowercase.
///
/// # Examples
///
/// ```
/// use rvfxe::services::project::normalize_path;
///
/// assert_eq!(normalize_path(".\\1011\\FX\\Fire.json"), "1011/fx/fire");
/// assert_eq!(normalize_path("ui/hud"), "ui/hud");
/// ```
pub fn normalize_path(path: &str) -> String {
    let forward = path.replace('\\', "/");
    let mut trimmed = forward.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    strip_extension(trimmed).to_lowercase()
}

fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..name_start + dot],
        _ => path,
    }
}

fn bare_name(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}

/// Builds project entries for every parameter, in list order.
pub fn export_project(parameters: &[ColorParameter]) -> Vec<ProjectEntry> {
    parameters
        .iter()
        .map(|p| ProjectEntry {
            relative_path: strip_extension(&p.relative_path).to_string(),
            param_name: p.param_name.clone(),
            rgba: p.rgba,
        })
        .collect()
}

/// Applies saved colors to the session as a single history step.
///
/// Each entry claims the first not-yet-claimed parameter with the same
/// normalized path and name, falling back to the same bare file name and
/// name. Entries matching nothing are counted and ignored. Nothing is
/// recorded when no entry matches.
pub fn import_project(session: &mut Session, entries: &[ProjectEntry]) -> ImportReport {
    let mut next = session.parameters().to_vec();
    let keys: Vec<String> = next.iter().map(|p| normalize_path(&p.relative_path)).collect();
    let mut claimed = vec![false; next.len()];
    let mut report = ImportReport::default();

    for entry in entries {
        let path = normalize_path(&entry.relative_path);
        let unclaimed = |i: &usize| !claimed[*i] && next[*i].param_name == entry.param_name;

        let exact = (0..next.len()).filter(unclaimed).find(|i| keys[*i] == path);
        let found = match exact {
            Some(i) => {
                report.matched += 1;
                Some(i)
            }
            None => {
                let fallback = (0..next.len())
                    .filter(unclaimed)
                    .find(|i| bare_name(&keys[*i]) == bare_name(&path));
                if fallback.is_some() {
                    report.fallback_matched += 1;
                }
                fallback
            }
        };

        match found {
            Some(i) => {
                claimed[i] = true;
                next[i].rgba = entry.rgba;
            }
            None => {
                debug!("No match for {} / {}", entry.relative_path, entry.param_name);
                report.unmatched += 1;
            }
        }
    }

    if report.matched + report.fallback_matched > 0 {
        session.record(next);
    }
    info!(
        "Imported project: {} matched, {} by file name, {} unmatched",
        report.matched, report.fallback_matched, report.unmatched
    );
    report
}

/// Writes entries as pretty JSON.
pub fn save_project(path: &Path, entries: &[ProjectEntry]) -> Result<()> {
    let content = serde_json::to_string_pretty(entries).context("Failed to serialize project")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write project file: {}", path.display()))
}

/// Reads entries from a project file.
pub fn load_project(path: &Path) -> Result<Vec<ProjectEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse project file: {}", path.display()))
}
