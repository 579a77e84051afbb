//! Path-addressed write-back of edited colors into their source documents.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::models::{sanitize_channel, AddressFault, ColorParameter, PatchAddressError};

/// Documents of one session, keyed by relative path.
pub type SourceDocuments = BTreeMap<String, Value>;

/// Result of a patch pass.
#[derive(Debug, Default)]
pub struct PatchOutcome {
    /// Patched copies of every document that owns a parameter and patched cleanly
    pub documents: BTreeMap<String, Value>,
    /// Files dropped from the output, with the first address error each hit
    pub failures: Vec<(String, PatchAddressError)>,
}

/// Writes each parameter's current color into a copy of its owning document.
///
/// Each document is deep-copied at most once. Sources are never modified, so
/// repeated calls on the same state produce the same output. A path that no
/// longer resolves drops that document from the output and is reported in
/// [`PatchOutcome::failures`]; other documents are unaffected.
pub fn apply(parameters: &[ColorParameter], sources: &SourceDocuments) -> PatchOutcome {
    let mut copies: HashMap<&str, Value> = HashMap::new();
    let mut failed: BTreeMap<String, PatchAddressError> = BTreeMap::new();

    for param in parameters {
        let file = param.relative_path.as_str();
        if failed.contains_key(file) {
            continue;
        }

        if !copies.contains_key(file) {
            let Some(source) = sources.get(file) else {
                failed.insert(
                    file.to_string(),
                    PatchAddressError {
                        parameter_id: param.id.clone(),
                        segment: 0,
                        path: param.path.to_string(),
                        fault: AddressFault::MissingDocument,
                    },
                );
                continue;
            };
            copies.insert(file, source.clone());
        }
        let Some(doc) = copies.get_mut(file) else {
            continue;
        };

        if let Err(err) = write_color(doc, param) {
            warn!("Dropping {} from save: {}", file, err);
            copies.remove(file);
            failed.insert(file.to_string(), err);
        }
    }

    PatchOutcome {
        documents: copies
            .into_iter()
            .map(|(file, doc)| (file.to_string(), doc))
            .collect(),
        failures: failed.into_iter().collect(),
    }
}

/// Overwrites the channels at `param.path` that differ from `param.rgba`.
///
/// Untouched channels keep their original representation, so an unedited
/// parameter leaves the document byte-for-byte identical.
fn write_color(doc: &mut Value, param: &ColorParameter) -> Result<(), PatchAddressError> {
    let target = param.path.resolve_mut(doc, &param.id)?;
    let Value::Object(channels) = target else {
        return Err(PatchAddressError {
            parameter_id: param.id.clone(),
            segment: param.path.segments().len(),
            path: param.path.to_string(),
            fault: AddressFault::TerminalNotObject,
        });
    };

    let rgba = param.rgba;
    for (key, value) in [("R", rgba.r), ("G", rgba.g), ("B", rgba.b), ("A", rgba.a)] {
        if sanitize_channel(channels.get(key)) != value {
            channels.insert(key.to_string(), Value::from(value));
        }
    }
    Ok(())
}

/// Writes a document as pretty JSON using a temp file + rename.
///
/// Parent directories are created as needed.
pub fn write_document(path: &Path, doc: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(doc).context("Failed to serialize document")?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
