//! In-memory editing session: loaded documents, parameter history and
//! selection.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::history::History;
use super::patch::{self, SourceDocuments};
use super::recolor::{self, EditOptions};
use crate::extract::{extract_parameters, folder_facets, load_document};
use crate::models::{ColorParameter, FilterDictionary, LinearColor, RgbColor};

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A bulk edit was requested with an empty selection.
    #[error("no parameters selected")]
    NothingSelected,
    /// An id that is not in the current parameter list.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    /// A shuffle was requested without colors.
    #[error("shuffle palette is empty")]
    EmptyPalette,
    /// Filesystem failure.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a load.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Files loaded and extracted
    pub loaded: usize,
    /// Files skipped because they were already loaded
    pub skipped: usize,
    /// Parameters added by this load
    pub parameters: usize,
    /// Files that failed to read or parse, with the reason
    pub failures: Vec<(String, String)>,
}

/// Outcome of a save.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Files written
    pub written: Vec<PathBuf>,
    /// Files not written, with the reason
    pub failures: Vec<(String, String)>,
}

/// Visibility filter for the parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFilter {
    /// Folder facets to show (empty shows every folder)
    pub folders: Vec<String>,
    /// Whether grayscale parameters are shown
    pub show_grayscale: bool,
    /// Case-insensitive substring of the parameter or file name
    pub search: String,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            show_grayscale: true,
            search: String::new(),
        }
    }
}

impl ViewFilter {
    /// True when `param` is visible under this filter.
    pub fn accepts(&self, param: &ColorParameter) -> bool {
        if !self.folders.is_empty() && !self.folders.iter().any(|f| f == param.folder()) {
            return false;
        }
        if !self.show_grayscale && param.rgba.is_grayscale() {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        param.param_name.to_lowercase().contains(&needle)
            || param.file_name.to_lowercase().contains(&needle)
    }
}

/// An editing session over a set of loaded documents.
#[derive(Debug, Default)]
pub struct Session {
    documents: SourceDocuments,
    history: History,
    selection: BTreeSet<String>,
    dictionary: FilterDictionary,
    history_limit: usize,
}

impl Session {
    /// Creates an empty session extracting with `dictionary`.
    pub fn new(dictionary: FilterDictionary, history_limit: usize) -> Self {
        Self {
            documents: SourceDocuments::new(),
            history: History::new(Vec::new(), history_limit),
            selection: BTreeSet::new(),
            dictionary,
            history_limit,
        }
    }

    /// The dictionary used by subsequent loads.
    pub fn dictionary(&self) -> &FilterDictionary {
        &self.dictionary
    }

    /// Replaces the dictionary. Already extracted parameters are kept.
    pub fn set_dictionary(&mut self, dictionary: FilterDictionary) {
        self.dictionary = dictionary;
    }

    /// Loads every `*.json` file under `root`.
    ///
    /// Without `append` the session is reset first. With it, files whose
    /// relative path is already loaded are skipped. Files that fail to parse
    /// are reported and skipped.
    pub fn load_directory(&mut self, root: &Path, append: bool) -> Result<LoadReport, SessionError> {
        let mut files = Vec::new();
        collect_json_files(root, &mut files)?;
        files.sort();

        let mut report = LoadReport::default();
        let mut documents = Vec::new();
        for file in files {
            let relative = relative_path(root, &file);
            if append && self.documents.contains_key(&relative) {
                report.skipped += 1;
                continue;
            }
            match load_document(&file) {
                Ok(doc) => documents.push((relative, doc)),
                Err(err) => {
                    warn!("Skipping {}: {}", relative, err);
                    report.failures.push((relative, err.to_string()));
                }
            }
        }

        if !append {
            self.reset();
        }
        let added = self.ingest(documents, append);
        report.loaded = added.0;
        report.parameters = added.1;
        info!(
            "Loaded {} file(s) from {} ({} parameters, {} failed)",
            report.loaded,
            root.display(),
            report.parameters,
            report.failures.len()
        );
        Ok(report)
    }

    /// Appends already-parsed documents, e.g. output of the conversion
    /// pipeline. Documents whose path is already loaded are skipped.
    pub fn load_documents(&mut self, documents: impl IntoIterator<Item = (String, Value)>) -> LoadReport {
        let mut report = LoadReport::default();
        let fresh: Vec<_> = documents
            .into_iter()
            .filter(|(relative, _)| {
                let known = self.documents.contains_key(relative);
                if known {
                    report.skipped += 1;
                }
                !known
            })
            .collect();
        let (loaded, parameters) = self.ingest(fresh, true);
        report.loaded = loaded;
        report.parameters = parameters;
        report
    }

    fn reset(&mut self) {
        self.documents.clear();
        self.selection.clear();
        self.history = History::new(Vec::new(), self.history_limit);
    }

    fn ingest(&mut self, documents: Vec<(String, Value)>, record: bool) -> (usize, usize) {
        if documents.is_empty() {
            return (0, 0);
        }
        let mut params = self.parameters().to_vec();
        let before = params.len();
        let loaded = documents.len();

        for (relative, doc) in documents {
            extract_parameters(&doc, &relative, &self.dictionary, &mut params);
            self.documents.insert(relative, doc);
        }

        let added = params.len() - before;
        if record {
            self.history.record(params);
        } else {
            self.history = History::new(params, self.history_limit);
        }
        (loaded, added)
    }

    /// The visible parameter list.
    pub fn parameters(&self) -> &[ColorParameter] {
        self.history.current()
    }

    /// Loaded documents keyed by relative path.
    pub fn documents(&self) -> &SourceDocuments {
        &self.documents
    }

    /// Looks up a parameter by id.
    pub fn parameter(&self, id: &str) -> Option<&ColorParameter> {
        self.parameters().iter().find(|p| p.id == id)
    }

    /// Sorted folder facets of the current parameters.
    pub fn folders(&self) -> Vec<String> {
        folder_facets(self.parameters())
    }

    /// Parameters visible under `filter`, in list order.
    pub fn view(&self, filter: &ViewFilter) -> Vec<&ColorParameter> {
        self.parameters().iter().filter(|p| filter.accepts(p)).collect()
    }

    /// Ids of the selected parameters.
    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    /// Adds a parameter to the selection.
    pub fn select(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_known(id)?;
        self.selection.insert(id.to_string());
        Ok(())
    }

    /// Removes a parameter from the selection.
    pub fn deselect(&mut self, id: &str) {
        self.selection.remove(id);
    }

    /// Flips the selection state of one parameter.
    pub fn toggle(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_known(id)?;
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
        Ok(())
    }

    /// Selects every visible parameter, or deselects them all when every
    /// visible parameter is already selected.
    pub fn select_all(&mut self, filter: &ViewFilter) {
        let visible: Vec<String> = self.view(filter).into_iter().map(|p| p.id.clone()).collect();
        if !visible.is_empty() && visible.iter().all(|id| self.selection.contains(id)) {
            for id in &visible {
                self.selection.remove(id);
            }
        } else {
            self.selection.extend(visible);
        }
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn ensure_known(&self, id: &str) -> Result<(), SessionError> {
        if self.parameter(id).is_some() {
            Ok(())
        } else {
            Err(SessionError::UnknownParameter(id.to_string()))
        }
    }

    /// Builds the next snapshot by mapping every selected parameter through
    /// `edit`, then records it once.
    fn edit_selection(
        &mut self,
        mut edit: impl FnMut(&ColorParameter) -> LinearColor,
    ) -> Result<usize, SessionError> {
        let selected: Vec<bool> = self
            .parameters()
            .iter()
            .map(|p| self.selection.contains(&p.id))
            .collect();
        if !selected.contains(&true) {
            return Err(SessionError::NothingSelected);
        }

        let mut changed = 0;
        let next: Vec<ColorParameter> = self
            .parameters()
            .iter()
            .zip(selected)
            .map(|(param, is_selected)| {
                let mut param = param.clone();
                if is_selected {
                    let rgba = edit(&param);
                    if rgba != param.rgba {
                        changed += 1;
                    }
                    param.rgba = rgba;
                }
                param
            })
            .collect();

        self.history.record(next);
        debug!("Edited {} parameter(s)", changed);
        Ok(changed)
    }

    /// Applies one color to the selection. Returns the number of changed
    /// parameters.
    pub fn apply_color(&mut self, color: RgbColor, opts: EditOptions) -> Result<usize, SessionError> {
        self.edit_selection(|p| recolor::apply_color(p.rgba, color, opts))
    }

    /// Rotates the hue of the selection by `degrees`.
    pub fn hue_shift(&mut self, degrees: f64, opts: EditOptions) -> Result<usize, SessionError> {
        self.edit_selection(|p| recolor::hue_shift(p.rgba, degrees, opts))
    }

    /// Gives each owning file of the selection one palette color,
    /// round-robin.
    pub fn shuffle(&mut self, palette: &[RgbColor], opts: EditOptions) -> Result<usize, SessionError> {
        if palette.is_empty() {
            return Err(SessionError::EmptyPalette);
        }
        let assignments = recolor::shuffle_assignments(
            self.parameters()
                .iter()
                .filter(|p| self.selection.contains(&p.id)),
            palette,
        );
        self.edit_selection(|p| match assignments.get(&p.relative_path) {
            Some(color) => recolor::apply_color(p.rgba, *color, opts),
            None => p.rgba,
        })
    }

    /// Sets one parameter's color directly.
    pub fn set_color(&mut self, id: &str, rgba: LinearColor) -> Result<(), SessionError> {
        self.ensure_known(id)?;
        let next = self
            .parameters()
            .iter()
            .map(|p| {
                let mut p = p.clone();
                if p.id == id {
                    p.rgba = rgba;
                }
                p
            })
            .collect();
        self.history.record(next);
        Ok(())
    }

    /// Replaces the whole parameter list as one history step.
    pub(crate) fn record(&mut self, parameters: Vec<ColorParameter>) {
        self.history.record(parameters);
    }

    /// Steps back one edit.
    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    /// Steps forward one edit.
    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    /// True when an edit can be undone.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// True when an undone edit can be redone.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Patches every document owning a parameter and writes it under
    /// `output_dir` at its relative path.
    ///
    /// Per-file failures are collected; the rest of the save proceeds.
    pub fn save(&self, output_dir: &Path) -> Result<SaveReport, SessionError> {
        fs::create_dir_all(output_dir).map_err(|source| SessionError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let outcome = patch::apply(self.parameters(), &self.documents);
        let mut report = SaveReport::default();
        for (relative, err) in outcome.failures {
            report.failures.push((relative, err.to_string()));
        }

        for (relative, doc) in &outcome.documents {
            let target = output_dir.join(relative);
            match patch::write_document(&target, doc) {
                Ok(()) => report.written.push(target),
                Err(err) => {
                    warn!("Failed to save {}: {:#}", relative, err);
                    report.failures.push((relative.clone(), format!("{err:#}")));
                }
            }
        }

        info!(
            "Saved {} file(s) to {} ({} failed)",
            report.written.len(),
            output_dir.display(),
            report.failures.len()
        );
        Ok(report)
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SessionError> {
    let io_err = |source: std::io::Error| SessionError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
