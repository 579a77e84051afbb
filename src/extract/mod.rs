//! Color parameter extraction from asset JSON documents.
//!
//! Documents come in a handful of loosely-typed shapes. Each shape is detected
//! structurally, in a fixed priority order, and the first one that matches
//! owns the whole document:
//!
//! 1. [`DocumentShape::VectorTable`] - a material export carrying
//!    `VectorParameterValues`
//! 2. [`DocumentShape::RowTable`] - a data table of style rows
//! 3. [`DocumentShape::Generic`] - recursive walk of every export
//!
//! Every candidate name passes through [`crate::models::matches`] before it is
//! recorded, and every recorded parameter carries the exact path needed to
//! write it back.

pub mod row_table;
pub mod struct_walk;
pub mod vector_table;

use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::models::{matches, ColorParameter, FilterDictionary, LinearColor, ParamPath};

/// Errors raised while reading a document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and parses one JSON document from disk.
pub fn load_document(path: &Path) -> Result<Value, ExtractError> {
    let content = fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&content, &path.display().to_string())
}

/// Parses JSON text, labelling errors with `origin`.
pub fn parse_document(content: &str, origin: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(content).map_err(|source| ExtractError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Recognized document layouts, in probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// Material export with a vector parameter table
    VectorTable {
        /// Index of the export holding the table
        export: usize,
        /// Index of the `VectorParameterValues` entry in that export's data
        entry: usize,
    },
    /// Data table export whose style rows are walked generically
    RowTable,
    /// Fallback recursive walk of every export
    Generic,
}

impl DocumentShape {
    /// Determines the shape of a document. The first structural match wins.
    pub fn detect(doc: &Value) -> Self {
        if let Some((export, entry)) = vector_table::locate(doc) {
            Self::VectorTable { export, entry }
        } else if row_table::is_row_table(doc) {
            Self::RowTable
        } else {
            Self::Generic
        }
    }

    /// Short name for logs and listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VectorTable { .. } => "vector-table",
            Self::RowTable => "row-table",
            Self::Generic => "generic",
        }
    }

    /// Runs this shape's extraction over `doc`.
    fn extract(self, doc: &Value, sink: &mut ParameterSink<'_>) {
        match self {
            Self::VectorTable { export, entry } => vector_table::extract(doc, export, entry, sink),
            Self::RowTable => row_table::extract(doc, sink),
            Self::Generic => struct_walk::extract_exports(doc, sink),
        }
    }
}

/// Collects parameters for one document, applying the name filter and
/// numbering each accepted parameter.
pub struct ParameterSink<'a> {
    relative_path: &'a str,
    file_name: &'a str,
    dictionary: &'a FilterDictionary,
    out: &'a mut Vec<ColorParameter>,
    ordinal: usize,
}

impl<'a> ParameterSink<'a> {
    fn new(
        relative_path: &'a str,
        dictionary: &'a FilterDictionary,
        out: &'a mut Vec<ColorParameter>,
    ) -> Self {
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        Self {
            relative_path,
            file_name,
            dictionary,
            out,
            ordinal: 0,
        }
    }

    /// The dictionary in effect for this document.
    pub fn dictionary(&self) -> &FilterDictionary {
        self.dictionary
    }

    /// Records a candidate if its name passes the filter.
    ///
    /// `color` is the object found at `path`; its channels are sanitized.
    pub fn offer(&mut self, name: String, path: ParamPath, color: &Value) -> bool {
        if !matches(&name, self.dictionary) {
            return false;
        }
        self.out.push(ColorParameter::new(
            self.relative_path,
            self.file_name,
            name,
            self.ordinal,
            path,
            LinearColor::from_json(color),
        ));
        self.ordinal += 1;
        true
    }

    fn recorded(&self) -> usize {
        self.ordinal
    }
}

/// Extracts every matching color parameter of one document into `out`.
///
/// Returns the shape that handled the document. Documents matching no known
/// layout simply contribute nothing.
pub fn extract_parameters(
    doc: &Value,
    relative_path: &str,
    dictionary: &FilterDictionary,
    out: &mut Vec<ColorParameter>,
) -> DocumentShape {
    let shape = DocumentShape::detect(doc);
    let mut sink = ParameterSink::new(relative_path, dictionary, out);
    shape.extract(doc, &mut sink);
    debug!(
        "Extracted {} parameter(s) from {} as {}",
        sink.recorded(),
        relative_path,
        shape.label()
    );
    shape
}

/// Sorted, de-duplicated folder prefixes of the given parameters.
pub fn folder_facets(parameters: &[ColorParameter]) -> Vec<String> {
    parameters
        .iter()
        .map(|p| p.folder().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Returns the `Exports` array of a document, if any.
pub(crate) fn exports(doc: &Value) -> Option<&Vec<Value>> {
    doc.get("Exports").and_then(Value::as_array)
}

/// Finds the first element of `items` whose `Name` equals `name`.
pub(crate) fn find_named<'v>(items: &'v [Value], name: &str) -> Option<(usize, &'v Value)> {
    items
        .iter()
        .enumerate()
        .find(|(_, item)| item.get("Name").and_then(Value::as_str) == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linear_color(name: &str, r: f64) -> Value {
        json!({
            "$type": "UAssetAPI.PropertyTypes.Structs.StructPropertyData, UAssetAPI",
            "StructType": "LinearColor",
            "Name": name,
            "Value": [{"Name": name, "Value": {"R": r, "G": 0.1, "B": 0.1, "A": 1.0}}]
        })
    }

    #[test]
    fn test_detect_priority() {
        let vector = json!({"Exports": [{"Data": [{"Name": "VectorParameterValues", "Value": []}]}]});
        assert!(matches!(
            DocumentShape::detect(&vector),
            DocumentShape::VectorTable { export: 0, entry: 0 }
        ));

        let table = json!({"Exports": [{
            "$type": "UAssetAPI.ExportTypes.DataTableExport, UAssetAPI",
            "Table": {"Data": []}
        }]});
        assert_eq!(DocumentShape::detect(&table), DocumentShape::RowTable);

        assert_eq!(DocumentShape::detect(&json!({"Exports": []})), DocumentShape::Generic);
        assert_eq!(DocumentShape::detect(&json!("text")), DocumentShape::Generic);
    }

    #[test]
    fn test_unknown_document_yields_nothing() {
        let mut out = Vec::new();
        let dict = FilterDictionary::default();
        extract_parameters(&json!({"Hello": "world"}), "a.json", &dict, &mut out);
        extract_parameters(&json!([1, 2, 3]), "b.json", &dict, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_generic_fallback_uses_export_names() {
        let doc = json!({"Exports": [{
            "ObjectName": "WBP_Hud",
            "Data": [linear_color("ColorAndOpacity", 0.4)]
        }]});
        let mut out = Vec::new();
        let shape = extract_parameters(&doc, "ui/hud.json", &FilterDictionary::default(), &mut out);
        assert_eq!(shape, DocumentShape::Generic);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].param_name, "WBP_Hud - ColorAndOpacity");
        assert_eq!(out[0].file_name, "hud.json");
        assert!((out[0].rgba.r - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_ordinals_are_unique_per_file() {
        let doc = json!({"Exports": [{
            "ObjectName": "Mat",
            "Data": [linear_color("Color", 0.1), linear_color("Color", 0.2)]
        }]});
        let mut out = Vec::new();
        extract_parameters(&doc, "m.json", &FilterDictionary::default(), &mut out);
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].id, out[1].id);
        assert_eq!(out[0].id, "m.json-Mat - Color-0");
        assert_eq!(out[1].id, "m.json-Mat - Color-1");
    }

    #[test]
    fn test_folder_facets_sorted_unique() {
        let doc = json!({"Exports": [{"ObjectName": "X", "Data": [linear_color("Color", 0.3)]}]});
        let dict = FilterDictionary::default();
        let mut out = Vec::new();
        for rel in ["b/two.json", "a/one.json", "root.json", "b/three.json"] {
            extract_parameters(&doc, rel, &dict, &mut out);
        }
        assert_eq!(folder_facets(&out), vec!["/", "a", "b"]);
    }

    #[test]
    fn test_parse_document_error() {
        let err = parse_document("{not json", "broken.json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
