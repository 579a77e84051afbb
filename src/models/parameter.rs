//! Color parameters and the typed paths that address them inside a document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use super::color::LinearColor;

/// One step from a JSON container into a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Field of an object
    Key(String),
    /// Element of an array
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Why a recorded path failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressFault {
    /// A key segment met a non-object
    ExpectedObject,
    /// An index segment met a non-array
    ExpectedArray,
    /// The object has no such key
    MissingKey(String),
    /// The array is too short
    IndexOutOfRange(usize),
    /// The path resolved but not to an object holding channels
    TerminalNotObject,
    /// No document is loaded under the parameter's relative path
    MissingDocument,
}

impl fmt::Display for AddressFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedObject => write!(f, "expected an object"),
            Self::ExpectedArray => write!(f, "expected an array"),
            Self::MissingKey(key) => write!(f, "missing key '{key}'"),
            Self::IndexOutOfRange(index) => write!(f, "index {index} out of range"),
            Self::TerminalNotObject => write!(f, "terminal value is not an object"),
            Self::MissingDocument => write!(f, "owning document is not loaded"),
        }
    }
}

/// A recorded parameter path no longer resolves in its document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot address parameter '{parameter_id}' at segment {segment} ({path}): {fault}")]
pub struct PatchAddressError {
    /// Id of the parameter being written
    pub parameter_id: String,
    /// Position of the failing segment (equal to the path length for terminal faults)
    pub segment: usize,
    /// Rendered path for diagnostics
    pub path: String,
    /// What went wrong
    pub fault: AddressFault,
}

/// Ordered segments from a document root to a color object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamPath(Vec<PathSegment>);

impl ParamPath {
    /// Creates an empty (root) path.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Resolves the path for writing, failing on the first segment that does
    /// not match the container it meets. Never coerces.
    pub fn resolve_mut<'a>(
        &self,
        root: &'a mut Value,
        parameter_id: &str,
    ) -> Result<&'a mut Value, PatchAddressError> {
        let fail = |segment: usize, fault: AddressFault| PatchAddressError {
            parameter_id: parameter_id.to_string(),
            segment,
            path: self.to_string(),
            fault,
        };

        let mut current = root;
        for (position, segment) in self.0.iter().enumerate() {
            current = match segment {
                PathSegment::Key(key) => match current {
                    Value::Object(map) => map
                        .get_mut(key)
                        .ok_or_else(|| fail(position, AddressFault::MissingKey(key.clone())))?,
                    _ => return Err(fail(position, AddressFault::ExpectedObject)),
                },
                PathSegment::Index(index) => match current {
                    Value::Array(items) => items
                        .get_mut(*index)
                        .ok_or_else(|| fail(position, AddressFault::IndexOutOfRange(*index)))?,
                    _ => return Err(fail(position, AddressFault::ExpectedArray)),
                },
            };
        }

        if !current.is_object() {
            return Err(fail(self.0.len(), AddressFault::TerminalNotObject));
        }
        Ok(current)
    }

    /// Read-only lookup; `None` when any segment does not resolve.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |current, segment| match segment {
            PathSegment::Key(key) => current.as_object()?.get(key),
            PathSegment::Index(index) => current.as_array()?.get(*index),
        })
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A color value discovered in a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorParameter {
    /// `<relative_path>-<param_name>-<ordinal>`, unique per session
    pub id: String,
    /// File name of the owning document
    pub file_name: String,
    /// Path of the owning document relative to the load root (`/` separated)
    pub relative_path: String,
    /// Display name (raw parameter name or `<parent> - <field>`)
    pub param_name: String,
    /// Address of the color object inside the document
    pub path: ParamPath,
    /// Current color
    pub rgba: LinearColor,
}

impl ColorParameter {
    /// Builds a parameter and its composite id.
    pub fn new(
        relative_path: &str,
        file_name: &str,
        param_name: String,
        ordinal: usize,
        path: ParamPath,
        rgba: LinearColor,
    ) -> Self {
        Self {
            id: format!("{relative_path}-{param_name}-{ordinal}"),
            file_name: file_name.to_string(),
            relative_path: relative_path.to_string(),
            param_name,
            path,
            rgba,
        }
    }

    /// Folder facet of this parameter (`/` for files at the load root).
    pub fn folder(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(index) if index > 0 => &self.relative_path[..index],
            _ => "/",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[PathSegment]) -> ParamPath {
        segments
            .iter()
            .cloned()
            .fold(ParamPath::root(), |p, s| p.child(s))
    }

    #[test]
    fn test_resolve_mut_success() {
        let mut doc = json!({"Exports": [{"Data": [{"Value": {"R": 1.0}}]}]});
        let p = path(&["Exports".into(), 0_usize.into(), "Data".into(), 0_usize.into(), "Value".into()]);
        let slot = p.resolve_mut(&mut doc, "id").unwrap();
        assert_eq!(slot["R"], json!(1.0));
    }

    #[test]
    fn test_resolve_mut_kind_mismatch() {
        let mut doc = json!({"Exports": {"0": {}}});
        let p = path(&["Exports".into(), 0_usize.into()]);
        let err = p.resolve_mut(&mut doc, "id").unwrap_err();
        assert_eq!(err.segment, 1);
        assert_eq!(err.fault, AddressFault::ExpectedArray);

        let mut doc = json!([1, 2]);
        let err = path(&["a".into()]).resolve_mut(&mut doc, "id").unwrap_err();
        assert_eq!(err.fault, AddressFault::ExpectedObject);
    }

    #[test]
    fn test_resolve_mut_missing() {
        let mut doc = json!({"a": [1]});
        let err = path(&["b".into()]).resolve_mut(&mut doc, "id").unwrap_err();
        assert_eq!(err.fault, AddressFault::MissingKey("b".to_string()));

        let err = path(&["a".into(), 3_usize.into()])
            .resolve_mut(&mut doc, "id")
            .unwrap_err();
        assert_eq!(err.fault, AddressFault::IndexOutOfRange(3));

        let err = path(&["a".into(), 0_usize.into()])
            .resolve_mut(&mut doc, "id")
            .unwrap_err();
        assert_eq!(err.fault, AddressFault::TerminalNotObject);
        assert_eq!(err.segment, 2);
    }

    #[test]
    fn test_path_display_and_serde() {
        let p = path(&["Exports".into(), 0_usize.into(), "Value".into()]);
        assert_eq!(p.to_string(), "$.Exports[0].Value");
        assert_eq!(serde_json::to_value(&p).unwrap(), json!(["Exports", 0, "Value"]));
        let back: ParamPath = serde_json::from_value(json!(["Exports", 0, "Value"])).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_resolve_read_only() {
        let doc = json!({"a": [{"b": 2}]});
        let p = path(&["a".into(), 0_usize.into(), "b".into()]);
        assert_eq!(p.resolve(&doc), Some(&json!(2)));
        assert_eq!(path(&["a".into(), 5_usize.into()]).resolve(&doc), None);
    }

    #[test]
    fn test_folder_facet() {
        let make = |rel: &str| {
            ColorParameter::new(
                rel,
                "f.json",
                "BaseColor".into(),
                0,
                ParamPath::root(),
                LinearColor::default(),
            )
        };
        assert_eq!(make("f.json").folder(), "/");
        assert_eq!(make("1011/vfx/f.json").folder(), "1011/vfx");
        assert_eq!(make("1011/vfx/f.json").id, "1011/vfx/f.json-BaseColor-0");
    }
}
