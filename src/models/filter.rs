//! Keyword dictionary deciding which parameter names count as colors.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configurable keyword lists consulted during extraction.
///
/// The dictionary is plain configuration: nothing derived from it is cached,
/// so editing it and re-running [`matches`] always reflects the new lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDictionary {
    /// Case-insensitive substrings of which at least one must appear (empty = allow all)
    #[serde(default)]
    pub include_keywords: Vec<String>,
    /// Case-insensitive substrings that reject a name outright
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    /// Struct field names treated as colors by the generic walk
    #[serde(default)]
    pub color_property_names: Vec<String>,
}

impl Default for FilterDictionary {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect();
        Self {
            include_keywords: owned(&["color", "tint", "Enemy", "Emiss", "Diff"]),
            exclude_keywords: owned(&["Offset", "uv", "ColorMaskChannel", "MaskColor_Enemy"]),
            color_property_names: owned(&[
                "ColorAndOpacity",
                "SpecifiedColor",
                "BaseColor",
                "HighlightColor",
                "FontTopColor",
                "FontButtomColor",
                "VectorParameter",
                "ShadowColor",
                "ContentColor",
                "OutlineColor",
                "Color",
                "TextColor",
                "BackgroundColor",
            ]),
        }
    }
}

impl FilterDictionary {
    /// Creates an empty dictionary that accepts every name.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            color_property_names: Vec::new(),
        }
    }

    /// True when `name` is on the generic walk's allow-list (exact match).
    pub fn is_color_property(&self, name: &str) -> bool {
        self.color_property_names.iter().any(|p| p == name)
    }

    /// Parses the dictionary from its JSON persistence format.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse filter dictionary JSON")
    }

    /// Serializes the dictionary to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize filter dictionary")
    }

    /// Loads a dictionary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read filter dictionary: {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Saves the dictionary to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)
            .with_context(|| format!("Failed to write filter dictionary: {}", path.display()))
    }
}

/// Decides whether a candidate parameter name passes the dictionary.
///
/// A name passes when the include list is empty or any include keyword is a
/// case-insensitive substring of it, and no exclude keyword is. Exclusion
/// always wins.
///
/// # Examples
///
/// ```
/// use rvfxe::models::{matches, FilterDictionary};
///
/// let dict = FilterDictionary {
///     include_keywords: vec!["color".into()],
///     exclude_keywords: vec!["offset".into()],
///     color_property_names: vec![],
/// };
/// assert!(matches("BaseColor", &dict));
/// assert!(!matches("LinerColor_Offset&Softness", &dict));
/// ```
pub fn matches(name: &str, dict: &FilterDictionary) -> bool {
    let lower = name.to_lowercase();
    let contains = |keyword: &String| lower.contains(&keyword.to_lowercase());

    let included = dict.include_keywords.is_empty() || dict.include_keywords.iter().any(contains);
    included && !dict.exclude_keywords.iter().any(contains)
}
