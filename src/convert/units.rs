//! Conversion units: parsing unit lists and naming their outputs.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use super::{ConversionDirection, ConvertError};

/// One file to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionUnit {
    /// Source file
    pub input: PathBuf,
    /// Explicit output path relative to the batch output directory
    pub output: Option<String>,
}

impl ConversionUnit {
    /// Creates a unit with a default output name.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
        }
    }

    /// File name of the input, used in progress events and results.
    pub fn name(&self) -> String {
        self.input
            .file_name()
            .map_or_else(|| self.input.display().to_string(), |n| n.to_string_lossy().to_string())
    }

    /// Output path relative to the batch output directory.
    ///
    /// Defaults to the input file name with the direction's extension.
    pub fn output_relative(&self, direction: ConversionDirection) -> String {
        match &self.output {
            Some(output) => output.clone(),
            None => Path::new(&self.name())
                .with_extension(direction.output_extension())
                .to_string_lossy()
                .to_string(),
        }
    }

    /// [`Self::output_relative`] as a normalized relative path.
    ///
    /// Fails for absolute paths and paths with `..` components.
    pub fn checked_output(&self, direction: ConversionDirection) -> Result<PathBuf, ConvertError> {
        let relative = self.output_relative(direction);
        let mut checked = PathBuf::new();
        for component in Path::new(&relative).components() {
            match component {
                Component::Normal(part) => checked.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ConvertError::InvalidOutput(relative));
                }
            }
        }
        if checked.as_os_str().is_empty() {
            return Err(ConvertError::InvalidOutput(relative));
        }
        Ok(checked)
    }
}

/// Parses a newline-delimited unit list.
///
/// Each non-blank line is `path` or `path,outputRelativePath`; both parts are
/// trimmed.
///
/// # Examples
///
/// ```
/// use rvfxe::convert::units::parse_unit_list;
///
/// let units = parse_unit_list("a.uasset\n\n b.uasset , 1011/b.json \n");
/// assert_eq!(units.len(), 2);
/// assert_eq!(units[1].output.as_deref(), Some("1011/b.json"));
/// ```
pub fn parse_unit_list(text: &str) -> Vec<ConversionUnit> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(',') {
            Some((input, output)) => ConversionUnit {
                input: PathBuf::from(input.trim()),
                output: Some(output.trim().to_string()).filter(|o| !o.is_empty()),
            },
            None => ConversionUnit::new(line),
        })
        .collect()
}

fn character_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^10\d{2}$").expect("valid character id pattern"))
}

/// Derives a structure-preserving output name for `path`.
///
/// In priority order:
/// 1. from the first path component that is a `10xx` character id onward
/// 2. relative to `root`, prefixed with the root's own name
/// 3. `<root name>/<file name>`
///
/// The extension is replaced with `extension`; separators are `/`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use rvfxe::convert::units::derive_output_name;
///
/// let name = derive_output_name(
///     Path::new("/game/Content/1011/VFX/MI_Fire.uasset"),
///     Path::new("/game/Content"),
///     "json",
/// );
/// assert_eq!(name, "1011/VFX/MI_Fire.json");
/// ```
pub fn derive_output_name(path: &Path, root: &Path, extension: &str) -> String {
    let components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let relative: Vec<String> = if let Some(start) = components
        .iter()
        .position(|part| character_id_pattern().is_match(part))
    {
        components[start..].to_vec()
    } else if let Ok(rel) = path.strip_prefix(root) {
        std::iter::once(root_name)
            .chain(rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()))
            .collect()
    } else {
        let file_name = components.last().cloned().unwrap_or_default();
        vec![root_name, file_name]
    };

    let joined = relative
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    Path::new(&joined)
        .with_extension(extension)
        .to_string_lossy()
        .to_string()
}
