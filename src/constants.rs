//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the document markers the extractor
//! looks for.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "RVFXE";

/// The binary name of the application (used in command examples, lowercase).
pub const APP_BINARY_NAME: &str = "rvfxe";

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = "rvfxe";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "RVFXE_CONFIG_DIR";

/// Name of the default conversion cache directory (under the system temp dir).
pub const CACHE_DIR_NAME: &str = "rvfxe-cache";

/// Export entry holding the material vector parameter table.
pub const VECTOR_PARAMETER_VALUES: &str = "VectorParameterValues";

/// `$type` tag of a data table export.
pub const DATA_TABLE_EXPORT_TYPE: &str = "UAssetAPI.ExportTypes.DataTableExport, UAssetAPI";

/// Row struct types whose values are walked for colors.
pub const STYLE_ROW_TYPES: &[&str] = &["RichTextStyleRow"];

/// Struct-type tag marking a linear color struct.
pub const COLOR_STRUCT_TYPE: &str = "LinearColor";
