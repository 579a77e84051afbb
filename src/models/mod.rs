//! Data models for color parameters, colors and filter configuration.
//!
//! This module contains the core data structures used throughout the application.
//! Models are independent of extraction, editing and conversion logic.

pub mod color;
pub mod filter;
pub mod parameter;

// Re-export all model types
pub use color::{sanitize_channel, LinearColor, RgbColor};
pub use filter::{matches, FilterDictionary};
pub use parameter::{AddressFault, ColorParameter, ParamPath, PatchAddressError, PathSegment};
