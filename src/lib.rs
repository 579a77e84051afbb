//! RVFXE library
//!
//! Finds color parameters inside the JSON projection of game assets, edits
//! them with undo/redo, writes the patched documents back, and drives the
//! external converter over batches of files with a shared cache.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod convert;
pub mod extract;
pub mod models;
pub mod services;
