//! Service layer for editing logic.
//!
//! These services sit between the extracted parameter model and the CLI:
//! color transforms, history, patching documents back and project files.

pub mod history;
pub mod patch;
pub mod project;
pub mod recolor;
pub mod session;

// Re-export commonly used types and functions
pub use history::History;
pub use patch::{write_document, PatchOutcome, SourceDocuments};
pub use project::{export_project, import_project, ImportReport, ProjectEntry};
pub use recolor::EditOptions;
pub use session::{LoadReport, SaveReport, Session, SessionError, ViewFilter};
