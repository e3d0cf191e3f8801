//! importfix - comment out imports of an unimplemented module.
//!
//! This crate provides the CLI binary on top of `importfix-core`.
//!
//! ## Modules
//!
//! - `cli` - Command implementations (run, undo)
//! - `render` - Text rendering of reports

pub mod cli;
pub mod render;

// Re-export core types for convenience
pub use importfix_core::error::{FixError, OutputErrorCode};
pub use importfix_core::output::{RunReport, SCHEMA_VERSION};
