//! Core infrastructure for importfix.
//!
//! This crate provides the rewrite engine, independent of any terminal I/O:
//! - Rewrite rules that comment out imports of a missing module
//! - The bulk import pass with per-file backups
//! - Declarative, idempotent special-case patches
//! - Configuration and target discovery
//! - Dry-run staging, run journal and undo
//! - Report types and unified diff generation

pub mod commenter;
pub mod config;
pub mod diff;
pub mod error;
pub mod journal;
pub mod output;
pub mod patch;
pub mod rule;
pub mod run;
pub mod store;
pub mod text;
