//! Command implementations behind the `importfix` binary.
//!
//! Each function takes already-parsed arguments and returns a report; the
//! binary decides how to render it. All functions return `Result<T, FixError>`
//! so the binary can map failures to stable exit codes.

use std::path::{Path, PathBuf};

use importfix_core::config::Config;
use importfix_core::error::FixError;
use importfix_core::journal::{undo, UndoReport};
use importfix_core::output::RunReport;
use importfix_core::run::{RunOptions, Runner};

/// Resolve the run root: the given directory, or the current one.
pub fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, FixError> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().map_err(|e| FixError::io(".", e)),
    }
}

/// Load the config from an explicit path, or from the root.
pub fn load_config(root: &Path, config: Option<&Path>) -> Result<Config, FixError> {
    match config {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            Config::load(path)
        }
        None => Config::load_from_root(root),
    }
}

/// Arguments of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Files replacing the configured list (empty: use the config).
    pub files: Vec<PathBuf>,
    pub dry_run: bool,
    pub diff: bool,
}

/// Run the bulk pass and the special cases.
pub fn run_fix(root: &Path, config: Config, args: RunArgs) -> Result<RunReport, FixError> {
    let runner = Runner::new(config)?;
    let options = RunOptions {
        root: root.to_path_buf(),
        dry_run: args.dry_run,
        with_diff: args.diff,
        files: (!args.files.is_empty()).then_some(args.files),
    };
    runner.run(&options)
}

/// Undo the last run under `root`.
pub fn run_undo(root: &Path, dry_run: bool) -> Result<UndoReport, FixError> {
    undo(root, dry_run)
}
