//! Run driver: bulk import pass, then special-case patches, then summary.
//!
//! The patch phase reads what the bulk phase wrote (or staged, in a dry run),
//! so the two phases always run in this order over the same `TextStore`.

use std::path::{Path, PathBuf};

use crate::commenter::{fix_file, FileReport};
use crate::config::Config;
use crate::error::FixError;
use crate::journal::{generate_run_id, Journal};
use crate::output::{RunReport, SCHEMA_VERSION};
use crate::patch::{apply_patch, PatchSpec};
use crate::rule::RewriteRule;
use crate::store::TextStore;

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory relative targets are resolved against.
    pub root: PathBuf,
    /// Report planned changes without writing anything.
    pub dry_run: bool,
    /// Attach unified diffs to file and patch reports.
    pub with_diff: bool,
    /// Replace the configured file list.
    pub files: Option<Vec<PathBuf>>,
}

/// Executes runs for one configuration.
#[derive(Debug)]
pub struct Runner {
    config: Config,
    rules: Vec<Box<dyn RewriteRule>>,
    patches: Vec<PatchSpec>,
}

impl Runner {
    /// Compile the configured rules and patches.
    pub fn new(config: Config) -> Result<Self, FixError> {
        let rules = config.compile_rules()?;
        let patches = config.patch_specs();
        Ok(Runner {
            config,
            rules,
            patches,
        })
    }

    /// Run both phases.
    ///
    /// A missing file or a patch whose guard does not hold is reported, never
    /// fatal. Filesystem errors abort the run.
    pub fn run(&self, options: &RunOptions) -> Result<RunReport, FixError> {
        let root = options.root.as_path();
        let run_id = generate_run_id();
        let _span =
            tracing::info_span!("run", run_id = %run_id, dry_run = options.dry_run).entered();
        let mut store = if options.dry_run {
            TextStore::dry_run()
        } else {
            TextStore::new()
        };

        let targets = self.config.resolve_targets(root, options.files.as_deref())?;
        tracing::info!(
            "{} {}: {} files, {} rules, {} patches",
            if options.dry_run { "previewing" } else { "starting" },
            run_id,
            targets.len(),
            self.rules.len(),
            self.patches.len()
        );

        let files = self.comment_phase(&mut store, &targets, options.with_diff)?;
        let fixed_count = files.iter().filter(|f| f.is_fixed()).count();

        let mut patches = Vec::with_capacity(self.patches.len());
        for spec in &self.patches {
            patches.push(apply_patch(&mut store, root, spec, options.with_diff)?);
        }

        let journal = self.save_journal(&run_id, root, &store)?;

        Ok(RunReport {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            run_id,
            dry_run: options.dry_run,
            files,
            patches,
            fixed_count,
            journal,
        })
    }

    fn comment_phase(
        &self,
        store: &mut TextStore,
        targets: &[PathBuf],
        with_diff: bool,
    ) -> Result<Vec<FileReport>, FixError> {
        targets
            .iter()
            .map(|path| fix_file(store, path, &self.rules, &self.config.backup_suffix, with_diff))
            .collect()
    }

    fn save_journal(
        &self,
        run_id: &str,
        root: &Path,
        store: &TextStore,
    ) -> Result<Option<PathBuf>, FixError> {
        if store.is_dry_run() || store.touched().is_empty() {
            return Ok(None);
        }
        Journal::from_store(run_id, root, store).save(root).map(Some)
    }
}
