//! Bulk import commenting: apply every rule to a file, back it up, rewrite it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diff::unified_diff;
use crate::error::FixError;
use crate::rule::{RewriteRule, RuleHit};
use crate::store::{backup_path, TextStore};

/// Result of running the rules over a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentResult {
    pub text: String,
    pub hits: Vec<RuleHit>,
}

impl CommentResult {
    /// Whether any rule matched.
    pub fn changed(&self) -> bool {
        !self.hits.is_empty()
    }
}

/// Apply `rules` to `text` in order. Each rule sees the output of the
/// previous one.
pub fn comment_imports(text: &str, rules: &[Box<dyn RewriteRule>]) -> CommentResult {
    let mut current = text.to_string();
    let mut hits = Vec::new();
    for rule in rules {
        let (rewritten, rule_hits) = rule.apply(&current);
        if rule_hits.is_empty() {
            continue;
        }
        for hit in &rule_hits {
            tracing::debug!("rule '{}' matched at line {}", hit.rule, hit.line);
        }
        current = rewritten.into_owned();
        hits.extend(rule_hits);
    }
    CommentResult {
        text: current,
        hits,
    }
}

/// What the bulk pass did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one rule matched; backup and rewrite written.
    Fixed,
    /// No rule matched; nothing written.
    Unchanged,
    /// The file does not exist; nothing written.
    NotFound,
}

/// Report for one file of the bulk pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Backup written for this file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hits: Vec<RuleHit>,
    /// Unified diff of the change, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl FileReport {
    fn new(path: &Path, status: FileStatus) -> Self {
        FileReport {
            path: path.to_path_buf(),
            status,
            backup: None,
            hits: Vec::new(),
            diff: None,
        }
    }

    /// Whether the file was rewritten.
    pub fn is_fixed(&self) -> bool {
        self.status == FileStatus::Fixed
    }
}

/// Comment out matching imports in `path`.
///
/// When a rule matches, the original text is written to the backup path
/// first and the rewritten text second. A missing file or a file no rule
/// matches is left alone.
pub fn fix_file(
    store: &mut TextStore,
    path: &Path,
    rules: &[Box<dyn RewriteRule>],
    backup_suffix: &str,
    with_diff: bool,
) -> Result<FileReport, FixError> {
    let Some(original) = store.read(path)? else {
        tracing::warn!("file not found: {}", path.display());
        return Ok(FileReport::new(path, FileStatus::NotFound));
    };

    let result = comment_imports(&original, rules);
    if !result.changed() {
        tracing::debug!("no changes needed in {}", path.display());
        return Ok(FileReport::new(path, FileStatus::Unchanged));
    }

    let backup = backup_path(path, backup_suffix);
    store.write_backup(path, &backup, &original)?;
    store.write(path, &original, &result.text)?;
    tracing::info!(
        "commented {} import(s) in {}",
        result.hits.len(),
        path.display()
    );

    let diff = with_diff
        .then(|| unified_diff(&path.display().to_string(), &original, &result.text));
    Ok(FileReport {
        path: path.to_path_buf(),
        status: FileStatus::Fixed,
        backup: Some(backup),
        hits: result.hits,
        diff,
    })
}
