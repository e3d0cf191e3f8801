//! Run journal: a snapshot of every file a run rewrote, and undo.
//!
//! A real run that changes anything saves a journal to
//! `<root>/.importfix/journal.json`. Each entry keeps the original text and
//! the hashes of the text before and after the run. Undo restores an entry
//! only if the file still hashes to what the run left behind, so edits made
//! after the run are never overwritten.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::FixError;
use crate::store::TextStore;

/// Directory under the root holding run state.
pub const JOURNAL_DIR: &str = ".importfix";

/// Journal file name inside [`JOURNAL_DIR`].
pub const JOURNAL_FILE: &str = "journal.json";

/// Path of the journal for `root`.
pub fn journal_path(root: &Path) -> PathBuf {
    root.join(JOURNAL_DIR).join(JOURNAL_FILE)
}

// ============================================================================
// Content Hashing
// ============================================================================

/// SHA-256 of file content, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute the hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

/// Generate a run id like `run_0123456789abcdef`.
///
/// Mixes the clock, the process id and a counter through SHA-256.
pub fn generate_run_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(counter.to_le_bytes());
    let hash = hasher.finalize();
    format!("run_{}", hex::encode(&hash[..8]))
}

// ============================================================================
// Journal
// ============================================================================

/// One rewritten file.
///
/// `path` and `backup` are relative to the run root when they lie under it,
/// so a journal stays valid however the root was spelled on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub path: PathBuf,
    pub before_hash: ContentHash,
    pub after_hash: ContentHash,
    /// Backup written by the bulk pass, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub backup: Option<PathBuf>,
    /// Text before the run.
    pub original: String,
}

/// Snapshot of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub run_id: String,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
    pub root: PathBuf,
    pub entries: Vec<JournalEntry>,
}

impl Journal {
    /// Build a journal from the files a store wrote.
    pub fn from_store(run_id: &str, root: &Path, store: &TextStore) -> Self {
        let entries = store
            .touched()
            .iter()
            .map(|(path, touched)| JournalEntry {
                path: relative_to(root, path),
                before_hash: ContentHash::compute(touched.original.as_bytes()),
                after_hash: ContentHash::compute(touched.current.as_bytes()),
                backup: touched.backup.as_deref().map(|b| relative_to(root, b)),
                original: touched.original.clone(),
            })
            .collect();
        let now: DateTime<Utc> = SystemTime::now().into();
        Journal {
            run_id: run_id.to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            root: root.to_path_buf(),
            entries,
        }
    }

    /// Path of `entry`'s file under `root`.
    pub fn target(&self, root: &Path, entry: &JournalEntry) -> PathBuf {
        root.join(&entry.path)
    }

    /// Write the journal under `root`, replacing any previous one.
    pub fn save(&self, root: &Path) -> Result<PathBuf, FixError> {
        let path = journal_path(root);
        let dir = root.join(JOURNAL_DIR);
        fs::create_dir_all(&dir).map_err(|e| FixError::io(&dir, e))?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| FixError::journal(format!("failed to serialize journal: {}", e)))?;
        fs::write(&path, json).map_err(|e| FixError::io(&path, e))?;
        tracing::info!("saved journal {} ({} files)", path.display(), self.entries.len());
        Ok(path)
    }

    /// Load the journal under `root`.
    pub fn load(root: &Path) -> Result<Self, FixError> {
        let path = journal_path(root);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FixError::NoJournal { path })
            }
            Err(e) => return Err(FixError::io(&path, e)),
        };
        serde_json::from_str(&content)
            .map_err(|e| FixError::journal(format!("corrupt journal {}: {}", path.display(), e)))
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

// ============================================================================
// Undo
// ============================================================================

/// A journal entry undo left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoConflict {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of undoing the last run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoReport {
    pub run_id: String,
    pub dry_run: bool,
    pub restored: Vec<PathBuf>,
    pub conflicts: Vec<UndoConflict>,
    /// Whether the journal was deleted (no conflicts, not a dry run).
    pub journal_removed: bool,
}

/// Restore the files rewritten by the last run under `root`.
///
/// Files changed since that run are reported as conflicts and left alone; the
/// journal is kept in that case so undo can be retried after resolving them.
/// A file that already holds its original text (restored by an earlier,
/// partial undo) counts as restored.
pub fn undo(root: &Path, dry_run: bool) -> Result<UndoReport, FixError> {
    let journal = Journal::load(root)?;
    let _span = tracing::info_span!("undo", run_id = %journal.run_id, dry_run).entered();
    tracing::debug!(
        "undoing {} (recorded under {})",
        journal.run_id,
        journal.root.display()
    );
    let mut restored = Vec::new();
    let mut conflicts = Vec::new();

    for entry in &journal.entries {
        let path = journal.target(root, entry);
        let current = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("undo conflict: {} no longer exists", path.display());
                conflicts.push(UndoConflict {
                    path,
                    reason: "file no longer exists".to_string(),
                });
                continue;
            }
            Err(e) => return Err(FixError::io(&path, e)),
        };

        let hash = ContentHash::compute(&current);
        if hash == entry.after_hash {
            if !dry_run {
                fs::write(&path, &entry.original).map_err(|e| FixError::io(&path, e))?;
                tracing::info!("restored {}", path.display());
            }
        } else if hash == entry.before_hash {
            tracing::debug!("{} already restored", path.display());
        } else {
            tracing::warn!("undo conflict: {} changed since run", path.display());
            conflicts.push(UndoConflict {
                path,
                reason: "file changed since the run".to_string(),
            });
            continue;
        }

        if !dry_run {
            if let Some(backup) = &entry.backup {
                remove_if_present(&root.join(backup))?;
            }
        }
        restored.push(path);
    }

    let journal_removed = !dry_run && conflicts.is_empty();
    if journal_removed {
        remove_if_present(&journal_path(root))?;
    }

    Ok(UndoReport {
        run_id: journal.run_id,
        dry_run,
        restored,
        conflicts,
        journal_removed,
    })
}

fn remove_if_present(path: &Path) -> Result<(), FixError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FixError::io(path, e)),
    }
}

// ============================================================================
// Tests
// ============================================================================
