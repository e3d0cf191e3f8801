//! File access for a run, with dry-run staging.
//!
//! All reads and writes of a run go through `TextStore`. In dry-run mode
//! writes land in an in-memory overlay: later phases read the staged text, so
//! a preview shows exactly what a real run would do, but nothing reaches disk.
//!
//! The store also remembers the pre-run text of every target it writes, which
//! is what the run journal is built from.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FixError;

/// Before/after text of a file written during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Touched {
    /// Text before the first write of the run.
    pub original: String,
    /// Text after the last write of the run.
    pub current: String,
    /// Backup written for this file, if any.
    pub backup: Option<PathBuf>,
}

/// Reads and writes source files for one run.
#[derive(Debug, Default)]
pub struct TextStore {
    dry_run: bool,
    overlay: HashMap<PathBuf, String>,
    touched: BTreeMap<PathBuf, Touched>,
}

impl TextStore {
    /// Store that writes to disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that stages writes in memory.
    pub fn dry_run() -> Self {
        TextStore {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Whether writes are staged instead of persisted.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Read `path` as UTF-8 text; `Ok(None)` if it does not exist.
    pub fn read(&self, path: &Path) -> Result<Option<String>, FixError> {
        if let Some(staged) = self.overlay.get(path) {
            return Ok(Some(staged.clone()));
        }
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FixError::io(path, e)),
        }
    }

    /// Replace the text of `path`, whose previous text was `previous`.
    pub fn write(&mut self, path: &Path, previous: &str, text: &str) -> Result<(), FixError> {
        self.persist(path, text)?;
        self.touched
            .entry(path.to_path_buf())
            .and_modify(|t| t.current = text.to_string())
            .or_insert_with(|| Touched {
                original: previous.to_string(),
                current: text.to_string(),
                backup: None,
            });
        Ok(())
    }

    /// Write `original` to `backup` as a safety copy of `path`.
    ///
    /// Backups are not targets: they are never read back by a run.
    pub fn write_backup(
        &mut self,
        path: &Path,
        backup: &Path,
        original: &str,
    ) -> Result<(), FixError> {
        self.persist(backup, original)?;
        let entry = self
            .touched
            .entry(path.to_path_buf())
            .or_insert_with(|| Touched {
                original: original.to_string(),
                current: original.to_string(),
                backup: None,
            });
        entry.backup = Some(backup.to_path_buf());
        Ok(())
    }

    /// Files written during this run, ordered by path.
    pub fn touched(&self) -> &BTreeMap<PathBuf, Touched> {
        &self.touched
    }

    fn persist(&mut self, path: &Path, text: &str) -> Result<(), FixError> {
        if self.dry_run {
            tracing::debug!("staged {} ({} bytes)", path.display(), text.len());
            self.overlay.insert(path.to_path_buf(), text.to_string());
            return Ok(());
        }
        fs::write(path, text).map_err(|e| FixError::io(path, e))
    }
}

/// Path of the backup for `path`: the file name with `suffix` appended.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/a/b/c.ts"), ".bak"),
            PathBuf::from("/a/b/c.ts.bak")
        );
    }

    #[test]
    fn read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = TextStore::new();
        assert_eq!(store.read(&dir.path().join("nope.ts")).unwrap(), None);
    }

    #[test]
    fn write_persists_and_tracks_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.ts");
        fs::write(&path, "one").unwrap();

        let mut store = TextStore::new();
        store.write(&path, "one", "two").unwrap();
        store.write(&path, "two", "three").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "three");
        let touched = &store.touched()[&path];
        assert_eq!(touched.original, "one");
        assert_eq!(touched.current, "three");
        assert_eq!(touched.backup, None);
    }

    #[test]
    fn dry_run_stages_without_touching_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.ts");
        fs::write(&path, "one").unwrap();

        let mut store = TextStore::dry_run();
        store
            .write_backup(&path, &backup_path(&path, ".bak"), "one")
            .unwrap();
        store.write(&path, "one", "two").unwrap();

        assert_eq!(store.read(&path).unwrap().as_deref(), Some("two"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
        assert!(!backup_path(&path, ".bak").exists());
    }

    #[test]
    fn backup_is_recorded_on_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.ts");
        let backup = backup_path(&path, ".bak");

        let mut store = TextStore::new();
        store.write_backup(&path, &backup, "one").unwrap();
        store.write(&path, "one", "two").unwrap();

        assert_eq!(fs::read_to_string(&backup).unwrap(), "one");
        let touched = &store.touched()[&path];
        assert_eq!(touched.original, "one");
        assert_eq!(touched.current, "two");
        assert_eq!(touched.backup.as_deref(), Some(backup.as_path()));
        assert!(!store.touched().contains_key(&backup));
    }
}
