//! Configuration handling for importfix.
//!
//! Configuration is read from `importfix.toml` in the run root, or from an
//! explicit path. Every key is optional; an absent file means the built-in
//! defaults: the eleven known exchanges-module importers and the three
//! built-in special cases.
//!
//! ```toml
//! files = ["src/modules/orders/services/order.service.ts"]
//! backup_suffix = ".bak"
//!
//! [discover]
//! include = ["src/**/*.ts"]
//! exclude = ["**/node_modules/**"]
//!
//! [[rules]]
//! name = "legacy-import"
//! statement = "import \\{[^}]+\\} from '@/legacy';"
//!
//! [[patches]]
//! name = "drop-legacy-call"
//! target = "src/app.ts"
//! action = { kind = "replace", find = "legacy();", replace = "// legacy();" }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::FixError;
use crate::journal::JOURNAL_DIR;
use crate::patch::{builtin_patches, PatchSpec};
use crate::rule::{compile_rules, default_rule_specs, RewriteRule, RuleSpec};

/// Directories discovery never descends into.
pub const SKIP_DIRS: &[&str] = &[".git", "node_modules", JOURNAL_DIR];

/// Name of the config file looked up in the run root.
pub const CONFIG_FILE: &str = "importfix.toml";

/// Source files that imported the exchanges module before it existed.
pub const DEFAULT_FILES: &[&str] = &[
    // market-data module
    "src/modules/market-data/websocket/market-data-websocket-manager.ts",
    "src/modules/market-data/websocket/pipeline.ts",
    "src/modules/market-data/websocket/websocket-manager.ts",
    "src/modules/market-data/services/orderbook.service.ts",
    "src/modules/market-data/services/ohlcv.service.ts",
    "src/modules/market-data/services/trades.service.ts",
    "src/modules/market-data/services/ticker.service.ts",
    // order-book module
    "src/modules/order-book/services/order-book-snapshot.service.ts",
    // social-trading module
    "src/modules/social-trading/services/copy-trading.service.ts",
    // orders module
    "src/modules/orders/services/position.service.ts",
    "src/modules/orders/services/order.service.ts",
];

/// importfix configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Files for the bulk import pass, relative to the root or absolute.
    #[serde(default = "default_files")]
    pub files: Vec<PathBuf>,

    /// Also scan the root for files matching these globs.
    #[serde(default)]
    pub discover: Option<DiscoverConfig>,

    /// Suffix appended to a file name to form its backup.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Include the built-in rules ahead of `rules`.
    #[serde(default = "default_true")]
    pub builtin_rules: bool,

    /// Extra rules, applied after the built-in ones.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,

    /// Include the built-in special-case patches ahead of `patches`.
    #[serde(default = "default_true")]
    pub builtin_patches: bool,

    /// Extra patches, applied after the built-in ones.
    #[serde(default)]
    pub patches: Vec<PatchSpec>,
}

/// Glob-based file discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoverConfig {
    /// Globs (relative to the root) a file must match.
    #[serde(default)]
    pub include: Vec<String>,
    /// Globs that exclude a file even if it is included.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_files() -> Vec<PathBuf> {
    DEFAULT_FILES.iter().map(PathBuf::from).collect()
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            files: default_files(),
            discover: None,
            backup_suffix: default_backup_suffix(),
            builtin_rules: true,
            rules: Vec::new(),
            builtin_patches: true,
            patches: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, FixError> {
        let content = fs::read_to_string(path).map_err(|e| {
            FixError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| FixError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `importfix.toml` from `root`, or the defaults if there is none.
    pub fn load_from_root(root: &Path) -> Result<Self, FixError> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!("loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Rules to run, in order.
    pub fn rule_specs(&self) -> Vec<RuleSpec> {
        let mut specs = if self.builtin_rules {
            default_rule_specs()
        } else {
            Vec::new()
        };
        specs.extend(self.rules.iter().cloned());
        specs
    }

    /// Compile the rules to run.
    pub fn compile_rules(&self) -> Result<Vec<Box<dyn RewriteRule>>, FixError> {
        compile_rules(&self.rule_specs())
    }

    /// Patches to run, in order.
    pub fn patch_specs(&self) -> Vec<PatchSpec> {
        let mut specs = if self.builtin_patches {
            builtin_patches()
        } else {
            Vec::new()
        };
        specs.extend(self.patches.iter().cloned());
        specs
    }

    /// Resolve the target files of the bulk pass under `root`.
    ///
    /// `files` replaces the configured list when given. Discovered files
    /// follow the listed ones in path order. Duplicates are dropped, keeping
    /// the first occurrence.
    pub fn resolve_targets(
        &self,
        root: &Path,
        files: Option<&[PathBuf]>,
    ) -> Result<Vec<PathBuf>, FixError> {
        let listed = files.unwrap_or(self.files.as_slice());
        let mut targets: Vec<PathBuf> = listed.iter().map(|f| root.join(f)).collect();

        if let Some(discover) = &self.discover {
            targets.extend(discover.scan(root, &self.backup_suffix)?);
        }

        let mut seen = HashSet::new();
        targets.retain(|path| {
            let fresh = seen.insert(path.clone());
            if !fresh {
                tracing::debug!("dropping duplicate target {}", path.display());
            }
            fresh
        });
        Ok(targets)
    }
}

impl DiscoverConfig {
    /// Walk `root` and return the files matching the include globs.
    ///
    /// Directories in [`SKIP_DIRS`] or matching an exclude glob are not
    /// descended into. Backups (files ending in `backup_suffix`) are never
    /// returned.
    pub fn scan(&self, root: &Path, backup_suffix: &str) -> Result<Vec<PathBuf>, FixError> {
        let include = build_globset(&self.include)?;
        let exclude = build_globset(&self.exclude)?;

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_type().is_dir() || !skip_dir(root, e.path(), &exclude)
            });

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                FixError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !backup_suffix.is_empty()
                && entry.file_name().to_string_lossy().ends_with(backup_suffix)
            {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if include.is_match(relative) && !exclude.is_match(relative) {
                found.push(entry.path().to_path_buf());
            }
        }
        tracing::debug!("discovered {} files under {}", found.len(), root.display());
        Ok(found)
    }
}

fn skip_dir(root: &Path, dir: &Path, exclude: &GlobSet) -> bool {
    let named = dir
        .file_name()
        .is_some_and(|name| SKIP_DIRS.iter().any(|skip| name == *skip));
    named || dir.strip_prefix(root).is_ok_and(|rel| exclude.is_match(rel))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, FixError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| FixError::config(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| FixError::config(format!("invalid glob set: {}", e)))
}

// ============================================================================
// Tests
// ============================================================================
