//! Declarative, idempotent text patches for one-off special cases.
//!
//! A `PatchSpec` names a target file, a guard and an action. Applying a patch
//! reads the target fresh, checks the guard, runs the action and writes the
//! file back in place only if the text changed. No backup is written.
//!
//! Every action is self-limiting: once applied, the condition it needs (the
//! `find` text, a missing definition, a missing symbol) no longer holds, so a
//! second application is skipped.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FixError;
use crate::store::TextStore;
use crate::text::{line_ending, split_trailing_whitespace, with_line_ending};

// ============================================================================
// Patch Model
// ============================================================================

/// A named patch against one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Patch name, used in reports and logs.
    pub name: String,
    /// Target file; relative paths are resolved against the run root.
    pub target: PathBuf,
    /// Preconditions on the target text.
    #[serde(default)]
    pub guard: Guard,
    /// The edit to make.
    pub action: PatchAction,
}

/// Substring preconditions checked before a patch runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guard {
    /// Every one of these must appear in the text.
    #[serde(default)]
    pub requires: Vec<String>,
    /// None of these may appear in the text.
    #[serde(default)]
    pub absent: Vec<String>,
}

impl Guard {
    fn check(&self, text: &str) -> Result<(), SkipReason> {
        if let Some(missing) = self.requires.iter().find(|s| !text.contains(s.as_str())) {
            return Err(SkipReason::RequirementMissing(missing.clone()));
        }
        if let Some(present) = self.absent.iter().find(|s| text.contains(s.as_str())) {
            return Err(SkipReason::AlreadyPresent(present.clone()));
        }
        Ok(())
    }
}

/// The edit a patch makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchAction {
    /// Replace every occurrence of `find` with `replace`.
    Replace { find: String, replace: String },
    /// Insert `payload` right after the first occurrence of `anchor`.
    InsertAfter { anchor: String, payload: String },
    /// Append `symbols` to the `import type { ... } from '<source>'` list that
    /// already names `marker`.
    AppendImportSymbols {
        source: String,
        marker: String,
        symbols: Vec<String>,
    },
}

/// Why a patch did not change its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// A `requires` guard string is not in the text.
    RequirementMissing(String),
    /// An `absent` guard string is already in the text.
    AlreadyPresent(String),
    /// The text the action edits was not found.
    TargetTextNotFound(String),
    /// Every symbol to append is already imported.
    SymbolsAlreadyImported,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::RequirementMissing(s) => {
                write!(f, "required text missing: {}", first_line(s))
            }
            SkipReason::AlreadyPresent(s) => write!(f, "already applied: {}", first_line(s)),
            SkipReason::TargetTextNotFound(s) => {
                write!(f, "target text not found: {}", first_line(s))
            }
            SkipReason::SymbolsAlreadyImported => write!(f, "symbols already imported"),
        }
    }
}

fn first_line(s: &str) -> &str {
    s.trim().lines().next().unwrap_or("")
}

/// Result of applying one patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// The target was rewritten.
    Applied,
    /// The target exists but the patch did not apply.
    Skipped { reason: SkipReason },
    /// The target file does not exist.
    TargetMissing,
}

/// Report for one patch in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchReport {
    pub name: String,
    pub target: PathBuf,
    #[serde(flatten)]
    pub outcome: PatchOutcome,
    /// Unified diff of the change, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

// ============================================================================
// Evaluation
// ============================================================================

impl PatchSpec {
    /// Compute the patched text, or why the patch does not apply.
    pub fn evaluate(&self, text: &str) -> Result<String, SkipReason> {
        self.guard.check(text)?;
        self.action.apply(text)
    }

    /// Target path resolved against `root`.
    pub fn target_in(&self, root: &Path) -> PathBuf {
        root.join(&self.target)
    }
}

impl PatchAction {
    /// Snippets are written with `\n` breaks and follow the target's line
    /// ending when applied.
    fn apply(&self, text: &str) -> Result<String, SkipReason> {
        let eol = line_ending(text);
        match self {
            PatchAction::Replace { find, replace } => {
                let find = with_line_ending(find, eol);
                if !text.contains(&*find) {
                    return Err(SkipReason::TargetTextNotFound(find.into_owned()));
                }
                Ok(text.replace(&*find, &with_line_ending(replace, eol)))
            }
            PatchAction::InsertAfter { anchor, payload } => {
                let anchor = with_line_ending(anchor, eol);
                let Some(pos) = text.find(&*anchor) else {
                    return Err(SkipReason::TargetTextNotFound(anchor.into_owned()));
                };
                let payload = with_line_ending(payload, eol);
                let at = pos + anchor.len();
                let mut out = String::with_capacity(text.len() + payload.len());
                out.push_str(&text[..at]);
                out.push_str(&payload);
                out.push_str(&text[at..]);
                Ok(out)
            }
            PatchAction::AppendImportSymbols {
                source,
                marker,
                symbols,
            } => append_import_symbols(text, source, marker, symbols),
        }
    }
}

fn append_import_symbols(
    text: &str,
    source: &str,
    marker: &str,
    symbols: &[String],
) -> Result<String, SkipReason> {
    let pattern = format!(
        r#"(?m)^[ \t]*import\s+type\s*\{{(?P<list>[^}}]*)\}}\s*from\s*['"]{}['"]"#,
        regex::escape(source)
    );
    let re = Regex::new(&pattern)
        .map_err(|_| SkipReason::TargetTextNotFound(source.to_string()))?;

    let not_found = || {
        SkipReason::TargetTextNotFound(format!(
            "import type {{ {} }} from '{}'",
            marker, source
        ))
    };
    let list = re
        .captures_iter(text)
        .filter_map(|caps| caps.name("list"))
        .find(|list| import_names(list.as_str()).any(|name| name == marker))
        .ok_or_else(not_found)?;

    let present: Vec<&str> = import_names(list.as_str()).collect();
    let missing: Vec<&str> = symbols
        .iter()
        .map(String::as_str)
        .filter(|s| !present.contains(s))
        .collect();
    if missing.is_empty() {
        return Err(SkipReason::SymbolsAlreadyImported);
    }

    let (body, tail) = split_trailing_whitespace(list.as_str());
    let (body, trailing_comma) = match body.strip_suffix(',') {
        Some(stripped) => (stripped, ","),
        None => (body, ""),
    };
    let new_list = format!("{}, {}{}{}", body, missing.join(", "), trailing_comma, tail);

    let mut out = String::with_capacity(text.len() + new_list.len());
    out.push_str(&text[..list.start()]);
    out.push_str(&new_list);
    out.push_str(&text[list.end()..]);
    Ok(out)
}

/// Imported names in a symbol list, ignoring `as` aliases.
fn import_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|item| item.split_whitespace().next().unwrap_or(""))
        .filter(|name| !name.is_empty())
}

// ============================================================================
// Application
// ============================================================================

/// Apply `spec` to its target under `root`.
///
/// `with_diff` attaches a unified diff of the change to the report.
pub fn apply_patch(
    store: &mut TextStore,
    root: &Path,
    spec: &PatchSpec,
    with_diff: bool,
) -> Result<PatchReport, FixError> {
    let path = spec.target_in(root);
    let report = |outcome, diff| PatchReport {
        name: spec.name.clone(),
        target: path.clone(),
        outcome,
        diff,
    };

    let Some(text) = store.read(&path)? else {
        tracing::warn!("patch '{}': target not found: {}", spec.name, path.display());
        return Ok(report(PatchOutcome::TargetMissing, None));
    };

    match spec.evaluate(&text) {
        Ok(patched) if patched != text => {
            store.write(&path, &text, &patched)?;
            tracing::info!("patch '{}' applied to {}", spec.name, path.display());
            let diff = with_diff
                .then(|| crate::diff::unified_diff(&path.display().to_string(), &text, &patched));
            Ok(report(PatchOutcome::Applied, diff))
        }
        Ok(_) => Ok(report(
            PatchOutcome::Skipped {
                reason: SkipReason::AlreadyPresent(spec.name.clone()),
            },
            None,
        )),
        Err(reason) => {
            tracing::debug!("patch '{}' skipped: {}", spec.name, reason);
            Ok(report(PatchOutcome::Skipped { reason }, None))
        }
    }
}

// ============================================================================
// Built-in Patches
// ============================================================================

const WEBSOCKET_MANAGER: &str =
    "src/modules/market-data/websocket/market-data-websocket-manager.ts";
const PIPELINE: &str = "src/modules/market-data/websocket/pipeline.ts";

/// The special cases that follow the bulk import pass.
///
/// They expect the bulk pass to have run first: the pipeline stub is anchored
/// on the commented-out import it leaves behind.
pub fn builtin_patches() -> Vec<PatchSpec> {
    vec![
        PatchSpec {
            name: "types-import-connection-config".to_string(),
            target: PathBuf::from(WEBSOCKET_MANAGER),
            guard: Guard::default(),
            action: PatchAction::AppendImportSymbols {
                source: "./types".to_string(),
                marker: "IExchangeAdapter".to_string(),
                symbols: vec!["ConnectionConfig".to_string(), "ExchangeId".to_string()],
            },
        },
        PatchSpec {
            name: "websocket-config-stub".to_string(),
            target: PathBuf::from(PIPELINE),
            guard: Guard {
                requires: Vec::new(),
                absent: vec!["function getDefaultWebSocketConfig".to_string()],
            },
            action: PatchAction::InsertAfter {
                anchor: "// import { getDefaultWebSocketConfig } from '@/modules/exchanges';"
                    .to_string(),
                payload: concat!(
                    "\n",
                    "\n",
                    "// Temporary stub until exchanges module is implemented\n",
                    "function getDefaultWebSocketConfig(exchangeId: ExchangeId): ConnectionConfig {\n",
                    "  throw new Error(`Exchanges module not yet implemented. Cannot get config for ${exchangeId}`);\n",
                    "}",
                )
                .to_string(),
            },
        },
        PatchSpec {
            name: "websocket-adapter-stub".to_string(),
            target: PathBuf::from(WEBSOCKET_MANAGER),
            guard: Guard::default(),
            action: PatchAction::Replace {
                find: concat!(
                    "    // Delegate creation to exchanges module to centralize exchange connectivity\n",
                    "    return createWebSocketAdapter(exchangeId, config);",
                )
                .to_string(),
                replace: concat!(
                    "    // Delegate creation to exchanges module to centralize exchange connectivity\n",
                    "    // Module not yet implemented\n",
                    "    throw new Error(`Exchanges module not yet implemented. Cannot create adapter for ${exchangeId}`);\n",
                    "    // return createWebSocketAdapter(exchangeId, config);",
                )
                .to_string(),
            },
        },
    ]
}

// ============================================================================
// Tests
// ============================================================================
