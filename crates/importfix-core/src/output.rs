//! JSON output types for CLI responses.
//!
//! Every response has `status` first and carries `schema_version`, so
//! consumers can parse the output of any command the same way.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::commenter::FileReport;
use crate::error::{FixError, OutputErrorCode};
use crate::journal::UndoReport;
use crate::patch::{PatchOutcome, PatchReport};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// Result of a full run: bulk pass, special cases, summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: String,
    pub schema_version: String,
    pub run_id: String,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub patches: Vec<PatchReport>,
    /// Number of files the bulk pass rewrote.
    pub fixed_count: usize,
    /// Journal written by this run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<PathBuf>,
}

impl RunReport {
    /// Number of special-case patches applied.
    pub fn applied_patches(&self) -> usize {
        self.patches
            .iter()
            .filter(|p| p.outcome == PatchOutcome::Applied)
            .count()
    }
}

/// Response for `undo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResponse {
    pub status: String,
    pub schema_version: String,
    #[serde(flatten)]
    pub report: UndoReport,
}

impl UndoResponse {
    pub fn new(report: UndoReport) -> Self {
        UndoResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            report,
        }
    }
}

/// Error details for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u8,
    pub message: String,
}

impl ErrorInfo {
    pub fn from_error(err: &FixError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(err: &FixError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commenter::FileStatus;
    use crate::patch::SkipReason;

    fn sample_report() -> RunReport {
        RunReport {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: "run_0000000000000000".to_string(),
            dry_run: false,
            files: vec![FileReport {
                path: PathBuf::from("a.ts"),
                status: FileStatus::NotFound,
                backup: None,
                hits: vec![],
                diff: None,
            }],
            patches: vec![
                PatchReport {
                    name: "p1".to_string(),
                    target: PathBuf::from("a.ts"),
                    outcome: PatchOutcome::Applied,
                    diff: None,
                },
                PatchReport {
                    name: "p2".to_string(),
                    target: PathBuf::from("b.ts"),
                    outcome: PatchOutcome::Skipped {
                        reason: SkipReason::SymbolsAlreadyImported,
                    },
                    diff: None,
                },
            ],
            fixed_count: 0,
            journal: None,
        }
    }

    #[test]
    fn status_is_first_field() {
        let mut out = Vec::new();
        emit_response(&sample_report(), &mut out).unwrap();
        let json = String::from_utf8(out).unwrap();
        assert!(json.trim_start().starts_with("{\n  \"status\": \"ok\""));
    }

    #[test]
    fn file_status_is_snake_case() {
        let value = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(value["files"][0]["status"], "not_found");
        assert!(value["files"][0].get("backup").is_none());
        assert!(value.get("journal").is_none());
    }

    #[test]
    fn patch_outcome_is_flattened() {
        let value = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(value["patches"][0]["status"], "applied");
        assert_eq!(value["patches"][1]["status"], "skipped");
    }

    #[test]
    fn applied_patches_counts_applied_only() {
        assert_eq!(sample_report().applied_patches(), 1);
    }

    #[test]
    fn error_response_carries_code() {
        let err = FixError::config("bad");
        let value = serde_json::to_value(ErrorResponse::new(&err)).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], 2);
        assert_eq!(value["error"]["message"], "config error: bad");
    }
}
