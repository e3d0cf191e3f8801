//! Human-readable rendering of run and undo reports.
//!
//! Output is plain text on stdout: a banner, one status line per file, one
//! line per special-case patch, and a closing summary.

use std::io::{self, Write};
use std::path::Path;

use importfix_core::commenter::{FileReport, FileStatus};
use importfix_core::journal::UndoReport;
use importfix_core::output::RunReport;
use importfix_core::patch::{PatchOutcome, PatchReport};

/// Width of the `=` rules framing the banner and summary.
pub const BANNER_WIDTH: usize = 60;

const TITLE: &str = "Fixing exchanges module imports";

fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(BANNER_WIDTH))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Render a run report.
pub fn render_run(
    report: &RunReport,
    backup_suffix: &str,
    out: &mut impl Write,
) -> io::Result<()> {
    rule(out)?;
    if report.dry_run {
        writeln!(out, "{} (dry run)", TITLE)?;
    } else {
        writeln!(out, "{}", TITLE)?;
    }
    rule(out)?;
    writeln!(out)?;

    for file in &report.files {
        render_file(file, report.dry_run, out)?;
    }

    writeln!(out)?;
    writeln!(out, "Fixing special cases...")?;
    for patch in &report.patches {
        render_patch(patch, report.dry_run, out)?;
    }

    writeln!(out)?;
    rule(out)?;
    if report.dry_run {
        writeln!(out, "✅ Would fix {} files (dry run, nothing written)", report.fixed_count)?;
    } else {
        writeln!(out, "✅ Fixed {} files", report.fixed_count)?;
        writeln!(out, "Applied {} special cases", report.applied_patches())?;
        writeln!(out, "Backup files created with {} extension", backup_suffix)?;
        if let Some(journal) = &report.journal {
            writeln!(out, "Run journal: {} (undo with `importfix undo`)", journal.display())?;
        }
    }
    rule(out)
}

fn render_file(file: &FileReport, dry_run: bool, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Fixing {}...", file_name(&file.path))?;
    match file.status {
        FileStatus::Fixed => {
            let backup = file
                .backup
                .as_deref()
                .map(file_name)
                .unwrap_or_default();
            if dry_run {
                writeln!(out, "  ✅ Would fix and back up to {}", backup)?;
            } else {
                writeln!(out, "  ✅ Fixed and backed up to {}", backup)?;
            }
        }
        FileStatus::Unchanged => writeln!(out, "  ℹ️  No changes needed")?,
        FileStatus::NotFound => {
            writeln!(out, "  ⚠️  File not found: {}", file.path.display())?
        }
    }
    if let Some(diff) = &file.diff {
        write!(out, "{}", diff)?;
    }
    Ok(())
}

fn render_patch(patch: &PatchReport, dry_run: bool, out: &mut impl Write) -> io::Result<()> {
    let target = file_name(&patch.target);
    match &patch.outcome {
        PatchOutcome::Applied => {
            let verb = if dry_run { "Would apply" } else { "Applied" };
            writeln!(out, "  ✅ {} {} to {}", verb, patch.name, target)?;
        }
        PatchOutcome::Skipped { reason } => {
            writeln!(out, "  ℹ️  Skipped {} on {}: {}", patch.name, target, reason)?;
        }
        PatchOutcome::TargetMissing => {
            writeln!(out, "  ⚠️  File not found: {}", patch.target.display())?;
        }
    }
    if let Some(diff) = &patch.diff {
        write!(out, "{}", diff)?;
    }
    Ok(())
}

/// Render an undo report.
pub fn render_undo(report: &UndoReport, out: &mut impl Write) -> io::Result<()> {
    let verb = if report.dry_run { "Would restore" } else { "Restored" };
    writeln!(out, "Undoing {}...", report.run_id)?;
    for path in &report.restored {
        writeln!(out, "  ✅ {} {}", verb, path.display())?;
    }
    for conflict in &report.conflicts {
        writeln!(out, "  ⚠️  Kept {}: {}", conflict.path.display(), conflict.reason)?;
    }
    writeln!(out, "{} {} files", verb, report.restored.len())?;
    if !report.conflicts.is_empty() {
        writeln!(
            out,
            "{} conflicts left in place; journal kept",
            report.conflicts.len()
        )?;
    }
    Ok(())
}
