//! Binary entry point for the importfix CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Comment out exchanges imports and apply the stub patches (default)
//! importfix
//!
//! # Preview the changes as unified diffs without writing anything
//! importfix run --dry-run --diff
//!
//! # Restrict the bulk pass to specific files
//! importfix --root backend run src/modules/orders/services/order.service.ts
//!
//! # Restore every file the last run rewrote
//! importfix undo
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use importfix::cli::{load_config, resolve_root, run_fix, run_undo, RunArgs};
use importfix::render::{render_run, render_undo};
use importfix_core::error::{FixError, OutputErrorCode};
use importfix_core::output::{emit_response, ErrorResponse, UndoResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Comment out imports of an unimplemented module and stub its call sites.
///
/// Running without a subcommand is the same as `importfix run`.
#[derive(Parser, Debug)]
#[command(name = "importfix", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Root directory relative targets are resolved against (default: current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: importfix.toml in the root, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Full JSON response.
    Json,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Comment out matching imports, then apply the special-case patches.
    Run {
        /// Files for the bulk pass, replacing the configured list.
        files: Vec<PathBuf>,
        /// Report planned changes without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// Include a unified diff for every change.
        #[arg(long)]
        diff: bool,
    },
    /// Restore the files rewritten by the last run.
    Undo {
        /// Report what would be restored without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);

    let format = cli.global.format;
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            match format {
                OutputFormat::Json => {
                    let _ = emit_response(&ErrorResponse::new(&err), &mut io::stdout());
                    let _ = io::stdout().flush();
                }
                OutputFormat::Text => eprintln!("error: {}", err),
            }
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), FixError> {
    let command = cli.command.unwrap_or(Command::Run {
        files: Vec::new(),
        dry_run: false,
        diff: false,
    });
    match command {
        Command::Run {
            files,
            dry_run,
            diff,
        } => execute_run(&cli.global, RunArgs { files, dry_run, diff }),
        Command::Undo { dry_run } => execute_undo(&cli.global, dry_run),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

fn execute_run(global: &GlobalArgs, args: RunArgs) -> Result<(), FixError> {
    let root = resolve_root(global.root.clone())?;
    let config = load_config(&root, global.config.as_deref())?;
    let backup_suffix = config.backup_suffix.clone();

    let report = run_fix(&root, config, args)?;

    let mut stdout = io::stdout();
    match global.format {
        OutputFormat::Json => emit_response(&report, &mut stdout),
        OutputFormat::Text => render_run(&report, &backup_suffix, &mut stdout),
    }
    .map_err(|e| FixError::io("<stdout>", e))?;
    let _ = stdout.flush();
    Ok(())
}

fn execute_undo(global: &GlobalArgs, dry_run: bool) -> Result<(), FixError> {
    let root = resolve_root(global.root.clone())?;
    let report = run_undo(&root, dry_run)?;

    let mut stdout = io::stdout();
    match global.format {
        OutputFormat::Json => emit_response(&UndoResponse::new(report), &mut stdout),
        OutputFormat::Text => render_undo(&report, &mut stdout),
    }
    .map_err(|e| FixError::io("<stdout>", e))?;
    let _ = stdout.flush();
    Ok(())
}
