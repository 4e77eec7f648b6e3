//! CLI module for caseforge
//!
//! ## Commands
//!
//! - `discover <MANIFEST>` - Discover test cases from a JSON assembly manifest
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `reporter` - Console and JSON discovery output
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod reporter;

use std::fmt;
use std::path::PathBuf;
use std::process;

use caseforge_core::MethodDisplay;
use clap::{Parser, Subcommand, ValueEnum};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Test case discovery for data-driven and generic test methods
#[derive(Parser, Debug)]
#[command(name = "caseforge")]
#[command(version = VERSION)]
#[command(about = "Discover test cases from test assembly manifests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover the test cases of one assembly manifest
    Discover {
        /// Assembly manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Runner config (default: caseforge.json next to the manifest)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Emit one JSON object per line
        #[arg(long)]
        json: bool,
        /// Never expand theories at discovery time
        #[arg(long = "no-pre-enumerate")]
        no_pre_enumerate: bool,
        /// How default display names are built
        #[arg(long, value_enum, value_name = "STYLE")]
        method_display: Option<MethodDisplayArg>,
        /// Stop after this many test cases
        #[arg(long, value_name = "N", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        limit: Option<usize>,
        /// Report discovery diagnostics
        #[arg(long)]
        diagnostics: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodDisplayArg {
    ClassAndMethod,
    Method,
}

impl From<MethodDisplayArg> for MethodDisplay {
    fn from(arg: MethodDisplayArg) -> Self {
        match arg {
            MethodDisplayArg::ClassAndMethod => MethodDisplay::ClassAndMethod,
            MethodDisplayArg::Method => MethodDisplay::Method,
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Discover {
            manifest,
            config,
            json,
            no_pre_enumerate,
            method_display,
            limit,
            diagnostics,
        } => commands::discover(&commands::DiscoverArgs {
            manifest,
            config,
            json,
            no_pre_enumerate,
            method_display: method_display.map(MethodDisplay::from),
            limit,
            diagnostics,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
