//! Command implementations for the CLI.
//!
//! All functions return `CliResult<T>` for proper error handling.

use std::future;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use caseforge_core::{
    CollectedDiagnostics, DefaultSerializer, DiagnosticSink, DiscovererRegistry, Discovery, DiscoveryContext,
    MethodDisplay, TracingDiagnostics,
};

use super::reporter::{ConsoleReporter, DiscoveryReporter, JsonReporter};
use super::{CliError, CliResult, ExitCode};
use crate::config::RunnerConfig;
use crate::manifest::Manifest;
use crate::walk::{WalkSummary, discover_assembly_async};

/// Options for the `discover` command after clap parsing.
#[derive(Debug, Clone, Default)]
pub struct DiscoverArgs {
    pub manifest: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub no_pre_enumerate: bool,
    pub method_display: Option<MethodDisplay>,
    pub limit: Option<usize>,
    pub diagnostics: bool,
}

/// Discover and print every test case of the manifest.
///
/// Exits with failure when any case is an execution error.
pub fn discover(args: &DiscoverArgs) -> CliResult<ExitCode> {
    let stdout = io::stdout();
    let summary = if args.json {
        let mut reporter = JsonReporter::new(stdout.lock());
        discover_with_reporter(args, &mut reporter)?
    } else {
        let color = stdout.is_terminal();
        let mut reporter = ConsoleReporter::new(stdout.lock(), color);
        discover_with_reporter(args, &mut reporter)?
    };

    if summary.errors > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Run discovery, sending every event to `reporter`.
pub fn discover_with_reporter(args: &DiscoverArgs, reporter: &mut dyn DiscoveryReporter) -> CliResult<WalkSummary> {
    if args.limit == Some(0) {
        return Err(CliError::failure("Error: --limit must be at least 1"));
    }

    let (config, config_path) = RunnerConfig::locate(args.config.as_deref(), &args.manifest)
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    let config_id = config_path.as_ref().map(|p| p.to_string_lossy().into_owned());
    let assembly = Manifest::load(&args.manifest)
        .and_then(|manifest| manifest.into_assembly(config_id.as_deref()))
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    let mut options = config.discovery_options();
    if args.no_pre_enumerate {
        options = options.with_pre_enumerate_theories(false);
    }
    if let Some(display) = args.method_display {
        options = options.with_method_display(display);
    }

    let collected = (args.diagnostics || config.diagnostic_messages()).then(|| Arc::new(CollectedDiagnostics::new()));
    let sink: Arc<dyn DiagnosticSink> = match &collected {
        Some(collected) => collected.clone(),
        None => Arc::new(TracingDiagnostics),
    };

    let ctx = DiscoveryContext::new(options, Arc::clone(&assembly.types), Arc::new(DefaultSerializer), sink);
    let discovery = Arc::new(Discovery::new(ctx, DiscovererRegistry::builtin()));
    let assembly = Arc::new(assembly);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting discovery runtime: {}", e)))?;

    reporter.on_discovery_start(&assembly);

    let limit = args.limit;
    let mut reported = 0usize;
    let summary = runtime
        .block_on(discover_assembly_async(Arc::clone(&assembly), discovery, |case| {
            if limit.is_some_and(|max| reported >= max) {
                return future::ready(false);
            }
            reporter.on_test_case(&case);
            reported += 1;
            future::ready(limit.is_none_or(|max| reported < max))
        }))
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if let Some(collected) = collected {
        reporter.on_diagnostics(&collected.messages());
    }
    reporter.on_discovery_complete(&summary);

    tracing::info!(
        assembly = %assembly.name,
        test_cases = summary.test_cases,
        errors = summary.errors,
        "discovery finished"
    );

    Ok(summary)
}
