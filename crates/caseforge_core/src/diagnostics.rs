//! Diagnostic sinks for fallback and error reporting.
//!
//! Sinks are fire-and-forget. Discovery never waits on them and never inspects their outcome.

use std::fmt;
use std::sync::Mutex;

pub trait DiagnosticSink: Send + Sync {
    fn send_diagnostic_message(&self, message: fmt::Arguments<'_>);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn send_diagnostic_message(&self, message: fmt::Arguments<'_>) {
        tracing::warn!(target: "caseforge::diagnostics", "{}", message);
    }
}

/// Keeps diagnostics in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for CollectedDiagnostics {
    fn send_diagnostic_message(&self, message: fmt::Arguments<'_>) {
        let mut messages = match self.messages.lock() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push(message.to_string());
    }
}

/// Drops every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn send_diagnostic_message(&self, _message: fmt::Arguments<'_>) {}
}
