//! Whole-assembly discovery walk.
//!
//! Classes are visited in declaration order, methods in declaration order within each class, and
//! each method's test cases in the order discovery produced them. The callback's `bool` return is
//! a cooperative cancellation signal: `false` stops the walk without error.

use std::future::Future;
use std::sync::Arc;

use caseforge_core::{Discovery, TestCase, TestMethod, TypeCatalog};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("discovery worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// One test assembly as produced by a metadata provider.
#[derive(Debug, Clone)]
pub struct TestAssembly {
    pub name: String,
    pub path: String,
    pub unique_id: String,
    pub types: Arc<TypeCatalog>,
    pub classes: Vec<TestClass>,
}

#[derive(Debug, Clone)]
pub struct TestClass {
    pub name: String,
    pub unique_id: String,
    pub methods: Vec<TestMethod>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub classes: usize,
    pub methods: usize,
    pub test_cases: usize,
    /// Cases of kind `ExecutionError`.
    pub errors: usize,
    pub cancelled: bool,
}

/// Walk the assembly on the calling thread, handing each case to `callback`.
#[tracing::instrument(skip_all, fields(assembly = %assembly.name))]
pub fn discover_assembly<F>(assembly: &TestAssembly, discovery: &Discovery, mut callback: F) -> WalkSummary
where
    F: FnMut(TestCase) -> bool,
{
    let mut summary = WalkSummary::default();
    for class in &assembly.classes {
        summary.classes += 1;
        for method in &class.methods {
            summary.methods += 1;
            for case in discovery.discover(method) {
                summary.test_cases += 1;
                if case.is_error() {
                    summary.errors += 1;
                }
                if !callback(case) {
                    tracing::debug!(test_cases = summary.test_cases, "discovery cancelled by callback");
                    summary.cancelled = true;
                    return summary;
                }
            }
        }
    }
    tracing::debug!(
        classes = summary.classes,
        methods = summary.methods,
        test_cases = summary.test_cases,
        "assembly discovered"
    );
    summary
}

/// Walk the assembly on one blocking worker, awaiting `callback` for every case.
///
/// The worker hands over one case at a time and waits for the callback's answer before it
/// continues, so callbacks never overlap and ordering matches [`discover_assembly`].
pub async fn discover_assembly_async<F, Fut>(
    assembly: Arc<TestAssembly>,
    discovery: Arc<Discovery>,
    mut callback: F,
) -> Result<WalkSummary, WalkError>
where
    F: FnMut(TestCase) -> Fut,
    Fut: Future<Output = bool>,
{
    let (tx, mut rx) = mpsc::channel::<(TestCase, oneshot::Sender<bool>)>(1);

    let worker = tokio::task::spawn_blocking(move || {
        discover_assembly(&assembly, &discovery, |case| {
            let (reply_tx, reply_rx) = oneshot::channel();
            if tx.blocking_send((case, reply_tx)).is_err() {
                return false;
            }
            reply_rx.blocking_recv().unwrap_or(false)
        })
    });

    while let Some((case, reply)) = rx.recv().await {
        let keep_going = callback(case).await;
        // The worker may already be gone; nothing to do then.
        let _ = reply.send(keep_going);
        if !keep_going {
            break;
        }
    }
    drop(rx);

    Ok(worker.await?)
}
