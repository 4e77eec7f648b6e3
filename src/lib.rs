#![forbid(unsafe_code)]
//! caseforge: test case discovery for data-driven and generic test methods
//!
//! The discovery engine lives in [`caseforge_core`]. This crate supplies what surrounds it:
//! a JSON manifest metadata provider, runner configuration, the whole-assembly walk, and the
//! `caseforge` command-line interface.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod manifest;
pub mod walk;

pub use caseforge_core as core;

pub use config::{ConfigError, RunnerConfig};
pub use manifest::{Manifest, ManifestError};
pub use walk::{TestAssembly, TestClass, WalkError, WalkSummary, discover_assembly, discover_assembly_async};
