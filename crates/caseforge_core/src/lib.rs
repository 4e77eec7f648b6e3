#![forbid(unsafe_code)]
//! Turn test method declarations into concrete, stably-identified test cases.
//!
//! This crate is the discovery engine behind `caseforge`. Given a read-only [`MethodDescriptor`]
//! (parameters, generic type parameters, declarative markers, data sources) it produces the
//! ordered list of [`TestCase`] records a runner will later execute.
//!
//! ## Pipeline
//!
//! Components, leaves first:
//!
//! - [`metadata`]: descriptors for types, parameters, markers, and the [`TypeCatalog`] hierarchy.
//! - [`binder`]: arity-correct argument arrays (optional + variadic parameters).
//! - [`unifier`]: resolves open type parameters from runtime argument types.
//! - [`serialization`]: decides whether resolved values can be identity-encoded.
//! - [`data`]: data rows, data sources, and the enumeration-scoped [`DisposalTracker`].
//! - [`materializer`]: display names, unique ids, skip/explicit/timeout metadata.
//! - [`discovery`]: per-method marker dispatch, eager vs. lazy theory enumeration, fallback policy.
//!
//! ## Notes
//!
//! - The crate does no IO and owns no async runtime. Callers supply metadata and data sources.
//! - Every fallback is an ordinary value. Discovery of one malformed method never aborts the walk.

pub mod binder;
pub mod data;
pub mod diagnostics;
pub mod discoverer;
pub mod discovery;
pub mod display;
pub mod errors;
pub mod identity;
pub mod materializer;
pub mod metadata;
pub mod options;
pub mod registry;
pub mod serialization;
pub mod testcase;
pub mod unifier;
pub mod value;

pub use binder::{ResolvedArguments, bind};
pub use data::{DataRow, DataSource, Disposable, DisposalTracker, InlineData};
pub use diagnostics::{CollectedDiagnostics, DiagnosticSink, NullDiagnostics, TracingDiagnostics};
pub use discoverer::{CaseVariant, FactDiscoverer, TestCaseDiscoverer, TheoryDiscoverer};
pub use discovery::{Discovery, DiscoveryContext, MarkerLookup};
pub use errors::{BindingError, DataError, MaterializeError, SerializationError, TypeParseError};
pub use metadata::{
    Marker, MarkerKind, MethodDescriptor, ParameterDescriptor, TestMarker, TypeCatalog, TypeDefinition,
    TypeDescriptor, TypeName, TypeParameter,
};
pub use options::{DiscoveryOptions, MethodDisplay, MethodDisplayOptions};
pub use registry::DiscovererRegistry;
pub use serialization::{DefaultSerializer, SerializationEngine};
pub use testcase::{SourceLocation, TestCase, TestCaseDetails, TestCaseKind, TestMethod};
pub use value::Value;
