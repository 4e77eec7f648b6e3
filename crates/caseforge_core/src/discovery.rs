//! Per-method discovery entry point.
//!
//! A method carries at most one recognized test marker. The marker's kind selects a discoverer
//! from the [`DiscovererRegistry`]; markers whose kind is not registered are invisible here.

use std::sync::Arc;

use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::materializer::method_error;
use crate::metadata::{MarkerKind, TestMarker, TypeCatalog};
use crate::options::DiscoveryOptions;
use crate::registry::DiscovererRegistry;
use crate::serialization::{DefaultSerializer, SerializationEngine};
use crate::testcase::{TestCase, TestMethod};

/// Collaborators shared by every discoverer during one pass.
#[derive(Clone)]
pub struct DiscoveryContext {
    pub options: DiscoveryOptions,
    pub types: Arc<TypeCatalog>,
    pub serializer: Arc<dyn SerializationEngine>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl DiscoveryContext {
    pub fn new(
        options: DiscoveryOptions,
        types: Arc<TypeCatalog>,
        serializer: Arc<dyn SerializationEngine>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            options,
            types,
            serializer,
            diagnostics,
        }
    }

    /// Default serializer and tracing diagnostics.
    pub fn with_defaults(options: DiscoveryOptions, types: Arc<TypeCatalog>) -> Self {
        Self::new(options, types, Arc::new(DefaultSerializer), Arc::new(TracingDiagnostics))
    }
}

/// Outcome of looking for the method's test marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerLookup<'m> {
    NoMarker,
    Single(&'m TestMarker),
    Conflict(Vec<MarkerKind>),
}

pub struct Discovery {
    ctx: DiscoveryContext,
    registry: DiscovererRegistry,
}

impl Discovery {
    pub fn new(ctx: DiscoveryContext, registry: DiscovererRegistry) -> Self {
        Self { ctx, registry }
    }

    pub fn context(&self) -> &DiscoveryContext {
        &self.ctx
    }

    pub fn registry(&self) -> &DiscovererRegistry {
        &self.registry
    }

    pub fn lookup<'m>(&self, method: &'m TestMethod) -> MarkerLookup<'m> {
        let recognized: Vec<&TestMarker> = method
            .descriptor
            .test_markers()
            .filter(|m| self.registry.get(&m.kind).is_some())
            .collect();
        match recognized.as_slice() {
            [] => MarkerLookup::NoMarker,
            [single] => MarkerLookup::Single(*single),
            many => MarkerLookup::Conflict(many.iter().map(|m| m.kind.clone()).collect()),
        }
    }

    /// Discover the test cases of one method. Never fails: every problem becomes a test case.
    #[tracing::instrument(skip_all, fields(method = %method.descriptor.qualified_name()))]
    pub fn discover(&self, method: &TestMethod) -> Vec<TestCase> {
        match self.lookup(method) {
            MarkerLookup::NoMarker => Vec::new(),
            MarkerLookup::Conflict(kinds) => {
                let kinds: Vec<&str> = kinds.iter().map(MarkerKind::as_str).collect();
                let message = format!(
                    "Test method '{}' has multiple test markers: {}",
                    method.descriptor.qualified_name(),
                    kinds.join(", ")
                );
                tracing::debug!(%message, "conflicting markers");
                vec![method_error(method, message)]
            }
            MarkerLookup::Single(marker) => match self.registry.get(&marker.kind) {
                Some(discoverer) => {
                    let cases = discoverer.discover(&self.ctx, method, marker);
                    tracing::debug!(kind = %marker.kind, cases = cases.len(), "method discovered");
                    cases
                }
                None => Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InlineData;
    use crate::metadata::{MethodDescriptor, ParameterDescriptor, TypeDescriptor, TypeName};
    use crate::testcase::TestCaseKind;
    use crate::value::Value;

    fn discovery() -> Discovery {
        Discovery::new(
            DiscoveryContext::new(
                DiscoveryOptions::default(),
                Arc::new(TypeCatalog::new()),
                Arc::new(DefaultSerializer),
                Arc::new(crate::diagnostics::NullDiagnostics),
            ),
            DiscovererRegistry::builtin(),
        )
    }

    fn method(descriptor: MethodDescriptor) -> TestMethod {
        TestMethod::new(Arc::new(descriptor), "class")
    }

    #[test]
    fn test_method_without_marker_yields_nothing() {
        let m = method(MethodDescriptor::new(TypeName::new("C", "A"), "Helper"));
        assert_eq!(discovery().lookup(&m), MarkerLookup::NoMarker);
        assert!(discovery().discover(&m).is_empty());
    }

    #[test]
    fn test_unregistered_marker_is_ignored() {
        let m = method(
            MethodDescriptor::new(TypeName::new("C", "A"), "Custom")
                .with_test_marker(TestMarker::new(MarkerKind::new("benchmark")))
                .with_test_marker(TestMarker::fact()),
        );
        assert!(matches!(discovery().lookup(&m), MarkerLookup::Single(_)));
    }

    #[test]
    fn test_conflicting_markers_yield_one_error() {
        let m = method(
            MethodDescriptor::new(TypeName::new("Samples.Tests", "A"), "Both")
                .with_parameter(ParameterDescriptor::required("x", TypeDescriptor::core("int")))
                .with_test_marker(TestMarker::fact())
                .with_test_marker(TestMarker::theory())
                .with_data(Arc::new(InlineData::row(vec![Value::Int(1)]))),
        );
        let cases = discovery().discover(&m);
        assert_eq!(cases.len(), 1);
        assert_eq!(
            cases[0].kind,
            TestCaseKind::ExecutionError {
                message: "Test method 'Samples.Tests.Both' has multiple test markers: fact, theory".into()
            }
        );
    }
}
