//! Data-driven discovery with a lazy fallback.
//!
//! Eager enumeration is all-or-nothing per method. Any row that cannot be safely pre-enumerated
//! discards every case built so far and the method becomes one delay-enumerated case.

use crate::binder::{bind, coerce_arguments};
use crate::data::{DataRow, DisposalTracker};
use crate::discoverer::{CaseVariant, TestCaseDiscoverer};
use crate::discovery::DiscoveryContext;
use crate::errors::{DataError, MaterializeError};
use crate::materializer::CaseFactory;
use crate::metadata::{MethodDescriptor, TestMarker, TypeDescriptor};
use crate::testcase::{TestCase, TestMethod};
use crate::unifier::{close_parameter_types, resolve_all};
use crate::value::Value;

/// Result of an eager enumeration attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TheoryOutcome {
    Enumerated(Vec<TestCase>),
    /// Eager enumeration is not safe; use one delay-enumerated case.
    Fallback,
}

enum RowOutcome {
    Case(TestCase),
    NonSerializable(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TheoryDiscoverer {
    variant: CaseVariant,
}

impl TheoryDiscoverer {
    pub fn new(variant: CaseVariant) -> Self {
        Self { variant }
    }

    /// Pull every row from every source and materialize it, or report why that is unsafe.
    pub fn enumerate(
        &self,
        ctx: &DiscoveryContext,
        method: &TestMethod,
        marker: &TestMarker,
        tracker: &mut DisposalTracker,
    ) -> Result<TheoryOutcome, DataError> {
        let descriptor = &method.descriptor;
        let factory = CaseFactory::new(ctx, method, marker);
        let qualified = descriptor.qualified_name();

        if let Some(source) = descriptor.data_sources().find(|s| !s.supports_discovery_enumeration()) {
            tracing::debug!(source = source.name(), "data source does not support discovery enumeration");
            return Ok(TheoryOutcome::Fallback);
        }

        let mut results = Vec::new();
        let mut row_index = 0usize;
        for source in descriptor.data_sources() {
            let rows = source.get_data(descriptor, tracker)?;
            if !tracker.is_empty() {
                tracing::debug!(
                    source = source.name(),
                    tracked = tracker.len(),
                    "data source registered disposables"
                );
                return Ok(TheoryOutcome::Fallback);
            }

            let Some(rows) = rows else {
                let message = format!(
                    "Test data returned null for {}. Make sure it is statically initialized before this test method is called.",
                    qualified
                );
                results.push(factory.error(message, Some(source.name())));
                continue;
            };

            for row in rows {
                match materialize_row(ctx, descriptor, &factory, &row, row_index) {
                    Ok(RowOutcome::Case(case)) => results.push(case),
                    Ok(RowOutcome::NonSerializable(types)) => {
                        let plural = if types.len() == 1 { "" } else { "s" };
                        ctx.diagnostics.send_diagnostic_message(format_args!(
                            "Non-serializable data (of type{} {}) found for '{}'; falling back to single test case.",
                            plural,
                            types.join(", "),
                            qualified
                        ));
                        return Ok(TheoryOutcome::Fallback);
                    }
                    Err(err) => {
                        ctx.diagnostics.send_diagnostic_message(format_args!(
                            "Error creating theory test case for '{}'; falling back to single test case. Exception message: '{}'",
                            qualified, err
                        ));
                        return Ok(TheoryOutcome::Fallback);
                    }
                }
                row_index += 1;
            }
        }

        if results.is_empty() {
            let message = format!("No data found for {}", qualified);
            let case = if marker.skip_test_without_data {
                let mut skipped = factory.standard();
                skipped.details.skip_reason = Some(message);
                skipped
            } else {
                factory.error(message, None)
            };
            results.push(case);
        }

        Ok(TheoryOutcome::Enumerated(results))
    }
}

impl TestCaseDiscoverer for TheoryDiscoverer {
    fn discover(&self, ctx: &DiscoveryContext, method: &TestMethod, marker: &TestMarker) -> Vec<TestCase> {
        let factory = CaseFactory::new(ctx, method, marker);

        if marker.is_unconditionally_skipped() {
            return self.variant.expand(vec![factory.standard()], marker);
        }

        let pre_enumerate = ctx.options.pre_enumerate_theories && !marker.disable_discovery_enumeration;
        if pre_enumerate {
            let mut tracker = DisposalTracker::new();
            let outcome = self.enumerate(ctx, method, marker, &mut tracker);
            for failure in tracker.dispose_all() {
                ctx.diagnostics.send_diagnostic_message(format_args!(
                    "Exception thrown while disposing discovery data for '{}': {}",
                    method.descriptor.qualified_name(),
                    failure
                ));
            }

            match outcome {
                Ok(TheoryOutcome::Enumerated(cases)) => return self.variant.expand(cases, marker),
                Ok(TheoryOutcome::Fallback) => {}
                Err(err) => {
                    ctx.diagnostics.send_diagnostic_message(format_args!(
                        "Exception thrown during theory discovery on '{}'; falling back to single test case.\n{}",
                        method.descriptor.qualified_name(),
                        err
                    ));
                }
            }
        }

        self.variant.expand(vec![factory.delay_enumerated()], marker)
    }
}

/// Bind, resolve generics, coerce, and gate one row.
///
/// Arity failures become an error case for the row; every other failure aborts enumeration.
fn materialize_row(
    ctx: &DiscoveryContext,
    descriptor: &MethodDescriptor,
    factory: &CaseFactory<'_>,
    row: &DataRow,
    row_index: usize,
) -> Result<RowOutcome, MaterializeError> {
    let bound = match bind(&descriptor.parameters, row.values.clone(), &ctx.types) {
        Ok(bound) => bound,
        Err(err) if err.is_arity() => {
            let raw = &row.values;
            let serialized = if raw.iter().all(|v| ctx.serializer.is_serializable(v, None)) {
                ctx.serializer.serialize_arguments(raw).ok()
            } else {
                None
            };
            return Ok(RowOutcome::Case(factory.row_error(
                raw,
                row_index,
                serialized.as_deref(),
                err.to_string(),
            )));
        }
        Err(err) => return Err(err.into()),
    };
    let values = bound.into_values();

    let generic_types = if descriptor.is_generic() {
        Some(resolve_all(&descriptor.type_parameters, &descriptor.parameters, &values, &ctx.types))
    } else {
        None
    };
    let parameter_types: Vec<TypeDescriptor> = match &generic_types {
        Some(resolved) => close_parameter_types(&descriptor.type_parameters, resolved, &descriptor.parameters),
        None => descriptor.parameters.iter().map(|p| p.ty.clone()).collect(),
    };
    let values = coerce_arguments(values, &parameter_types);

    let non_serializable = non_serializable_types(ctx, &values, &parameter_types);
    if !non_serializable.is_empty() {
        return Ok(RowOutcome::NonSerializable(non_serializable));
    }

    let serialized = ctx.serializer.serialize_arguments(&values)?;
    Ok(RowOutcome::Case(factory.for_row(row, values, generic_types, &serialized)))
}

/// Nulls never block pre-enumeration; every other value is checked against its declared type.
fn non_serializable_types(ctx: &DiscoveryContext, values: &[Value], declared: &[TypeDescriptor]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for (value, ty) in values.iter().zip(declared) {
        if value.is_null() || ctx.serializer.is_serializable(value, Some(ty)) {
            continue;
        }
        let name = format!("'{}'", value.runtime_type().unwrap_or_else(|| ty.clone()));
        if !types.contains(&name) {
            types.push(name);
        }
    }
    types
}
