//! Test case records produced by discovery.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::identity::UniqueIdGenerator;
use crate::metadata::{MethodDescriptor, TypeDescriptor};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Immutable per-case metadata, computed once at materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseDetails {
    pub display_name: String,
    pub unique_id: String,
    pub skip_reason: Option<String>,
    pub explicit: bool,
    /// Milliseconds; `0` means no timeout.
    pub timeout: u32,
    pub source_location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCaseKind {
    /// Ready to run as-is (a fact, or one pre-enumerated theory row).
    Standard,
    /// Data retrieval deferred to execution time.
    DelayEnumerated { skip_test_without_data: bool },
    /// Fails at execution with `message`.
    ExecutionError { message: String },
}

impl TestCaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            TestCaseKind::Standard => "standard",
            TestCaseKind::DelayEnumerated { .. } => "delay-enumerated",
            TestCaseKind::ExecutionError { .. } => "error",
        }
    }
}

/// One discovered test case.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub details: TestCaseDetails,
    pub kind: TestCaseKind,
    pub class_name: String,
    pub method_name: String,
    /// Bound, coerced arguments for a pre-enumerated row.
    pub arguments: Option<Vec<Value>>,
    /// Resolved generic types, in type-parameter order.
    pub generic_types: Option<Vec<TypeDescriptor>>,
    pub traits: BTreeMap<String, Vec<String>>,
    pub skip_unless: Option<String>,
    pub skip_when: Option<String>,
    pub culture: Option<String>,
}

impl TestCase {
    pub fn display_name(&self) -> &str {
        &self.details.display_name
    }

    pub fn unique_id(&self) -> &str {
        &self.details.unique_id
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.details.skip_reason.as_deref()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TestCaseKind::ExecutionError { .. })
    }

    pub fn is_delay_enumerated(&self) -> bool {
        matches!(self.kind, TestCaseKind::DelayEnumerated { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            TestCaseKind::ExecutionError { message } => Some(message),
            _ => None,
        }
    }
}

/// A method paired with its id, handed to discovery by the assembly walk.
#[derive(Debug, Clone)]
pub struct TestMethod {
    pub descriptor: Arc<MethodDescriptor>,
    pub unique_id: String,
}

impl TestMethod {
    pub fn new(descriptor: Arc<MethodDescriptor>, class_id: &str) -> Self {
        let unique_id = UniqueIdGenerator::for_test_method(class_id, &descriptor.name);
        Self { descriptor, unique_id }
    }
}
