//! Builds [`TestCase`] records for one method and marker.

use std::collections::BTreeMap;

use crate::data::DataRow;
use crate::discovery::DiscoveryContext;
use crate::display::{base_display_name, display_name_with_arguments};
use crate::identity::UniqueIdGenerator;
use crate::metadata::{MethodDescriptor, TestMarker, TypeDescriptor};
use crate::options::{DiscoveryOptions, MethodDisplay};
use crate::testcase::{TestCase, TestCaseDetails, TestCaseKind, TestMethod};
use crate::value::Value;

/// Test case constructor bound to one method and its marker.
pub struct CaseFactory<'a> {
    ctx: &'a DiscoveryContext,
    method: &'a TestMethod,
    marker: &'a TestMarker,
}

impl<'a> CaseFactory<'a> {
    pub fn new(ctx: &'a DiscoveryContext, method: &'a TestMethod, marker: &'a TestMarker) -> Self {
        Self { ctx, method, marker }
    }

    fn descriptor(&self) -> &MethodDescriptor {
        &self.method.descriptor
    }

    /// The single case for a fact, or for an unconditionally skipped theory.
    pub fn standard(&self) -> TestCase {
        let name = base_display_name(self.descriptor(), self.marker.display_name.as_deref(), None, &self.ctx.options);
        let unique_id = UniqueIdGenerator::for_test_case(&self.method.unique_id, None, None);
        self.build(
            name,
            unique_id,
            TestCaseKind::Standard,
            self.marker.skip.clone(),
            self.marker.explicit,
            self.marker.timeout,
        )
    }

    /// One case standing in for the whole theory; rows are enumerated at execution time.
    pub fn delay_enumerated(&self) -> TestCase {
        let name = base_display_name(self.descriptor(), self.marker.display_name.as_deref(), None, &self.ctx.options);
        let unique_id = UniqueIdGenerator::for_test_case(&self.method.unique_id, None, None);
        let kind = TestCaseKind::DelayEnumerated {
            skip_test_without_data: self.marker.skip_test_without_data,
        };
        self.build(
            name,
            unique_id,
            kind,
            self.marker.skip.clone(),
            self.marker.explicit,
            self.marker.timeout,
        )
    }

    /// One pre-enumerated theory row.
    ///
    /// `arguments` are bound and coerced; `serialized` is their canonical encoding.
    pub fn for_row(
        &self,
        row: &DataRow,
        arguments: Vec<Value>,
        generic_types: Option<Vec<TypeDescriptor>>,
        serialized: &str,
    ) -> TestCase {
        let base = base_display_name(
            self.descriptor(),
            self.marker.display_name.as_deref(),
            row.display_name.as_deref(),
            &self.ctx.options,
        );
        let name = display_name_with_arguments(&base, self.descriptor(), generic_types.as_deref(), Some(&arguments));
        let unique_id =
            UniqueIdGenerator::for_test_case(&self.method.unique_id, generic_types.as_deref(), Some(serialized));

        let mut case = self.build(
            name,
            unique_id,
            TestCaseKind::Standard,
            row.skip.clone().or_else(|| self.marker.skip.clone()),
            row.explicit.unwrap_or(self.marker.explicit),
            row.timeout.unwrap_or(self.marker.timeout),
        );
        merge_traits(&mut case.traits, &row.traits);
        case.arguments = Some(arguments);
        case.generic_types = generic_types;
        case
    }

    /// A row whose values could not be bound to the parameters.
    ///
    /// The id includes the raw values when they are encodable, else the row's position.
    pub fn row_error(&self, raw: &[Value], row_index: usize, serialized: Option<&str>, message: String) -> TestCase {
        let base = self.error_base_name();
        let name = display_name_with_arguments(&base, self.descriptor(), None, Some(raw));
        let unique_id = match serialized {
            Some(encoded) => UniqueIdGenerator::for_test_case(&self.method.unique_id, None, Some(encoded)),
            None => UniqueIdGenerator::extend(
                &UniqueIdGenerator::for_test_case(&self.method.unique_id, None, None),
                &format!("row:{}", row_index),
            ),
        };
        self.build(name, unique_id, TestCaseKind::ExecutionError { message }, None, false, 0)
    }

    /// A case that fails with `message` when run.
    ///
    /// `discriminator` keeps ids distinct when one method yields several error cases.
    pub fn error(&self, message: String, discriminator: Option<&str>) -> TestCase {
        let name = self.error_base_name();
        let mut unique_id = UniqueIdGenerator::for_test_case(&self.method.unique_id, None, None);
        if let Some(extra) = discriminator {
            unique_id = UniqueIdGenerator::extend(&unique_id, extra);
        }
        self.build(name, unique_id, TestCaseKind::ExecutionError { message }, None, false, 0)
    }

    /// Error cases always name the class, regardless of display options.
    fn error_base_name(&self) -> String {
        let options = DiscoveryOptions::default().with_method_display(MethodDisplay::ClassAndMethod);
        base_display_name(self.descriptor(), None, None, &options)
    }

    fn build(
        &self,
        display_name: String,
        unique_id: String,
        kind: TestCaseKind,
        skip_reason: Option<String>,
        explicit: bool,
        timeout: u32,
    ) -> TestCase {
        let descriptor = self.descriptor();
        let is_error = matches!(kind, TestCaseKind::ExecutionError { .. });
        TestCase {
            details: TestCaseDetails {
                display_name,
                unique_id,
                skip_reason,
                explicit,
                timeout,
                source_location: descriptor.source_location.clone(),
            },
            kind,
            class_name: descriptor.owner.full_name.clone(),
            method_name: descriptor.name.clone(),
            arguments: None,
            generic_types: None,
            traits: descriptor.traits(),
            skip_unless: if is_error { None } else { self.marker.skip_unless.clone() },
            skip_when: if is_error { None } else { self.marker.skip_when.clone() },
            culture: None,
        }
    }
}

/// Standalone error case for a method that has no usable marker (conflicting markers).
pub fn method_error(method: &TestMethod, message: String) -> TestCase {
    let descriptor = &method.descriptor;
    TestCase {
        details: TestCaseDetails {
            display_name: descriptor.qualified_name(),
            unique_id: UniqueIdGenerator::for_test_case(&method.unique_id, None, None),
            skip_reason: None,
            explicit: false,
            timeout: 0,
            source_location: descriptor.source_location.clone(),
        },
        kind: TestCaseKind::ExecutionError { message },
        class_name: descriptor.owner.full_name.clone(),
        method_name: descriptor.name.clone(),
        arguments: None,
        generic_types: None,
        traits: descriptor.traits(),
        skip_unless: None,
        skip_when: None,
        culture: None,
    }
}

fn merge_traits(into: &mut BTreeMap<String, Vec<String>>, extra: &BTreeMap<String, Vec<String>>) {
    for (name, values) in extra {
        into.entry(name.clone()).or_default().extend(values.iter().cloned());
    }
}
