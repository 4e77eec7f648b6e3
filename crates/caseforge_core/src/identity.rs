//! Deterministic unique ids.
//!
//! An id is the lowercase hex SHA-256 of its components, each terminated by a zero byte. Ids nest:
//! a test case id starts from its method id, which starts from its class id, and so on.

use sha2::{Digest, Sha256};

use crate::metadata::TypeDescriptor;

/// Incremental id builder.
#[derive(Clone, Default)]
pub struct UniqueIdGenerator {
    hasher: Sha256,
}

impl UniqueIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: &str) -> &mut Self {
        self.hasher.update(component.as_bytes());
        self.hasher.update([0u8]);
        self
    }

    pub fn compute(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    pub fn for_assembly(path: &str, config_path: Option<&str>) -> String {
        let mut id = Self::new();
        id.add(path);
        if let Some(config) = config_path {
            id.add(config);
        }
        id.compute()
    }

    pub fn for_test_class(assembly_id: &str, class_name: &str) -> String {
        let mut id = Self::new();
        id.add(assembly_id).add(class_name);
        id.compute()
    }

    pub fn for_test_method(class_id: &str, method_name: &str) -> String {
        let mut id = Self::new();
        id.add(class_id).add(method_name);
        id.compute()
    }

    /// `serialized_arguments` is the canonical encoding of the bound arguments, if any.
    pub fn for_test_case(
        method_id: &str,
        generic_types: Option<&[TypeDescriptor]>,
        serialized_arguments: Option<&str>,
    ) -> String {
        Self::test_case_builder(method_id, generic_types, serialized_arguments).compute()
    }

    /// A builder pre-loaded with the test case components, for callers that append more.
    pub fn test_case_builder(
        method_id: &str,
        generic_types: Option<&[TypeDescriptor]>,
        serialized_arguments: Option<&str>,
    ) -> Self {
        let mut id = Self::new();
        id.add(method_id);
        if let Some(arguments) = serialized_arguments {
            id.add(arguments);
        }
        for ty in generic_types.unwrap_or_default() {
            id.add(&ty.to_string());
        }
        id
    }

    /// Extend an existing id with one more component (culture variants, error discriminators).
    pub fn extend(base_id: &str, component: &str) -> String {
        let mut id = Self::new();
        id.add(base_id).add(component);
        id.compute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deterministic_hex() {
        let a = UniqueIdGenerator::for_test_method("class", "Run");
        let b = UniqueIdGenerator::for_test_method("class", "Run");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_component_boundaries_matter() {
        let mut left = UniqueIdGenerator::new();
        left.add("ab").add("c");
        let mut right = UniqueIdGenerator::new();
        right.add("a").add("bc");
        assert_ne!(left.compute(), right.compute());
    }

    #[test]
    fn test_generic_types_change_the_id() {
        let plain = UniqueIdGenerator::for_test_case("m", None, None);
        let generic = UniqueIdGenerator::for_test_case("m", Some(&[TypeDescriptor::core("int")]), None);
        let other = UniqueIdGenerator::for_test_case("m", Some(&[TypeDescriptor::core("string")]), None);
        assert_ne!(plain, generic);
        assert_ne!(generic, other);
    }

    #[test]
    fn test_config_path_changes_assembly_id() {
        assert_ne!(
            UniqueIdGenerator::for_assembly("a.dll", None),
            UniqueIdGenerator::for_assembly("a.dll", Some("caseforge.json"))
        );
    }
}
