//! JSON manifest metadata provider.
//!
//! A manifest describes one test assembly: its user types, and its classes and methods in
//! declaration order. Loading a manifest yields a [`TestAssembly`] ready for the discovery walk.
//!
//! ```json
//! {
//!   "assembly": "Samples",
//!   "classes": [{
//!     "name": "Samples.MathTests",
//!     "methods": [{
//!       "name": "Add",
//!       "parameters": [{ "name": "a", "type": "int" }, { "name": "b", "type": "int" }],
//!       "markers": [{ "kind": "theory" }],
//!       "data": [{ "kind": "inline", "rows": [[1, 2], [3, 4]] }]
//!     }]
//!   }]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use caseforge_core::data::{DataRow, DataSource, Disposable, DisposalTracker, InlineData};
use caseforge_core::errors::{DataError, TypeParseError};
use caseforge_core::identity::UniqueIdGenerator;
use caseforge_core::metadata::{Marker, MarkerKind, TypeScope};
use caseforge_core::value::{EnumValue, ObjectValue};
use caseforge_core::{
    MethodDescriptor, ParameterDescriptor, SourceLocation, TestMarker, TestMethod, TypeCatalog, TypeDefinition,
    TypeDescriptor, TypeName, TypeParameter, Value,
};
use serde::Deserialize;
use thiserror::Error;

use crate::walk::{TestAssembly, TestClass};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid type '{text}' in {context}: {source}")]
    Type {
        text: String,
        context: String,
        source: TypeParseError,
    },

    #[error("invalid value in {context}: {message}")]
    Value { context: String, message: String },

    #[error("invalid parameter '{parameter}' on {method}: {message}")]
    Parameter {
        method: String,
        parameter: String,
        message: String,
    },
}

// ============================================================================
// Manifest schema
// ============================================================================

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// Assembly name; also the defining assembly of every user type.
    pub assembly: String,
    /// Path used for the assembly id; defaults to the assembly name.
    pub path: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeEntry {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    pub base: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassEntry {
    pub name: String,
    /// Traits applied to every method of the class.
    #[serde(default)]
    pub traits: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default)]
    pub markers: Vec<MarkerEntry>,
    #[serde(default)]
    pub data: Vec<DataEntry>,
    #[serde(default)]
    pub traits: BTreeMap<String, Vec<String>>,
    pub source: Option<SourceEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParameterEntry {
    pub name: String,
    /// Declared type; for a variadic parameter this is the array type (`int[]`).
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub optional: bool,
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkerEntry {
    pub kind: String,
    pub display_name: Option<String>,
    pub skip: Option<String>,
    pub skip_unless: Option<String>,
    pub skip_when: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub skip_test_without_data: bool,
    #[serde(default)]
    pub disable_discovery_enumeration: bool,
    #[serde(default)]
    pub cultures: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "camelCase", deny_unknown_fields)]
pub enum DataEntry {
    /// Rows declared on the method itself.
    Inline { rows: Vec<RowEntry> },
    /// Rows produced by a named member at discovery time.
    #[serde(rename_all = "camelCase")]
    Member {
        name: String,
        #[serde(default = "default_true")]
        discoverable: bool,
        /// Tracked objects registered with the disposal tracker on retrieval.
        #[serde(default)]
        disposables: usize,
        #[serde(default)]
        returns_null: bool,
        /// Retrieval fails with this message.
        error: Option<String>,
        #[serde(default)]
        rows: Vec<RowEntry>,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RowEntry {
    Values(Vec<serde_json::Value>),
    Detailed(DetailedRow),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DetailedRow {
    pub values: Vec<serde_json::Value>,
    pub skip: Option<String>,
    pub explicit: Option<bool>,
    pub timeout: Option<u32>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub traits: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub file: String,
    pub line: u32,
}

// ============================================================================
// Loading
// ============================================================================

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Manifest, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the assembly, resolving every type expression and value.
    pub fn into_assembly(self, config_path: Option<&str>) -> Result<TestAssembly, ManifestError> {
        let path = self.path.clone().unwrap_or_else(|| self.assembly.clone());
        let unique_id = UniqueIdGenerator::for_assembly(&path, config_path);
        let types = self.build_catalog()?;

        let mut classes = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let class_id = UniqueIdGenerator::for_test_class(&unique_id, &class.name);
            let owner = TypeName::new(class.name.clone(), self.assembly.clone());
            let mut methods = Vec::with_capacity(class.methods.len());
            for method in &class.methods {
                let descriptor = build_method(&self.assembly, &owner, class, method)?;
                methods.push(TestMethod::new(Arc::new(descriptor), &class_id));
            }
            classes.push(TestClass {
                name: class.name.clone(),
                unique_id: class_id,
                methods,
            });
        }

        tracing::debug!(
            assembly = %self.assembly,
            classes = classes.len(),
            types = types.len(),
            "manifest loaded"
        );

        Ok(TestAssembly {
            name: self.assembly,
            path,
            unique_id,
            types: Arc::new(types),
            classes,
        })
    }

    fn build_catalog(&self) -> Result<TypeCatalog, ManifestError> {
        let mut catalog = TypeCatalog::new();
        for entry in &self.types {
            let params = type_parameters(&entry.type_parameters);
            let scope = TypeScope::new(&params, &self.assembly);
            let context = format!("type '{}'", entry.name);
            let mut definition =
                TypeDefinition::new(TypeName::new(entry.name.clone(), self.assembly.clone())).with_type_parameters(params.clone());
            if let Some(base) = &entry.base {
                definition = definition.with_base(parse_type(base, &scope, &context)?);
            }
            for interface in &entry.interfaces {
                definition = definition.with_interface(parse_type(interface, &scope, &context)?);
            }
            catalog.define(definition);
        }
        Ok(catalog)
    }
}

fn type_parameters(names: &[String]) -> Vec<TypeParameter> {
    names
        .iter()
        .enumerate()
        .map(|(position, name)| TypeParameter::new(name.clone(), position))
        .collect()
}

fn parse_type(text: &str, scope: &TypeScope<'_>, context: &str) -> Result<TypeDescriptor, ManifestError> {
    TypeDescriptor::parse(text, scope).map_err(|source| ManifestError::Type {
        text: text.to_string(),
        context: context.to_string(),
        source,
    })
}

fn build_method(
    assembly: &str,
    owner: &TypeName,
    class: &ClassEntry,
    entry: &MethodEntry,
) -> Result<MethodDescriptor, ManifestError> {
    let qualified = format!("{}.{}", class.name, entry.name);
    let mut descriptor = MethodDescriptor::new(owner.clone(), entry.name.clone());
    for name in &entry.type_parameters {
        descriptor = descriptor.with_type_parameter(name.clone());
    }

    let value_scope = TypeScope::new(&[], assembly);
    let param_scope_params = descriptor.type_parameters.clone();
    let param_scope = TypeScope::new(&param_scope_params, assembly);

    for (index, parameter) in entry.parameters.iter().enumerate() {
        let context = format!("parameter '{}' of {}", parameter.name, qualified);
        let ty = parse_type(&parameter.ty, &param_scope, &context)?;
        if parameter.variadic {
            if index + 1 != entry.parameters.len() {
                return Err(ManifestError::Parameter {
                    method: qualified,
                    parameter: parameter.name.clone(),
                    message: "only the last parameter may be variadic".to_string(),
                });
            }
            let Some(element) = ty.element_type() else {
                return Err(ManifestError::Parameter {
                    method: qualified,
                    parameter: parameter.name.clone(),
                    message: format!("variadic parameter must have an array type, found '{}'", ty),
                });
            };
            descriptor = descriptor.with_parameter(ParameterDescriptor::variadic(parameter.name.clone(), element.clone()));
            continue;
        }
        let built = if parameter.optional {
            let default = match &parameter.default {
                Some(json) => Some(json_to_value(json, &value_scope, &context)?),
                None => None,
            };
            ParameterDescriptor::optional(parameter.name.clone(), ty, default)
        } else {
            ParameterDescriptor::required(parameter.name.clone(), ty)
        };
        descriptor = descriptor.with_parameter(built);
    }

    for marker in &entry.markers {
        descriptor = descriptor.with_test_marker(build_marker(marker));
    }

    for (index, data) in entry.data.iter().enumerate() {
        let context = format!("data source #{} of {}", index, qualified);
        descriptor = descriptor.with_data(build_source(data, &value_scope, &context)?);
    }

    for traits in [&class.traits, &entry.traits] {
        for (name, values) in traits {
            for value in values {
                descriptor = descriptor.with_marker(Marker::Trait {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    if let Some(source) = &entry.source {
        descriptor.source_location = Some(SourceLocation::new(source.file.clone(), source.line));
    }

    Ok(descriptor)
}

fn build_marker(entry: &MarkerEntry) -> TestMarker {
    let mut marker = TestMarker::new(MarkerKind::new(entry.kind.clone()));
    marker.display_name = entry.display_name.clone();
    marker.skip = entry.skip.clone();
    marker.skip_unless = entry.skip_unless.clone();
    marker.skip_when = entry.skip_when.clone();
    marker.explicit = entry.explicit;
    marker.timeout = entry.timeout;
    marker.skip_test_without_data = entry.skip_test_without_data;
    marker.disable_discovery_enumeration = entry.disable_discovery_enumeration;
    marker.cultures = entry.cultures.clone();
    marker
}

fn build_source(entry: &DataEntry, scope: &TypeScope<'_>, context: &str) -> Result<Arc<dyn DataSource>, ManifestError> {
    match entry {
        DataEntry::Inline { rows } => Ok(Arc::new(InlineData::new(build_rows(rows, scope, context)?))),
        DataEntry::Member {
            name,
            discoverable,
            disposables,
            returns_null,
            error,
            rows,
        } => Ok(Arc::new(ManifestMemberData {
            name: format!("MemberData({})", name),
            discoverable: *discoverable,
            disposables: *disposables,
            returns_null: *returns_null,
            error: error.clone(),
            rows: build_rows(rows, scope, context)?,
        })),
    }
}

fn build_rows(rows: &[RowEntry], scope: &TypeScope<'_>, context: &str) -> Result<Vec<DataRow>, ManifestError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let context = format!("row #{} of {}", index, context);
            let (values, detail) = match row {
                RowEntry::Values(values) => (values, None),
                RowEntry::Detailed(detail) => (&detail.values, Some(detail)),
            };
            let values = values
                .iter()
                .map(|v| json_to_value(v, scope, &context))
                .collect::<Result<Vec<_>, _>>()?;
            let mut row = DataRow::new(values);
            if let Some(detail) = detail {
                row.skip = detail.skip.clone();
                row.explicit = detail.explicit;
                row.timeout = detail.timeout;
                row.display_name = detail.display_name.clone();
                row.traits = detail.traits.clone();
            }
            Ok(row)
        })
        .collect()
}

// ============================================================================
// Values
// ============================================================================

/// Convert a JSON value to an argument value.
///
/// Integers that fit 32 bits become `int`, larger ones `long`. Typed forms (`{"long": 1}`,
/// `{"char": "x"}`, `{"type": "List<int>"}`, ...) select other types explicitly.
pub fn json_to_value(json: &serde_json::Value, scope: &TypeScope<'_>, context: &str) -> Result<Value, ManifestError> {
    use serde_json::Value as Json;

    let invalid = |message: String| ManifestError::Value {
        context: context.to_string(),
        message,
    };

    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i)))
            } else if n.is_u64() {
                Err(invalid(format!("integer {} does not fit in a long", n)))
            } else {
                n.as_f64().map(Value::Double).ok_or_else(|| invalid(format!("unsupported number {}", n)))
            }
        }
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Array(items) => {
            let items = items
                .iter()
                .map(|item| json_to_value(item, scope, context))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::array(inferred_element(&items), items))
        }
        Json::Object(map) => typed_value(map, scope, context),
    }
}

fn inferred_element(items: &[Value]) -> TypeDescriptor {
    let mut types = items.iter().filter_map(Value::runtime_type);
    match types.next() {
        Some(first) if types.all(|t| t == first) => first,
        _ => TypeDescriptor::object(),
    }
}

fn typed_value(
    map: &serde_json::Map<String, serde_json::Value>,
    scope: &TypeScope<'_>,
    context: &str,
) -> Result<Value, ManifestError> {
    let invalid = |message: String| ManifestError::Value {
        context: context.to_string(),
        message,
    };
    let text = |key: &str| -> Result<String, ManifestError> {
        match map.get(key) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(invalid(format!("'{}' must be a string, found {}", key, other))),
            None => Err(invalid(format!("missing '{}'", key))),
        }
    };

    if let Some(long) = map.get("long") {
        return long
            .as_i64()
            .map(Value::Long)
            .ok_or_else(|| invalid(format!("'long' must be an integer, found {}", long)));
    }
    if let Some(double) = map.get("double") {
        return double
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| invalid(format!("'double' must be a number, found {}", double)));
    }
    if map.contains_key("char") {
        let s = text("char")?;
        let mut chars = s.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Char(c)),
            _ => Err(invalid(format!("'char' must be exactly one character, found {:?}", s))),
        };
    }
    if map.contains_key("type") {
        let ty = text("type")?;
        return Ok(Value::Type(parse_type(&ty, scope, context)?));
    }
    if map.contains_key("enum") {
        let ty = text("enum")?;
        let member = text("member")?;
        let value = map
            .get("value")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| invalid("enum 'value' must be an integer".to_string()))?;
        return Ok(Value::Enum(EnumValue {
            ty: TypeName::new(ty, scope.assembly),
            member,
            value,
        }));
    }
    if map.contains_key("object") {
        let ty = parse_type(&text("object")?, scope, context)?;
        let display = match map.get("display") {
            Some(_) => text("display")?,
            None => ty.simple_name(),
        };
        let serialized = match map.get("serialized") {
            Some(_) => Some(text("serialized")?),
            None => None,
        };
        return Ok(Value::Object(ObjectValue { ty, display, serialized }));
    }
    if map.contains_key("array") {
        let element = parse_type(&text("array")?, scope, context)?;
        let items = match map.get("items") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| json_to_value(item, scope, context))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => return Err(invalid(format!("'items' must be an array, found {}", other))),
            None => Vec::new(),
        };
        return Ok(Value::array(element, items));
    }

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    Err(invalid(format!("unrecognized typed value with keys [{}]", keys.join(", "))))
}

// ============================================================================
// Member data sources
// ============================================================================

/// A member-backed data source whose behavior is scripted by the manifest.
#[derive(Debug)]
pub struct ManifestMemberData {
    name: String,
    discoverable: bool,
    disposables: usize,
    returns_null: bool,
    error: Option<String>,
    rows: Vec<DataRow>,
}

impl DataSource for ManifestMemberData {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_discovery_enumeration(&self) -> bool {
        self.discoverable
    }

    fn get_data(
        &self,
        _method: &MethodDescriptor,
        tracker: &mut DisposalTracker,
    ) -> Result<Option<Vec<DataRow>>, DataError> {
        if let Some(message) = &self.error {
            return Err(DataError::Failed {
                source_name: self.name.clone(),
                message: message.clone(),
            });
        }
        for index in 0..self.disposables {
            tracker.track(Box::new(ManifestDisposable {
                label: format!("{}#{}", self.name, index),
            }));
        }
        if self.returns_null {
            return Ok(None);
        }
        Ok(Some(self.rows.clone()))
    }
}

struct ManifestDisposable {
    label: String,
}

impl Disposable for ManifestDisposable {
    fn dispose(&mut self) -> Result<(), DataError> {
        tracing::debug!(object = %self.label, "disposed");
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scope() -> TypeScope<'static> {
        TypeScope::new(&[], "Samples")
    }

    fn value(json: &str) -> Result<Value, ManifestError> {
        let json: serde_json::Value = serde_json::from_str(json).unwrap();
        json_to_value(&json, &scope(), "test")
    }

    // ========================================
    // Values
    // ========================================

    #[test]
    fn test_numbers_pick_width() {
        assert_eq!(value("1").unwrap(), Value::Int(1));
        assert_eq!(value("4294967296").unwrap(), Value::Long(4_294_967_296));
        assert_eq!(value("1.5").unwrap(), Value::Double(1.5));
        assert!(value("18446744073709551615").is_err());
    }

    #[test]
    fn test_typed_forms() {
        assert_eq!(value(r#"{"long": 1}"#).unwrap(), Value::Long(1));
        assert_eq!(value(r#"{"char": "x"}"#).unwrap(), Value::Char('x'));
        assert!(value(r#"{"char": "xy"}"#).is_err());
        assert_eq!(
            value(r#"{"type": "List<int>"}"#).unwrap().to_string(),
            "typeof(List<int>)"
        );
        let Value::Object(object) = value(r#"{"object": "Samples.Widget"}"#).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(object.display, "Widget");
        assert!(object.serialized.is_none());
    }

    #[test]
    fn test_plain_arrays_infer_element_type() {
        let Value::Array(array) = value("[1, 2]").unwrap() else {
            panic!("expected array");
        };
        assert_eq!(array.element, TypeDescriptor::core("int"));
        let Value::Array(array) = value(r#"[1, "x"]"#).unwrap() else {
            panic!("expected array");
        };
        assert!(array.element.is_object());
    }

    #[test]
    fn test_unknown_typed_value_is_rejected() {
        let err = value(r#"{"mystery": 1}"#).unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }

    // ========================================
    // Manifest structure
    // ========================================

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = Manifest::parse(r#"{"assembly": "A", "clases": []}"#).unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }

    #[test]
    fn test_assembly_preserves_declaration_order() {
        let manifest = Manifest::parse(
            r#"{
                "assembly": "Samples",
                "classes": [
                    { "name": "Samples.B", "methods": [{ "name": "Two" }, { "name": "One" }] },
                    { "name": "Samples.A", "methods": [{ "name": "Three" }] }
                ]
            }"#,
        )
        .unwrap();
        let assembly = manifest.into_assembly(None).unwrap();
        let names: Vec<&str> = assembly
            .classes
            .iter()
            .flat_map(|c| c.methods.iter().map(|m| m.descriptor.name.as_str()))
            .collect();
        assert_eq!(names, vec!["Two", "One", "Three"]);
    }

    #[test]
    fn test_variadic_must_be_last_array() {
        let manifest = Manifest::parse(
            r#"{
                "assembly": "Samples",
                "classes": [{ "name": "Samples.P", "methods": [{
                    "name": "Sum",
                    "parameters": [{ "name": "values", "type": "int", "variadic": true }]
                }]}]
            }"#,
        )
        .unwrap();
        let err = manifest.into_assembly(None).unwrap_err();
        assert!(matches!(err, ManifestError::Parameter { .. }));
    }

    #[test]
    fn test_member_source_scripts_behavior() {
        let source = ManifestMemberData {
            name: "MemberData(Rows)".into(),
            discoverable: true,
            disposables: 2,
            returns_null: true,
            error: None,
            rows: vec![],
        };
        let method = MethodDescriptor::new(TypeName::new("C", "A"), "M");
        let mut tracker = DisposalTracker::new();
        assert_eq!(source.get_data(&method, &mut tracker).unwrap(), None);
        assert_eq!(tracker.len(), 2);
    }
}
