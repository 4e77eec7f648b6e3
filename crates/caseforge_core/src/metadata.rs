//! Metadata model for test methods.
//!
//! Descriptors are read-only once built and are shared across a discovery pass. Types compare by
//! `(full name, defining assembly)` so two same-named types from different assemblies never unify.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::data::DataSource;
use crate::errors::TypeParseError;
use crate::testcase::SourceLocation;
use crate::value::Value;

/// Assembly that defines the built-in types.
pub const CORE_ASSEMBLY: &str = "core";

/// Built-in type spellings (all live in [`CORE_ASSEMBLY`]).
pub mod builtins {
    pub const OBJECT: &str = "object";
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const LONG: &str = "long";
    pub const DOUBLE: &str = "double";
    pub const CHAR: &str = "char";
    pub const STRING: &str = "string";
    pub const TYPE: &str = "Type";
    pub const LIST: &str = "List";
    pub const DICTIONARY: &str = "Dictionary";
    pub const ENUMERABLE: &str = "IEnumerable";
    pub const NULLABLE: &str = "Nullable";

    /// Every spelling resolved to the core assembly by the type-expression parser.
    pub const ALL: &[&str] = &[
        OBJECT, BOOL, INT, LONG, DOUBLE, CHAR, STRING, TYPE, LIST, DICTIONARY, ENUMERABLE, NULLABLE,
    ];

    /// Types whose zero value is not `null`.
    pub const VALUE_TYPES: &[&str] = &[BOOL, INT, LONG, DOUBLE, CHAR];
}

// ============================================================================
// Type names and descriptors
// ============================================================================

/// A type's identity: fully qualified name plus the assembly that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub full_name: String,
    pub assembly: String,
}

impl TypeName {
    pub fn new(full_name: impl Into<String>, assembly: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            assembly: assembly.into(),
        }
    }

    /// A type defined in [`CORE_ASSEMBLY`].
    pub fn core(full_name: impl Into<String>) -> Self {
        Self::new(full_name, CORE_ASSEMBLY)
    }

    /// The name without namespace or generic arity suffix (`Ns.Box`1` -> `Box`).
    pub fn simple_name(&self) -> &str {
        let name = match self.full_name.find('`') {
            Some(idx) => &self.full_name[..idx],
            None => &self.full_name,
        };
        match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => name,
        }
    }

    /// The namespace portion of the full name, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.full_name.rfind('.').map(|idx| &self.full_name[..idx])
    }

    pub fn is_core(&self) -> bool {
        self.assembly == CORE_ASSEMBLY
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

/// An open generic type parameter declared on a method or a generic type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub position: usize,
}

impl TypeParameter {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// A type as seen by the unifier.
///
/// `ClosedGeneric` is any instantiation of a generic definition. Its arguments may themselves be
/// open (`List<T>`), in which case the whole descriptor is open; see [`TypeDescriptor::is_open`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Concrete(TypeName),
    OpenGeneric(TypeParameter),
    Array(Box<TypeDescriptor>),
    ClosedGeneric(TypeName, Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn core(name: &str) -> Self {
        TypeDescriptor::Concrete(TypeName::core(name))
    }

    /// The universal fallback type.
    pub fn object() -> Self {
        Self::core(builtins::OBJECT)
    }

    pub fn array_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn generic(definition: TypeName, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::ClosedGeneric(definition, args)
    }

    pub fn is_object(&self) -> bool {
        self.is_core_named(builtins::OBJECT)
    }

    /// Check whether this is the built-in named type `name`.
    pub fn is_core_named(&self, name: &str) -> bool {
        matches!(self, TypeDescriptor::Concrete(n) if n.is_core() && n.full_name == name)
    }

    /// Check whether values of this type have a non-null zero value.
    pub fn is_value_type(&self) -> bool {
        match self {
            TypeDescriptor::Concrete(name) => name.is_core() && builtins::VALUE_TYPES.contains(&name.full_name.as_str()),
            _ => false,
        }
    }

    /// Check whether any open type parameter occurs in this type.
    pub fn is_open(&self) -> bool {
        match self {
            TypeDescriptor::Concrete(_) => false,
            TypeDescriptor::OpenGeneric(_) => true,
            TypeDescriptor::Array(element) => element.is_open(),
            TypeDescriptor::ClosedGeneric(_, args) => args.iter().any(TypeDescriptor::is_open),
        }
    }

    /// Element type of an array type.
    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Replace open type parameters by their bindings; unbound parameters stay open.
    pub fn substitute(&self, bindings: &[(TypeParameter, TypeDescriptor)]) -> TypeDescriptor {
        match self {
            TypeDescriptor::Concrete(_) => self.clone(),
            TypeDescriptor::OpenGeneric(param) => bindings
                .iter()
                .find(|(p, _)| p.name == param.name)
                .map(|(_, ty)| ty.clone())
                .unwrap_or_else(|| self.clone()),
            TypeDescriptor::Array(element) => TypeDescriptor::Array(Box::new(element.substitute(bindings))),
            TypeDescriptor::ClosedGeneric(def, args) => {
                TypeDescriptor::ClosedGeneric(def.clone(), args.iter().map(|a| a.substitute(bindings)).collect())
            }
        }
    }

    /// Render with simple (namespace-free) names, as used in display names.
    pub fn simple_name(&self) -> String {
        match self {
            TypeDescriptor::Concrete(name) => name.simple_name().to_string(),
            TypeDescriptor::OpenGeneric(param) => param.name.clone(),
            TypeDescriptor::Array(element) => format!("{}[]", element.simple_name()),
            TypeDescriptor::ClosedGeneric(def, args) => {
                let args: Vec<String> = args.iter().map(TypeDescriptor::simple_name).collect();
                format!("{}<{}>", def.simple_name(), args.join(", "))
            }
        }
    }

    /// Parse a type expression such as `T`, `int[]`, or `Dictionary<string, List<T>>`.
    pub fn parse(text: &str, scope: &TypeScope<'_>) -> Result<TypeDescriptor, TypeParseError> {
        TypeExprParser::new(text, scope).parse()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Concrete(name) => write!(f, "{}", name),
            TypeDescriptor::OpenGeneric(param) => write!(f, "{}", param.name),
            TypeDescriptor::Array(element) => write!(f, "{}[]", element),
            TypeDescriptor::ClosedGeneric(def, args) => {
                write!(f, "{}<", def)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
        }
    }
}

// ============================================================================
// Type expression parsing
// ============================================================================

/// Name-resolution context for type expressions.
///
/// Identifiers resolve, in order, to a type parameter in scope, a built-in type, or a type in
/// `assembly`.
#[derive(Debug, Clone, Copy)]
pub struct TypeScope<'a> {
    pub type_parameters: &'a [TypeParameter],
    pub assembly: &'a str,
}

impl<'a> TypeScope<'a> {
    pub fn new(type_parameters: &'a [TypeParameter], assembly: &'a str) -> Self {
        Self {
            type_parameters,
            assembly,
        }
    }

    fn resolve_name(&self, ident: &str) -> NameResolution {
        if let Some(param) = self.type_parameters.iter().find(|p| p.name == ident) {
            return NameResolution::Parameter(param.clone());
        }
        if builtins::ALL.contains(&ident) {
            return NameResolution::Type(TypeName::core(ident));
        }
        NameResolution::Type(TypeName::new(ident, self.assembly))
    }
}

enum NameResolution {
    Parameter(TypeParameter),
    Type(TypeName),
}

struct TypeExprParser<'s, 'a> {
    text: &'s str,
    chars: Vec<(usize, char)>,
    pos: usize,
    scope: &'s TypeScope<'a>,
}

impl<'s, 'a> TypeExprParser<'s, 'a> {
    fn new(text: &'s str, scope: &'s TypeScope<'a>) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            pos: 0,
            scope,
        }
    }

    fn parse(mut self) -> Result<TypeDescriptor, TypeParseError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(TypeParseError::Empty);
        }
        let ty = self.parse_type()?;
        self.skip_ws();
        match self.peek() {
            None => Ok(ty),
            Some(found) => Err(self.unexpected(found)),
        }
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, TypeParseError> {
        self.skip_ws();
        let ident = self.parse_ident()?;
        self.skip_ws();

        let mut ty = if self.peek() == Some('<') {
            self.pos += 1;
            let mut args = Vec::new();
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(found) => return Err(self.unexpected(found)),
                    None => {
                        return Err(TypeParseError::Unterminated {
                            text: self.text.to_string(),
                        });
                    }
                }
            }
            match self.scope.resolve_name(&ident) {
                NameResolution::Type(def) => TypeDescriptor::ClosedGeneric(def, args),
                // A type parameter cannot itself take arguments.
                NameResolution::Parameter(_) => return Err(self.unexpected('<')),
            }
        } else {
            match self.scope.resolve_name(&ident) {
                NameResolution::Parameter(param) => TypeDescriptor::OpenGeneric(param),
                NameResolution::Type(name) => TypeDescriptor::Concrete(name),
            }
        };

        loop {
            self.skip_ws();
            if self.peek() == Some('[') {
                self.pos += 1;
                self.skip_ws();
                match self.peek() {
                    Some(']') => {
                        self.pos += 1;
                        ty = TypeDescriptor::array_of(ty);
                    }
                    Some(found) => return Err(self.unexpected(found)),
                    None => {
                        return Err(TypeParseError::Unterminated {
                            text: self.text.to_string(),
                        });
                    }
                }
            } else {
                break;
            }
        }

        Ok(ty)
    }

    fn parse_ident(&mut self) -> Result<String, TypeParseError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == '`' || c == '+' {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(TypeParseError::Unterminated {
                    text: self.text.to_string(),
                }),
            };
        }
        Ok(ident)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, found: char) -> TypeParseError {
        let offset = self.chars.get(self.pos).map(|(o, _)| *o).unwrap_or(self.text.len());
        TypeParseError::Unexpected {
            text: self.text.to_string(),
            found,
            offset,
        }
    }
}

// ============================================================================
// Type hierarchy
// ============================================================================

/// Supertypes of a user-defined type (or generic type definition).
///
/// For a generic definition, `base` and `interfaces` may mention `type_parameters`; they are
/// substituted with the instantiation's arguments on lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: TypeName,
    pub type_parameters: Vec<TypeParameter>,
    pub base: Option<TypeDescriptor>,
    pub interfaces: Vec<TypeDescriptor>,
}

impl TypeDefinition {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            type_parameters: Vec::new(),
            base: None,
            interfaces: Vec::new(),
        }
    }

    pub fn with_type_parameters(mut self, params: Vec<TypeParameter>) -> Self {
        self.type_parameters = params;
        self
    }

    pub fn with_base(mut self, base: TypeDescriptor) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: TypeDescriptor) -> Self {
        self.interfaces.push(interface);
        self
    }
}

/// Lookup table of type definitions for one assembly scan.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    definitions: HashMap<TypeName, TypeDefinition>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, definition: TypeDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn with(mut self, definition: TypeDefinition) -> Self {
        self.define(definition);
        self
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeDefinition> {
        self.definitions.get(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Direct base type and directly implemented interfaces, with generic arguments substituted.
    fn supertypes(&self, ty: &TypeDescriptor) -> (Option<TypeDescriptor>, Vec<TypeDescriptor>) {
        let (name, args): (&TypeName, &[TypeDescriptor]) = match ty {
            TypeDescriptor::Concrete(name) => (name, &[]),
            TypeDescriptor::ClosedGeneric(name, args) => (name, args.as_slice()),
            TypeDescriptor::Array(element) => return (None, vec![enumerable_of(element.as_ref().clone())]),
            TypeDescriptor::OpenGeneric(_) => return (None, Vec::new()),
        };
        let Some(def) = self.definitions.get(name) else {
            return builtin_supertypes(name, args);
        };
        let bindings: Vec<(TypeParameter, TypeDescriptor)> =
            def.type_parameters.iter().cloned().zip(args.iter().cloned()).collect();
        let base = def.base.as_ref().map(|b| b.substitute(&bindings));
        let interfaces = def.interfaces.iter().map(|i| i.substitute(&bindings)).collect();
        (base, interfaces)
    }

    /// The type itself, its base chain, then every interface implemented anywhere in that chain.
    ///
    /// Interfaces inherited from other interfaces are included; duplicates are dropped and the first
    /// occurrence keeps its position.
    pub fn hierarchy(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut pending_interfaces = Vec::new();

        let mut current = Some(ty.clone());
        while let Some(level) = current {
            if !seen.insert(level.clone()) {
                break;
            }
            let (base, interfaces) = self.supertypes(&level);
            chain.push(level);
            pending_interfaces.extend(interfaces);
            current = base;
        }

        let mut interfaces = Vec::new();
        let mut queue = std::collections::VecDeque::from(pending_interfaces);
        while let Some(interface) = queue.pop_front() {
            if !seen.insert(interface.clone()) {
                continue;
            }
            let (_, inherited) = self.supertypes(&interface);
            interfaces.push(interface);
            queue.extend(inherited);
        }

        chain.extend(interfaces);
        chain
    }

    /// Check whether a value of type `from` may be stored where `to` is expected.
    pub fn is_assignable(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        if to.is_object() || from == to {
            return true;
        }
        self.hierarchy(from).iter().any(|t| t == to)
    }
}

fn enumerable_of(element: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::generic(TypeName::core(builtins::ENUMERABLE), vec![element])
}

/// Interfaces of the built-in types, which no manifest can redefine.
///
/// `List<T>` and `string` are sequences; arrays are handled by the caller.
fn builtin_supertypes(name: &TypeName, args: &[TypeDescriptor]) -> (Option<TypeDescriptor>, Vec<TypeDescriptor>) {
    if !name.is_core() {
        return (None, Vec::new());
    }
    match (name.full_name.as_str(), args) {
        (builtins::LIST, [element]) => (None, vec![enumerable_of(element.clone())]),
        (builtins::STRING, []) => (None, vec![enumerable_of(TypeDescriptor::core(builtins::CHAR))]),
        _ => (None, Vec::new()),
    }
}

// ============================================================================
// Parameters, markers, methods
// ============================================================================

/// One declared method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub is_optional: bool,
    pub default_value: Option<Value>,
    /// Only meaningful on the trailing parameter, whose `ty` is then an array type.
    pub is_variadic: bool,
}

impl ParameterDescriptor {
    pub fn required(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            is_optional: false,
            default_value: None,
            is_variadic: false,
        }
    }

    /// An optional parameter; `None` means "use the type's zero value".
    pub fn optional(name: impl Into<String>, ty: TypeDescriptor, default_value: Option<Value>) -> Self {
        Self {
            is_optional: true,
            default_value,
            ..Self::required(name, ty)
        }
    }

    /// A trailing variadic parameter collecting values of `element`.
    pub fn variadic(name: impl Into<String>, element: TypeDescriptor) -> Self {
        Self {
            is_variadic: true,
            ..Self::required(name, TypeDescriptor::array_of(element))
        }
    }

    /// Element type collected by a variadic parameter.
    pub fn variadic_element(&self) -> Option<&TypeDescriptor> {
        if self.is_variadic { self.ty.element_type() } else { None }
    }
}

/// Identifies which discoverer handles a test marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKind(String);

impl MarkerKind {
    pub const FACT: &'static str = "fact";
    pub const THEORY: &'static str = "theory";
    pub const CULTURED_FACT: &'static str = "cultured-fact";
    pub const CULTURED_THEORY: &'static str = "cultured-theory";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn fact() -> Self {
        Self::new(Self::FACT)
    }

    pub fn theory() -> Self {
        Self::new(Self::THEORY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fact-or-theory marker with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMarker {
    pub kind: MarkerKind,
    pub display_name: Option<String>,
    pub skip: Option<String>,
    /// Name of a predicate that must hold for `skip` to be ignored.
    pub skip_unless: Option<String>,
    /// Name of a predicate that must hold for `skip` to apply.
    pub skip_when: Option<String>,
    pub explicit: bool,
    /// Milliseconds; `0` means no timeout.
    pub timeout: u32,
    pub skip_test_without_data: bool,
    pub disable_discovery_enumeration: bool,
    pub cultures: Vec<String>,
}

impl TestMarker {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            display_name: None,
            skip: None,
            skip_unless: None,
            skip_when: None,
            explicit: false,
            timeout: 0,
            skip_test_without_data: false,
            disable_discovery_enumeration: false,
            cultures: Vec::new(),
        }
    }

    pub fn fact() -> Self {
        Self::new(MarkerKind::fact())
    }

    pub fn theory() -> Self {
        Self::new(MarkerKind::theory())
    }

    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_cultures(mut self, cultures: Vec<String>) -> Self {
        self.cultures = cultures;
        self
    }

    /// A skip reason with no predicate that could lift it.
    pub fn is_unconditionally_skipped(&self) -> bool {
        self.skip.is_some() && self.skip_unless.is_none() && self.skip_when.is_none()
    }
}

/// A declarative marker attached to a method.
#[derive(Clone)]
pub enum Marker {
    Test(TestMarker),
    Data(Arc<dyn DataSource>),
    Trait { name: String, value: String },
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Test(marker) => f.debug_tuple("Test").field(marker).finish(),
            Marker::Data(source) => f.debug_tuple("Data").field(&source.name()).finish(),
            Marker::Trait { name, value } => f.debug_struct("Trait").field("name", name).field("value", value).finish(),
        }
    }
}

/// Read-only description of one test method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub owner: TypeName,
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub type_parameters: Vec<TypeParameter>,
    pub markers: Vec<Marker>,
    pub source_location: Option<SourceLocation>,
}

impl MethodDescriptor {
    pub fn new(owner: TypeName, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            parameters: Vec::new(),
            type_parameters: Vec::new(),
            markers: Vec::new(),
            source_location: None,
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        let position = self.type_parameters.len();
        self.type_parameters.push(TypeParameter::new(name, position));
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_test_marker(self, marker: TestMarker) -> Self {
        self.with_marker(Marker::Test(marker))
    }

    pub fn with_data(self, source: Arc<dyn DataSource>) -> Self {
        self.with_marker(Marker::Data(source))
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }

    /// `Class.Method` using the owner's full name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner.full_name, self.name)
    }

    pub fn test_markers(&self) -> impl Iterator<Item = &TestMarker> {
        self.markers.iter().filter_map(|m| match m {
            Marker::Test(t) => Some(t),
            _ => None,
        })
    }

    /// Data sources in declaration order.
    pub fn data_sources(&self) -> impl Iterator<Item = &Arc<dyn DataSource>> {
        self.markers.iter().filter_map(|m| match m {
            Marker::Data(d) => Some(d),
            _ => None,
        })
    }

    /// Trait markers grouped by name, values in declaration order.
    pub fn traits(&self) -> BTreeMap<String, Vec<String>> {
        let mut traits: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for marker in &self.markers {
            if let Marker::Trait { name, value } = marker {
                traits.entry(name.clone()).or_default().push(value.clone());
            }
        }
        traits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_with(params: &[TypeParameter]) -> TypeScope<'_> {
        TypeScope::new(params, "Samples")
    }

    // ========================================
    // Type names
    // ========================================

    #[test]
    fn test_simple_name_strips_namespace_and_arity() {
        let name = TypeName::new("Samples.Collections.Box`1", "Samples");
        assert_eq!(name.simple_name(), "Box");
        assert_eq!(name.namespace(), Some("Samples.Collections"));
    }

    #[test]
    fn test_type_names_differ_by_assembly() {
        assert_ne!(TypeName::new("Widget", "A"), TypeName::new("Widget", "B"));
    }

    // ========================================
    // Type expression parsing
    // ========================================

    #[test]
    fn test_parse_builtin_and_parameter() {
        let params = vec![TypeParameter::new("T", 0)];
        let scope = scope_with(&params);
        assert_eq!(TypeDescriptor::parse("int", &scope).unwrap(), TypeDescriptor::core("int"));
        assert_eq!(
            TypeDescriptor::parse("T", &scope).unwrap(),
            TypeDescriptor::OpenGeneric(TypeParameter::new("T", 0))
        );
    }

    #[test]
    fn test_parse_nested_generic_array() {
        let params = vec![TypeParameter::new("T", 0)];
        let scope = scope_with(&params);
        let ty = TypeDescriptor::parse("Dictionary<string, List<T>>[]", &scope).unwrap();
        assert_eq!(ty.to_string(), "Dictionary<string, List<T>>[]");
        assert!(ty.is_open());
    }

    #[test]
    fn test_parse_user_type_uses_scope_assembly() {
        let scope = scope_with(&[]);
        let ty = TypeDescriptor::parse("Samples.Widget", &scope).unwrap();
        assert_eq!(ty, TypeDescriptor::Concrete(TypeName::new("Samples.Widget", "Samples")));
    }

    #[test]
    fn test_parse_errors() {
        let scope = scope_with(&[]);
        assert_eq!(TypeDescriptor::parse("  ", &scope), Err(TypeParseError::Empty));
        assert!(matches!(
            TypeDescriptor::parse("List<int", &scope),
            Err(TypeParseError::Unterminated { .. })
        ));
        assert!(matches!(
            TypeDescriptor::parse("int]", &scope),
            Err(TypeParseError::Unexpected { found: ']', .. })
        ));
    }

    // ========================================
    // Hierarchy
    // ========================================

    #[test]
    fn test_hierarchy_substitutes_generic_definition() {
        let t = TypeParameter::new("T", 0);
        let boxed = TypeName::new("Samples.Box", "Samples");
        let catalog = TypeCatalog::new().with(
            TypeDefinition::new(boxed.clone())
                .with_type_parameters(vec![t.clone()])
                .with_interface(TypeDescriptor::generic(
                    TypeName::core(builtins::ENUMERABLE),
                    vec![TypeDescriptor::OpenGeneric(t)],
                )),
        );

        let closed = TypeDescriptor::generic(boxed, vec![TypeDescriptor::core("int")]);
        let hierarchy = catalog.hierarchy(&closed);
        assert_eq!(hierarchy.len(), 2);
        assert_eq!(hierarchy[1].to_string(), "IEnumerable<int>");
    }

    #[test]
    fn test_builtin_sequences_implement_enumerable() {
        let catalog = TypeCatalog::new();
        let int = TypeDescriptor::core("int");
        let names = |ty: &TypeDescriptor| -> Vec<String> { catalog.hierarchy(ty).iter().map(|t| t.to_string()).collect() };

        assert_eq!(names(&TypeDescriptor::array_of(int.clone())), vec!["int[]", "IEnumerable<int>"]);
        assert_eq!(
            names(&TypeDescriptor::generic(TypeName::core(builtins::LIST), vec![int.clone()])),
            vec!["List<int>", "IEnumerable<int>"]
        );
        assert_eq!(names(&TypeDescriptor::core("string")), vec!["string", "IEnumerable<char>"]);
        assert_eq!(names(&int), vec!["int"]);
        // Same spelling in a user assembly is not the built-in.
        let user_list = TypeDescriptor::generic(TypeName::new("List", "Samples"), vec![int]);
        assert_eq!(catalog.hierarchy(&user_list).len(), 1);
    }

    #[test]
    fn test_is_core_named_checks_assembly() {
        assert!(TypeDescriptor::core("string").is_core_named(builtins::STRING));
        assert!(!TypeDescriptor::Concrete(TypeName::new("string", "Samples")).is_core_named(builtins::STRING));
        assert!(TypeDescriptor::object().is_object());
    }

    #[test]
    fn test_hierarchy_orders_bases_before_interfaces() {
        let base = TypeName::new("Samples.Base", "Samples");
        let derived = TypeName::new("Samples.Derived", "Samples");
        let marker = TypeName::new("Samples.IMarker", "Samples");
        let catalog = TypeCatalog::new()
            .with(TypeDefinition::new(base.clone()).with_interface(TypeDescriptor::Concrete(marker.clone())))
            .with(TypeDefinition::new(derived.clone()).with_base(TypeDescriptor::Concrete(base.clone())));

        let names: Vec<String> = catalog
            .hierarchy(&TypeDescriptor::Concrete(derived))
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(names, vec!["Samples.Derived", "Samples.Base", "Samples.IMarker"]);
    }

    #[test]
    fn test_is_assignable_to_object_and_base() {
        let base = TypeName::new("Samples.Base", "Samples");
        let derived = TypeName::new("Samples.Derived", "Samples");
        let catalog =
            TypeCatalog::new().with(TypeDefinition::new(derived.clone()).with_base(TypeDescriptor::Concrete(base.clone())));
        let derived = TypeDescriptor::Concrete(derived);
        assert!(catalog.is_assignable(&derived, &TypeDescriptor::object()));
        assert!(catalog.is_assignable(&derived, &TypeDescriptor::Concrete(base.clone())));
        assert!(!catalog.is_assignable(&TypeDescriptor::Concrete(base), &derived));
    }

    // ========================================
    // Markers
    // ========================================

    #[test]
    fn test_conditional_skip_is_not_unconditional() {
        let mut marker = TestMarker::theory().with_skip("later");
        assert!(marker.is_unconditionally_skipped());
        marker.skip_when = Some("IsWindows".to_string());
        assert!(!marker.is_unconditionally_skipped());
    }

    #[test]
    fn test_traits_grouped_by_name() {
        let method = MethodDescriptor::new(TypeName::new("Samples.Tests", "Samples"), "Run")
            .with_marker(Marker::Trait {
                name: "Category".into(),
                value: "Fast".into(),
            })
            .with_marker(Marker::Trait {
                name: "Category".into(),
                value: "Unit".into(),
            });
        assert_eq!(method.traits()["Category"], vec!["Fast", "Unit"]);
    }
}
