//! Dynamic argument values produced by data sources.

use std::fmt;

use crate::metadata::{TypeDescriptor, TypeName, builtins};

const MAX_STRING_LENGTH: usize = 50;
const MAX_ARRAY_ITEMS: usize = 5;
const ELLIPSIS: &str = "···";

/// A runtime argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Char(char),
    Str(String),
    Array(ArrayValue),
    Enum(EnumValue),
    /// A type used as a value (`typeof(T)`).
    Type(TypeDescriptor),
    /// An opaque user object. Only objects carrying a `serialized` form can be pre-enumerated.
    Object(ObjectValue),
}

/// A typed array: the element type is part of the value, not inferred from its items.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element: TypeDescriptor,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub ty: TypeName,
    pub member: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectValue {
    pub ty: TypeDescriptor,
    pub display: String,
    pub serialized: Option<String>,
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(element: TypeDescriptor, items: Vec<Value>) -> Self {
        Value::Array(ArrayValue { element, items })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value's runtime type; `None` for `null`.
    pub fn runtime_type(&self) -> Option<TypeDescriptor> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeDescriptor::core(builtins::BOOL),
            Value::Int(_) => TypeDescriptor::core(builtins::INT),
            Value::Long(_) => TypeDescriptor::core(builtins::LONG),
            Value::Double(_) => TypeDescriptor::core(builtins::DOUBLE),
            Value::Char(_) => TypeDescriptor::core(builtins::CHAR),
            Value::Str(_) => TypeDescriptor::core(builtins::STRING),
            Value::Array(array) => TypeDescriptor::array_of(array.element.clone()),
            Value::Enum(e) => TypeDescriptor::Concrete(e.ty.clone()),
            Value::Type(_) => TypeDescriptor::core(builtins::TYPE),
            Value::Object(o) => o.ty.clone(),
        };
        Some(ty)
    }

    /// The zero value of a type: `false`/`0`/`'\0'` for value types, `null` otherwise.
    pub fn zero_for(ty: &TypeDescriptor) -> Value {
        match ty {
            TypeDescriptor::Concrete(name) if name.is_core() => match name.full_name.as_str() {
                builtins::BOOL => Value::Bool(false),
                builtins::INT => Value::Int(0),
                builtins::LONG => Value::Long(0),
                builtins::DOUBLE => Value::Double(0.0),
                builtins::CHAR => Value::Char('\0'),
                _ => Value::Null,
            },
            _ => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    /// Argument rendering used in test case display names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Char(c) => write!(f, "'{}'", escape_char(*c)),
            Value::Str(s) => write_string(f, s),
            Value::Array(array) => {
                write!(f, "[")?;
                for (i, item) in array.items.iter().take(MAX_ARRAY_ITEMS).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if array.items.len() > MAX_ARRAY_ITEMS {
                    write!(f, ", {}", ELLIPSIS)?;
                }
                write!(f, "]")
            }
            Value::Enum(e) => write!(f, "{}", e.member),
            Value::Type(ty) => write!(f, "typeof({})", ty),
            Value::Object(o) => write!(f, "{}", o.display),
        }
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars().take(MAX_STRING_LENGTH) {
        write!(f, "{}", escape_char(c))?;
    }
    write!(f, "\"")?;
    if s.chars().count() > MAX_STRING_LENGTH {
        write!(f, "{}", ELLIPSIS)?;
    }
    Ok(())
}

fn escape_char(c: char) -> String {
    match c {
        '"' => "\\\"".to_string(),
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        '\0' => "\\0".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        c if c.is_control() => format!("\\x{:04x}", c as u32),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_strings_are_truncated() {
        let text = "a".repeat(60);
        let rendered = Value::str(text).to_string();
        assert_eq!(rendered, format!("\"{}\"···", "a".repeat(50)));
    }

    #[test]
    fn test_strings_and_chars_are_escaped() {
        assert_eq!(Value::str("a\"b\n").to_string(), "\"a\\\"b\\n\"");
        assert_eq!(Value::Char('\'').to_string(), "'\\''");
    }

    #[test]
    fn test_array_shows_at_most_five_items() {
        let items = (1..=7).map(Value::Int).collect();
        let value = Value::array(TypeDescriptor::core("int"), items);
        assert_eq!(value.to_string(), "[1, 2, 3, 4, 5, ···]");
    }

    #[test]
    fn test_type_value_renders_typeof() {
        assert_eq!(Value::Type(TypeDescriptor::core("string")).to_string(), "typeof(string)");
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(Value::zero_for(&TypeDescriptor::core("int")), Value::Int(0));
        assert_eq!(Value::zero_for(&TypeDescriptor::core("string")), Value::Null);
        assert_eq!(Value::zero_for(&TypeDescriptor::object()), Value::Null);
    }

    #[test]
    fn test_runtime_type_of_array_includes_element() {
        let value = Value::array(TypeDescriptor::core("int"), vec![]);
        assert_eq!(value.runtime_type(), Some(TypeDescriptor::array_of(TypeDescriptor::core("int"))));
        assert_eq!(Value::Null.runtime_type(), None);
    }
}
