//! Serializability gate and canonical value encoding.
//!
//! The canonical encoding feeds unique ids, so it must be injective: every string and type name is
//! length-prefixed and every item is terminated, so concatenations can never collide.

use std::fmt::Write as _;

use crate::errors::SerializationError;
use crate::metadata::{TypeDescriptor, builtins};
use crate::value::Value;

/// Decides whether resolved values can be identity-encoded, and encodes them.
pub trait SerializationEngine: Send + Sync {
    /// Check whether `value`, declared as `declared` (if known), round-trips through [`serialize`].
    ///
    /// [`serialize`]: SerializationEngine::serialize
    fn is_serializable(&self, value: &Value, declared: Option<&TypeDescriptor>) -> bool;

    fn serialize(&self, value: &Value) -> Result<String, SerializationError>;

    /// Encode a whole argument array.
    fn serialize_arguments(&self, values: &[Value]) -> Result<String, SerializationError> {
        let mut out = String::new();
        let _ = write!(out, "{}:", values.len());
        for value in values {
            out.push_str(&self.serialize(value)?);
        }
        Ok(out)
    }
}

/// Serializes primitives, strings, enums, closed types, typed arrays of those, and objects that
/// carry their own serialized form.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSerializer;

impl DefaultSerializer {
    fn is_serializable_type(ty: &TypeDescriptor) -> bool {
        match ty {
            TypeDescriptor::OpenGeneric(_) => false,
            TypeDescriptor::Array(element) => Self::is_serializable_type(element),
            // `object` and user types may hold anything; the value decides.
            TypeDescriptor::Concrete(_) => true,
            TypeDescriptor::ClosedGeneric(def, args) => {
                def.is_core() && def.full_name == builtins::NULLABLE && args.iter().all(Self::is_serializable_type)
            }
        }
    }

    /// `null` is only encodable where the declared type says what it is a null *of*.
    fn null_is_serializable(declared: Option<&TypeDescriptor>) -> bool {
        match declared {
            None => true,
            Some(ty) if ty.is_object() => true,
            Some(TypeDescriptor::Concrete(name)) => name.is_core(),
            Some(TypeDescriptor::Array(element)) => Self::is_serializable_type(element),
            Some(TypeDescriptor::ClosedGeneric(def, _)) => def.is_core() && def.full_name == builtins::NULLABLE,
            Some(TypeDescriptor::OpenGeneric(_)) => false,
        }
    }
}

impl SerializationEngine for DefaultSerializer {
    fn is_serializable(&self, value: &Value, declared: Option<&TypeDescriptor>) -> bool {
        match value {
            Value::Null => Self::null_is_serializable(declared),
            Value::Bool(_) | Value::Int(_) | Value::Long(_) | Value::Double(_) | Value::Char(_) | Value::Str(_) => true,
            Value::Enum(_) => true,
            Value::Type(ty) => !ty.is_open(),
            Value::Object(object) => object.serialized.is_some(),
            // Items are judged by their own runtime type, so `object[]` holding primitives passes.
            Value::Array(array) => {
                Self::is_serializable_type(&array.element)
                    && array
                        .items
                        .iter()
                        .all(|item| self.is_serializable(item, item.runtime_type().as_ref()))
            }
        }
    }

    fn serialize(&self, value: &Value) -> Result<String, SerializationError> {
        let mut out = String::new();
        encode(value, &mut out)?;
        Ok(out)
    }
}

fn encode(value: &Value, out: &mut String) -> Result<(), SerializationError> {
    match value {
        Value::Null => out.push_str("n;"),
        Value::Bool(b) => {
            let _ = write!(out, "b{};", u8::from(*b));
        }
        Value::Int(i) => {
            let _ = write!(out, "i{};", i);
        }
        Value::Long(l) => {
            let _ = write!(out, "l{};", l);
        }
        Value::Double(d) => {
            let _ = write!(out, "d{:016x};", d.to_bits());
        }
        Value::Char(c) => {
            let _ = write!(out, "c{};", u32::from(*c));
        }
        Value::Str(s) => {
            out.push('s');
            encode_text(s, out);
            out.push(';');
        }
        Value::Enum(e) => {
            out.push('e');
            encode_text(&e.ty.full_name, out);
            encode_text(&e.ty.assembly, out);
            let _ = write!(out, "{};", e.value);
        }
        Value::Type(ty) => {
            if ty.is_open() {
                return Err(SerializationError::OpenType {
                    type_name: ty.to_string(),
                });
            }
            out.push('t');
            encode_type(ty, out);
            out.push(';');
        }
        Value::Object(object) => {
            let Some(serialized) = &object.serialized else {
                return Err(SerializationError::Unsupported {
                    type_name: object.ty.to_string(),
                });
            };
            out.push('o');
            encode_type(&object.ty, out);
            encode_text(serialized, out);
            out.push(';');
        }
        Value::Array(array) => {
            out.push('a');
            encode_type(&array.element, out);
            let _ = write!(out, "{}:", array.items.len());
            for item in &array.items {
                encode(item, out)?;
            }
            out.push(';');
        }
    }
    Ok(())
}

fn encode_text(text: &str, out: &mut String) {
    let _ = write!(out, "{}:{}", text.len(), text);
}

fn encode_type(ty: &TypeDescriptor, out: &mut String) {
    match ty {
        TypeDescriptor::Concrete(name) => {
            out.push('C');
            encode_text(&name.full_name, out);
            encode_text(&name.assembly, out);
        }
        TypeDescriptor::OpenGeneric(param) => {
            out.push('G');
            encode_text(&param.name, out);
        }
        TypeDescriptor::Array(element) => {
            out.push('A');
            encode_type(element, out);
        }
        TypeDescriptor::ClosedGeneric(def, args) => {
            out.push('K');
            encode_text(&def.full_name, out);
            encode_text(&def.assembly, out);
            let _ = write!(out, "{}:", args.len());
            for arg in args {
                encode_type(arg, out);
            }
        }
    }
}
