//! Arity-correct argument arrays, plus coercion to closed parameter types.

use crate::errors::BindingError;
use crate::metadata::{ParameterDescriptor, TypeCatalog, TypeDescriptor, builtins};
use crate::value::Value;

/// Arguments after binding. Length always equals the method's parameter count.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArguments(Vec<Value>);

impl ResolvedArguments {
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Bind raw row values to a method's parameters.
///
/// Missing optional parameters get their declared default (or the type's zero value). A trailing
/// variadic parameter collects any surplus values into one array.
pub fn bind(
    parameters: &[ParameterDescriptor],
    raw_args: Vec<Value>,
    types: &TypeCatalog,
) -> Result<ResolvedArguments, BindingError> {
    let variadic = parameters.last().filter(|p| p.is_variadic);

    if raw_args.len() == parameters.len() && variadic.is_none() {
        return Ok(ResolvedArguments(raw_args));
    }

    let required = parameters.iter().filter(|p| !p.is_optional && !p.is_variadic).count();
    if raw_args.len() < required {
        return Err(BindingError::TooFewArguments {
            expected: parameters.len(),
            provided: raw_args.len(),
        });
    }

    let Some(variadic) = variadic else {
        if raw_args.len() > parameters.len() {
            return Err(BindingError::TooManyArguments {
                expected: parameters.len(),
                provided: raw_args.len(),
            });
        }
        let mut resolved = raw_args;
        for parameter in &parameters[resolved.len()..] {
            resolved.push(default_for(parameter));
        }
        return Ok(ResolvedArguments(resolved));
    };

    let fixed = parameters.len() - 1;
    let mut values = raw_args.into_iter();
    let mut resolved: Vec<Value> = values.by_ref().take(fixed).collect();
    for parameter in &parameters[resolved.len()..fixed] {
        resolved.push(default_for(parameter));
    }

    let trailing: Vec<Value> = values.collect();
    resolved.push(collect_variadic(variadic, trailing, types)?);
    Ok(ResolvedArguments(resolved))
}

fn default_for(parameter: &ParameterDescriptor) -> Value {
    parameter
        .default_value
        .clone()
        .unwrap_or_else(|| Value::zero_for(&parameter.ty))
}

fn collect_variadic(
    parameter: &ParameterDescriptor,
    mut trailing: Vec<Value>,
    types: &TypeCatalog,
) -> Result<Value, BindingError> {
    let element = parameter.variadic_element().cloned().unwrap_or_else(TypeDescriptor::object);

    if trailing.len() == 1 {
        let passes_through = match &trailing[0] {
            Value::Null => true,
            Value::Array(array) => element.is_open() || array.element == element,
            _ => false,
        };
        if passes_through {
            return Ok(trailing.remove(0));
        }
    }

    let element = if element.is_open() {
        common_runtime_type(&trailing).unwrap_or_else(TypeDescriptor::object)
    } else {
        element
    };

    let mut items = Vec::with_capacity(trailing.len());
    for value in trailing.iter() {
        let coerced = coerce(value.clone(), &element);
        if !fits(&coerced, &element, types) {
            return Err(BindingError::VariadicMismatch {
                arguments: describe(&trailing),
            });
        }
        items.push(coerced);
    }
    Ok(Value::array(element, items))
}

/// The shared runtime type of all non-null values, if there is exactly one.
fn common_runtime_type(values: &[Value]) -> Option<TypeDescriptor> {
    let mut common: Option<TypeDescriptor> = None;
    for ty in values.iter().filter_map(Value::runtime_type) {
        match &common {
            None => common = Some(ty),
            Some(existing) if *existing == ty => {}
            Some(_) => return None,
        }
    }
    common
}

fn fits(value: &Value, target: &TypeDescriptor, types: &TypeCatalog) -> bool {
    match value.runtime_type() {
        None => !target.is_value_type(),
        Some(actual) => types.is_assignable(&actual, target),
    }
}

fn describe(values: &[Value]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    rendered.join(", ")
}

/// Coerce bound values to their (closed) parameter types.
///
/// Widens `int` to `long`/`double` and `long` to `double`, and turns one-character strings into
/// `char`. Everything else passes through unchanged.
pub fn coerce_arguments(values: Vec<Value>, parameter_types: &[TypeDescriptor]) -> Vec<Value> {
    values
        .into_iter()
        .zip(parameter_types)
        .map(|(value, ty)| coerce(value, ty))
        .collect()
}

fn coerce(value: Value, target: &TypeDescriptor) -> Value {
    let TypeDescriptor::Concrete(name) = target else {
        return value;
    };
    if !name.is_core() {
        return value;
    }
    match (value, name.full_name.as_str()) {
        (Value::Int(i), builtins::LONG) => Value::Long(i64::from(i)),
        (Value::Int(i), builtins::DOUBLE) => Value::Double(f64::from(i)),
        (Value::Long(l), builtins::DOUBLE) => Value::Double(l as f64),
        (Value::Str(s), builtins::CHAR) if s.chars().count() == 1 => match s.chars().next() {
            Some(c) => Value::Char(c),
            None => Value::Str(s),
        },
        (value, _) => value,
    }
}
