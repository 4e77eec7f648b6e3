//! Display names for test cases.

use crate::metadata::{MethodDescriptor, TypeDescriptor};
use crate::options::{DiscoveryOptions, MethodDisplay};
use crate::value::Value;

/// Base display name before generic and argument suffixes.
///
/// Explicit display names win, marker first, then data row. Otherwise the name is derived from the
/// method per `options`.
pub fn base_display_name(
    method: &MethodDescriptor,
    marker_display_name: Option<&str>,
    row_display_name: Option<&str>,
    options: &DiscoveryOptions,
) -> String {
    if let Some(name) = marker_display_name.or(row_display_name) {
        return name.to_string();
    }
    let raw = match options.method_display {
        MethodDisplay::ClassAndMethod => method.qualified_name(),
        MethodDisplay::Method => method.name.clone(),
    };
    options.method_display_options.apply(&raw)
}

/// `Base<int, string>(a: 1, b: "x")`.
///
/// Parameters with no supplied value show their default when optional, else `???`. Surplus values
/// are listed as `???: value`.
pub fn display_name_with_arguments(
    base: &str,
    method: &MethodDescriptor,
    generic_types: Option<&[TypeDescriptor]>,
    arguments: Option<&[Value]>,
) -> String {
    let mut name = base.to_string();

    if let Some(types) = generic_types.filter(|t| !t.is_empty()) {
        let names: Vec<String> = types.iter().map(TypeDescriptor::simple_name).collect();
        name.push('<');
        name.push_str(&names.join(", "));
        name.push('>');
    }

    let Some(arguments) = arguments else {
        return name;
    };
    if arguments.is_empty() && method.parameters.is_empty() {
        return name;
    }

    let mut rendered = Vec::with_capacity(method.parameters.len().max(arguments.len()));
    for (i, parameter) in method.parameters.iter().enumerate() {
        let value = match arguments.get(i) {
            Some(value) => value.to_string(),
            None if parameter.is_optional => parameter
                .default_value
                .clone()
                .unwrap_or_else(|| Value::zero_for(&parameter.ty))
                .to_string(),
            None => "???".to_string(),
        };
        rendered.push(format!("{}: {}", parameter.name, value));
    }
    for extra in arguments.iter().skip(method.parameters.len()) {
        rendered.push(format!("???: {}", extra));
    }

    name.push('(');
    name.push_str(&rendered.join(", "));
    name.push(')');
    name
}
