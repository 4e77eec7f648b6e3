//! Generic type parameter resolution from bound argument values.
//!
//! Parameters are scanned in declaration order and the first one that informs a type parameter
//! wins. Conflicting later evidence is ignored.

use crate::metadata::{ParameterDescriptor, TypeCatalog, TypeDescriptor, TypeParameter};
use crate::value::Value;

/// Resolve one open type parameter, falling back to `object` when nothing informs it.
pub fn resolve(
    type_parameter: &TypeParameter,
    parameters: &[ParameterDescriptor],
    bound_args: &[Value],
    types: &TypeCatalog,
) -> TypeDescriptor {
    parameters
        .iter()
        .zip(bound_args)
        .filter(|(_, arg)| !arg.is_null())
        .find_map(|(parameter, arg)| {
            let passed = arg.runtime_type()?;
            match_type(type_parameter, &parameter.ty, &passed, types)
        })
        .unwrap_or_else(TypeDescriptor::object)
}

/// Resolve every type parameter, in declaration order.
pub fn resolve_all(
    type_parameters: &[TypeParameter],
    parameters: &[ParameterDescriptor],
    bound_args: &[Value],
    types: &TypeCatalog,
) -> Vec<TypeDescriptor> {
    type_parameters
        .iter()
        .map(|tp| resolve(tp, parameters, bound_args, types))
        .collect()
}

/// Parameter types with every type parameter replaced by its resolution.
pub fn close_parameter_types(
    type_parameters: &[TypeParameter],
    resolved: &[TypeDescriptor],
    parameters: &[ParameterDescriptor],
) -> Vec<TypeDescriptor> {
    let bindings: Vec<(TypeParameter, TypeDescriptor)> =
        type_parameters.iter().cloned().zip(resolved.iter().cloned()).collect();
    parameters.iter().map(|p| p.ty.substitute(&bindings)).collect()
}

fn match_type(
    type_parameter: &TypeParameter,
    declared: &TypeDescriptor,
    passed: &TypeDescriptor,
    types: &TypeCatalog,
) -> Option<TypeDescriptor> {
    match declared {
        TypeDescriptor::OpenGeneric(param) if param.name == type_parameter.name => Some(passed.clone()),
        TypeDescriptor::Array(declared_element) => match passed {
            TypeDescriptor::Array(passed_element) => match_type(type_parameter, declared_element, passed_element, types),
            _ => None,
        },
        TypeDescriptor::ClosedGeneric(definition, declared_args) if declared.is_open() => {
            types.hierarchy(passed).into_iter().find_map(|candidate| match candidate {
                TypeDescriptor::ClosedGeneric(candidate_def, candidate_args)
                    if candidate_def == *definition && candidate_args.len() == declared_args.len() =>
                {
                    declared_args
                        .iter()
                        .zip(&candidate_args)
                        .find_map(|(d, c)| match_type(type_parameter, d, c, types))
                }
                _ => None,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{TypeDefinition, TypeName, builtins};
    use crate::value::ObjectValue;

    fn t() -> TypeParameter {
        TypeParameter::new("T", 0)
    }

    fn open_t() -> TypeDescriptor {
        TypeDescriptor::OpenGeneric(t())
    }

    fn int() -> TypeDescriptor {
        TypeDescriptor::core("int")
    }

    // ========================================
    // Direct and element matches
    // ========================================

    #[test]
    fn test_direct_match_resolves_string() {
        let params = vec![ParameterDescriptor::required("value", open_t())];
        let resolved = resolve(&t(), &params, &[Value::str("hi")], &TypeCatalog::new());
        assert_eq!(resolved, TypeDescriptor::core("string"));
    }

    #[test]
    fn test_element_match_resolves_int() {
        let params = vec![ParameterDescriptor::required("items", TypeDescriptor::array_of(open_t()))];
        let args = [Value::array(int(), vec![Value::Int(1), Value::Int(2)])];
        assert_eq!(resolve(&t(), &params, &args, &TypeCatalog::new()), int());
    }

    #[test]
    fn test_null_argument_is_skipped() {
        let params = vec![
            ParameterDescriptor::required("a", open_t()),
            ParameterDescriptor::required("b", open_t()),
        ];
        let args = [Value::Null, Value::Long(3)];
        assert_eq!(
            resolve(&t(), &params, &args, &TypeCatalog::new()),
            TypeDescriptor::core("long")
        );
    }

    #[test]
    fn test_uninformed_parameter_falls_back_to_object() {
        let params = vec![ParameterDescriptor::required("a", int())];
        assert!(resolve(&t(), &params, &[Value::Int(1)], &TypeCatalog::new()).is_object());
        assert!(resolve(&t(), &[], &[], &TypeCatalog::new()).is_object());
    }

    #[test]
    fn test_first_resolved_parameter_wins() {
        // pick<T>(a: T, b: T) with (1, "x"): no consistency check, `a` decides.
        let params = vec![
            ParameterDescriptor::required("a", open_t()),
            ParameterDescriptor::required("b", open_t()),
        ];
        let args = [Value::Int(1), Value::str("x")];
        assert_eq!(resolve(&t(), &params, &args, &TypeCatalog::new()), int());
    }

    // ========================================
    // Nested generic matches
    // ========================================

    #[test]
    fn test_nested_generic_walks_interfaces() {
        let item = TypeParameter::new("TItem", 0);
        let bag = TypeName::new("Samples.Bag", "Samples");
        let enumerable = TypeName::core(builtins::ENUMERABLE);
        let types = TypeCatalog::new().with(
            TypeDefinition::new(bag.clone())
                .with_type_parameters(vec![item.clone()])
                .with_interface(TypeDescriptor::generic(
                    enumerable.clone(),
                    vec![TypeDescriptor::OpenGeneric(item)],
                )),
        );

        let params = vec![ParameterDescriptor::required(
            "source",
            TypeDescriptor::generic(enumerable, vec![open_t()]),
        )];
        let bag_of_strings = Value::Object(ObjectValue {
            ty: TypeDescriptor::generic(bag, vec![TypeDescriptor::core("string")]),
            display: "Bag".into(),
            serialized: None,
        });
        assert_eq!(
            resolve(&t(), &params, &[bag_of_strings], &types),
            TypeDescriptor::core("string")
        );
    }

    #[test]
    fn test_enumerable_parameter_accepts_builtin_list() {
        let enumerable = TypeName::core(builtins::ENUMERABLE);
        let params = vec![ParameterDescriptor::required(
            "items",
            TypeDescriptor::generic(enumerable, vec![open_t()]),
        )];
        let list = Value::Object(ObjectValue {
            ty: TypeDescriptor::generic(TypeName::core(builtins::LIST), vec![int()]),
            display: "List<int>".into(),
            serialized: None,
        });
        assert_eq!(resolve(&t(), &params, &[list], &TypeCatalog::new()), int());
    }

    #[test]
    fn test_enumerable_parameter_accepts_array() {
        let enumerable = TypeName::core(builtins::ENUMERABLE);
        let params = vec![ParameterDescriptor::required(
            "items",
            TypeDescriptor::generic(enumerable, vec![open_t()]),
        )];
        let args = [Value::array(int(), vec![Value::Int(1)])];
        assert_eq!(resolve(&t(), &params, &args, &TypeCatalog::new()), int());
        let text = [Value::str("abc")];
        assert_eq!(
            resolve(&t(), &params, &text, &TypeCatalog::new()),
            TypeDescriptor::core("char")
        );
    }

    #[test]
    fn test_nested_generic_positional_argument() {
        let dictionary = TypeName::core(builtins::DICTIONARY);
        let v = TypeParameter::new("V", 1);
        let params = vec![ParameterDescriptor::required(
            "map",
            TypeDescriptor::generic(
                dictionary.clone(),
                vec![TypeDescriptor::core("string"), TypeDescriptor::OpenGeneric(v.clone())],
            ),
        )];
        let map = Value::Object(ObjectValue {
            ty: TypeDescriptor::generic(dictionary, vec![TypeDescriptor::core("string"), int()]),
            display: "map".into(),
            serialized: None,
        });
        assert_eq!(resolve(&v, &params, &[map], &TypeCatalog::new()), int());
    }

    #[test]
    fn test_close_parameter_types_substitutes() {
        let params = vec![ParameterDescriptor::required("items", TypeDescriptor::array_of(open_t()))];
        let closed = close_parameter_types(&[t()], &[int()], &params);
        assert_eq!(closed, vec![TypeDescriptor::array_of(int())]);
    }
}
