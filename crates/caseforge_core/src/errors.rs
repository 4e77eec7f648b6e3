//! Error types shared across the discovery pipeline.
//!
//! None of these abort an assembly scan: the discovery layer converts each into either a failing
//! test case or a lazy fallback.

use thiserror::Error;

/// Argument binding could not produce an arity-correct argument array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error(
        "The test method expected {expected} parameter {}, but {provided} parameter {} provided.",
        values(.expected),
        values_were(.provided)
    )]
    TooFewArguments { expected: usize, provided: usize },

    #[error(
        "The test method expected {expected} parameter {}, but {provided} parameter {} provided.",
        values(.expected),
        values_were(.provided)
    )]
    TooManyArguments { expected: usize, provided: usize },

    #[error("The arguments for this test method did not match the parameters: {arguments}")]
    VariadicMismatch { arguments: String },
}

impl BindingError {
    /// Fewer or more values than the method can accept.
    pub fn is_arity(&self) -> bool {
        matches!(self, Self::TooFewArguments { .. } | Self::TooManyArguments { .. })
    }
}

fn values(count: &usize) -> &'static str {
    if *count == 1 { "value" } else { "values" }
}

fn values_were(count: &usize) -> &'static str {
    if *count == 1 { "value was" } else { "values were" }
}

/// A data source failed while producing rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("data source '{source_name}' failed: {message}")]
    Failed { source_name: String, message: String },

    #[error("failed to dispose '{object}': {message}")]
    Dispose { object: String, message: String },
}

/// A value could not be canonically encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Cannot serialize a value of type '{type_name}': unsupported type for serialization")]
    Unsupported { type_name: String },

    #[error("Cannot serialize open generic type '{type_name}'")]
    OpenType { type_name: String },
}

/// Building a test case from a method and (optionally) a data row failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// A type expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("empty type expression")]
    Empty,

    #[error("unexpected '{found}' at offset {offset} in type expression '{text}'")]
    Unexpected { text: String, found: char, offset: usize },

    #[error("unterminated generic argument list in type expression '{text}'")]
    Unterminated { text: String },
}
