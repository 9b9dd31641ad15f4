use crate::validation::ValidationError;
use thiserror::Error;

/// Errors raised while turning a statement model into SQL text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("SELECT statement has no table: call from() before executing")]
    MissingTable,

    #[error("{0} statement has no columns to write")]
    EmptyValues(&'static str),

    #[error("Operator of this type is not supported: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl BuildError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
