#![forbid(unsafe_code)]

use thiserror::Error;

/// Convenience alias for translation results.
pub type TranslateResult<T> = std::result::Result<T, TranslateError>;

/// Structured errors produced while compiling a pattern query to SQL.
///
/// All of these bubble out of [`crate::query::SqlTranslator::translate`];
/// nothing is recovered locally and nothing is logged on the way up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A WHERE clause or projection referenced a name no MATCH clause bound.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    /// A slot lookup went past the query graph; indicates a translator bug,
    /// not bad user input.
    #[error("{kind} index {index} is out of range")]
    OutOfRange { kind: &'static str, index: usize },
    /// The IR contains a construct the visitors do not recognize.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    /// SKIP requires an accompanying LIMIT.
    #[error("SKIP must be used in combination with LIMIT")]
    SkipWithoutLimit,
    /// One variable name was bound to both a node and a relation.
    #[error("variable '{0}' is already bound to a different entity kind")]
    VariableKindConflict(String),
}
