#![forbid(unsafe_code)]

use thiserror::Error;

/// Convenience alias for filter compilation results.
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Errors raised while compiling a filter expression.
///
/// Compilation is all-or-nothing: an error aborts the whole expression so a
/// predicate can never be silently dropped from the resulting clause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Property key is not a simple identifier and cannot be rendered safely.
    #[error("property key '{key}' is not a valid identifier")]
    InvalidPropertyKey {
        /// Offending key as supplied by the caller.
        key: String,
    },
    /// Node alias is not a simple identifier.
    #[error("node alias '{alias}' is not a valid identifier")]
    InvalidNodeAlias {
        /// Offending alias.
        alias: String,
    },
    /// Parameter prefix is not a valid parameter-name prefix.
    #[error("parameter prefix '{prefix}' is not a valid identifier")]
    InvalidParamPrefix {
        /// Offending prefix.
        prefix: String,
    },
    /// Two compiled filters bind the same parameter name.
    #[error("parameter '${name}' is bound by both filters; compile them with distinct prefixes")]
    ParameterCollision {
        /// Parameter name present in both filters.
        name: String,
    },
}

impl FilterError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            FilterError::InvalidPropertyKey { .. } => "InvalidPropertyKey",
            FilterError::InvalidNodeAlias { .. } => "InvalidNodeAlias",
            FilterError::InvalidParamPrefix { .. } => "InvalidParamPrefix",
            FilterError::ParameterCollision { .. } => "ParameterCollision",
        }
    }
}

/// Returns true when `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
