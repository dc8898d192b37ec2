#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Convenience alias for validator outcomes.
pub type ValidationResult<T = ()> = std::result::Result<T, ValidationError>;

/// Reasons a query was refused.
///
/// Messages are written to be returned verbatim to an agent as a tool-call
/// error, so each one names what was found and what is allowed instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Query contains a data-modifying clause.
    #[error("query contains the write keyword '{keyword}'; only read-only queries are allowed")]
    MutationRejected {
        /// Keyword found, upper-cased.
        keyword: String,
    },
    /// Query calls a procedure that can write.
    #[error("query calls the write procedure '{procedure}'; only read-only procedures are allowed")]
    WriteProcedureRejected {
        /// Procedure name prefix found.
        procedure: String,
    },
    /// Query does not start with a read clause.
    #[error("query must start with one of {expected} (found '{found}')")]
    UnreadableQueryShape {
        /// First token of the query, or empty when the query was blank.
        found: String,
        /// Accepted leading keywords.
        expected: KeywordList,
    },
    /// Query references labels or relationship types missing from the schema.
    #[error("{}", SchemaViolationMessage(self))]
    SchemaViolation {
        /// Labels referenced but not declared.
        unknown_labels: BTreeSet<String>,
        /// Relationship types referenced but not declared.
        unknown_relationships: BTreeSet<String>,
        /// Every declared label.
        known_labels: BTreeSet<String>,
        /// Every declared relationship type.
        known_relationships: BTreeSet<String>,
    },
    /// Refusal raised by a caller-supplied validator.
    #[error("{validator}: {reason}")]
    Rejected {
        /// Name of the validator that refused the query.
        validator: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

impl ValidationError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MutationRejected { .. } => "MutationRejected",
            ValidationError::WriteProcedureRejected { .. } => "MutationRejected",
            ValidationError::UnreadableQueryShape { .. } => "UnreadableQueryShape",
            ValidationError::SchemaViolation { .. } => "SchemaViolation",
            ValidationError::Rejected { .. } => "Rejected",
        }
    }
}

/// Convenience wrapper that formats validation errors with their codes.
pub struct ValidationErrorWithCode<'a>(pub &'a ValidationError);

impl fmt::Display for ValidationErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}

/// Keyword vocabulary rendered as `MATCH, WITH, ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordList(pub &'static [&'static str]);

impl fmt::Display for KeywordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, keyword) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&keyword.to_uppercase())?;
        }
        Ok(())
    }
}

struct SchemaViolationMessage<'a>(&'a ValidationError);

impl fmt::Display for SchemaViolationMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ValidationError::SchemaViolation {
            unknown_labels,
            unknown_relationships,
            known_labels,
            known_relationships,
        } = self.0
        else {
            return Ok(());
        };
        f.write_str("query references elements missing from the schema")?;
        if !unknown_labels.is_empty() {
            write!(
                f,
                "; unknown labels: {} (known labels: {})",
                join(unknown_labels),
                join(known_labels)
            )?;
        }
        if !unknown_relationships.is_empty() {
            write!(
                f,
                "; unknown relationship types: {} (known relationship types: {})",
                join(unknown_relationships),
                join(known_relationships)
            )?;
        }
        Ok(())
    }
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
