#![forbid(unsafe_code)]

//! Safety checks for query text the system did not construct itself.
//!
//! Raw text is first normalized ([`normalize`]) and then run through a
//! [`ValidatorChain`]. [`QueryGuard`] bundles both steps with the schema
//! snapshot the checks run against.

use std::sync::Arc;

/// Schema-adherence scanner.
pub mod adherence;

/// Fail-fast validator composition.
pub mod chain;

/// Validation error taxonomy.
pub mod errors;

/// Read-only enforcement.
pub mod mutation;

/// Transport escape normalization.
pub mod normalize;

pub use adherence::{SchemaAdherence, SchemaMode};
pub use chain::ValidatorChain;
pub use errors::{ValidationError, ValidationErrorWithCode, ValidationResult};
pub use mutation::MutationScanner;
pub use normalize::{normalize, NormalizedQuery};

use crate::schema::SchemaDescriptor;

/// A single independent check over normalized query text.
///
/// Implementations must be pure: no shared mutable state, no I/O. They are
/// invoked concurrently against a shared schema snapshot.
pub trait QueryValidator: Send + Sync {
    /// Stable name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Accepts the query or explains why it is refused.
    fn validate(&self, query: &NormalizedQuery, schema: &SchemaDescriptor) -> ValidationResult;
}

impl<V: QueryValidator + ?Sized> QueryValidator for Box<V> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn validate(&self, query: &NormalizedQuery, schema: &SchemaDescriptor) -> ValidationResult {
        (**self).validate(query, schema)
    }
}

/// Normalize-then-validate entry point for untrusted query text.
#[derive(Debug)]
pub struct QueryGuard {
    schema: Arc<SchemaDescriptor>,
    chain: ValidatorChain,
}

impl QueryGuard {
    /// Guards queries with `chain` against `schema`.
    pub fn new(schema: Arc<SchemaDescriptor>, chain: ValidatorChain) -> Self {
        Self { schema, chain }
    }

    /// Guard using the standard read-only chain.
    pub fn read_only(schema: Arc<SchemaDescriptor>, mode: SchemaMode) -> Self {
        Self::new(schema, ValidatorChain::read_only(mode))
    }

    /// Schema snapshot checked against.
    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// Validators applied, in order.
    pub fn chain(&self) -> &ValidatorChain {
        &self.chain
    }

    /// Normalizes `raw` and runs the chain, returning the text to execute.
    pub fn check(&self, raw: &str) -> ValidationResult<NormalizedQuery> {
        let query = normalize(raw);
        self.chain.validate(&query, &self.schema)?;
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeType, RelationshipType};

    fn guard(mode: SchemaMode) -> QueryGuard {
        let schema = SchemaDescriptor::new()
            .with_node_type(NodeType::new("Person"))
            .with_node_type(NodeType::new("Organization"))
            .with_relationship(RelationshipType::new("WORKS_AT", "Person", "Organization"));
        QueryGuard::read_only(Arc::new(schema), mode)
    }

    #[test]
    fn check_returns_normalized_text() {
        let query = guard(SchemaMode::Strict)
            .check(r"MATCH (p:Person)-[:WORKS_AT]->(o:Organization)\nRETURN p, o")
            .expect("query accepted");
        assert_eq!(
            query.as_str(),
            "MATCH (p:Person)-[:WORKS_AT]->(o:Organization)\nRETURN p, o"
        );
    }

    #[test]
    fn escaped_leading_break_still_reads_as_match() {
        let query = guard(SchemaMode::Strict)
            .check(r"\n\tMATCH (p:Person) RETURN p")
            .expect("query accepted");
        assert!(query.starts_with("\n\tMATCH"));
    }

    #[test]
    fn lenient_guard_accepts_unknown_labels_but_not_writes() {
        let guard = guard(SchemaMode::Lenient);
        assert!(guard.check("MATCH (r:Robot) RETURN r").is_ok());
        assert!(guard.check("MATCH (r:Robot) SET r.x = 1").is_err());
    }
}
