//! Ordered, fail-fast composition of validators.

use std::fmt;

use tracing::{debug, info};

use crate::guard::adherence::{SchemaAdherence, SchemaMode};
use crate::guard::errors::ValidationResult;
use crate::guard::mutation::MutationScanner;
use crate::guard::normalize::NormalizedQuery;
use crate::guard::QueryValidator;
use crate::schema::SchemaDescriptor;

/// Runs validators in order and stops at the first refusal.
///
/// Later validators are never invoked once one fails, so the reported reason
/// is always the first violation in chain order.
#[derive(Default)]
pub struct ValidatorChain {
    validators: Vec<Box<dyn QueryValidator>>,
}

impl ValidatorChain {
    /// Builds a chain from an ordered list of validators.
    pub fn new(validators: Vec<Box<dyn QueryValidator>>) -> Self {
        Self { validators }
    }

    /// Standard read-only chain: mutation scan, then schema adherence.
    pub fn read_only(mode: SchemaMode) -> Self {
        Self::default()
            .with(MutationScanner)
            .with(SchemaAdherence::new(mode))
    }

    /// Appends a validator to the end of the chain.
    pub fn with<V: QueryValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Number of validators in the chain.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true when the chain has no validators (and accepts everything).
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Names of the validators in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }
}

impl QueryValidator for ValidatorChain {
    fn name(&self) -> &'static str {
        "validator_chain"
    }

    fn validate(&self, query: &NormalizedQuery, schema: &SchemaDescriptor) -> ValidationResult {
        for validator in &self.validators {
            if let Err(err) = validator.validate(query, schema) {
                info!(
                    validator = validator.name(),
                    code = err.code(),
                    reason = %err,
                    "query refused"
                );
                return Err(err);
            }
            debug!(validator = validator.name(), "validator passed");
        }
        Ok(())
    }
}

impl FromIterator<Box<dyn QueryValidator>> for ValidatorChain {
    fn from_iter<I: IntoIterator<Item = Box<dyn QueryValidator>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Vec<Box<dyn QueryValidator>>> for ValidatorChain {
    fn from(validators: Vec<Box<dyn QueryValidator>>) -> Self {
        Self::new(validators)
    }
}

impl fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorChain")
            .field("validators", &self.names())
            .finish()
    }
}

/// Builds a [`ValidatorChain`] from validator values, in order.
///
/// ```
/// use graph_retrieval::guard::{MutationScanner, SchemaAdherence};
/// use graph_retrieval::validator_chain;
///
/// let chain = validator_chain![MutationScanner, SchemaAdherence::strict()];
/// assert_eq!(chain.names(), ["mutation_scanner", "schema_adherence"]);
/// ```
#[macro_export]
macro_rules! validator_chain {
    ($($validator:expr),* $(,)?) => {
        $crate::guard::ValidatorChain::new(vec![
            $(Box::new($validator) as Box<dyn $crate::guard::QueryValidator>),*
        ])
    };
}
