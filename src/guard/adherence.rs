//! Schema adherence for free-text queries.
//!
//! Labels are extracted from node-pattern label positions (`(v:A:B)`,
//! `(:A&B)`, `(:A|B)`, backtick-quoted names) and relationship types from
//! relationship patterns (`[r:T]`, `[:T|U*1..3]`). The extraction is lexical,
//! so label-shaped text inside string literals is treated as a reference and
//! exotic pattern spellings may escape it.
//!
//! Known gaps, all passing strict mode unchecked:
//!
//! * label predicates outside a node pattern, as in `WHERE n:Robot`;
//! * negated or wildcard relationship types, as in `[:!OWNS]` or `[:%]`;
//! * labels and types supplied through parameters or dynamic expressions.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::guard::errors::{ValidationError, ValidationResult};
use crate::guard::normalize::NormalizedQuery;
use crate::guard::QueryValidator;
use crate::schema::SchemaDescriptor;

const NAME: &str = r"(?:`[^`]+`|[A-Za-z_][A-Za-z0-9_]*)";

static NODE_LABELS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\(\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*:\s*({NAME}(?:\s*[:&|]\s*{NAME})*)"
    ))
    .expect("node label pattern is valid")
});

static REL_TYPES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\[\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*:\s*({NAME}(?:\s*\|\s*:?\s*{NAME})*)"
    ))
    .expect("relationship type pattern is valid")
});

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME).expect("name pattern is valid"));

/// How schema drift is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMode {
    /// Unknown labels or relationship types refuse the query.
    #[default]
    Strict,
    /// Unknown names are logged and the query proceeds.
    Lenient,
}

/// Checks that a query only references declared labels and relationship types.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaAdherence {
    mode: SchemaMode,
}

impl SchemaAdherence {
    /// Creates a check operating in `mode`.
    pub fn new(mode: SchemaMode) -> Self {
        Self { mode }
    }

    /// Creates a check that refuses unknown names.
    pub fn strict() -> Self {
        Self::new(SchemaMode::Strict)
    }

    /// Creates a check that only logs unknown names.
    pub fn lenient() -> Self {
        Self::new(SchemaMode::Lenient)
    }

    /// Mode this check was built with.
    pub fn mode(&self) -> SchemaMode {
        self.mode
    }
}

impl QueryValidator for SchemaAdherence {
    fn name(&self) -> &'static str {
        "schema_adherence"
    }

    fn validate(&self, query: &NormalizedQuery, schema: &SchemaDescriptor) -> ValidationResult {
        let known_labels = schema.known_labels();
        let known_relationships = schema.relationship_names();

        let unknown_labels: BTreeSet<String> = referenced_labels(query)
            .into_iter()
            .filter(|label| !known_labels.contains(label.as_str()))
            .collect();
        let unknown_relationships: BTreeSet<String> = referenced_relationship_types(query)
            .into_iter()
            .filter(|rel| !known_relationships.contains(rel.as_str()))
            .collect();

        if unknown_labels.is_empty() && unknown_relationships.is_empty() {
            return Ok(());
        }

        match self.mode {
            SchemaMode::Strict => Err(ValidationError::SchemaViolation {
                unknown_labels,
                unknown_relationships,
                known_labels: owned(known_labels),
                known_relationships: owned(known_relationships),
            }),
            SchemaMode::Lenient => {
                warn!(
                    unknown_labels = ?unknown_labels,
                    unknown_relationships = ?unknown_relationships,
                    "query references names missing from the schema; continuing in lenient mode"
                );
                Ok(())
            }
        }
    }
}

/// Labels written in node-pattern label positions, each stacked label separately.
pub fn referenced_labels(query: &str) -> BTreeSet<String> {
    extract(&NODE_LABELS_RE, query)
}

/// Relationship types written in relationship patterns, alternatives separately.
pub fn referenced_relationship_types(query: &str) -> BTreeSet<String> {
    extract(&REL_TYPES_RE, query)
}

fn extract(pattern: &Regex, query: &str) -> BTreeSet<String> {
    pattern
        .captures_iter(query)
        .filter_map(|caps| caps.get(1))
        .flat_map(|group| NAME_RE.find_iter(group.as_str()))
        .map(|name| name.as_str().trim_matches('`').to_owned())
        .collect()
}

fn owned(names: BTreeSet<&str>) -> BTreeSet<String> {
    names.into_iter().map(str::to_owned).collect()
}
