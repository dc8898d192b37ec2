//! Read-only enforcement for free-text queries.
//!
//! The scan is lexical: the query is case-folded and searched for whole-word
//! write clauses, write-capable procedure calls, and a read clause in leading
//! position. Keywords inside string literals are not distinguished from
//! clauses, so such queries are refused rather than risk a false accept.

use std::sync::LazyLock;

use regex::Regex;

use crate::guard::errors::{KeywordList, ValidationError, ValidationResult};
use crate::guard::normalize::NormalizedQuery;
use crate::guard::QueryValidator;
use crate::schema::SchemaDescriptor;

/// Clauses that modify data or schema.
pub const MUTATION_KEYWORDS: &[&str] = &[
    "create", "merge", "delete", "detach", "set", "remove", "drop", "foreach", "load",
];

/// Procedure name prefixes able to write.
pub const WRITE_PROCEDURES: &[&str] = &[
    "apoc.create.",
    "apoc.merge.",
    "apoc.refactor.",
    "apoc.periodic.",
    "apoc.do.",
    "apoc.cypher.runwrite",
    "apoc.cypher.dowrite",
    "apoc.nodes.delete",
    "apoc.atomic.",
    "apoc.trigger.",
    "apoc.schema.assert",
    "apoc.import.",
    "apoc.export.",
    "apoc.systemdb.",
    "apoc.custom.",
    "apoc.nodes.link",
    "apoc.nodes.collapse",
    "apoc.lock.",
    "db.create",
    "db.index.fulltext.create",
    "db.index.vector.create",
    "dbms.",
];

/// Leading verbs of a procedure's last name segment that mark it as writing
/// (`db.index.vector.createNodeIndex`, `gds.pageRank.write`).
pub const WRITE_PROCEDURE_VERBS: &[&str] = &[
    "create", "merge", "delete", "drop", "set", "remove", "write", "mutate", "import",
];

/// Clauses a read-only query may start with.
pub const READ_KEYWORDS: &[&str] = &["match", "optional", "with", "unwind", "return", "call"];

static MUTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", MUTATION_KEYWORDS.join("|")))
        .expect("mutation keyword pattern is valid")
});

static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcall\b").expect("call pattern is valid"));

static PROCEDURE_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcall\s+([a-z_][a-z0-9_]*(?:\.[a-z_][a-z0-9_]*)*)")
        .expect("procedure call pattern is valid")
});

static WRITE_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{})", WRITE_PROCEDURE_VERBS.join("|")))
        .expect("write verb pattern is valid")
});

static LEADING_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]+").expect("leading word pattern is valid"));

/// Refuses queries that could modify the graph.
///
/// Stateless; a single value can be shared by any number of chains.
#[derive(Clone, Copy, Debug, Default)]
pub struct MutationScanner;

impl MutationScanner {
    /// Runs the scan over `query`.
    pub fn scan(query: &str) -> ValidationResult {
        let folded = query.to_lowercase();

        if let Some(found) = MUTATION_RE.find(&folded) {
            return Err(ValidationError::MutationRejected {
                keyword: found.as_str().to_uppercase(),
            });
        }

        if CALL_RE.is_match(&folded) {
            if let Some(procedure) = WRITE_PROCEDURES.iter().find(|p| folded.contains(**p)) {
                return Err(ValidationError::WriteProcedureRejected {
                    procedure: (*procedure).to_owned(),
                });
            }
            if let Some(procedure) = write_verb_procedure(&folded) {
                return Err(ValidationError::WriteProcedureRejected {
                    procedure: procedure.to_owned(),
                });
            }
        }

        let leading = leading_keyword(&folded);
        if !READ_KEYWORDS.contains(&leading) {
            return Err(ValidationError::UnreadableQueryShape {
                found: first_token(query).to_owned(),
                expected: KeywordList(READ_KEYWORDS),
            });
        }
        Ok(())
    }
}

impl QueryValidator for MutationScanner {
    fn name(&self) -> &'static str {
        "mutation_scanner"
    }

    fn validate(&self, query: &NormalizedQuery, _schema: &SchemaDescriptor) -> ValidationResult {
        Self::scan(query)
    }
}

/// First called procedure whose last name segment starts with a write verb.
fn write_verb_procedure(folded: &str) -> Option<&str> {
    PROCEDURE_CALL_RE
        .captures_iter(folded)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .find(|name| {
            name.rsplit('.')
                .next()
                .is_some_and(|last| WRITE_VERB_RE.is_match(last))
        })
}

/// Leading run of letters/underscores of the trimmed, case-folded text.
fn leading_keyword(folded: &str) -> &str {
    LEADING_WORD_RE
        .find(folded.trim_start())
        .map_or("", |m| m.as_str())
}

/// First whitespace-delimited token, as written, for error reporting.
fn first_token(query: &str) -> &str {
    query.split_whitespace().next().unwrap_or("")
}
