//! Safety layer between an LLM agent and a property-graph database.
//!
//! Two paths reach the database:
//!
//! * structured filters ([`filter::FilterExpr`]) compiled into parameterized
//!   Cypher `WHERE` fragments whose literals travel in a separate parameter map;
//! * free-text queries written by the agent, normalized and run through a
//!   fail-fast [`guard::ValidatorChain`] that refuses writes and, in strict
//!   mode, references to labels or relationship types missing from the
//!   [`schema::SchemaDescriptor`].
//!
//! ```
//! use std::sync::Arc;
//! use graph_retrieval::filter::{compile, FilterExpr};
//! use graph_retrieval::guard::{QueryGuard, SchemaMode};
//! use graph_retrieval::schema::{NodeType, SchemaDescriptor};
//!
//! let filter = FilterExpr::eq("status", "active");
//! let compiled = compile(Some(&filter), "n", "filter_").unwrap();
//! assert_eq!(compiled.clause, "n.status = $filter_0");
//!
//! let schema = SchemaDescriptor::new().with_node_type(NodeType::new("Person"));
//! let guard = QueryGuard::read_only(Arc::new(schema), SchemaMode::Strict);
//! assert!(guard.check("MATCH (p:Person) RETURN p").is_ok());
//! assert!(guard.check("MATCH (p:Person) DETACH DELETE p").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// TOML-backed schema catalog and settings.
pub mod config;
/// Crate-level error wrapper.
pub mod error;
pub mod filter;
pub mod guard;
pub mod schema;
pub mod tool;
pub mod value;

pub use config::{ConfigError, RetrievalConfig};
pub use error::{Result, RetrievalError};
pub use filter::{CompiledFilter, FilterCompiler, FilterError, FilterExpr, Narrowing};
pub use guard::{QueryGuard, QueryValidator, SchemaMode, ValidationError, ValidatorChain};
pub use schema::{NodeType, RelationshipType, SchemaDescriptor};
pub use tool::{QueryExecutor, ReadQueryTool, ToolError};
pub use value::Value;
