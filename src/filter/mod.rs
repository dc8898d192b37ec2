#![forbid(unsafe_code)]

//! Structured filters and their compilation into parameterized clauses.

/// Compiler from [`FilterExpr`] trees to [`CompiledFilter`] fragments.
pub mod compile;

/// Filter compilation error taxonomy.
pub mod errors;

/// Immutable filter expression model.
pub mod expr;

/// Always-on scoping predicates for narrowed views.
pub mod narrow;

pub use compile::{compile, CompiledFilter, FilterCompiler, Parameters};
pub use errors::{FilterError, FilterResult};
pub use expr::FilterExpr;
pub use narrow::Narrowing;
