//! Scoping predicates for derived repository views.
//!
//! A narrowed view (for example "chunks of one document") attaches predicates
//! that hold for every query it issues. [`Narrowing`] conjoins them with the
//! caller's own filter before compilation so both share one parameter counter.

use crate::filter::compile::{CompiledFilter, FilterCompiler};
use crate::filter::errors::FilterResult;
use crate::filter::expr::FilterExpr;

/// Predicates always conjoined onto caller filters.
#[derive(Clone, Debug, Default)]
pub struct Narrowing {
    scopes: Vec<FilterExpr>,
}

impl Narrowing {
    /// Creates an empty narrowing that leaves filters untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy narrowed further by `scope`.
    pub fn with(mut self, scope: FilterExpr) -> Self {
        self.scopes.push(scope);
        self
    }

    /// Returns true when no scope has been attached.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Combines the scopes with `filter`; `None` only when both are absent.
    pub fn apply(&self, filter: Option<FilterExpr>) -> Option<FilterExpr> {
        let mut children = self.scopes.clone();
        children.extend(filter);
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(FilterExpr::And { children }),
        }
    }

    /// Applies the scopes and compiles the result in one step.
    pub fn compile(
        &self,
        compiler: &FilterCompiler,
        filter: Option<FilterExpr>,
    ) -> FilterResult<CompiledFilter> {
        compiler.compile(self.apply(filter).as_ref())
    }
}
