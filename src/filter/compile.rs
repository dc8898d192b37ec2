//! Filter compilation into parameterized `WHERE` fragments.
//!
//! Every literal in a [`FilterExpr`] is replaced by a generated `$param`
//! reference and moved into [`CompiledFilter::parameters`]; operators, the
//! node alias and (validated) property keys are the only text rendered into
//! the clause. The executor binds parameters out-of-band, so no value can
//! alter the structure of the clause.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::filter::errors::{is_identifier, FilterError, FilterResult};
use crate::filter::expr::FilterExpr;
use crate::value::Value;

/// Named parameter bindings produced by compilation.
pub type Parameters = BTreeMap<String, Value>;

/// Alias used when callers do not supply one.
pub const DEFAULT_NODE_ALIAS: &str = "n";
/// Parameter prefix used when callers do not supply one.
pub const DEFAULT_PARAM_PREFIX: &str = "filter_";

/// Parameterized clause plus the literal values it references.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CompiledFilter {
    /// Boolean fragment suitable for a `WHERE` position; empty for no filter.
    pub clause: String,
    /// Values referenced by `$name` placeholders in `clause`.
    pub parameters: Parameters,
}

impl CompiledFilter {
    /// The filter produced for an absent expression.
    pub const EMPTY: CompiledFilter = CompiledFilter {
        clause: String::new(),
        parameters: BTreeMap::new(),
    };

    /// Returns true when this filter constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// Conjoins this filter onto an existing structural clause.
    ///
    /// Returns `existing` untouched when this filter is empty, `clause` alone
    /// when `existing` is blank, and `existing AND clause` otherwise.
    pub fn append_to(&self, existing: &str) -> String {
        if self.is_empty() {
            return existing.to_owned();
        }
        if existing.trim().is_empty() {
            return self.clause.clone();
        }
        format!("{existing} AND {}", self.clause)
    }

    /// Renders `WHERE <clause>`, or an empty string for an empty filter.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clause)
        }
    }

    /// Conjoins two independently compiled filters.
    ///
    /// Both sides keep their clauses verbatim, so they must have been compiled
    /// with distinct parameter prefixes; overlapping names are rejected rather
    /// than letting one binding shadow the other.
    pub fn and(self, other: CompiledFilter) -> FilterResult<CompiledFilter> {
        if other.is_empty() {
            return Ok(self);
        }
        if self.is_empty() {
            return Ok(other);
        }
        if let Some(name) = other
            .parameters
            .keys()
            .find(|name| self.parameters.contains_key(*name))
        {
            return Err(FilterError::ParameterCollision { name: name.clone() });
        }
        let mut parameters = self.parameters;
        parameters.extend(other.parameters);
        Ok(CompiledFilter {
            clause: format!("({}) AND ({})", self.clause, other.clause),
            parameters,
        })
    }
}

/// Compiles `expr` against `node_alias`, naming parameters `<param_prefix><n>`.
///
/// `None` yields [`CompiledFilter::EMPTY`]. Parameter numbering starts at zero
/// for every call.
pub fn compile(
    expr: Option<&FilterExpr>,
    node_alias: &str,
    param_prefix: &str,
) -> FilterResult<CompiledFilter> {
    FilterCompiler::new(node_alias, param_prefix)?.compile(expr)
}

/// Validated compilation settings, reusable across calls.
#[derive(Clone, Debug)]
pub struct FilterCompiler {
    node_alias: String,
    param_prefix: String,
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self {
            node_alias: DEFAULT_NODE_ALIAS.to_owned(),
            param_prefix: DEFAULT_PARAM_PREFIX.to_owned(),
        }
    }
}

impl FilterCompiler {
    /// Validates the alias and prefix once up front.
    pub fn new(node_alias: impl Into<String>, param_prefix: impl Into<String>) -> FilterResult<Self> {
        let node_alias = node_alias.into();
        let param_prefix = param_prefix.into();
        if !is_identifier(&node_alias) {
            return Err(FilterError::InvalidNodeAlias { alias: node_alias });
        }
        if !is_identifier(&param_prefix) {
            return Err(FilterError::InvalidParamPrefix {
                prefix: param_prefix,
            });
        }
        Ok(Self {
            node_alias,
            param_prefix,
        })
    }

    /// Node alias prefixed to every property access.
    pub fn node_alias(&self) -> &str {
        &self.node_alias
    }

    /// Prefix of generated parameter names.
    pub fn param_prefix(&self) -> &str {
        &self.param_prefix
    }

    /// Compiles `expr`; each call uses a fresh parameter counter.
    pub fn compile(&self, expr: Option<&FilterExpr>) -> FilterResult<CompiledFilter> {
        let Some(expr) = expr else {
            return Ok(CompiledFilter::EMPTY);
        };
        let mut ctx = CompileContext {
            alias: &self.node_alias,
            prefix: &self.param_prefix,
            next_param: 0,
            parameters: Parameters::new(),
        };
        let clause = ctx.render(expr)?;
        debug!(
            alias = %self.node_alias,
            params = ctx.parameters.len(),
            "compiled filter expression"
        );
        Ok(CompiledFilter {
            clause,
            parameters: ctx.parameters,
        })
    }
}

/// Per-call state; the counter is monotonic across the whole tree.
struct CompileContext<'a> {
    alias: &'a str,
    prefix: &'a str,
    next_param: usize,
    parameters: Parameters,
}

impl CompileContext<'_> {
    fn render(&mut self, expr: &FilterExpr) -> FilterResult<String> {
        match expr {
            FilterExpr::Eq { key, value } => self.comparison(key, "=", value.clone()),
            FilterExpr::Ne { key, value } => self.comparison(key, "<>", value.clone()),
            FilterExpr::Gt { key, value } => self.comparison(key, ">", value.clone()),
            FilterExpr::Gte { key, value } => self.comparison(key, ">=", value.clone()),
            FilterExpr::Lt { key, value } => self.comparison(key, "<", value.clone()),
            FilterExpr::Lte { key, value } => self.comparison(key, "<=", value.clone()),
            FilterExpr::In { key, values } => {
                self.comparison(key, "IN", Value::List(values.clone()))
            }
            FilterExpr::NotIn { key, values } => {
                let inner = self.comparison(key, "IN", Value::List(values.clone()))?;
                Ok(format!("NOT {inner}"))
            }
            FilterExpr::Contains { key, value } => {
                self.comparison(key, "CONTAINS", Value::String(value.clone()))
            }
            FilterExpr::StartsWith { key, value } => {
                self.comparison(key, "STARTS WITH", Value::String(value.clone()))
            }
            FilterExpr::EndsWith { key, value } => {
                self.comparison(key, "ENDS WITH", Value::String(value.clone()))
            }
            FilterExpr::ContainsCi { key, value } => self.folded(key, "CONTAINS", value),
            FilterExpr::EqCi { key, value } => self.folded(key, "=", value),
            FilterExpr::MatchesPattern { key, pattern } => {
                self.comparison(key, "=~", Value::String(pattern.clone()))
            }
            FilterExpr::HasAnyLabel { labels } => {
                let list = labels.iter().cloned().map(Value::String).collect();
                let param = self.bind(Value::List(list));
                Ok(format!(
                    "any(label IN labels({}) WHERE label IN ${param})",
                    self.alias
                ))
            }
            FilterExpr::And { children } => self.junction(children, "AND", "true"),
            FilterExpr::Or { children } => self.junction(children, "OR", "false"),
            FilterExpr::Not { child } => Ok(format!("NOT ({})", self.render(child)?)),
        }
    }

    fn comparison(&mut self, key: &str, op: &str, value: Value) -> FilterResult<String> {
        let prop = self.property(key)?;
        let param = self.bind(value);
        Ok(format!("{prop} {op} ${param}"))
    }

    fn folded(&mut self, key: &str, op: &str, value: &str) -> FilterResult<String> {
        let prop = self.property(key)?;
        let param = self.bind(Value::String(value.to_lowercase()));
        Ok(format!("toLower({prop}) {op} ${param}"))
    }

    fn junction(
        &mut self,
        children: &[FilterExpr],
        joiner: &str,
        identity: &str,
    ) -> FilterResult<String> {
        match children {
            [] => Ok(identity.to_owned()),
            [only] => self.render(only),
            _ => {
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    parts.push(format!("({})", self.render(child)?));
                }
                Ok(parts.join(&format!(" {joiner} ")))
            }
        }
    }

    fn property(&self, key: &str) -> FilterResult<String> {
        if !is_identifier(key) {
            return Err(FilterError::InvalidPropertyKey {
                key: key.to_owned(),
            });
        }
        Ok(format!("{}.{key}", self.alias))
    }

    fn bind(&mut self, value: Value) -> String {
        let name = format!("{}{}", self.prefix, self.next_param);
        self.next_param += 1;
        self.parameters.insert(name.clone(), value);
        name
    }
}
