//! Filter expression model.
//!
//! A [`FilterExpr`] is an immutable boolean tree of property and label
//! predicates scoped to a single graph entity. It carries no behavior beyond
//! construction helpers; rendering lives in [`crate::filter::compile`].
//!
//! Expressions deserialize from JSON tagged by `op`, which lets an agent hand
//! over a structured filter instead of raw query text:
//!
//! ```json
//! {"op": "and", "children": [
//!     {"op": "eq", "key": "status", "value": "active"},
//!     {"op": "contains_ci", "key": "name", "value": "ali"}
//! ]}
//! ```

use std::collections::BTreeSet;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Boolean predicate tree over node properties and labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterExpr {
    /// `key = value`.
    Eq {
        /// Property key.
        key: String,
        /// Expected value.
        value: Value,
    },
    /// `key <> value`.
    Ne {
        /// Property key.
        key: String,
        /// Excluded value.
        value: Value,
    },
    /// `key > value`.
    Gt {
        /// Property key.
        key: String,
        /// Exclusive lower bound.
        value: Value,
    },
    /// `key >= value`.
    Gte {
        /// Property key.
        key: String,
        /// Inclusive lower bound.
        value: Value,
    },
    /// `key < value`.
    Lt {
        /// Property key.
        key: String,
        /// Exclusive upper bound.
        value: Value,
    },
    /// `key <= value`.
    Lte {
        /// Property key.
        key: String,
        /// Inclusive upper bound.
        value: Value,
    },
    /// Property value is one of `values`.
    In {
        /// Property key.
        key: String,
        /// Accepted values, bound as a single list parameter.
        values: Vec<Value>,
    },
    /// Property value is none of `values`.
    NotIn {
        /// Property key.
        key: String,
        /// Rejected values, bound as a single list parameter.
        values: Vec<Value>,
    },
    /// Substring match.
    Contains {
        /// Property key.
        key: String,
        /// Substring to look for.
        value: String,
    },
    /// Case-insensitive substring match.
    ContainsCi {
        /// Property key.
        key: String,
        /// Substring to look for; lower-cased at compile time.
        value: String,
    },
    /// Case-insensitive equality.
    EqCi {
        /// Property key.
        key: String,
        /// Expected value; lower-cased at compile time.
        value: String,
    },
    /// Prefix match.
    StartsWith {
        /// Property key.
        key: String,
        /// Required prefix.
        value: String,
    },
    /// Suffix match.
    EndsWith {
        /// Property key.
        key: String,
        /// Required suffix.
        value: String,
    },
    /// Regular-expression match. The pattern is bound verbatim; embed `(?i)`
    /// for case-insensitive matching.
    MatchesPattern {
        /// Property key.
        key: String,
        /// Regular expression in the database's regex dialect.
        pattern: String,
    },
    /// Entity carries at least one of `labels`.
    HasAnyLabel {
        /// Candidate labels.
        labels: BTreeSet<String>,
    },
    /// Conjunction.
    And {
        /// Operands.
        children: Vec<FilterExpr>,
    },
    /// Disjunction.
    Or {
        /// Operands.
        children: Vec<FilterExpr>,
    },
    /// Negation.
    Not {
        /// Negated operand.
        child: Box<FilterExpr>,
    },
}

impl FilterExpr {
    /// Builds `key = value`.
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds `key <> value`.
    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Ne {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds `key > value`.
    pub fn gt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Gt {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds `key >= value`.
    pub fn gte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Gte {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds `key < value`.
    pub fn lt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Lt {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds `key <= value`.
    pub fn lte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Lte {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds `key IN values`.
    pub fn in_list<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FilterExpr::In {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds `NOT key IN values`.
    pub fn not_in<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FilterExpr::NotIn {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a substring match.
    pub fn contains(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Contains {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a case-insensitive substring match.
    pub fn contains_ci(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::ContainsCi {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a case-insensitive equality.
    pub fn eq_ci(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::EqCi {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a prefix match.
    pub fn starts_with(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::StartsWith {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a suffix match.
    pub fn ends_with(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::EndsWith {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a regular-expression match.
    pub fn matches_pattern(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        FilterExpr::MatchesPattern {
            key: key.into(),
            pattern: pattern.into(),
        }
    }

    /// Builds a label-membership predicate.
    pub fn has_any_label<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterExpr::HasAnyLabel {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a conjunction of `children`.
    pub fn and(children: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::And {
            children: children.into_iter().collect(),
        }
    }

    /// Builds a disjunction of `children`.
    pub fn or(children: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::Or {
            children: children.into_iter().collect(),
        }
    }

    /// Wraps this expression in a negation.
    pub fn negate(self) -> Self {
        FilterExpr::Not {
            child: Box::new(self),
        }
    }

    /// Conjoins `other` onto this expression, flattening an existing `And`.
    pub fn and_also(self, other: FilterExpr) -> Self {
        match self {
            FilterExpr::And { mut children } => {
                children.push(other);
                FilterExpr::And { children }
            }
            expr => FilterExpr::and([expr, other]),
        }
    }

    /// Returns true for leaf predicates (everything but `And`/`Or`/`Not`).
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            FilterExpr::And { .. } | FilterExpr::Or { .. } | FilterExpr::Not { .. }
        )
    }

    /// Counts leaf predicates in the tree; each one binds exactly one parameter.
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterExpr::And { children } | FilterExpr::Or { children } => {
                children.iter().map(FilterExpr::leaf_count).sum()
            }
            FilterExpr::Not { child } => child.leaf_count(),
            _ => 1,
        }
    }

    /// Parses the `op`-tagged JSON form handed over by an agent.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Not for FilterExpr {
    type Output = FilterExpr;

    fn not(self) -> Self::Output {
        self.negate()
    }
}
