#![forbid(unsafe_code)]

//! Agent-facing read tool: guard the query, then hand it to an executor.
//!
//! Execution itself belongs to the database client; it plugs in through
//! [`QueryExecutor`]. A refused query never reaches the executor, and the
//! refusal renders as a message the agent can act on when retrying.

use std::error::Error as StdError;

use thiserror::Error;
use tracing::{debug, info};

use crate::filter::Parameters;
use crate::guard::{NormalizedQuery, QueryGuard, ValidationError};

/// Runs trusted query text against the graph store.
pub trait QueryExecutor {
    /// Result rows as produced by the client.
    type Rows;
    /// Client error type.
    type Error: StdError + Send + Sync + 'static;

    /// Executes `query`, binding `parameters` as named placeholders.
    fn execute(
        &self,
        query: &NormalizedQuery,
        parameters: &Parameters,
    ) -> Result<Self::Rows, Self::Error>;
}

/// Failure of a guarded tool call.
#[derive(Debug, Error)]
pub enum ToolError<E: StdError + Send + Sync + 'static> {
    /// The guard refused the query; nothing was executed.
    #[error("query rejected: {0}")]
    Rejected(#[from] ValidationError),
    /// The query was accepted but the executor failed.
    #[error("query execution failed: {0}")]
    Execution(#[source] E),
}

impl<E: StdError + Send + Sync + 'static> ToolError<E> {
    /// Text returned to the agent as the tool-call error result.
    pub fn tool_message(&self) -> String {
        match self {
            ToolError::Rejected(err) => format!(
                "[{}] {err}. Rewrite the query and call the tool again.",
                err.code()
            ),
            ToolError::Execution(err) => format!("[ExecutionFailed] {err}"),
        }
    }
}

/// Read-only query tool exposed to an agent.
pub struct ReadQueryTool<E> {
    guard: QueryGuard,
    executor: E,
}

impl<E: QueryExecutor> ReadQueryTool<E> {
    /// Wraps `executor` behind `guard`.
    pub fn new(guard: QueryGuard, executor: E) -> Self {
        Self { guard, executor }
    }

    /// Guard in front of the executor.
    pub fn guard(&self) -> &QueryGuard {
        &self.guard
    }

    /// Validates `raw_query` and executes it when accepted.
    pub fn run(
        &self,
        raw_query: &str,
        parameters: &Parameters,
    ) -> Result<E::Rows, ToolError<E::Error>> {
        let query = self.guard.check(raw_query).map_err(|err| {
            info!(code = err.code(), "agent query rejected");
            ToolError::Rejected(err)
        })?;
        debug!(params = parameters.len(), "executing guarded query");
        self.executor
            .execute(&query, parameters)
            .map_err(ToolError::Execution)
    }
}
