use crate::error::Result;
use crate::types::{FetchConfig, ParamType};
use async_trait::async_trait;
use serde_json::Value;

/// The data-source capability the paginator runs against.
///
/// An executor hands out prepared statements; it never exposes connections,
/// transactions, or pooling to this layer. Any backend fault is surfaced as
/// a `DataAccess` error, unmodified.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Get the type name of this executor (for diagnostics)
    fn executor_type(&self) -> &'static str;

    /// Prepare one read statement for execution
    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>>;
}

/// A prepared statement handle.
///
/// Binds accumulate by placeholder name; fetching executes the statement and
/// materializes its rows. The contract is cursor-less: once a fetch call
/// returns, the statement owes the caller nothing further.
#[async_trait]
pub trait Statement: Send {
    /// Bind a named placeholder value
    fn bind_value(&mut self, name: &str, value: Value, param_type: ParamType);

    /// Execute and materialize every result row.
    ///
    /// With no fetch config, each row is a mapping of column name to value;
    /// a config reshapes the rows (see [`FetchConfig`]).
    async fn fetch_all(&mut self, fetch: Option<&FetchConfig>) -> Result<Vec<Value>>;

    /// Execute and materialize only the first result row, if any
    async fn fetch_one(&mut self) -> Result<Option<Value>>;
}
