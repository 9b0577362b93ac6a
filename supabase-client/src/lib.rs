//! Admin Backends for the Supabase Admin Gateway
//!
//! [`AdminBackend`] is the contract the HTTP handlers program against. Two
//! implementations are provided:
//!
//! - [`PlatformClient`] talks to a real instance over HTTP
//! - [`RecordingBackend`] answers from a script and records every call

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod platform;
pub mod recording;

use serde_json::Value as JsonValue;

use supabase_common::error::Result;
use supabase_common::types::{BucketChanges, Filter, NewBucket};
use supabase_sql::SqlStatement;

pub use platform::PlatformClient;
pub use recording::{Call, RecordingBackend};

/// Name of the remote procedure that runs arbitrary SQL
pub const EXECUTE_SQL: &str = "execute_sql";

/// PostgREST table read
#[derive(Debug, Clone)]
pub struct TableQuery {
    pub schema: String,
    pub table: String,
    /// Column list, `*` for all
    pub select: String,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl TableQuery {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            select: "*".to_string(),
            filters: Vec::new(),
            limit: None,
        }
    }

    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in PostgREST syntax
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];
        pairs.extend(
            self.filters
                .iter()
                .map(|f| (f.column.clone(), f.expression())),
        );
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Administrative operations against a Supabase instance.
///
/// Remote failures surface as `Error::Remote` carrying the platform's message;
/// connection problems as `Error::Transport`.
#[async_trait::async_trait]
pub trait AdminBackend: Send + Sync {
    /// Call a remote procedure (`POST /rest/v1/rpc/{function}`)
    async fn rpc(&self, function: &str, args: JsonValue) -> Result<JsonValue>;

    /// Run a statement through the `execute_sql` procedure
    async fn execute_sql(&self, statement: &SqlStatement) -> Result<JsonValue> {
        self.rpc(EXECUTE_SQL, statement.to_rpc_args()).await
    }

    /// Read rows from a table (`GET /rest/v1/{table}`)
    async fn select(&self, query: &TableQuery) -> Result<JsonValue>;

    /// `POST /storage/v1/bucket`
    async fn create_bucket(&self, bucket: &NewBucket) -> Result<JsonValue>;

    /// `PUT /storage/v1/bucket/{id}`
    async fn update_bucket(&self, id: &str, changes: &BucketChanges) -> Result<JsonValue>;

    /// `DELETE /storage/v1/bucket/{id}`
    async fn delete_bucket(&self, id: &str) -> Result<JsonValue>;

    /// Whether the instance answers at all
    async fn probe(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use supabase_common::types::FilterOperator;

    #[test]
    fn test_query_pairs() {
        let query = TableQuery::new("public", "users")
            .select("id,email")
            .filter(Filter {
                column: "age".to_string(),
                operator: FilterOperator::Gte,
                value: "18".to_string(),
            })
            .limit(10);

        assert_eq!(
            query.query_pairs(),
            vec![
                ("select".to_string(), "id,email".to_string()),
                ("age".to_string(), "gte.18".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_select_is_star() {
        let query = TableQuery::new("public", "users");
        assert_eq!(query.query_pairs(), vec![("select".to_string(), "*".to_string())]);
    }
}
