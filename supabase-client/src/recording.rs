//! Scripted in-memory backend for tests and local development

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use supabase_common::error::{Error, Result};
use supabase_common::types::{BucketChanges, NewBucket};

use crate::{AdminBackend, TableQuery, EXECUTE_SQL};

/// One call received by a [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// `rpc/{function}`, `select/{table}` or `storage/{create|update|delete}`
    pub key: String,
    pub payload: JsonValue,
}

/// Backend that answers from per-key queues and records every call.
///
/// Keys are the same strings as [`Call::key`]. A key with an empty queue
/// answers `[]` for reads and procedures and a success body for storage
/// calls. Table reads record their query string as `[name, value]` pairs in
/// order, so repeated filters on one column are all kept.
pub struct RecordingBackend {
    script: Mutex<HashMap<String, VecDeque<Result<JsonValue>>>>,
    calls: Mutex<Vec<Call>>,
    reachable: AtomicBool,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
        }
    }

    /// Queue a response for the next call with `key`
    pub fn respond(&self, key: impl Into<String>, response: Result<JsonValue>) -> &Self {
        self.script
            .lock()
            .entry(key.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a success payload
    pub fn ok(&self, key: impl Into<String>, payload: JsonValue) -> &Self {
        self.respond(key, Ok(payload))
    }

    /// Queue a platform error
    pub fn fail(&self, key: impl Into<String>, status: u16, message: &str) -> &Self {
        self.respond(key, Err(Error::remote(status, message)))
    }

    /// Set the answer of [`AdminBackend::probe`]
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Keys of the calls received so far, in order
    pub fn call_keys(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.key.clone()).collect()
    }

    /// Query text of every `execute_sql` call, in order
    pub fn executed_sql(&self) -> Vec<String> {
        let key = format!("rpc/{EXECUTE_SQL}");
        self.calls
            .lock()
            .iter()
            .filter(|c| c.key == key)
            .filter_map(|c| c.payload["query"].as_str().map(str::to_string))
            .collect()
    }

    fn answer(&self, key: String, payload: JsonValue, default: JsonValue) -> Result<JsonValue> {
        let scripted = self
            .script
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        self.calls.lock().push(Call { key, payload });
        scripted.unwrap_or(Ok(default))
    }
}

#[async_trait::async_trait]
impl AdminBackend for RecordingBackend {
    async fn rpc(&self, function: &str, args: JsonValue) -> Result<JsonValue> {
        self.answer(format!("rpc/{function}"), args, JsonValue::Array(Vec::new()))
    }

    async fn select(&self, query: &TableQuery) -> Result<JsonValue> {
        let payload = serde_json::json!({
            "schema": query.schema,
            "params": query.query_pairs(),
        });
        self.answer(
            format!("select/{}", query.table),
            payload,
            JsonValue::Array(Vec::new()),
        )
    }

    async fn create_bucket(&self, bucket: &NewBucket) -> Result<JsonValue> {
        self.answer(
            "storage/create".to_string(),
            serde_json::to_value(bucket)?,
            serde_json::json!({ "name": bucket.id }),
        )
    }

    async fn update_bucket(&self, id: &str, changes: &BucketChanges) -> Result<JsonValue> {
        self.answer(
            "storage/update".to_string(),
            serde_json::json!({ "id": id, "changes": changes }),
            serde_json::json!({ "message": "Successfully updated" }),
        )
    }

    async fn delete_bucket(&self, id: &str) -> Result<JsonValue> {
        self.answer(
            "storage/delete".to_string(),
            serde_json::json!({ "id": id }),
            serde_json::json!({ "message": "Successfully deleted" }),
        )
    }

    async fn probe(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supabase_sql::SqlStatement;

    #[tokio::test]
    async fn test_scripted_responses_are_consumed_in_order() {
        let backend = RecordingBackend::new();
        backend
            .ok("rpc/list_tables", serde_json::json!([{"table_name": "users"}]))
            .fail("rpc/list_tables", 404, "function not found");

        let first = backend.rpc("list_tables", serde_json::json!({})).await.unwrap();
        assert_eq!(first[0]["table_name"], "users");

        let second = backend.rpc("list_tables", serde_json::json!({})).await;
        assert_eq!(second.unwrap_err().to_string(), "function not found");

        let third = backend.rpc("list_tables", serde_json::json!({})).await.unwrap();
        assert_eq!(third, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_execute_sql_is_recorded() {
        let backend = RecordingBackend::new();
        backend
            .execute_sql(&SqlStatement::new("SELECT $1").bind("public"))
            .await
            .unwrap();

        assert_eq!(backend.call_keys(), vec!["rpc/execute_sql".to_string()]);
        assert_eq!(backend.executed_sql(), vec!["SELECT $1".to_string()]);
        assert_eq!(backend.calls()[0].payload["params"][0], "public");
    }

    #[tokio::test]
    async fn test_select_records_query_pairs() {
        let backend = RecordingBackend::new();
        backend
            .select(&TableQuery::new("app", "orders").limit(1))
            .await
            .unwrap();

        let call = &backend.calls()[0];
        assert_eq!(call.key, "select/orders");
        assert_eq!(call.payload["schema"], "app");
        assert_eq!(
            call.payload["params"],
            serde_json::json!([["select", "*"], ["limit", "1"]])
        );
    }

    #[tokio::test]
    async fn test_select_keeps_repeated_column_filters() {
        use supabase_common::types::{Filter, FilterOperator};

        let range = |operator, value: &str| Filter {
            column: "age".to_string(),
            operator,
            value: value.to_string(),
        };
        let query = TableQuery::new("public", "users")
            .filter(range(FilterOperator::Gte, "18"))
            .filter(range(FilterOperator::Lte, "65"));

        let backend = RecordingBackend::new();
        backend.select(&query).await.unwrap();

        assert_eq!(
            backend.calls()[0].payload["params"],
            serde_json::json!([["select", "*"], ["age", "gte.18"], ["age", "lte.65"]])
        );
    }

    #[tokio::test]
    async fn test_probe_follows_flag() {
        let backend = RecordingBackend::new();
        assert!(backend.probe().await);
        backend.set_reachable(false);
        assert!(!backend.probe().await);
    }
}
