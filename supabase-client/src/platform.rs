//! HTTP backend for a running Supabase instance

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

use supabase_common::config::PlatformConfig;
use supabase_common::error::{Error, Result};
use supabase_common::types::{BucketChanges, NewBucket};

use crate::{AdminBackend, TableQuery};

/// Client for the REST, RPC and storage APIs of one instance.
///
/// Every request carries the service key both as `apikey` and as a bearer
/// token.
pub struct PlatformClient {
    base_url: Url,
    service_key: String,
    http: reqwest::Client,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let base_url = Url::parse(config.url.trim())
            .map_err(|e| Error::ConfigError(format!("invalid supabase.url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::ConfigError(format!(
                "supabase.url cannot be used as a base URL: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            service_key: config.service_key.clone(),
            http,
        })
    }

    /// Base URL of the instance
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended with percent-encoded path segments
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::ConfigError("supabase.url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<JsonValue> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !status.is_success() {
            debug!("Platform answered {}: {}", status, body);
            return Err(Error::remote(status.as_u16(), remote_message(status, &body)));
        }

        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::Transport(format!("invalid JSON from platform: {e}")))
    }
}

/// Message of a platform error body.
///
/// PostgREST uses `message`, the storage API `message` or `error`, GoTrue
/// `msg` or `error_description`.
fn remote_message(status: StatusCode, body: &str) -> String {
    if let Ok(JsonValue::Object(fields)) = serde_json::from_str::<JsonValue>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(JsonValue::String(message)) = fields.get(key) {
                return message.clone();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[async_trait::async_trait]
impl AdminBackend for PlatformClient {
    async fn rpc(&self, function: &str, args: JsonValue) -> Result<JsonValue> {
        let url = self.endpoint(&["rest", "v1", "rpc", function])?;
        debug!("RPC {}", function);
        self.send(self.http.post(url).json(&args)).await
    }

    async fn select(&self, query: &TableQuery) -> Result<JsonValue> {
        let url = self.endpoint(&["rest", "v1", query.table.as_str()])?;
        let mut builder = self.http.get(url).query(&query.query_pairs());
        if query.schema != "public" {
            builder = builder.header("Accept-Profile", &query.schema);
        }
        self.send(builder).await
    }

    async fn create_bucket(&self, bucket: &NewBucket) -> Result<JsonValue> {
        let url = self.endpoint(&["storage", "v1", "bucket"])?;
        self.send(self.http.post(url).json(&bucket.with_resolved_name()))
            .await
    }

    async fn update_bucket(&self, id: &str, changes: &BucketChanges) -> Result<JsonValue> {
        let url = self.endpoint(&["storage", "v1", "bucket", id])?;
        let mut body = serde_json::to_value(changes)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("id".to_string(), JsonValue::String(id.to_string()));
        }
        self.send(self.http.put(url).json(&body)).await
    }

    async fn delete_bucket(&self, id: &str) -> Result<JsonValue> {
        let url = self.endpoint(&["storage", "v1", "bucket", id])?;
        self.send(self.http.delete(url)).await
    }

    async fn probe(&self) -> bool {
        match self.http.get(self.base_url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health probe failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> PlatformClient {
        let config = PlatformConfig {
            url: url.to_string(),
            service_key: "service-key".to_string(),
            ..PlatformConfig::default()
        };
        PlatformClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("http://localhost:8000");
        assert_eq!(
            client.endpoint(&["rest", "v1", "rpc", "execute_sql"]).unwrap().as_str(),
            "http://localhost:8000/rest/v1/rpc/execute_sql"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes() {
        let client = client("https://example.com/supabase/");
        assert_eq!(
            client.endpoint(&["storage", "v1", "bucket", "my bucket"]).unwrap().as_str(),
            "https://example.com/supabase/storage/v1/bucket/my%20bucket"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = PlatformConfig {
            url: "not a url".to_string(),
            ..PlatformConfig::default()
        };
        assert!(matches!(
            PlatformClient::new(&config),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_remote_message_extraction() {
        assert_eq!(
            remote_message(
                StatusCode::NOT_FOUND,
                r#"{"code":"PGRST202","message":"Could not find the function public.execute_sql"}"#
            ),
            "Could not find the function public.execute_sql"
        );
        assert_eq!(
            remote_message(StatusCode::BAD_REQUEST, r#"{"statusCode":"409","error":"Duplicate"}"#),
            "Duplicate"
        );
        assert_eq!(remote_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(remote_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[tokio::test]
    async fn test_unreachable_instance_is_transport_error() {
        let client = client("http://127.0.0.1:9");
        let err = client.rpc("execute_sql", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(!client.probe().await);
    }
}
