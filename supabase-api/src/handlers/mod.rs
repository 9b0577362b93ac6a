//! HTTP handlers, one module per domain

pub mod database;
pub mod functions;
pub mod storage;
pub mod tables;

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde_json::{json, Value as JsonValue};

use supabase_common::error::{Error, Result};

use crate::spec::SPECIFICATION;
use crate::ApiState;

pub(crate) const MISSING_PARAMETERS: &str = "Missing required parameters";

/// Value of a required string field; absent and empty both count as missing
pub(crate) fn required<'a>(value: &'a Option<String>, message: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingField(message))
}

/// Optional string field falling back to `default` when absent or empty
pub(crate) fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or(default)
}

pub(crate) fn schema_or_public(schema: &Option<String>) -> &str {
    or_default(schema, "public")
}

/// Row payloads come back as `null` when a statement returns nothing
pub(crate) fn rows_or_empty(rows: JsonValue) -> JsonValue {
    if rows.is_null() {
        JsonValue::Array(Vec::new())
    } else {
        rows
    }
}

pub(crate) fn success(message: String) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
    }))
}

/// GET / - Service information
pub async fn info_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": "Supabase Self-Hosted MCP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Administration gateway for self-hosted Supabase instances",
        "status": "running",
    }))
}

/// GET /health - Liveness plus reachability of the instance
pub async fn health_handler(state: web::Data<Arc<ApiState>>) -> HttpResponse {
    let supabase = if state.backend.probe().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "supabase": supabase,
    }))
}

/// GET /v1/specification - Machine-readable endpoint catalogue
pub async fn specification_handler() -> HttpResponse {
    HttpResponse::Ok().json(&*SPECIFICATION)
}
