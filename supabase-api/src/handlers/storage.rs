//! Storage handlers: buckets and bucket policies
//!
//! Bucket writes go through the storage API first and fall back to SQL on
//! `storage.buckets` when the API call fails; the response names the path
//! taken in `method`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use supabase_common::types::{BucketChanges, BucketOperation, NewBucket};
use supabase_sql::storage::{self, BucketPolicy};

use super::{or_default, required, rows_or_empty, success, MISSING_PARAMETERS};
use crate::error::HandlerResult;
use crate::ApiState;

const BUCKET_ID_REQUIRED: &str = "Bucket ID is required";

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BucketIdRequest {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBucketRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub public: bool,
    pub file_size_limit: Option<u64>,
    pub allowed_mime_types: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBucketRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub changes: BucketChanges,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BucketPolicyRequest {
    pub bucket_id: Option<String>,
    pub name: Option<String>,
    pub operation: Option<String>,
    pub definition: Option<String>,
    pub role: Option<String>,
}

fn written(message: String, method: &str, data: Option<serde_json::Value>) -> HttpResponse {
    let mut body = json!({
        "success": true,
        "message": message,
        "method": method,
    });
    if let Some(data) = data {
        body["data"] = data;
    }
    HttpResponse::Ok().json(body)
}

// ============================================================================
// Buckets
// ============================================================================

/// POST /v1/get_buckets
pub async fn get_buckets(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<BucketIdRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let id = request.id.as_deref();
    debug!(endpoint = "get_buckets", ?id, "Handling request");

    let rows = state.backend.execute_sql(&storage::select_buckets(id)).await?;
    Ok(HttpResponse::Ok().json(rows_or_empty(rows)))
}

/// POST /v1/create_bucket
pub async fn create_bucket(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<CreateBucketRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let id = required(&request.id, BUCKET_ID_REQUIRED)?.to_string();
    debug!(endpoint = "create_bucket", bucket = %id, "Handling request");

    let bucket = NewBucket {
        id,
        name: request.name,
        public: request.public,
        file_size_limit: request.file_size_limit,
        allowed_mime_types: request.allowed_mime_types,
    };
    let message = format!("Bucket '{}' created successfully", bucket.id);

    match state.backend.create_bucket(&bucket).await {
        Ok(data) => return Ok(written(message, "api", Some(data))),
        Err(e) => warn!("Storage API create failed, falling back to SQL: {}", e),
    }

    state.backend.execute_sql(&storage::insert_bucket(&bucket)).await?;
    Ok(written(message, "sql", None))
}

/// POST /v1/update_bucket - Only the settings present in the body change
pub async fn update_bucket(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<UpdateBucketRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let id = required(&request.id, BUCKET_ID_REQUIRED)?;
    debug!(endpoint = "update_bucket", bucket = id, "Handling request");

    let message = format!("Bucket '{id}' updated successfully");

    match state.backend.update_bucket(id, &request.changes).await {
        Ok(data) => return Ok(written(message, "api", Some(data))),
        Err(e) => warn!("Storage API update failed, falling back to SQL: {}", e),
    }

    state
        .backend
        .execute_sql(&storage::update_bucket(id, &request.changes))
        .await?;
    Ok(written(message, "sql", None))
}

/// POST /v1/delete_bucket
pub async fn delete_bucket(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<BucketIdRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let id = required(&request.id, BUCKET_ID_REQUIRED)?;
    debug!(endpoint = "delete_bucket", bucket = id, "Handling request");

    let message = format!("Bucket '{id}' deleted successfully");

    match state.backend.delete_bucket(id).await {
        Ok(_) => return Ok(written(message, "api", None)),
        Err(e) => warn!("Storage API delete failed, falling back to SQL: {}", e),
    }

    state.backend.execute_sql(&storage::delete_bucket(id)).await?;
    Ok(written(message, "sql", None))
}

// ============================================================================
// Bucket Policies
// ============================================================================

/// POST /v1/get_bucket_policies
pub async fn get_bucket_policies(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<BucketPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let bucket_id = required(&request.bucket_id, BUCKET_ID_REQUIRED)?;
    debug!(endpoint = "get_bucket_policies", bucket = bucket_id, "Handling request");

    let rows = state
        .backend
        .execute_sql(&storage::select_bucket_policies(bucket_id))
        .await?;
    Ok(HttpResponse::Ok().json(rows_or_empty(rows)))
}

/// POST /v1/create_bucket_policy
pub async fn create_bucket_policy(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<BucketPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let bucket_id = required(&request.bucket_id, MISSING_PARAMETERS)?;
    let name = required(&request.name, MISSING_PARAMETERS)?;
    let operation = required(&request.operation, MISSING_PARAMETERS)?;
    let definition = required(&request.definition, MISSING_PARAMETERS)?;
    debug!(endpoint = "create_bucket_policy", bucket = bucket_id, policy = name, "Handling request");

    let policy = BucketPolicy {
        bucket_id,
        name,
        operation: operation.parse::<BucketOperation>()?,
        definition,
        role: or_default(&request.role, "authenticated"),
    };

    state
        .backend
        .execute_sql(&storage::insert_bucket_policy(&policy)?)
        .await?;
    Ok(success(format!(
        "Policy '{name}' for bucket '{bucket_id}' created successfully"
    )))
}

/// POST /v1/update_bucket_policy
pub async fn update_bucket_policy(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<BucketPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let bucket_id = required(&request.bucket_id, MISSING_PARAMETERS)?;
    let name = required(&request.name, MISSING_PARAMETERS)?;
    let definition = required(&request.definition, MISSING_PARAMETERS)?;
    debug!(endpoint = "update_bucket_policy", bucket = bucket_id, policy = name, "Handling request");

    state
        .backend
        .execute_sql(&storage::update_bucket_policy(bucket_id, name, definition)?)
        .await?;
    Ok(success(format!(
        "Policy '{name}' for bucket '{bucket_id}' updated successfully"
    )))
}

/// POST /v1/delete_bucket_policy
pub async fn delete_bucket_policy(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<BucketPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let bucket_id = required(&request.bucket_id, MISSING_PARAMETERS)?;
    let name = required(&request.name, MISSING_PARAMETERS)?;
    debug!(endpoint = "delete_bucket_policy", bucket = bucket_id, policy = name, "Handling request");

    state
        .backend
        .execute_sql(&storage::delete_bucket_policy(bucket_id, name))
        .await?;
    Ok(success(format!(
        "Policy '{name}' for bucket '{bucket_id}' deleted successfully"
    )))
}
