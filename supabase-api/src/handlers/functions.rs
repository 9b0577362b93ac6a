//! Edge function handlers
//!
//! Functions are kept in an `edge_functions` table when the instance has
//! one. When it does not, the handlers answer 200 with
//! `implementation_needed: true` instead of failing.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use supabase_sql::functions;

use super::{required, rows_or_empty, success, MISSING_PARAMETERS};
use crate::error::HandlerResult;
use crate::ApiState;

const NAME_REQUIRED: &str = "Function name is required";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FunctionNameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FunctionRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub verify_jwt: Option<bool>,
    pub import_map: Option<JsonValue>,
}

fn implementation_needed(action: &str, function_name: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": format!(
            "Edge function {action} requires a specific implementation for your self-hosted Supabase setup"
        ),
        "implementation_needed": true,
        "function_name": function_name,
    }))
}

/// POST /v1/get_edge_functions
pub async fn get_edge_functions(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<FunctionNameRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = request.name.as_deref();
    debug!(endpoint = "get_edge_functions", ?name, "Handling request");

    match state.backend.execute_sql(&functions::select_functions(name)).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(rows_or_empty(rows))),
        Err(e) => {
            warn!("edge_functions table unavailable: {}", e);
            Ok(HttpResponse::Ok().json(json!({
                "message": "Edge functions management requires a specific implementation for your self-hosted Supabase setup",
                "implementation_needed": true,
                "functions": [],
            })))
        }
    }
}

/// POST /v1/create_edge_function
pub async fn create_edge_function(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<FunctionRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, MISSING_PARAMETERS)?;
    let code = required(&request.code, MISSING_PARAMETERS)?;
    debug!(endpoint = "create_edge_function", function = name, "Handling request");

    let import_map = request
        .import_map
        .clone()
        .filter(|m| !m.is_null())
        .unwrap_or_else(|| json!({}));
    let statement = functions::insert_function(
        name,
        code,
        request.verify_jwt.unwrap_or(false),
        &import_map,
    );

    match state.backend.execute_sql(&statement).await {
        Ok(_) => Ok(success(format!("Edge function '{name}' created successfully"))),
        Err(e) => {
            warn!("edge_functions insert failed: {}", e);
            Ok(implementation_needed("creation", name))
        }
    }
}

/// POST /v1/update_edge_function
pub async fn update_edge_function(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<FunctionRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, MISSING_PARAMETERS)?;
    let code = required(&request.code, MISSING_PARAMETERS)?;
    debug!(endpoint = "update_edge_function", function = name, "Handling request");

    let statement =
        functions::update_function(name, code, request.verify_jwt, request.import_map.as_ref());

    match state.backend.execute_sql(&statement).await {
        Ok(_) => Ok(success(format!("Edge function '{name}' updated successfully"))),
        Err(e) => {
            warn!("edge_functions update failed: {}", e);
            Ok(implementation_needed("update", name))
        }
    }
}

/// POST /v1/delete_edge_function
pub async fn delete_edge_function(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<FunctionNameRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, NAME_REQUIRED)?;
    debug!(endpoint = "delete_edge_function", function = name, "Handling request");

    match state.backend.execute_sql(&functions::delete_function(name)).await {
        Ok(_) => Ok(success(format!("Edge function '{name}' deleted successfully"))),
        Err(e) => {
            warn!("edge_functions delete failed: {}", e);
            Ok(implementation_needed("deletion", name))
        }
    }
}

/// POST /v1/deploy_edge_function - Deployment is not managed by the gateway
pub async fn deploy_edge_function(body: web::Json<FunctionNameRequest>) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, NAME_REQUIRED)?;
    debug!(endpoint = "deploy_edge_function", function = name, "Handling request");

    Ok(implementation_needed("deployment", name))
}
