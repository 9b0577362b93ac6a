//! Database handlers: ad-hoc queries, schema catalog, schemas and RLS policies

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use supabase_common::error::Error;
use supabase_common::types::{build_schema_catalog, CatalogRow, PolicyOperation};
use supabase_sql::ddl::{self, PolicyDefinition};
use supabase_sql::{catalog, ensure_read_only, qualified_table, SqlStatement};

use super::{or_default, required, rows_or_empty, schema_or_public, success, MISSING_PARAMETERS};
use crate::error::HandlerResult;
use crate::ApiState;

const QUERY_REQUIRED: &str = "Query is required";
const SCHEMA_NAME_REQUIRED: &str = "Schema name is required";
const EXECUTE_SQL_HINT: &str = "Unable to execute query. You may need to create a custom \
    function 'execute_sql' in your Supabase instance.";

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteQueryRequest {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSchemaRequest {
    pub schema: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SchemaNameRequest {
    pub name: Option<String>,
    pub cascade: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RlsPoliciesRequest {
    pub schema: Option<String>,
    pub table: Option<String>,
}

/// Body shared by the create, update and delete policy endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RlsPolicyRequest {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub name: Option<String>,
    pub operation: Option<String>,
    pub definition: Option<String>,
    pub check: Option<String>,
    pub role: Option<String>,
}

impl RlsPolicyRequest {
    /// Policy described by this request; `operation` falls back to `default_operation`
    fn policy(&self, default_operation: Option<PolicyOperation>) -> Result<PolicyDefinition<'_>, Error> {
        let table = required(&self.table, MISSING_PARAMETERS)?;
        let name = required(&self.name, MISSING_PARAMETERS)?;
        let operation = match (self.operation.as_deref().filter(|o| !o.is_empty()), default_operation) {
            (Some(op), _) => op.parse()?,
            (None, Some(default)) => default,
            (None, None) => return Err(Error::MissingField(MISSING_PARAMETERS)),
        };
        let definition = required(&self.definition, MISSING_PARAMETERS)?;

        Ok(PolicyDefinition {
            schema: schema_or_public(&self.schema),
            table,
            name,
            operation,
            definition,
            check: self.check.as_deref(),
            role: or_default(&self.role, "public"),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/execute_query - Read-only queries only
pub async fn execute_query(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<ExecuteQueryRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let query = required(&request.query, QUERY_REQUIRED)?;
    debug!(endpoint = "execute_query", "Handling request");

    ensure_read_only(query)?;

    let rows = state
        .backend
        .execute_sql(&SqlStatement::new(query))
        .await
        .map_err(|e| e.with_hint(EXECUTE_SQL_HINT))?;
    Ok(HttpResponse::Ok().json(rows_or_empty(rows)))
}

/// POST /v1/get_database_schema
pub async fn get_database_schema(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<DatabaseSchemaRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let schema = request.schema.as_deref().filter(|s| !s.is_empty());
    debug!(endpoint = "get_database_schema", ?schema, "Handling request");

    let rows = state
        .backend
        .execute_sql(&catalog::database_schema(schema))
        .await?;
    let rows: Vec<CatalogRow> = serde_json::from_value(rows_or_empty(rows)).map_err(Error::from)?;

    Ok(HttpResponse::Ok().json(build_schema_catalog(rows)))
}

/// POST /v1/create_schema
pub async fn create_schema(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<SchemaNameRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, SCHEMA_NAME_REQUIRED)?;
    debug!(endpoint = "create_schema", schema = name, "Handling request");

    state.backend.execute_sql(&ddl::create_schema(name)).await?;
    Ok(success(format!("Schema '{name}' created successfully")))
}

/// POST /v1/delete_schema
pub async fn delete_schema(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<SchemaNameRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, SCHEMA_NAME_REQUIRED)?;
    debug!(endpoint = "delete_schema", schema = name, cascade = request.cascade, "Handling request");

    state
        .backend
        .execute_sql(&ddl::drop_schema(name, request.cascade))
        .await?;
    Ok(success(format!("Schema '{name}' deleted successfully")))
}

/// POST /v1/get_rls_policies
pub async fn get_rls_policies(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<RlsPoliciesRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let schema = schema_or_public(&request.schema);
    let table = request.table.as_deref();
    debug!(endpoint = "get_rls_policies", schema, ?table, "Handling request");

    let rows = state
        .backend
        .execute_sql(&catalog::rls_policies(schema, table))
        .await?;
    Ok(HttpResponse::Ok().json(rows_or_empty(rows)))
}

/// POST /v1/create_rls_policy
pub async fn create_rls_policy(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<RlsPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let policy = request.policy(None)?;
    debug!(endpoint = "create_rls_policy", policy = policy.name, "Handling request");

    state.backend.execute_sql(&ddl::create_policy(&policy)?).await?;
    Ok(success(format!(
        "RLS policy '{}' created on {}",
        policy.name,
        qualified_table(policy.schema, policy.table)
    )))
}

/// POST /v1/update_rls_policy
///
/// The drop and the re-create travel in one `execute_sql` call, so the
/// procedure's transaction either applies both or neither.
pub async fn update_rls_policy(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<RlsPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let policy = request.policy(Some(PolicyOperation::All))?;
    debug!(endpoint = "update_rls_policy", policy = policy.name, "Handling request");

    state.backend.execute_sql(&ddl::replace_policy(&policy)?).await?;
    Ok(success(format!(
        "RLS policy '{}' updated on {}",
        policy.name,
        qualified_table(policy.schema, policy.table)
    )))
}

/// POST /v1/delete_rls_policy
pub async fn delete_rls_policy(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<RlsPolicyRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let table = required(&request.table, MISSING_PARAMETERS)?;
    let name = required(&request.name, MISSING_PARAMETERS)?;
    let schema = schema_or_public(&request.schema);
    debug!(endpoint = "delete_rls_policy", policy = name, "Handling request");

    state
        .backend
        .execute_sql(&ddl::drop_policy(schema, table, name))
        .await?;
    Ok(success(format!(
        "RLS policy '{name}' deleted from {}",
        qualified_table(schema, table)
    )))
}
