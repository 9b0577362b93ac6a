//! Table handlers: reads, type generation, listing and DDL

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use supabase_client::TableQuery;
use supabase_common::error::Error;
use supabase_common::types::{
    ColumnDefinition, Filter, SchemaTable, StatementOutcome, WhereCondition,
};
use supabase_sql::ddl::{self, TableAlteration};
use supabase_sql::{catalog, typescript};

use super::{required, rows_or_empty, schema_or_public, success};
use crate::error::HandlerResult;
use crate::ApiState;

const TABLE_REQUIRED: &str = "Table name is required";
const TABLE_AND_COLUMNS_REQUIRED: &str = "Table name and columns are required";
const TYPES_HINT: &str = "Unable to generate types. You may need to create a custom function \
    to retrieve schema information in your Supabase instance.";

/// Tables probed when neither `list_tables` nor `execute_sql` is installed
const COMMON_TABLES: [&str; 6] = ["profiles", "products", "users", "categories", "orders", "items"];

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryTableRequest {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub select: Option<String>,
    #[serde(rename = "where")]
    pub conditions: Vec<WhereCondition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SchemaRequest {
    pub schema: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTableRequest {
    pub schema: Option<String>,
    pub name: Option<String>,
    pub columns: Vec<ColumnDefinition>,
    pub enable_rls: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlterTableRequest {
    pub schema: Option<String>,
    pub name: Option<String>,
    pub new_name: Option<String>,
    pub add_columns: Vec<ColumnDefinition>,
    pub drop_columns: Vec<String>,
    pub enable_rls: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DropTableRequest {
    pub schema: Option<String>,
    pub name: Option<String>,
    pub cascade: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/query_table
pub async fn query_table(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<QueryTableRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let table = required(&request.table, TABLE_REQUIRED)?;
    debug!(endpoint = "query_table", table, "Handling request");

    let select = request
        .select
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("*");
    let mut query = TableQuery::new(schema_or_public(&request.schema), table).select(select);

    for condition in &request.conditions {
        match Filter::from_condition(condition) {
            Some(filter) => query = query.filter(filter),
            None => debug!("Ignoring unknown operator '{}'", condition.operator),
        }
    }

    let rows = state.backend.select(&query).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /v1/generate_types
pub async fn generate_types(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<SchemaRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let schema = schema_or_public(&request.schema);
    debug!(endpoint = "generate_types", schema, "Handling request");

    let types = match state
        .backend
        .rpc("get_schema_information", json!({ "p_schema": schema }))
        .await
    {
        Ok(data) => {
            let tables: Vec<SchemaTable> =
                serde_json::from_value(rows_or_empty(data)).map_err(Error::from)?;
            typescript::render_interfaces(schema, &tables)
        }
        Err(e) => {
            warn!("get_schema_information unavailable, falling back to pg_tables: {}", e);
            let rows = state
                .backend
                .execute_sql(&catalog::table_names(schema))
                .await
                .map_err(|e| e.with_hint(TYPES_HINT))?;

            let names: Vec<&str> = rows
                .as_array()
                .map(|rows| rows.iter().filter_map(|r| r["tablename"].as_str()).collect())
                .unwrap_or_default();
            typescript::render_placeholders(schema, &names)
        }
    };

    Ok(HttpResponse::Ok().json(json!({ "types": types })))
}

/// POST /v1/list_tables
///
/// Tries the `list_tables` procedure, then a `pg_tables` query, then probes
/// a handful of commonly named tables.
pub async fn list_tables(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<SchemaRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let schema = schema_or_public(&request.schema);
    debug!(endpoint = "list_tables", schema, "Handling request");

    match state
        .backend
        .rpc("list_tables", json!({ "p_schema": schema }))
        .await
    {
        Ok(data) if !data.is_null() => return Ok(HttpResponse::Ok().json(data)),
        Ok(_) => debug!("list_tables returned no data, falling back to pg_tables"),
        Err(e) => warn!("list_tables unavailable, falling back to pg_tables: {}", e),
    }

    match state.backend.execute_sql(&catalog::list_tables(schema)).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(rows_or_empty(rows))),
        Err(e) => {
            warn!("execute_sql unavailable, probing common tables: {}", e);
            let mut found = Vec::new();
            for table in COMMON_TABLES {
                let probe = TableQuery::new(schema, table).limit(1);
                if state.backend.select(&probe).await.is_ok() {
                    found.push(json!({ "table_name": table }));
                }
            }
            Ok(HttpResponse::Ok().json(found))
        }
    }
}

/// POST /v1/create_table
pub async fn create_table(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<CreateTableRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, TABLE_AND_COLUMNS_REQUIRED)?;
    if request.columns.is_empty() {
        return Err(Error::MissingField(TABLE_AND_COLUMNS_REQUIRED).into());
    }
    let schema = schema_or_public(&request.schema);
    debug!(endpoint = "create_table", schema, table = name, "Handling request");

    let statement = ddl::create_table(schema, name, &request.columns, request.enable_rls)?;
    state.backend.execute_sql(&statement).await?;

    Ok(success(format!(
        "Table '{name}' created successfully in schema '{schema}'"
    )))
}

/// POST /v1/alter_table
///
/// Each change runs as its own statement; failures are reported per
/// operation instead of aborting the request.
pub async fn alter_table(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<AlterTableRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, TABLE_REQUIRED)?;
    let schema = schema_or_public(&request.schema);
    debug!(endpoint = "alter_table", schema, table = name, "Handling request");

    let changes = TableAlteration {
        new_name: request.new_name.as_deref(),
        add_columns: &request.add_columns,
        drop_columns: &request.drop_columns,
        enable_rls: request.enable_rls,
    };
    let statements = ddl::alter_table(schema, name, &changes)?;

    let mut operations = Vec::with_capacity(statements.len());
    for statement in statements {
        let outcome = match state.backend.execute_sql(&statement).await {
            Ok(_) => StatementOutcome {
                success: true,
                query: statement.query,
                error: None,
            },
            Err(e) => {
                warn!("ALTER TABLE step failed: {}", e);
                StatementOutcome {
                    success: false,
                    query: statement.query,
                    error: Some(e.to_string()),
                }
            }
        };
        operations.push(outcome);
    }

    let all_succeeded = operations.iter().all(|o| o.success);
    let message = if all_succeeded {
        format!("Table '{name}' altered successfully")
    } else {
        format!("Some operations failed while altering table '{name}'")
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": all_succeeded,
        "operations": operations,
        "message": message,
    })))
}

/// POST /v1/drop_table
pub async fn drop_table(
    state: web::Data<Arc<ApiState>>,
    body: web::Json<DropTableRequest>,
) -> HandlerResult {
    let request = body.into_inner();
    let name = required(&request.name, TABLE_REQUIRED)?;
    let schema = schema_or_public(&request.schema);
    debug!(endpoint = "drop_table", schema, table = name, "Handling request");

    state
        .backend
        .execute_sql(&ddl::drop_table(schema, name, request.cascade))
        .await?;

    Ok(success(format!(
        "Table '{name}' dropped successfully from schema '{schema}'"
    )))
}
