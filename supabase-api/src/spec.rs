//! Endpoint catalogue served at `/v1/specification`
//!
//! One entry per POST endpoint, each with a JSON-schema style description of
//! its body.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value as JsonValue};

const SCHEMA_DEFAULT_PUBLIC: &str = "Database schema (optional, defaults to public)";
const POLICY_OPERATIONS: [&str; 5] = ["SELECT", "INSERT", "UPDATE", "DELETE", "ALL"];
const BUCKET_OPERATIONS: [&str; 4] = ["SELECT", "INSERT", "UPDATE", "DELETE"];

fn typed(kind: &str, description: &str) -> JsonValue {
    json!({ "type": kind, "description": description })
}

fn string(description: &str) -> JsonValue {
    typed("string", description)
}

fn boolean(description: &str) -> JsonValue {
    typed("boolean", description)
}

fn one_of(values: &[&str], description: &str) -> JsonValue {
    json!({ "type": "string", "enum": values, "description": description })
}

fn object(properties: &[(&str, JsonValue)], required: &[&str]) -> JsonValue {
    let properties: Map<String, JsonValue> = properties
        .iter()
        .map(|(name, schema)| ((*name).to_string(), schema.clone()))
        .collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn function(
    name: &str,
    description: &str,
    properties: &[(&str, JsonValue)],
    required: &[&str],
) -> JsonValue {
    json!({
        "name": name,
        "description": description,
        "parameters": object(properties, required),
    })
}

fn column_schema(with_constraints: bool) -> JsonValue {
    let mut properties = vec![
        ("name", string("Column name")),
        ("type", string("Column data type")),
        ("nullable", boolean("Whether the column can be null (optional, defaults to true)")),
        ("default_value", string("Default value expression (optional)")),
    ];
    if with_constraints {
        properties.extend([
            ("primary_key", boolean("Whether the column is a primary key (optional, defaults to false)")),
            ("unique", boolean("Whether the column value must be unique (optional, defaults to false)")),
            (
                "references",
                json!({
                    "type": "object",
                    "properties": {
                        "table": string("Referenced table, optionally schema-qualified"),
                        "column": string("Referenced column"),
                    },
                    "description": "Foreign key reference (optional)",
                }),
            ),
        ]);
    }
    object(&properties, &["name", "type"])
}

fn array_of(items: JsonValue, description: &str) -> JsonValue {
    json!({ "type": "array", "items": items, "description": description })
}

fn table_functions() -> Vec<JsonValue> {
    let where_condition = object(
        &[
            ("column", string("Column name")),
            (
                "operator",
                one_of(
                    &["eq", "neq", "gt", "gte", "lt", "lte", "like", "ilike", "is"],
                    "Comparison operator",
                ),
            ),
            ("value", typed("any", "Value to compare against")),
        ],
        &["column", "operator", "value"],
    );

    vec![
        function(
            "query_table",
            "Query a specific table with schema selection and where clause support",
            &[
                ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
                ("table", string("Name of the table to query")),
                ("select", string("Comma-separated list of columns to select (optional, defaults to *)")),
                ("where", array_of(where_condition, "Array of where conditions (optional)")),
            ],
            &["table"],
        ),
        function(
            "generate_types",
            "Generate TypeScript types for your Supabase database schema",
            &[("schema", string(SCHEMA_DEFAULT_PUBLIC))],
            &[],
        ),
        function(
            "list_tables",
            "List all tables in a specific schema",
            &[("schema", string(SCHEMA_DEFAULT_PUBLIC))],
            &[],
        ),
        function(
            "create_table",
            "Create a new table",
            &[
                ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
                ("name", string("Table name")),
                ("columns", array_of(column_schema(true), "Table columns")),
                ("enable_rls", boolean("Whether to enable RLS on the table (optional, defaults to false)")),
            ],
            &["name", "columns"],
        ),
        function(
            "alter_table",
            "Alter a table (add/drop columns, rename)",
            &[
                ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
                ("name", string("Table name")),
                ("new_name", string("New table name (optional)")),
                ("add_columns", array_of(column_schema(false), "Columns to add (optional)")),
                (
                    "drop_columns",
                    array_of(json!({ "type": "string" }), "Columns to drop (optional)"),
                ),
                ("enable_rls", boolean("Enable or disable RLS on the table (optional)")),
            ],
            &["name"],
        ),
        function(
            "drop_table",
            "Drop a table",
            &[
                ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
                ("name", string("Table name")),
                ("cascade", boolean("Whether to cascade the deletion (optional, defaults to false)")),
            ],
            &["name"],
        ),
    ]
}

fn database_functions() -> Vec<JsonValue> {
    let policy_properties = |operation_required: bool| {
        vec![
            ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
            ("table", string("Table name")),
            ("name", string("Policy name")),
            (
                "operation",
                one_of(
                    &POLICY_OPERATIONS,
                    if operation_required {
                        "Operation type that the policy applies to"
                    } else {
                        "Operation type that the policy applies to (optional, defaults to ALL)"
                    },
                ),
            ),
            ("definition", string("USING expression of the policy")),
            ("check", string("WITH CHECK expression (optional, used for INSERT, UPDATE and ALL)")),
            ("role", string("Role the policy applies to (optional, defaults to public)")),
        ]
    };

    vec![
        function(
            "execute_query",
            "Execute a raw SQL query (read-only statements only)",
            &[("query", string("A single SELECT or VALUES query"))],
            &["query"],
        ),
        function(
            "get_database_schema",
            "Get columns, primary keys and foreign keys of every table",
            &[("schema", string("Schema name (optional, defaults to all non-system schemas)"))],
            &[],
        ),
        function(
            "create_schema",
            "Create a new schema",
            &[("name", string("Schema name"))],
            &["name"],
        ),
        function(
            "delete_schema",
            "Delete a schema",
            &[
                ("name", string("Schema name")),
                ("cascade", boolean("Whether to cascade the deletion (optional, defaults to false)")),
            ],
            &["name"],
        ),
        function(
            "get_rls_policies",
            "Get RLS policies for a table or all tables",
            &[
                ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
                ("table", string("Table name (optional, defaults to every table of the schema)")),
            ],
            &[],
        ),
        function(
            "create_rls_policy",
            "Create a new RLS policy",
            &policy_properties(true),
            &["table", "name", "operation", "definition"],
        ),
        function(
            "update_rls_policy",
            "Replace an existing RLS policy",
            &policy_properties(false),
            &["table", "name", "definition"],
        ),
        function(
            "delete_rls_policy",
            "Delete an RLS policy",
            &[
                ("schema", string(SCHEMA_DEFAULT_PUBLIC)),
                ("table", string("Table name")),
                ("name", string("Policy name")),
            ],
            &["table", "name"],
        ),
    ]
}

fn storage_functions() -> Vec<JsonValue> {
    let mime_types = array_of(json!({ "type": "string" }), "Allowed MIME types (optional)");
    let size_limit = typed("number", "File size limit in bytes (optional)");

    vec![
        function(
            "get_buckets",
            "Get all storage buckets or a specific one",
            &[("id", string("Bucket ID (optional, defaults to every bucket)"))],
            &[],
        ),
        function(
            "create_bucket",
            "Create a new storage bucket",
            &[
                ("id", string("Bucket ID")),
                ("name", string("Bucket name (optional, defaults to the ID)")),
                ("public", boolean("Whether the bucket is public (optional, defaults to false)")),
                ("file_size_limit", size_limit.clone()),
                ("allowed_mime_types", mime_types.clone()),
            ],
            &["id"],
        ),
        function(
            "update_bucket",
            "Update a storage bucket",
            &[
                ("id", string("Bucket ID")),
                ("public", boolean("Whether the bucket is public (optional)")),
                ("file_size_limit", size_limit),
                ("allowed_mime_types", mime_types),
            ],
            &["id"],
        ),
        function(
            "delete_bucket",
            "Delete a storage bucket",
            &[("id", string("Bucket ID"))],
            &["id"],
        ),
        function(
            "get_bucket_policies",
            "Get policies for a storage bucket",
            &[("bucket_id", string("Bucket ID"))],
            &["bucket_id"],
        ),
        function(
            "create_bucket_policy",
            "Create a new policy for a storage bucket",
            &[
                ("bucket_id", string("Bucket ID")),
                ("name", string("Policy name")),
                ("operation", one_of(&BUCKET_OPERATIONS, "Operation type")),
                ("definition", string("Policy expression")),
                ("role", string("Role name (optional, defaults to authenticated)")),
            ],
            &["bucket_id", "name", "operation", "definition"],
        ),
        function(
            "update_bucket_policy",
            "Update a policy for a storage bucket",
            &[
                ("bucket_id", string("Bucket ID")),
                ("name", string("Policy name")),
                ("definition", string("Policy expression")),
            ],
            &["bucket_id", "name", "definition"],
        ),
        function(
            "delete_bucket_policy",
            "Delete a policy for a storage bucket",
            &[
                ("bucket_id", string("Bucket ID")),
                ("name", string("Policy name")),
            ],
            &["bucket_id", "name"],
        ),
    ]
}

fn edge_functions() -> Vec<JsonValue> {
    let code = string("Function code (JavaScript/TypeScript)");
    let import_map = typed("object", "Import map for the function (optional)");

    vec![
        function(
            "get_edge_functions",
            "Get all edge functions or a specific one",
            &[("name", string("Function name (optional, defaults to every function)"))],
            &[],
        ),
        function(
            "create_edge_function",
            "Create a new edge function",
            &[
                ("name", string("Function name")),
                ("code", code.clone()),
                ("verify_jwt", boolean("Whether to verify JWT (optional, defaults to false)")),
                ("import_map", import_map.clone()),
            ],
            &["name", "code"],
        ),
        function(
            "update_edge_function",
            "Update an existing edge function",
            &[
                ("name", string("Function name")),
                ("code", code),
                ("verify_jwt", boolean("Whether to verify JWT (optional)")),
                ("import_map", import_map),
            ],
            &["name", "code"],
        ),
        function(
            "delete_edge_function",
            "Delete an edge function",
            &[("name", string("Function name"))],
            &["name"],
        ),
        function(
            "deploy_edge_function",
            "Deploy an edge function",
            &[("name", string("Function name"))],
            &["name"],
        ),
    ]
}

/// The specification document
pub static SPECIFICATION: Lazy<JsonValue> = Lazy::new(|| {
    let functions: Vec<JsonValue> = table_functions()
        .into_iter()
        .chain(database_functions())
        .chain(storage_functions())
        .chain(edge_functions())
        .collect();

    json!({ "functions": functions })
});

/// Names of the documented endpoints, in document order
pub fn function_names() -> Vec<&'static str> {
    SPECIFICATION["functions"]
        .as_array()
        .map(|functions| {
            functions
                .iter()
                .filter_map(|f| f["name"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_endpoint_is_documented_once() {
        let names = function_names();
        assert_eq!(names.len(), 27);

        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_entry_shape() {
        let create_table = SPECIFICATION["functions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "create_table")
            .unwrap();

        assert_eq!(create_table["parameters"]["type"], "object");
        assert_eq!(create_table["parameters"]["required"], json!(["name", "columns"]));
        assert_eq!(
            create_table["parameters"]["properties"]["columns"]["items"]["required"],
            json!(["name", "type"])
        );
    }

    #[test]
    fn test_optional_only_entries_have_no_required_list() {
        let list_tables = SPECIFICATION["functions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "list_tables")
            .unwrap();
        assert!(list_tables["parameters"].get("required").is_none());
    }

    #[test]
    fn test_bucket_policy_operations() {
        let create = SPECIFICATION["functions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "create_bucket_policy")
            .unwrap();
        assert_eq!(
            create["parameters"]["properties"]["operation"]["enum"],
            json!(["SELECT", "INSERT", "UPDATE", "DELETE"])
        );
    }
}
