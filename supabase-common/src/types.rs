//! Common types for the admin gateway

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// Table Types
// ============================================================================

/// Column descriptor used by `create_table` and `alter_table`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    /// Only an explicit `false` produces `NOT NULL`
    #[serde(default)]
    pub nullable: Option<bool>,
    /// SQL expression; strings are embedded as written, numbers and booleans as literals
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub references: Option<ForeignKeyTarget>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(serde_json::Value::String(expr.into()));
        self
    }

    #[must_use]
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKeyTarget {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

/// Foreign key target of a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub column: String,
}

/// Filter condition for `query_table`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereCondition {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// PostgREST filter operators accepted by `query_table`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
}

impl FilterOperator {
    /// Parse an operator name; unknown names yield `None` and are skipped by callers
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "ilike" => Some(Self::Ilike),
            "is" => Some(Self::Is),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::Is => "is",
        }
    }
}

/// A resolved PostgREST filter: `column=operator.value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    /// Resolve a where condition, dropping it if the operator is unknown
    pub fn from_condition(condition: &WhereCondition) -> Option<Self> {
        let operator = FilterOperator::parse(&condition.operator)?;
        let value = match &condition.value {
            serde_json::Value::Null => "null".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(Self {
            column: condition.column.clone(),
            operator,
            value,
        })
    }

    /// Query-string value part
    pub fn expression(&self) -> String {
        format!("{}.{}", self.operator.as_str(), self.value)
    }
}

// ============================================================================
// Policy Types
// ============================================================================

/// Command an RLS policy applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyOperation {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyOperation {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Whether a `WITH CHECK` clause is meaningful for this command
    pub fn accepts_check(self) -> bool {
        matches!(self, Self::All | Self::Insert | Self::Update)
    }
}

impl FromStr for PolicyOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "SELECT" => Ok(Self::Select),
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(Error::ValidationError(
                "Invalid operation. Must be SELECT, INSERT, UPDATE, DELETE, or ALL".to_string(),
            )),
        }
    }
}

impl fmt::Display for PolicyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Operation a storage bucket policy controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BucketOperation {
    Select,
    Insert,
    Update,
    Delete,
}

impl BucketOperation {
    /// Numeric code stored in `storage.policies.operation`
    pub fn code(self) -> u8 {
        match self {
            Self::Select => 10,
            Self::Insert => 20,
            Self::Update => 40,
            Self::Delete => 80,
        }
    }
}

impl FromStr for BucketOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELECT" => Ok(Self::Select),
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(Error::ValidationError(
                "Invalid operation. Must be SELECT, INSERT, UPDATE, or DELETE".to_string(),
            )),
        }
    }
}

// ============================================================================
// Storage Types
// ============================================================================

/// Bucket to be created
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBucket {
    pub id: String,
    /// Defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
}

impl NewBucket {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }

    /// Copy with `name` filled in from [`NewBucket::display_name`]
    #[must_use]
    pub fn with_resolved_name(&self) -> Self {
        Self {
            name: Some(self.display_name().to_string()),
            ..self.clone()
        }
    }
}

/// Settings to change on an existing bucket.
///
/// `None` leaves a setting untouched; for the nullable settings an explicit
/// JSON `null` deserializes to `Some(None)` and clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_size_limit: Option<Option<u64>>,
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_mime_types: Option<Option<Vec<String>>>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Catalog Types
// ============================================================================

/// One row of the column catalog query
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub default_value: serde_json::Value,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub reference_schema: Option<String>,
    #[serde(default)]
    pub reference_table: Option<String>,
    #[serde(default)]
    pub reference_column: Option<String>,
}

/// Column entry of a described table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub not_null: bool,
    pub default_value: serde_json::Value,
}

/// Target of a described foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
}

/// Described foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: ForeignKeyReference,
}

/// Described table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<CatalogColumn>,
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// schema name -> table name -> table
pub type SchemaCatalog = BTreeMap<String, BTreeMap<String, TableSchema>>;

/// Group catalog rows into the nested schema/table structure
pub fn build_schema_catalog(rows: Vec<CatalogRow>) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();

    for row in rows {
        let table = catalog
            .entry(row.schema_name)
            .or_default()
            .entry(row.table_name)
            .or_default();

        if row.is_primary_key {
            table.primary_keys.push(row.column_name.clone());
        }
        if row.is_foreign_key {
            table.foreign_keys.push(ForeignKey {
                column: row.column_name.clone(),
                references: ForeignKeyReference {
                    schema: row.reference_schema,
                    table: row.reference_table,
                    column: row.reference_column,
                },
            });
        }
        table.columns.push(CatalogColumn {
            name: row.column_name,
            data_type: row.data_type,
            not_null: row.not_null,
            default_value: row.default_value,
        });
    }

    catalog
}

/// Table entry returned by the `get_schema_information` procedure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaTable {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<SchemaColumn>,
}

/// Column entry returned by the `get_schema_information` procedure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub is_nullable: String,
}

// ============================================================================
// Response Types
// ============================================================================

/// Error body returned to callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Outcome of one statement of `alter_table`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementOutcome {
    pub success: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(schema: &str, table: &str, column: &str) -> CatalogRow {
        CatalogRow {
            schema_name: schema.to_string(),
            table_name: table.to_string(),
            column_name: column.to_string(),
            data_type: "uuid".to_string(),
            not_null: true,
            default_value: serde_json::Value::Null,
            is_primary_key: false,
            is_foreign_key: false,
            reference_schema: None,
            reference_table: None,
            reference_column: None,
        }
    }

    #[test]
    fn test_policy_operation_parse() {
        assert_eq!("select".parse::<PolicyOperation>().unwrap(), PolicyOperation::Select);
        assert_eq!(" ALL ".parse::<PolicyOperation>().unwrap(), PolicyOperation::All);
        assert!("TRUNCATE".parse::<PolicyOperation>().is_err());
        assert!(PolicyOperation::Update.accepts_check());
        assert!(!PolicyOperation::Delete.accepts_check());
    }

    #[test]
    fn test_bucket_operation_codes() {
        assert_eq!("SELECT".parse::<BucketOperation>().unwrap().code(), 10);
        assert_eq!("DELETE".parse::<BucketOperation>().unwrap().code(), 80);
        assert!("ALL".parse::<BucketOperation>().is_err());
    }

    #[test]
    fn test_filter_from_condition() {
        let cond = WhereCondition {
            column: "age".to_string(),
            operator: "gte".to_string(),
            value: serde_json::json!(18),
        };
        assert_eq!(Filter::from_condition(&cond).unwrap().expression(), "gte.18");

        let cond = WhereCondition {
            column: "deleted_at".to_string(),
            operator: "is".to_string(),
            value: serde_json::Value::Null,
        };
        assert_eq!(Filter::from_condition(&cond).unwrap().expression(), "is.null");

        let cond = WhereCondition {
            column: "x".to_string(),
            operator: "between".to_string(),
            value: serde_json::json!(1),
        };
        assert!(Filter::from_condition(&cond).is_none());
    }

    #[test]
    fn test_build_schema_catalog() {
        let mut id = row("public", "posts", "id");
        id.is_primary_key = true;
        let mut author = row("public", "posts", "author_id");
        author.is_foreign_key = true;
        author.reference_schema = Some("public".to_string());
        author.reference_table = Some("users".to_string());
        author.reference_column = Some("id".to_string());

        let catalog = build_schema_catalog(vec![id, author, row("audit", "log", "id")]);

        let posts = &catalog["public"]["posts"];
        assert_eq!(posts.columns.len(), 2);
        assert_eq!(posts.primary_keys, vec!["id".to_string()]);
        assert_eq!(posts.foreign_keys[0].references.table.as_deref(), Some("users"));
        assert!(catalog["audit"].contains_key("log"));
    }

    #[test]
    fn test_bucket_changes_distinguish_null_from_absent() {
        let changes: BucketChanges = serde_json::from_value(serde_json::json!({
            "public": true,
            "file_size_limit": null
        }))
        .unwrap();
        assert_eq!(changes.public, Some(true));
        assert_eq!(changes.file_size_limit, Some(None));
        assert_eq!(changes.allowed_mime_types, None);

        let empty: BucketChanges = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_new_bucket_display_name() {
        let bucket: NewBucket = serde_json::from_value(serde_json::json!({ "id": "avatars" })).unwrap();
        assert_eq!(bucket.display_name(), "avatars");
        assert!(!bucket.public);
    }

    #[test]
    fn test_resolved_bucket_omits_absent_options() {
        let bucket: NewBucket = serde_json::from_value(serde_json::json!({ "id": "avatars" })).unwrap();
        assert_eq!(
            serde_json::to_value(bucket.with_resolved_name()).unwrap(),
            serde_json::json!({ "id": "avatars", "name": "avatars", "public": false })
        );

        let bucket = NewBucket {
            id: "docs".to_string(),
            name: Some("Documents".to_string()),
            file_size_limit: Some(1024),
            ..NewBucket::default()
        };
        assert_eq!(
            serde_json::to_value(bucket.with_resolved_name()).unwrap(),
            serde_json::json!({
                "id": "docs",
                "name": "Documents",
                "public": false,
                "file_size_limit": 1024
            })
        );
    }

    #[test]
    fn test_column_definition_json() {
        let column: ColumnDefinition = serde_json::from_value(serde_json::json!({
            "name": "id",
            "type": "uuid",
            "primary_key": true,
            "default_value": "gen_random_uuid()"
        }))
        .unwrap();
        assert_eq!(column.data_type, "uuid");
        assert!(column.primary_key);
        assert!(column.nullable.is_none());
    }
}
