//! Storage bucket and bucket policy statements
//!
//! These are the SQL fallbacks used when the storage API is unreachable, plus
//! the bucket policy statements which have no API counterpart.

use supabase_common::error::Result;
use supabase_common::types::{BucketChanges, BucketOperation, NewBucket};

use crate::fragment;
use crate::quote::{quote_literal, text_array};
use crate::SqlStatement;

fn size_limit(limit: Option<u64>) -> String {
    limit.map_or_else(|| "NULL".to_string(), |l| l.to_string())
}

pub fn select_buckets(id: Option<&str>) -> SqlStatement {
    match id.filter(|i| !i.is_empty()) {
        Some(id) => SqlStatement::new(format!(
            "SELECT * FROM storage.buckets WHERE id = {}",
            quote_literal(id)
        )),
        None => SqlStatement::new("SELECT * FROM storage.buckets"),
    }
}

pub fn insert_bucket(bucket: &NewBucket) -> SqlStatement {
    SqlStatement::new(format!(
        "INSERT INTO storage.buckets (id, name, public, file_size_limit, allowed_mime_types, created_at, updated_at)\n\
         VALUES ({}, {}, {}, {}, {}, NOW(), NOW())",
        quote_literal(&bucket.id),
        quote_literal(bucket.display_name()),
        bucket.public,
        size_limit(bucket.file_size_limit),
        text_array(bucket.allowed_mime_types.as_deref()),
    ))
}

/// `UPDATE` touching `updated_at` and only the settings present in `changes`
pub fn update_bucket(id: &str, changes: &BucketChanges) -> SqlStatement {
    let mut sql = String::from("UPDATE storage.buckets SET updated_at = NOW()");

    if let Some(public) = changes.public {
        sql.push_str(&format!(", public = {public}"));
    }
    if let Some(limit) = changes.file_size_limit {
        sql.push_str(&format!(", file_size_limit = {}", size_limit(limit)));
    }
    if let Some(types) = &changes.allowed_mime_types {
        sql.push_str(&format!(
            ", allowed_mime_types = {}",
            text_array(types.as_deref())
        ));
    }

    sql.push_str(&format!(" WHERE id = {}", quote_literal(id)));
    SqlStatement::new(sql)
}

pub fn delete_bucket(id: &str) -> SqlStatement {
    SqlStatement::new(format!(
        "DELETE FROM storage.buckets WHERE id = {}",
        quote_literal(id)
    ))
}

// ============================================================================
// Bucket Policies
// ============================================================================

pub fn select_bucket_policies(bucket_id: &str) -> SqlStatement {
    SqlStatement::new(format!(
        "SELECT
  name,
  CASE operation
    WHEN 10 THEN 'SELECT'
    WHEN 20 THEN 'INSERT'
    WHEN 40 THEN 'UPDATE'
    WHEN 80 THEN 'DELETE'
    ELSE 'UNKNOWN'
  END AS operation,
  definition,
  role
FROM storage.policies
WHERE bucket_id = {}
ORDER BY name",
        quote_literal(bucket_id)
    ))
}

/// Bucket policy to be created
#[derive(Debug, Clone)]
pub struct BucketPolicy<'a> {
    pub bucket_id: &'a str,
    pub name: &'a str,
    pub operation: BucketOperation,
    pub definition: &'a str,
    pub role: &'a str,
}

pub fn insert_bucket_policy(policy: &BucketPolicy<'_>) -> Result<SqlStatement> {
    let definition = fragment::expression("definition", policy.definition)?;

    Ok(SqlStatement::new(format!(
        "INSERT INTO storage.policies (name, bucket_id, operation, definition, role, created_at)\n\
         VALUES ({}, {}, {}, {}, {}, NOW())",
        quote_literal(policy.name),
        quote_literal(policy.bucket_id),
        policy.operation.code(),
        quote_literal(&definition),
        quote_literal(policy.role),
    )))
}

pub fn update_bucket_policy(bucket_id: &str, name: &str, definition: &str) -> Result<SqlStatement> {
    let definition = fragment::expression("definition", definition)?;

    Ok(SqlStatement::new(format!(
        "UPDATE storage.policies SET definition = {}, updated_at = NOW() WHERE bucket_id = {} AND name = {}",
        quote_literal(&definition),
        quote_literal(bucket_id),
        quote_literal(name),
    )))
}

pub fn delete_bucket_policy(bucket_id: &str, name: &str) -> SqlStatement {
    SqlStatement::new(format!(
        "DELETE FROM storage.policies WHERE bucket_id = {} AND name = {}",
        quote_literal(bucket_id),
        quote_literal(name),
    ))
}
