//! Catalog queries
//!
//! Read-only queries over `pg_catalog` used by the schema, policy and table
//! listing endpoints.

use crate::quote::quote_literal;
use crate::SqlStatement;

const COLUMN_CATALOG: &str = "SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  a.attname AS column_name,
  format_type(a.atttypid, a.atttypmod) AS data_type,
  a.attnotnull AS not_null,
  pg_get_expr(d.adbin, d.adrelid) AS default_value,
  COALESCE(co.contype = 'p', false) AS is_primary_key,
  COALESCE(co.contype = 'f', false) AS is_foreign_key,
  CASE WHEN co.contype = 'f' THEN ref_ns.nspname END AS reference_schema,
  CASE WHEN co.contype = 'f' THEN ref_class.relname END AS reference_table,
  CASE WHEN co.contype = 'f' THEN ref_attr.attname END AS reference_column
FROM pg_attribute a
JOIN pg_class c ON a.attrelid = c.oid
JOIN pg_namespace n ON c.relnamespace = n.oid
LEFT JOIN pg_attrdef d ON a.attrelid = d.adrelid AND a.attnum = d.adnum
LEFT JOIN pg_constraint co ON (
  co.conrelid = c.oid
  AND a.attnum = ANY(co.conkey)
  AND co.contype IN ('p', 'f')
)
LEFT JOIN pg_class ref_class ON co.confrelid = ref_class.oid
LEFT JOIN pg_namespace ref_ns ON ref_class.relnamespace = ref_ns.oid
LEFT JOIN pg_attribute ref_attr ON (
  ref_attr.attrelid = co.confrelid
  AND ref_attr.attnum = co.confkey[array_position(co.conkey, a.attnum)]
)
WHERE a.attnum > 0 AND NOT a.attisdropped AND c.relkind = 'r'";

const POLICY_CATALOG: &str = "SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  p.polname AS policy_name,
  CASE WHEN p.polpermissive THEN 'PERMISSIVE' ELSE 'RESTRICTIVE' END AS policy_type,
  CASE p.polcmd
    WHEN 'r' THEN 'SELECT'
    WHEN 'a' THEN 'INSERT'
    WHEN 'w' THEN 'UPDATE'
    WHEN 'd' THEN 'DELETE'
    WHEN '*' THEN 'ALL'
  END AS command,
  pg_get_expr(p.polqual, p.polrelid) AS expression,
  pg_get_expr(p.polwithcheck, p.polrelid) AS check_expression,
  ARRAY(
    SELECT CASE WHEN r.oid = 0 THEN 'public' ELSE pg_get_userbyid(r.oid)::text END
    FROM unnest(p.polroles) AS r(oid)
  ) AS roles
FROM pg_policy p
JOIN pg_class c ON p.polrelid = c.oid
JOIN pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1";

/// Column catalog for one schema, or for every non-system schema.
///
/// Rows deserialize into [`supabase_common::types::CatalogRow`].
pub fn database_schema(schema: Option<&str>) -> SqlStatement {
    let filter = match schema.filter(|s| !s.is_empty()) {
        Some(schema) => format!(" AND n.nspname = {}", quote_literal(schema)),
        None => " AND n.nspname NOT IN ('pg_catalog', 'information_schema')".to_string(),
    };

    SqlStatement::new(format!(
        "{COLUMN_CATALOG}{filter}\nORDER BY n.nspname, c.relname, a.attnum"
    ))
}

/// RLS policies of a schema, optionally narrowed to one table
pub fn rls_policies(schema: &str, table: Option<&str>) -> SqlStatement {
    const ORDER: &str = "\nORDER BY n.nspname, c.relname, p.polname";

    match table.filter(|t| !t.is_empty()) {
        Some(table) => SqlStatement::new(format!("{POLICY_CATALOG} AND c.relname = $2{ORDER}"))
            .bind(schema)
            .bind(table),
        None => SqlStatement::new(format!("{POLICY_CATALOG}{ORDER}")).bind(schema),
    }
}

/// `[{ table_name }]` rows for the tables of a schema
pub fn list_tables(schema: &str) -> SqlStatement {
    SqlStatement::new(format!(
        "SELECT tablename AS table_name FROM pg_tables WHERE schemaname = {}",
        quote_literal(schema)
    ))
}

/// `[{ tablename }]` rows for the tables of a schema
pub fn table_names(schema: &str) -> SqlStatement {
    SqlStatement::new(format!(
        "SELECT tablename FROM pg_tables WHERE schemaname = {}",
        quote_literal(schema)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_schema_filters() {
        let stmt = database_schema(Some("app"));
        assert!(stmt.query.contains("AND n.nspname = 'app'"));
        assert!(stmt.query.ends_with("ORDER BY n.nspname, c.relname, a.attnum"));

        let stmt = database_schema(None);
        assert!(stmt
            .query
            .contains("NOT IN ('pg_catalog', 'information_schema')"));
    }

    #[test]
    fn test_database_schema_quotes_literal() {
        let stmt = database_schema(Some("x' OR '1'='1"));
        assert!(stmt.query.contains("n.nspname = 'x'' OR ''1''=''1'"));
    }

    #[test]
    fn test_rls_policies_params() {
        let stmt = rls_policies("public", None);
        assert_eq!(stmt.params, vec![serde_json::json!("public")]);
        assert!(!stmt.query.contains("$2"));

        let stmt = rls_policies("public", Some("posts"));
        assert_eq!(
            stmt.params,
            vec![serde_json::json!("public"), serde_json::json!("posts")]
        );
        assert!(stmt.query.contains("c.relname = $2"));
    }

    #[test]
    fn test_list_tables_queries() {
        assert_eq!(
            list_tables("public").query,
            "SELECT tablename AS table_name FROM pg_tables WHERE schemaname = 'public'"
        );
        assert_eq!(
            table_names("app").query,
            "SELECT tablename FROM pg_tables WHERE schemaname = 'app'"
        );
    }
}
