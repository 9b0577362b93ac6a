//! DDL builders for tables, schemas and RLS policies

use supabase_common::error::{Error, Result};
use supabase_common::types::{ColumnDefinition, PolicyOperation};

use crate::fragment;
use crate::quote::{qualified_table, quote_ident, quote_reference};
use crate::SqlStatement;

/// Render one column definition for `CREATE TABLE` / `ADD COLUMN`
fn column_sql(column: &ColumnDefinition, with_constraints: bool) -> Result<String> {
    if column.name.is_empty() {
        return Err(Error::ValidationError("Column name is required".to_string()));
    }

    let mut def = format!(
        "{} {}",
        quote_ident(&column.name),
        fragment::data_type("type", &column.data_type)?
    );

    if column.nullable == Some(false) {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = fragment::default_value(column.default_value.as_ref())? {
        def.push_str(" DEFAULT ");
        def.push_str(&default);
    }

    if with_constraints {
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if column.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(target) = &column.references {
            def.push_str(&format!(
                " REFERENCES {} ({})",
                quote_reference(&target.table),
                quote_ident(&target.column)
            ));
        }
    }

    Ok(def)
}

/// `CREATE TABLE`, optionally followed by enabling row level security
pub fn create_table(
    schema: &str,
    name: &str,
    columns: &[ColumnDefinition],
    enable_rls: bool,
) -> Result<SqlStatement> {
    let table = qualified_table(schema, name);

    let definitions = columns
        .iter()
        .map(|c| column_sql(c, true).map(|def| format!("  {def}")))
        .collect::<Result<Vec<_>>>()?;

    let mut sql = format!("CREATE TABLE {table} (\n{}\n)", definitions.join(",\n"));
    if enable_rls {
        sql.push_str(&format!(";\nALTER TABLE {table} ENABLE ROW LEVEL SECURITY"));
    }

    Ok(SqlStatement::new(sql))
}

/// Requested changes to an existing table
#[derive(Debug, Clone, Default)]
pub struct TableAlteration<'a> {
    pub new_name: Option<&'a str>,
    pub add_columns: &'a [ColumnDefinition],
    pub drop_columns: &'a [String],
    pub enable_rls: Option<bool>,
}

/// One statement per change, in the order rename, add, drop, RLS toggle
pub fn alter_table(
    schema: &str,
    name: &str,
    changes: &TableAlteration<'_>,
) -> Result<Vec<SqlStatement>> {
    let table = qualified_table(schema, name);
    let mut statements = Vec::new();

    if let Some(new_name) = changes.new_name.filter(|n| !n.is_empty()) {
        statements.push(SqlStatement::new(format!(
            "ALTER TABLE {table} RENAME TO {}",
            quote_ident(new_name)
        )));
    }

    for column in changes.add_columns {
        statements.push(SqlStatement::new(format!(
            "ALTER TABLE {table} ADD COLUMN {}",
            column_sql(column, false)?
        )));
    }

    for column in changes.drop_columns {
        statements.push(SqlStatement::new(format!(
            "ALTER TABLE {table} DROP COLUMN {}",
            quote_ident(column)
        )));
    }

    match changes.enable_rls {
        Some(true) => statements.push(SqlStatement::new(format!(
            "ALTER TABLE {table} ENABLE ROW LEVEL SECURITY"
        ))),
        Some(false) => statements.push(SqlStatement::new(format!(
            "ALTER TABLE {table} DISABLE ROW LEVEL SECURITY"
        ))),
        None => {}
    }

    Ok(statements)
}

pub fn drop_table(schema: &str, name: &str, cascade: bool) -> SqlStatement {
    let mut sql = format!("DROP TABLE IF EXISTS {}", qualified_table(schema, name));
    if cascade {
        sql.push_str(" CASCADE");
    }
    SqlStatement::new(sql)
}

pub fn create_schema(name: &str) -> SqlStatement {
    SqlStatement::new(format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(name)))
}

pub fn drop_schema(name: &str, cascade: bool) -> SqlStatement {
    let mut sql = format!("DROP SCHEMA IF EXISTS {}", quote_ident(name));
    if cascade {
        sql.push_str(" CASCADE");
    }
    SqlStatement::new(sql)
}

/// RLS policy to be created
#[derive(Debug, Clone)]
pub struct PolicyDefinition<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub name: &'a str,
    pub operation: PolicyOperation,
    pub definition: &'a str,
    pub check: Option<&'a str>,
    pub role: &'a str,
}

fn role_sql(role: &str) -> String {
    if role.eq_ignore_ascii_case("public") {
        "PUBLIC".to_string()
    } else {
        quote_ident(role)
    }
}

fn create_policy_sql(policy: &PolicyDefinition<'_>) -> Result<String> {
    let definition = fragment::expression("definition", policy.definition)?;
    let check = policy
        .check
        .filter(|c| !c.trim().is_empty())
        .map(|c| fragment::expression("check", c))
        .transpose()?;

    let mut sql = format!(
        "CREATE POLICY {} ON {} FOR {} TO {}",
        quote_ident(policy.name),
        qualified_table(policy.schema, policy.table),
        policy.operation.as_sql(),
        role_sql(policy.role)
    );

    // INSERT policies only take WITH CHECK; the definition serves as the check
    // unless an explicit one was given.
    if policy.operation == PolicyOperation::Insert {
        sql.push_str(&format!(" WITH CHECK ({})", check.unwrap_or(definition)));
        return Ok(sql);
    }

    sql.push_str(&format!(" USING ({definition})"));
    if let Some(check) = check.filter(|_| policy.operation.accepts_check()) {
        sql.push_str(&format!(" WITH CHECK ({check})"));
    }

    Ok(sql)
}

fn drop_policy_sql(schema: &str, table: &str, name: &str) -> String {
    format!(
        "DROP POLICY IF EXISTS {} ON {}",
        quote_ident(name),
        qualified_table(schema, table)
    )
}

pub fn create_policy(policy: &PolicyDefinition<'_>) -> Result<SqlStatement> {
    create_policy_sql(policy).map(SqlStatement::new)
}

/// Drop and recreate a policy in a single statement batch.
///
/// `execute_sql` runs the batch inside one transaction, so a failing
/// `CREATE POLICY` leaves the old policy in place.
pub fn replace_policy(policy: &PolicyDefinition<'_>) -> Result<SqlStatement> {
    let create = create_policy_sql(policy)?;
    Ok(SqlStatement::new(format!(
        "{};\n{}",
        drop_policy_sql(policy.schema, policy.table, policy.name),
        create
    )))
}

pub fn drop_policy(schema: &str, table: &str, name: &str) -> SqlStatement {
    SqlStatement::new(drop_policy_sql(schema, table, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(operation: PolicyOperation, check: Option<&'static str>) -> PolicyDefinition<'static> {
        PolicyDefinition {
            schema: "public",
            table: "posts",
            name: "owner access",
            operation,
            definition: "auth.uid() = author_id",
            check,
            role: "authenticated",
        }
    }

    #[test]
    fn test_create_table_sql() {
        let columns = vec![
            ColumnDefinition::new("id", "uuid")
                .primary_key()
                .with_default("gen_random_uuid()"),
            ColumnDefinition::new("title", "text").not_null(),
            ColumnDefinition::new("author_id", "uuid").references("auth.users", "id"),
        ];

        let stmt = create_table("public", "posts", &columns, true).unwrap();
        let sql = stmt.query;

        assert!(sql.starts_with("CREATE TABLE \"public\".\"posts\" (\n"));
        assert!(sql.contains("\"id\" UUID DEFAULT gen_random_uuid() PRIMARY KEY"));
        assert!(sql.contains("\"title\" TEXT NOT NULL"));
        assert!(sql.contains("REFERENCES \"auth\".\"users\" (\"id\")"));
        assert!(sql.ends_with(";\nALTER TABLE \"public\".\"posts\" ENABLE ROW LEVEL SECURITY"));
    }

    #[test]
    fn test_create_table_rejects_bad_type() {
        let columns = vec![ColumnDefinition::new("id", "int); DROP TABLE users; --")];
        assert!(create_table("public", "t", &columns, false).is_err());
    }

    #[test]
    fn test_alter_table_order() {
        let add = vec![ColumnDefinition::new("bio", "text").not_null().with_default("''")];
        let drop = vec!["legacy".to_string()];
        let changes = TableAlteration {
            new_name: Some("members"),
            add_columns: &add,
            drop_columns: &drop,
            enable_rls: Some(false),
        };

        let statements = alter_table("public", "users", &changes).unwrap();
        assert_eq!(statements.len(), 4);
        assert_eq!(
            statements[0].query,
            "ALTER TABLE \"public\".\"users\" RENAME TO \"members\""
        );
        assert!(statements[1].query.starts_with("ALTER TABLE \"public\".\"users\" ADD COLUMN \"bio\" TEXT NOT NULL DEFAULT"));
        assert_eq!(
            statements[2].query,
            "ALTER TABLE \"public\".\"users\" DROP COLUMN \"legacy\""
        );
        assert_eq!(
            statements[3].query,
            "ALTER TABLE \"public\".\"users\" DISABLE ROW LEVEL SECURITY"
        );
    }

    #[test]
    fn test_alter_table_without_changes() {
        let statements = alter_table("public", "users", &TableAlteration::default()).unwrap();
        assert!(statements.is_empty());
    }

    #[test]
    fn test_drop_statements() {
        assert_eq!(
            drop_table("public", "users", true).query,
            "DROP TABLE IF EXISTS \"public\".\"users\" CASCADE"
        );
        assert_eq!(create_schema("audit").query, "CREATE SCHEMA IF NOT EXISTS \"audit\"");
        assert_eq!(drop_schema("audit", false).query, "DROP SCHEMA IF EXISTS \"audit\"");
    }

    #[test]
    fn test_select_policy_ignores_check() {
        let sql = create_policy(&policy(PolicyOperation::Select, Some("true")))
            .unwrap()
            .query;
        assert!(sql.starts_with(
            "CREATE POLICY \"owner access\" ON \"public\".\"posts\" FOR SELECT TO \"authenticated\" USING ("
        ));
        assert!(!sql.contains("WITH CHECK"));
    }

    #[test]
    fn test_update_policy_has_check() {
        let sql = create_policy(&policy(PolicyOperation::Update, Some("auth.uid() = author_id")))
            .unwrap()
            .query;
        assert!(sql.contains(" USING ("));
        assert!(sql.contains(" WITH CHECK ("));
    }

    #[test]
    fn test_insert_policy_uses_check_only() {
        let sql = create_policy(&policy(PolicyOperation::Insert, None)).unwrap().query;
        assert!(!sql.contains("USING"));
        assert!(sql.contains("FOR INSERT"));
        assert!(sql.contains("WITH CHECK ("));
    }

    #[test]
    fn test_public_role_is_keyword() {
        let mut p = policy(PolicyOperation::All, None);
        p.role = "public";
        assert!(create_policy(&p).unwrap().query.contains(" TO PUBLIC "));
    }

    #[test]
    fn test_replace_policy_is_one_batch() {
        let sql = replace_policy(&policy(PolicyOperation::All, None)).unwrap().query;
        let (drop, create) = sql.split_once(";\n").unwrap();
        assert_eq!(
            drop,
            "DROP POLICY IF EXISTS \"owner access\" ON \"public\".\"posts\""
        );
        assert!(create.starts_with("CREATE POLICY"));
    }

    #[test]
    fn test_policy_rejects_injected_definition() {
        let mut p = policy(PolicyOperation::Select, None);
        p.definition = "true); DROP TABLE posts; --";
        assert!(create_policy(&p).is_err());
    }
}
