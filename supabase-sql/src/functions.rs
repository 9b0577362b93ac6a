//! Statements over the `edge_functions` table

use crate::quote::quote_literal;
use crate::SqlStatement;

fn json_literal(value: &serde_json::Value) -> String {
    format!("{}::jsonb", quote_literal(&value.to_string()))
}

pub fn select_functions(name: Option<&str>) -> SqlStatement {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => SqlStatement::new(format!(
            "SELECT * FROM edge_functions WHERE name = {}",
            quote_literal(name)
        )),
        None => SqlStatement::new("SELECT * FROM edge_functions"),
    }
}

pub fn insert_function(
    name: &str,
    code: &str,
    verify_jwt: bool,
    import_map: &serde_json::Value,
) -> SqlStatement {
    SqlStatement::new(format!(
        "INSERT INTO edge_functions (name, code, verify_jwt, import_map, created_at, updated_at)\n\
         VALUES ({}, {}, {verify_jwt}, {}, NOW(), NOW())",
        quote_literal(name),
        quote_literal(code),
        json_literal(import_map),
    ))
}

/// Replace the code, and `verify_jwt` / `import_map` when given
pub fn update_function(
    name: &str,
    code: &str,
    verify_jwt: Option<bool>,
    import_map: Option<&serde_json::Value>,
) -> SqlStatement {
    let mut sql = format!("UPDATE edge_functions SET code = {}", quote_literal(code));

    if let Some(verify_jwt) = verify_jwt {
        sql.push_str(&format!(", verify_jwt = {verify_jwt}"));
    }
    if let Some(import_map) = import_map.filter(|m| !m.is_null()) {
        sql.push_str(&format!(", import_map = {}", json_literal(import_map)));
    }

    sql.push_str(&format!(", updated_at = NOW() WHERE name = {}", quote_literal(name)));
    SqlStatement::new(sql)
}

pub fn delete_function(name: &str) -> SqlStatement {
    SqlStatement::new(format!(
        "DELETE FROM edge_functions WHERE name = {}",
        quote_literal(name)
    ))
}
