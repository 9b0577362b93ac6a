//! Read-only guard for caller-supplied SQL

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use supabase_common::error::{Error, Result};

const REJECTION: &str =
    "Only read-only queries are allowed through this endpoint for security reasons";

/// Whether `sql` is a single read-only query.
///
/// The text must parse as exactly one statement, that statement must be a
/// query, and every query body reachable from it (set operations, nested
/// queries, CTEs) must be a plain `SELECT` or `VALUES` without `INTO` or a
/// row-locking clause.
///
/// Function calls are not analysed: a `SELECT` invoking a function with side
/// effects (`pg_terminate_backend`, `set_config`, a user-defined procedure)
/// still passes.
pub fn is_read_only_query(sql: &str) -> bool {
    let dialect = PostgreSqlDialect {};
    let statements = match Parser::parse_sql(&dialect, sql) {
        Ok(statements) => statements,
        Err(e) => {
            debug!("Rejecting unparseable query: {}", e);
            return false;
        }
    };

    match statements.as_slice() {
        [Statement::Query(query)] => query_is_read_only(query),
        _ => false,
    }
}

/// Fail with `Forbidden` unless `sql` is read-only
pub fn ensure_read_only(sql: &str) -> Result<()> {
    if is_read_only_query(sql) {
        Ok(())
    } else {
        Err(Error::Forbidden(REJECTION.to_string()))
    }
}

fn query_is_read_only(query: &Query) -> bool {
    if !query.locks.is_empty() {
        return false;
    }

    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query)));

    ctes_read_only && set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_none(),
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        SetExpr::Values(_) => true,
        _ => false,
    }
}
