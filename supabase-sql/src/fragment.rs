//! Validation of caller-supplied SQL fragments
//!
//! Column types, default values and policy expressions cannot be passed as
//! parameters, so they are parsed and re-rendered from the syntax tree before
//! being embedded. Anything that is not exactly one type or one expression is
//! rejected.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;

use supabase_common::error::{Error, Result};

fn fragment_error(field: &'static str, err: &ParserError) -> Error {
    Error::InvalidSqlFragment {
        field,
        reason: err.to_string(),
    }
}

fn ensure_consumed(field: &'static str, parser: &Parser) -> Result<()> {
    match parser.peek_token().token {
        Token::EOF => Ok(()),
        other => Err(Error::InvalidSqlFragment {
            field,
            reason: format!("unexpected trailing input near '{other}'"),
        }),
    }
}

/// Parse a column data type and return its canonical rendering
pub fn data_type(field: &'static str, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::InvalidSqlFragment {
            field,
            reason: "empty type".to_string(),
        });
    }

    let dialect = PostgreSqlDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(text)
        .map_err(|e| fragment_error(field, &e))?;
    let parsed = parser
        .parse_data_type()
        .map_err(|e| fragment_error(field, &e))?;
    ensure_consumed(field, &parser)?;

    Ok(parsed.to_string())
}

/// Parse a scalar expression and return its canonical rendering
pub fn expression(field: &'static str, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::InvalidSqlFragment {
            field,
            reason: "empty expression".to_string(),
        });
    }

    let dialect = PostgreSqlDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(text)
        .map_err(|e| fragment_error(field, &e))?;
    let parsed = parser.parse_expr().map_err(|e| fragment_error(field, &e))?;
    ensure_consumed(field, &parser)?;

    Ok(parsed.to_string())
}

/// Render a JSON default value.
///
/// Strings are SQL expressions, numbers and booleans become literals, and
/// `null` or an empty string means no default.
pub fn default_value(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => expression("default_value", s).map(Some),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(if *b { "TRUE" } else { "FALSE" }.to_string())),
        Some(_) => Err(Error::InvalidSqlFragment {
            field: "default_value",
            reason: "expected a string, number or boolean".to_string(),
        }),
    }
}
