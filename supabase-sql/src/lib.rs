//! SQL Builders for the Supabase Admin Gateway
//!
//! Everything the gateway sends through the `execute_sql` procedure is
//! assembled here:
//! - identifier and literal quoting
//! - validation of caller-supplied fragments (types, defaults, policy expressions)
//! - the read-only guard for caller-supplied queries
//! - DDL for tables, schemas and RLS policies
//! - DML for storage buckets, bucket policies and edge functions
//! - TypeScript interface generation from catalog data

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod ddl;
pub mod fragment;
pub mod functions;
pub mod guard;
pub mod quote;
pub mod storage;
pub mod typescript;

use serde::Serialize;

pub use guard::{ensure_read_only, is_read_only_query};
pub use quote::{qualified_table, quote_ident, quote_literal};
pub use typescript::to_pascal_case;

/// A statement ready for the `execute_sql` procedure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    pub query: String,
    /// Positional parameters (`$1`, `$2`, ...); omitted from the payload when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<serde_json::Value>,
}

impl SqlStatement {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Vec::new(),
        }
    }

    /// Append a positional parameter
    #[must_use]
    pub fn bind(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Arguments object for the `execute_sql` procedure
    pub fn to_rpc_args(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "query": self.query }))
    }
}

impl std::fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.query)
    }
}
