//! TypeScript interface generation

use std::fmt::Write as _;

use supabase_common::types::SchemaTable;

/// `snake_case` to `PascalCase`; empty segments are dropped
pub fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// TypeScript type for a PostgreSQL `data_type` name
pub fn ts_type(data_type: &str) -> &'static str {
    match data_type.to_ascii_lowercase().as_str() {
        "integer" | "numeric" | "decimal" | "real" | "double precision" | "smallint"
        | "bigint" => "number",
        "text" | "character varying" | "character" | "varchar" | "char" | "uuid" | "date"
        | "time" | "timestamp" | "timestamptz" => "string",
        "boolean" => "boolean",
        "json" | "jsonb" => "Record<string, any>",
        "array" => "any[]",
        _ => "any",
    }
}

fn header(schema: &str) -> String {
    format!("// TypeScript types for schema: {schema}\n\n")
}

/// Interfaces with one property per column; nullable columns are optional
pub fn render_interfaces(schema: &str, tables: &[SchemaTable]) -> String {
    let mut out = header(schema);

    for table in tables {
        let _ = writeln!(out, "export interface {} {{", to_pascal_case(&table.table_name));
        for column in &table.columns {
            let optional = if column.is_nullable == "YES" { "?" } else { "" };
            let _ = writeln!(
                out,
                "  {}{}: {};",
                column.column_name,
                optional,
                ts_type(&column.data_type)
            );
        }
        out.push_str("}\n\n");
    }

    out
}

/// Interfaces for tables whose columns are unknown
pub fn render_placeholders<S: AsRef<str>>(schema: &str, table_names: &[S]) -> String {
    let mut out = header(schema);

    for name in table_names {
        let _ = writeln!(out, "export interface {} {{", to_pascal_case(name.as_ref()));
        out.push_str("  // column details unavailable\n");
        out.push_str("  id: string;\n");
        out.push_str("  created_at?: string;\n");
        out.push_str("}\n\n");
    }

    out
}
