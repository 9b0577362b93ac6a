//! Identifier and literal quoting

/// Quote an identifier, doubling embedded double quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded single quotes.
///
/// Assumes `standard_conforming_strings = on` (the default since PostgreSQL 9.1),
/// so backslashes need no escaping.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `"schema"."table"`
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Quote a possibly schema-qualified reference such as `auth.users`
pub fn quote_reference(reference: &str) -> String {
    match reference.split_once('.') {
        Some((schema, table)) if !schema.is_empty() && !table.is_empty() => {
            qualified_table(schema, table)
        }
        _ => quote_ident(reference),
    }
}

/// `ARRAY['a','b']::text[]`, or `NULL`
pub fn text_array(values: Option<&[String]>) -> String {
    match values {
        Some(values) => {
            let items: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
            format!("ARRAY[{}]::text[]", items.join(", "))
        }
        None => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("x'; DROP TABLE t; --"), "'x''; DROP TABLE t; --'");
    }

    #[test]
    fn test_quote_reference() {
        assert_eq!(quote_reference("users"), "\"users\"");
        assert_eq!(quote_reference("auth.users"), "\"auth\".\"users\"");
        assert_eq!(quote_reference(".users"), "\".users\"");
    }

    #[test]
    fn test_text_array() {
        let types = vec!["image/png".to_string(), "image/jpeg".to_string()];
        assert_eq!(
            text_array(Some(&types)),
            "ARRAY['image/png', 'image/jpeg']::text[]"
        );
        assert_eq!(text_array(None), "NULL");
    }
}
