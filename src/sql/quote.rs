//! Identifier and literal quoting for generated DuckDB SQL.
//!
//! Column names and filter values are arbitrary user data. Everything that
//! ends up in query text goes through one of these helpers.

use std::sync::LazyLock;

use regex::Regex;

static BARE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Whether `name` can be spliced into SQL without quoting.
pub fn is_bare_identifier(name: &str) -> bool {
    BARE_IDENTIFIER.is_match(name)
}

/// Quote an identifier for DuckDB.
///
/// Simple names (`^[A-Za-z_][A-Za-z0-9_]*$`) are returned unchanged. Anything
/// else, including the empty string, is wrapped in double quotes with embedded
/// double quotes doubled, so the result is always a single identifier token.
pub fn quote_identifier(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Quote a string literal (standard SQL single quotes).
pub fn quote_literal(value: impl AsRef<str>) -> String {
    format!("'{}'", value.as_ref().replace('\'', "''"))
}

/// Canonical text form of a value before it is quoted or hashed.
///
/// Strings are taken verbatim, numbers and booleans use their display form,
/// and a missing value becomes the empty string.
pub fn literal_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
