//! Semantic type classes for engine-reported column types.
//!
//! `DESCRIBE` reports DuckDB type strings such as `BIGINT`, `DECIMAL(18,2)` or
//! `TIMESTAMP WITH TIME ZONE`. Filter generation only needs to know which
//! comparison semantics apply, so the raw string collapses to a [`TypeClass`].

use std::fmt;

/// Comparison semantics for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Integer, floating point, and decimal types.
    Numeric,
    /// Calendar date without time.
    Date,
    /// Time of day.
    Time,
    /// Timestamps of any precision, with or without time zone.
    Timestamp,
    /// BOOLEAN.
    Boolean,
    /// Everything else.
    Text,
}

const NUMERIC_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "INTEGER", "BIGINT", "HUGEINT", "UTINYINT", "USMALLINT", "UINTEGER",
    "UBIGINT", "REAL", "FLOAT", "DOUBLE", "DECIMAL",
];

const TIMESTAMP_TYPES: &[&str] = &[
    "TIMESTAMP",
    "TIMESTAMP_S",
    "TIMESTAMP_MS",
    "TIMESTAMP_NS",
    "TIMESTAMP_TZ",
    "TIMESTAMP WITH TIME ZONE",
];

impl TypeClass {
    /// Classify a raw engine type string. Never fails; unknown types are text.
    pub fn from_raw(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        let base = match upper.find('(') {
            Some(idx) => upper[..idx].trim(),
            None => upper.as_str(),
        };

        if NUMERIC_TYPES.contains(&base) {
            TypeClass::Numeric
        } else if base == "DATE" {
            TypeClass::Date
        } else if base == "TIME" {
            TypeClass::Time
        } else if TIMESTAMP_TYPES.contains(&base) {
            TypeClass::Timestamp
        } else if base == "BOOLEAN" {
            TypeClass::Boolean
        } else {
            TypeClass::Text
        }
    }

    /// The SQL type used when try-casting both sides of a comparison.
    pub fn cast_target(&self) -> Option<&'static str> {
        match self {
            TypeClass::Numeric => Some("DOUBLE"),
            TypeClass::Date => Some("DATE"),
            TypeClass::Time => Some("TIME"),
            TypeClass::Timestamp => Some("TIMESTAMP"),
            TypeClass::Boolean | TypeClass::Text => None,
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeClass::Numeric => "numeric",
            TypeClass::Date => "date",
            TypeClass::Time => "time",
            TypeClass::Timestamp => "timestamp",
            TypeClass::Boolean => "boolean",
            TypeClass::Text => "text",
        };
        f.write_str(name)
    }
}

/// Normalize a raw engine type string to its [`TypeClass`].
pub fn normalize_type(raw: &str) -> TypeClass {
    TypeClass::from_raw(raw)
}
