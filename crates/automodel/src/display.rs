//! Coarse display categories for Postgres column types.
//!
//! Model doc comments describe each column with a reader-facing category
//! rather than a concrete Rust type, so the mapping here is deliberately
//! lossy: anything not recognized falls back to `string`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayType {
    String,
    Integer,
    Boolean,
    Double,
    Date,
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Double => "double",
            Self::Date => "date",
        };
        f.write_str(s)
    }
}

/// Normalized Postgres type names per category. The defaults cover stock
/// Postgres; config can extend each list for custom or domain types.
#[derive(Debug, Clone)]
pub struct TypeCategories {
    pub integer: Vec<String>,
    pub double: Vec<String>,
    pub boolean: Vec<String>,
    pub date: Vec<String>,
}

impl Default for TypeCategories {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            integer: list(&[
                "int2", "smallint", "int4", "integer", "serial", "int8", "bigint", "bigserial",
            ]),
            double: list(&["float4", "real", "float8", "double precision", "numeric", "decimal"]),
            boolean: list(&["bool", "boolean"]),
            date: list(&[
                "date",
                "timestamp",
                "timestamp without time zone",
                "timestamptz",
            ]),
        }
    }
}

impl TypeCategories {
    /// Extend the default lists with extra normalized type names.
    pub fn with_extras(
        integer: &[String],
        double: &[String],
        boolean: &[String],
        date: &[String],
    ) -> Self {
        let mut categories = Self::default();
        categories.integer.extend(integer.iter().map(|s| normalize_pg_type(s)));
        categories.double.extend(double.iter().map(|s| normalize_pg_type(s)));
        categories.boolean.extend(boolean.iter().map(|s| normalize_pg_type(s)));
        categories.date.extend(date.iter().map(|s| normalize_pg_type(s)));
        categories
    }

    pub fn display_type(&self, pg_type: &str) -> DisplayType {
        let normalized = normalize_pg_type(pg_type);
        let has = |list: &[String]| list.iter().any(|t| *t == normalized);

        if has(&self.integer) {
            DisplayType::Integer
        } else if has(&self.double) {
            DisplayType::Double
        } else if has(&self.boolean) {
            DisplayType::Boolean
        } else if has(&self.date) {
            DisplayType::Date
        } else {
            DisplayType::String
        }
    }
}

/// Lowercase, strip `(...)` typmods, compress spaces, fold common synonyms.
pub fn normalize_pg_type(pg_type: &str) -> String {
    let mut s = pg_type.trim().to_lowercase();

    // `varchar(255)`, `timestamp(3) with time zone`, `numeric(10,2)`, ...
    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let s = s
        .split_whitespace()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match s.as_str() {
        "character varying" => "varchar".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pg_type_strips_typmods() {
        assert_eq!(normalize_pg_type("character varying(255)"), "varchar");
        assert_eq!(
            normalize_pg_type("timestamp(3) with time zone"),
            "timestamptz"
        );
        assert_eq!(normalize_pg_type("NUMERIC(10,2)"), "numeric");
    }

    #[test]
    fn default_categories() {
        let cats = TypeCategories::default();
        assert_eq!(cats.display_type("bigint"), DisplayType::Integer);
        assert_eq!(cats.display_type("numeric(10,2)"), DisplayType::Double);
        assert_eq!(cats.display_type("boolean"), DisplayType::Boolean);
        assert_eq!(cats.display_type("timestamp with time zone"), DisplayType::Date);
        assert_eq!(cats.display_type("uuid"), DisplayType::String);
        assert_eq!(cats.display_type("text"), DisplayType::String);
    }

    #[test]
    fn extras_extend_the_defaults() {
        let cats = TypeCategories::with_extras(
            &["custom_int(4)".to_string()],
            &[],
            &[],
            &["custom_ts".to_string()],
        );
        assert_eq!(cats.display_type("custom_int"), DisplayType::Integer);
        assert_eq!(cats.display_type("custom_ts"), DisplayType::Date);
        assert_eq!(cats.display_type("integer"), DisplayType::Integer);
    }

    #[test]
    fn display_renders_lowercase_names() {
        assert_eq!(DisplayType::Integer.to_string(), "integer");
        assert_eq!(DisplayType::String.to_string(), "string");
    }
}
