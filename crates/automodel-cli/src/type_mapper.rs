use automodel::normalize_pg_type;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct TypeMapper {
    /// User overrides from `[models.types]` (normalized PG type -> Rust path/type).
    custom: BTreeMap<String, String>,
}

impl TypeMapper {
    pub fn new(custom: BTreeMap<String, String>) -> Self {
        let mut normalized = BTreeMap::new();
        for (k, v) in custom {
            normalized.insert(normalize_pg_type(&k), v);
        }
        Self { custom: normalized }
    }

    pub fn map(&self, pg_type: &str) -> String {
        let normalized = normalize_pg_type(pg_type);

        if let Some(t) = self.custom.get(&normalized) {
            return t.clone();
        }

        // Arrays come back as `integer[]`, `uuid[]`, etc.
        if let Some(base) = normalized.strip_suffix("[]") {
            let inner = self.map(base);
            return format!("Vec<{inner}>");
        }

        match normalized.as_str() {
            "bool" | "boolean" => "bool".to_string(),

            "int2" | "smallint" => "i16".to_string(),
            "int4" | "integer" | "serial" => "i32".to_string(),
            "int8" | "bigint" | "bigserial" => "i64".to_string(),

            "float4" | "real" => "f32".to_string(),
            "float8" | "double precision" => "f64".to_string(),

            "text" | "varchar" | "character varying" | "char" | "character" | "name" => {
                "String".to_string()
            }

            "uuid" => "uuid::Uuid".to_string(),
            "json" | "jsonb" => "serde_json::Value".to_string(),

            "timestamptz" | "timestamp with time zone" => {
                "chrono::DateTime<chrono::Utc>".to_string()
            }
            "timestamp" | "timestamp without time zone" => "chrono::NaiveDateTime".to_string(),
            "date" => "chrono::NaiveDate".to_string(),
            "time" | "time without time zone" => "chrono::NaiveTime".to_string(),

            "bytea" => "Vec<u8>".to_string(),

            // Conservative default (compiles; user can override for runtime correctness).
            _ => "String".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_builtin_types() {
        let m = TypeMapper::new(BTreeMap::new());
        assert_eq!(m.map("integer"), "i32");
        assert_eq!(m.map("character varying(255)"), "String");
        assert_eq!(m.map("uuid[]"), "Vec<uuid::Uuid>");
        assert_eq!(m.map("jsonb"), "serde_json::Value");
    }

    #[test]
    fn custom_mapping_overrides_builtin() {
        let mut custom = BTreeMap::new();
        custom.insert("uuid".to_string(), "my::Uuid".to_string());
        let m = TypeMapper::new(custom);
        assert_eq!(m.map("uuid"), "my::Uuid");
        assert_eq!(m.map("uuid[]"), "Vec<my::Uuid>");
    }
}
