//! Whole-schema introspection.
//!
//! Everything the classifier needs is loaded up front in a handful of
//! information-schema queries, so relationship inference runs against an
//! in-memory snapshot instead of issuing per-table lookups.

use crate::client::{DbClient, RowExt};
use crate::error::{SchemaError, SchemaResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub ordinal: i32,
}

/// A foreign key declared on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub constraint: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<ColumnInfo>,
    /// Primary key column names, in constraint order.
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Columns covered by a single-column UNIQUE constraint.
    pub unique_columns: Vec<String>,
}

impl TableInfo {
    /// A pivot table has a composite primary key and no surrogate `id` column
    /// inside it.
    pub fn is_pivot(&self) -> bool {
        self.primary_key.len() > 1
            && !self.primary_key.iter().any(|c| c.eq_ignore_ascii_case("id"))
    }

    pub fn column_is_unique(&self, column: &str) -> bool {
        self.unique_columns.iter().any(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    /// Foreign keys whose local column is part of the primary key.
    pub fn primary_key_foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(|fk| self.primary_key.iter().any(|pk| *pk == fk.column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSchema {
    pub schema: String,
    pub tables: Vec<TableInfo>,
}

impl DbSchema {
    pub fn find_table(&self, table: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == table)
    }

    /// Foreign keys that reference the given table, paired with the table
    /// declaring them.
    ///
    /// The declaring table may be the referenced table itself: a
    /// self-referencing key shows up here too, so the reverse side of a
    /// parent/child column is not lost.
    pub fn external_foreign_keys<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = (&'a TableInfo, &'a ForeignKey)> {
        self.tables.iter().flat_map(move |t| {
            t.foreign_keys
                .iter()
                .filter(move |fk| fk.referenced_table == table)
                .map(move |fk| (t, fk))
        })
    }
}

const COLUMNS_SQL: &str = r#"
SELECT c.table_name, c.column_name, c.data_type, c.is_nullable, c.ordinal_position
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE'
ORDER BY c.table_name, c.ordinal_position
"#;

const COMMENTS_SQL: &str = r#"
SELECT c.relname AS table_name, obj_description(c.oid, 'pg_class') AS comment
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')
"#;

const PRIMARY_KEYS_SQL: &str = r#"
SELECT kcu.table_name, kcu.column_name
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON kcu.constraint_schema = tc.constraint_schema
 AND kcu.constraint_name = tc.constraint_name
WHERE tc.table_schema = $1 AND tc.constraint_type = 'PRIMARY KEY'
ORDER BY kcu.table_name, kcu.ordinal_position
"#;

const FOREIGN_KEYS_SQL: &str = r#"
SELECT
  tc.constraint_name,
  kcu.table_name,
  kcu.column_name,
  ccu.table_name AS referenced_table,
  ccu.column_name AS referenced_column
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON kcu.constraint_schema = tc.constraint_schema
 AND kcu.constraint_name = tc.constraint_name
JOIN information_schema.constraint_column_usage ccu
  ON ccu.constraint_schema = tc.constraint_schema
 AND ccu.constraint_name = tc.constraint_name
WHERE tc.table_schema = $1 AND tc.constraint_type = 'FOREIGN KEY'
ORDER BY kcu.table_name, tc.constraint_name, kcu.ordinal_position
"#;

const UNIQUE_COLUMNS_SQL: &str = r#"
SELECT kcu.table_name, min(kcu.column_name) AS column_name
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON kcu.constraint_schema = tc.constraint_schema
 AND kcu.constraint_name = tc.constraint_name
WHERE tc.table_schema = $1 AND tc.constraint_type = 'UNIQUE'
GROUP BY kcu.table_name, tc.constraint_name
HAVING count(*) = 1
"#;

/// Load every base table of the selected schema, with columns, comments and
/// key metadata.
pub async fn load_schema_from_db<C: DbClient>(client: &C, schema: &str) -> SchemaResult<DbSchema> {
    let mut tables: BTreeMap<String, TableInfo> = BTreeMap::new();

    for row in client.query(COLUMNS_SQL, &[&schema]).await? {
        let table_name: String = row.try_get_column("table_name")?;
        let column_name: String = row.try_get_column("column_name")?;
        let data_type: String = row.try_get_column("data_type")?;
        let is_nullable: String = row.try_get_column("is_nullable")?;
        let ordinal: i32 = row.try_get_column("ordinal_position")?;

        let table = tables.entry(table_name.clone()).or_insert_with(|| TableInfo {
            name: table_name,
            comment: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            unique_columns: Vec::new(),
        });

        table.columns.push(ColumnInfo {
            name: column_name,
            data_type,
            not_null: is_nullable == "NO",
            ordinal,
        });
    }

    if tables.is_empty() {
        return Err(SchemaError::Validation(format!(
            "no tables found in schema {schema}"
        )));
    }

    for row in client.query(COMMENTS_SQL, &[&schema]).await? {
        let table_name: String = row.try_get_column("table_name")?;
        let comment: Option<String> = row
            .try_get::<_, Option<String>>("comment")
            .map_err(|e| SchemaError::decode("comment", e.to_string()))?;
        if let Some(table) = tables.get_mut(&table_name) {
            table.comment = comment.filter(|c| !c.trim().is_empty());
        }
    }

    for row in client.query(PRIMARY_KEYS_SQL, &[&schema]).await? {
        let table_name: String = row.try_get_column("table_name")?;
        let column_name: String = row.try_get_column("column_name")?;
        if let Some(table) = tables.get_mut(&table_name) {
            table.primary_key.push(column_name);
        }
    }

    for row in client.query(FOREIGN_KEYS_SQL, &[&schema]).await? {
        let table_name: String = row.try_get_column("table_name")?;
        let fk = ForeignKey {
            constraint: row.try_get_column("constraint_name")?,
            column: row.try_get_column("column_name")?,
            referenced_table: row.try_get_column("referenced_table")?,
            referenced_column: row.try_get_column("referenced_column")?,
        };
        if let Some(table) = tables.get_mut(&table_name) {
            // Composite foreign keys come back as one row per column pair;
            // the classifier only handles single-column keys, so extra rows
            // of the same constraint are dropped here.
            if !table.foreign_keys.iter().any(|f| f.constraint == fk.constraint) {
                table.foreign_keys.push(fk);
            }
        }
    }

    for row in client.query(UNIQUE_COLUMNS_SQL, &[&schema]).await? {
        let table_name: String = row.try_get_column("table_name")?;
        let column_name: String = row.try_get_column("column_name")?;
        if let Some(table) = tables.get_mut(&table_name) {
            if !table.unique_columns.contains(&column_name) {
                table.unique_columns.push(column_name);
            }
        }
    }

    Ok(DbSchema {
        schema: schema.to_string(),
        tables: tables.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, pk: &[&str]) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            comment: None,
            columns: Vec::new(),
            primary_key: pk.iter().map(|s| s.to_string()).collect(),
            foreign_keys: Vec::new(),
            unique_columns: Vec::new(),
        }
    }

    #[test]
    fn pivot_requires_composite_key_without_id() {
        assert!(table("role_user", &["role_id", "user_id"]).is_pivot());
        assert!(!table("users", &["id"]).is_pivot());
        assert!(!table("odd", &["id", "other"]).is_pivot());
        assert!(!table("odd", &["ID", "other"]).is_pivot());
        assert!(!table("single", &["user_id"]).is_pivot());
    }

    #[test]
    fn external_foreign_keys_find_referencing_tables() {
        let mut posts = table("posts", &["id"]);
        posts.foreign_keys.push(ForeignKey {
            constraint: "posts_user_id_fkey".to_string(),
            column: "user_id".to_string(),
            referenced_table: "users".to_string(),
            referenced_column: "id".to_string(),
        });
        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![table("users", &["id"]), posts],
        };

        let hits: Vec<_> = schema.external_foreign_keys("users").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "posts");
        assert_eq!(hits[0].1.column, "user_id");
        assert!(schema.external_foreign_keys("posts").next().is_none());
    }

    #[test]
    fn self_referencing_keys_are_included() {
        let mut categories = table("categories", &["id"]);
        categories.foreign_keys.push(ForeignKey {
            constraint: "categories_parent_id_fkey".to_string(),
            column: "parent_id".to_string(),
            referenced_table: "categories".to_string(),
            referenced_column: "id".to_string(),
        });
        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![categories],
        };

        let hits: Vec<_> = schema.external_foreign_keys("categories").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "categories");
        assert_eq!(hits[0].1.column, "parent_id");
    }
}
