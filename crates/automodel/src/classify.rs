//! Relationship classification.
//!
//! Foreign-key metadata from an introspected [`DbSchema`] is sorted into the
//! four relationship kinds. The classifier is a pure function over the
//! snapshot: table-to-class naming is injected by the caller (the registry
//! may override class names) and nothing here talks to the database.

use crate::inflect::accessor_name;
use crate::introspect::{DbSchema, ForeignKey, TableInfo};
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::BelongsToMany => "belongs_to_many",
        }
    }

    /// Whether the accessor yields a collection of models.
    pub fn is_many(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }
}

/// Pivot-table details carried only by belongs-to-many relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotMeta {
    /// Extra pivot columns to expose, beyond the two key columns.
    pub columns: Vec<String>,
    /// The pivot carries both `created_at` and `updated_at`.
    pub with_timestamps: bool,
    /// The pivot carries `deleted_at`.
    pub soft_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Accessor name, before renames.
    pub name: String,
    pub kind: RelationKind,
    /// Target model class name.
    pub class: String,
    /// belongs-to: the referenced table; has-one/has-many: the referencing
    /// table; belongs-to-many: the pivot table.
    pub table: String,
    /// belongs-to: the referenced column; has-one/has-many: the referencing
    /// column; belongs-to-many: the pivot column pointing at this model.
    pub foreign_key: String,
    /// belongs-to: the local column; has-one/has-many: the referenced column;
    /// belongs-to-many: the pivot column pointing at the target model.
    pub other_key: String,
    pub pivot: Option<PivotMeta>,
}

/// Classify every foreign key touching `table` into a relationship.
///
/// `resolve_class` maps a table name to its model class name (registry
/// overrides first, inflection as the fallback).
pub fn classify_table(
    schema: &DbSchema,
    table: &TableInfo,
    resolve_class: &dyn Fn(&str) -> String,
) -> Vec<Relationship> {
    let mut relations = Vec::new();

    // Local foreign keys: this row points at a parent row.
    for fk in &table.foreign_keys {
        let class = resolve_class(&fk.referenced_table);
        relations.push(Relationship {
            name: accessor_name(&class, false),
            kind: RelationKind::BelongsTo,
            class,
            table: fk.referenced_table.clone(),
            foreign_key: fk.referenced_column.clone(),
            other_key: fk.column.clone(),
            pivot: None,
        });
    }

    // Foreign keys that point back at this table, including the table's own
    // self-references.
    for (other, fk) in schema.external_foreign_keys(&table.name) {
        if other.is_pivot() {
            if let Some(rel) = classify_pivot(other, fk, resolve_class) {
                relations.push(rel);
            }
        } else if other.column_is_unique(&fk.column) {
            let class = resolve_class(&other.name);
            relations.push(Relationship {
                name: accessor_name(&class, false),
                kind: RelationKind::HasOne,
                class,
                table: other.name.clone(),
                foreign_key: fk.column.clone(),
                other_key: fk.referenced_column.clone(),
                pivot: None,
            });
        } else {
            let class = resolve_class(&other.name);
            relations.push(Relationship {
                name: accessor_name(&class, true),
                kind: RelationKind::HasMany,
                class,
                table: other.name.clone(),
                foreign_key: fk.column.clone(),
                other_key: fk.referenced_column.clone(),
                pivot: None,
            });
        }
    }

    relations
}

/// Resolve the far side of a pivot table and build the belongs-to-many.
///
/// The other half must be exactly one primary-key foreign key on a different
/// column; zero or several candidates drop the relationship with a log line.
/// (Ambiguous pivots have no principled single answer, so dropping is the
/// documented policy rather than guessing.)
fn classify_pivot(
    pivot: &TableInfo,
    came_from: &ForeignKey,
    resolve_class: &dyn Fn(&str) -> String,
) -> Option<Relationship> {
    let candidates: Vec<&ForeignKey> = pivot
        .primary_key_foreign_keys()
        .filter(|fk| fk.column != came_from.column)
        .collect();

    let [target] = candidates.as_slice() else {
        warn!(
            pivot = %pivot.name,
            column = %came_from.column,
            candidates = candidates.len(),
            "could not resolve the far side of the pivot table, skipping this relationship"
        );
        return None;
    };

    let class = resolve_class(&target.referenced_table);
    let mut meta = PivotMeta::default();

    let mut has_created_at = false;
    let mut has_updated_at = false;
    for col in &pivot.columns {
        if col.name == came_from.column || col.name == target.column {
            continue;
        }
        match col.name.as_str() {
            "created_at" => has_created_at = true,
            "updated_at" => has_updated_at = true,
            "deleted_at" => meta.soft_delete = true,
            _ => meta.columns.push(col.name.clone()),
        }
    }

    if has_created_at && has_updated_at {
        meta.with_timestamps = true;
    } else {
        // Only one of the pair exists: surface it as a plain pivot column.
        if has_created_at {
            meta.columns.insert(0, "created_at".to_string());
        }
        if has_updated_at {
            meta.columns.insert(0, "updated_at".to_string());
        }
    }

    Some(Relationship {
        name: accessor_name(&class, true),
        kind: RelationKind::BelongsToMany,
        class,
        table: pivot.name.clone(),
        foreign_key: came_from.column.clone(),
        other_key: target.column.clone(),
        pivot: Some(meta),
    })
}

/// Accessor names that occur more than once, in first-occurrence order.
///
/// Collisions are reported, never resolved; generation proceeds and the
/// caller decides how loudly to complain.
pub fn find_collisions(relations: &[Relationship]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut collisions = Vec::new();

    for rel in relations {
        if !seen.insert(rel.name.as_str()) && reported.insert(rel.name.as_str()) {
            collisions.push(rel.name.clone());
        }
    }

    collisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflect::table_to_class;
    use crate::introspect::ColumnInfo;

    fn col(name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: "bigint".to_string(),
            not_null: true,
            ordinal: 0,
        }
    }

    fn fk(column: &str, referenced_table: &str, referenced_column: &str) -> ForeignKey {
        ForeignKey {
            constraint: format!("{column}_fkey"),
            column: column.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        }
    }

    fn table(name: &str, columns: &[&str], pk: &[&str]) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            comment: None,
            columns: columns.iter().map(|c| col(c)).collect(),
            primary_key: pk.iter().map(|s| s.to_string()).collect(),
            foreign_keys: Vec::new(),
            unique_columns: Vec::new(),
        }
    }

    fn resolve(t: &str) -> String {
        table_to_class(t)
    }

    #[test]
    fn local_foreign_key_is_belongs_to() {
        let mut posts = table("posts", &["id", "user_id"], &["id"]);
        posts.foreign_keys.push(fk("user_id", "users", "id"));
        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![table("users", &["id"], &["id"]), posts],
        };

        let rels = classify_table(&schema, schema.find_table("posts").unwrap(), &resolve);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].kind, RelationKind::BelongsTo);
        assert_eq!(rels[0].name, "user");
        assert_eq!(rels[0].table, "users");
        assert_eq!(rels[0].foreign_key, "id");
        assert_eq!(rels[0].other_key, "user_id");
    }

    #[test]
    fn unique_external_key_is_has_one_otherwise_has_many() {
        let mut profiles = table("profiles", &["id", "user_id"], &["id"]);
        profiles.foreign_keys.push(fk("user_id", "users", "id"));
        profiles.unique_columns.push("user_id".to_string());

        let mut posts = table("posts", &["id", "user_id"], &["id"]);
        posts.foreign_keys.push(fk("user_id", "users", "id"));

        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![table("users", &["id"], &["id"]), profiles, posts],
        };

        let rels = classify_table(&schema, schema.find_table("users").unwrap(), &resolve);
        let kinds: Vec<_> = rels.iter().map(|r| (r.table.as_str(), r.kind)).collect();
        assert!(kinds.contains(&("profiles", RelationKind::HasOne)));
        assert!(kinds.contains(&("posts", RelationKind::HasMany)));

        let has_one = rels.iter().find(|r| r.kind == RelationKind::HasOne).unwrap();
        assert_eq!(has_one.name, "profile");
        let has_many = rels.iter().find(|r| r.kind == RelationKind::HasMany).unwrap();
        assert_eq!(has_many.name, "posts");
    }

    #[test]
    fn pivot_external_key_is_belongs_to_many() {
        let mut pivot = table(
            "role_user",
            &["role_id", "user_id", "created_at", "updated_at", "expires_at"],
            &["role_id", "user_id"],
        );
        pivot.foreign_keys.push(fk("role_id", "roles", "id"));
        pivot.foreign_keys.push(fk("user_id", "users", "id"));

        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![
                table("users", &["id"], &["id"]),
                table("roles", &["id"], &["id"]),
                pivot,
            ],
        };

        let rels = classify_table(&schema, schema.find_table("users").unwrap(), &resolve);
        assert_eq!(rels.len(), 1);
        let rel = &rels[0];
        assert_eq!(rel.kind, RelationKind::BelongsToMany);
        assert_eq!(rel.name, "roles");
        assert_eq!(rel.table, "role_user");
        assert_eq!(rel.foreign_key, "user_id");
        assert_eq!(rel.other_key, "role_id");

        let meta = rel.pivot.as_ref().unwrap();
        assert!(meta.with_timestamps);
        assert!(!meta.soft_delete);
        assert_eq!(meta.columns, vec!["expires_at".to_string()]);
    }

    #[test]
    fn lone_created_at_stays_a_pivot_column() {
        let mut pivot = table(
            "role_user",
            &["role_id", "user_id", "created_at", "deleted_at"],
            &["role_id", "user_id"],
        );
        pivot.foreign_keys.push(fk("role_id", "roles", "id"));
        pivot.foreign_keys.push(fk("user_id", "users", "id"));

        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![
                table("users", &["id"], &["id"]),
                table("roles", &["id"], &["id"]),
                pivot,
            ],
        };

        let rels = classify_table(&schema, schema.find_table("users").unwrap(), &resolve);
        let meta = rels[0].pivot.as_ref().unwrap();
        assert!(!meta.with_timestamps);
        assert!(meta.soft_delete);
        assert_eq!(meta.columns, vec!["created_at".to_string()]);
    }

    #[test]
    fn self_referencing_key_yields_belongs_to_and_has_many() {
        let mut categories = table("categories", &["id", "parent_id", "name"], &["id"]);
        categories.foreign_keys.push(fk("parent_id", "categories", "id"));
        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![categories],
        };

        let rels = classify_table(&schema, schema.find_table("categories").unwrap(), &resolve);
        assert_eq!(rels.len(), 2);

        assert_eq!(rels[0].kind, RelationKind::BelongsTo);
        assert_eq!(rels[0].name, "category");
        assert_eq!(rels[0].table, "categories");
        assert_eq!(rels[0].other_key, "parent_id");

        assert_eq!(rels[1].kind, RelationKind::HasMany);
        assert_eq!(rels[1].name, "categories");
        assert_eq!(rels[1].table, "categories");
        assert_eq!(rels[1].foreign_key, "parent_id");
        assert_eq!(rels[1].other_key, "id");
    }

    #[test]
    fn ambiguous_pivot_drops_the_relationship() {
        // Three-way pivot: two candidate far sides, no single answer.
        let mut pivot = table(
            "permission_role_user",
            &["role_id", "user_id", "permission_id"],
            &["role_id", "user_id", "permission_id"],
        );
        pivot.foreign_keys.push(fk("role_id", "roles", "id"));
        pivot.foreign_keys.push(fk("user_id", "users", "id"));
        pivot.foreign_keys.push(fk("permission_id", "permissions", "id"));

        let schema = DbSchema {
            schema: "public".to_string(),
            tables: vec![
                table("users", &["id"], &["id"]),
                table("roles", &["id"], &["id"]),
                table("permissions", &["id"], &["id"]),
                pivot,
            ],
        };

        let rels = classify_table(&schema, schema.find_table("users").unwrap(), &resolve);
        assert!(rels.is_empty());
    }

    #[test]
    fn collision_detection_reports_duplicates_once() {
        let rel = |name: &str| Relationship {
            name: name.to_string(),
            kind: RelationKind::HasMany,
            class: "Post".to_string(),
            table: "posts".to_string(),
            foreign_key: "user_id".to_string(),
            other_key: "id".to_string(),
            pivot: None,
        };

        let rels = vec![rel("posts"), rel("posts"), rel("posts"), rel("comments")];
        assert_eq!(find_collisions(&rels), vec!["posts".to_string()]);
    }
}
