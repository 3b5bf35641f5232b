//! automodel
//!
//! Schema introspection and relationship inference for generating ORM model
//! definitions from a live Postgres database.
//!
//! The library is split along a simple boundary: [`introspect`] loads a
//! whole-schema snapshot over any [`DbClient`], and everything downstream of
//! it ([`classify`], [`inflect`], [`overrides`], [`display`]) is pure and
//! testable without a database.
//!
//! # Example
//!
//! ```ignore
//! use automodel::{classify_table, load_schema_from_db, table_to_class};
//!
//! let schema = load_schema_from_db(&client, "public").await?;
//! for table in &schema.tables {
//!     let relations = classify_table(&schema, table, &|t| table_to_class(t));
//!     // render a model from `table` and `relations`
//! }
//! ```

pub mod classify;
pub mod client;
pub mod display;
pub mod error;
pub mod inflect;
pub mod introspect;
pub mod overrides;

pub use classify::{
    PivotMeta, RelationKind, Relationship, classify_table, find_collisions,
};
pub use client::{DbClient, RowExt};
pub use display::{DisplayType, TypeCategories, normalize_pg_type};
pub use error::{SchemaError, SchemaResult};
pub use inflect::{accessor_name, pluralize, singularize, table_to_class};
pub use introspect::{ColumnInfo, DbSchema, ForeignKey, TableInfo, load_schema_from_db};
pub use overrides::{
    RemoveRule, RenameRule, ScopeOp, ScopeRule, ScopeValue, TraitRule, apply_renames,
    parse_remove, parse_rename, parse_scope, parse_trait, should_remove,
};
