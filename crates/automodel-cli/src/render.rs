//! Model file rendering.
//!
//! Each table becomes one Rust module containing a single struct annotated
//! with `#[orm(...)]` attributes for the target ORM's derive macro. The
//! renderer is deterministic: same input, same bytes, so `--check` and the
//! overwrite guard can compare content directly.

use crate::type_mapper::TypeMapper;
use automodel::{
    ColumnInfo, RelationKind, Relationship, ScopeRule, ScopeValue, TableInfo, TraitRule,
    TypeCategories,
};
use std::collections::HashSet;

pub struct RenderContext<'a> {
    pub table: &'a TableInfo,
    pub class: &'a str,
    pub relations: &'a [Relationship],
    pub scopes: &'a [ScopeRule],
    pub traits: &'a [TraitRule],
    /// Columns listed in the fillable attribute.
    pub fillable: &'a [String],
    pub derives: &'a [String],
    pub extra_uses: &'a [String],
    pub type_mapper: &'a TypeMapper,
    pub categories: &'a TypeCategories,
    /// Maps a related model's class name to the path emitted in attributes.
    pub resolve_path: &'a dyn Fn(&str) -> String,
}

pub fn render_model(ctx: &RenderContext) -> anyhow::Result<String> {
    let mut out = String::new();
    out.push_str("// @generated by automodel\n\n");

    let mut uses: Vec<String> = ctx.extra_uses.to_vec();
    uses.extend(ctx.traits.iter().map(|t| t.path.clone()));
    uses.sort();
    uses.dedup();
    for u in &uses {
        out.push_str(&format!("use {u};\n"));
    }
    if !uses.is_empty() {
        out.push('\n');
    }

    render_doc_comment(&mut out, ctx);

    let mut derives: Vec<String> = ctx.derives.to_vec();
    derives.extend(ctx.traits.iter().map(|t| t.name.clone()));
    derives.dedup();
    if !derives.is_empty() {
        out.push_str(&format!("#[derive({})]\n", derives.join(", ")));
    }

    for rel in ctx.relations {
        render_relation_attr(&mut out, rel, ctx.resolve_path);
    }

    for scope in ctx.scopes {
        render_scope_attr(&mut out, scope);
    }

    if ctx.table.has_column("created_at") && ctx.table.has_column("updated_at") {
        out.push_str("#[orm(timestamps)]\n");
    }
    if ctx.table.has_column("deleted_at") {
        out.push_str("#[orm(soft_delete)]\n");
    }

    if !ctx.fillable.is_empty() {
        let list = ctx
            .fillable
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("#[orm(fillable({list}))]\n"));
    }

    out.push_str(&format!("#[orm(table = \"{}\")]\n", ctx.table.name));
    out.push_str(&format!("pub struct {} {{\n", sanitize_type_ident(ctx.class)));

    let mut seen_fields: HashSet<String> = HashSet::new();
    for c in &ctx.table.columns {
        let field_ident = sanitize_field_ident(&c.name);
        if !seen_fields.insert(field_ident.clone()) {
            anyhow::bail!(
                "duplicate field name after sanitization in {}: {field_ident}",
                ctx.table.name
            );
        }

        let ty = column_rust_type(ctx.type_mapper, c);

        let mut orm_parts: Vec<String> = Vec::new();
        if ctx.table.primary_key.iter().any(|pk| *pk == c.name) {
            orm_parts.push("id".to_string());
        }
        if field_ident.trim_start_matches("r#") != c.name {
            orm_parts.push(format!("column = \"{}\"", c.name));
        }

        if !orm_parts.is_empty() {
            out.push_str(&format!("    #[orm({})]\n", orm_parts.join(", ")));
        }
        out.push_str(&format!("    pub {field_ident}: {ty},\n"));
    }

    out.push_str("}\n");

    Ok(tidy_output(&out))
}

fn render_doc_comment(out: &mut String, ctx: &RenderContext) {
    match &ctx.table.comment {
        Some(comment) => {
            for line in comment.lines() {
                out.push_str(&format!("/// {}\n", line.trim_end()));
            }
        }
        None => {
            out.push_str(&format!("/// Model for the `{}` table.\n", ctx.table.name));
        }
    }

    if !ctx.table.columns.is_empty() {
        out.push_str("///\n");
        out.push_str("/// Columns:\n");
        for c in &ctx.table.columns {
            let display = display_type(ctx.categories, c);
            out.push_str(&format!("/// - `{}` ({display})\n", c.name));
        }
    }

    if !ctx.relations.is_empty() {
        out.push_str("///\n");
        out.push_str("/// Relationships:\n");
        for rel in ctx.relations {
            let ty = if rel.kind.is_many() {
                format!("Vec<{}>", rel.class)
            } else {
                rel.class.clone()
            };
            out.push_str(&format!("/// - `{}` ({ty})\n", rel.name));
        }
    }
}

fn display_type(categories: &TypeCategories, c: &ColumnInfo) -> String {
    let base = categories.display_type(&c.data_type);
    if c.not_null {
        base.to_string()
    } else {
        format!("nullable {base}")
    }
}

fn render_relation_attr(out: &mut String, rel: &Relationship, resolve_path: &dyn Fn(&str) -> String) {
    let path = resolve_path(&rel.class);

    if rel.kind == RelationKind::BelongsToMany {
        let mut parts = vec![
            path,
            format!("through = \"{}\"", rel.table),
            format!("foreign_key = \"{}\"", rel.foreign_key),
            format!("other_key = \"{}\"", rel.other_key),
            format!("as = \"{}\"", rel.name),
        ];
        if let Some(meta) = &rel.pivot {
            if meta.with_timestamps {
                parts.push("with_timestamps".to_string());
            }
            if meta.soft_delete {
                parts.push("soft_delete".to_string());
            }
            if !meta.columns.is_empty() {
                parts.push(format!("pivot_columns = \"{}\"", meta.columns.join(", ")));
            }
        }
        out.push_str(&format!("#[orm(belongs_to_many({}))]\n", parts.join(", ")));
        return;
    }

    out.push_str(&format!(
        "#[orm({}({}, foreign_key = \"{}\", other_key = \"{}\", as = \"{}\"))]\n",
        rel.kind.as_str(),
        path,
        rel.foreign_key,
        rel.other_key,
        rel.name
    ));
}

fn render_scope_attr(out: &mut String, scope: &ScopeRule) {
    let value = match &scope.value {
        ScopeValue::Literal(lit) => format!("value = \"{lit}\""),
        ScopeValue::Param(param) => format!("param = \"{param}\""),
    };
    out.push_str(&format!(
        "#[orm(scope({}, field = \"{}\", op = \"{}\", {value}))]\n",
        scope.name,
        scope.field,
        scope.op.as_str()
    ));
}

/// mod.rs of a models directory: one `pub mod` line per module (model files
/// and subdirectories) and one re-export per model.
///
/// `models` pairs a module path relative to this mod.rs with the class it
/// exports; subdirectory models pass `folder::Class` paths and share the
/// folder's `pub mod` line.
pub fn render_mod_rs(models: &[(String, String)], folders: &[String]) -> String {
    let mut out = String::new();
    out.push_str("// @generated by automodel\n\n");

    let mut mods: Vec<&str> = folders.iter().map(|f| f.as_str()).collect();
    mods.extend(
        models
            .iter()
            .map(|(module, _)| module.split("::").next().unwrap_or(module)),
    );
    mods.sort_unstable();
    mods.dedup();
    for m in &mods {
        out.push_str(&format!("pub mod {m};\n"));
    }

    let mut models = models.to_vec();
    models.sort();
    out.push('\n');
    for (module, class) in &models {
        out.push_str(&format!("pub use {module}::{class};\n"));
    }

    tidy_output(&out)
}

fn column_rust_type(type_mapper: &TypeMapper, c: &ColumnInfo) -> String {
    let mut ty = type_mapper.map(&c.data_type);
    if !c.not_null && !ty.starts_with("Option<") {
        ty = format!("Option<{ty}>");
    }
    ty
}

/// Collapse blank-line runs, strip trailing spaces, end with one newline.
pub fn tidy_output(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;

    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    while out.ends_with("\n\n") {
        out.pop();
    }

    out
}

pub fn sanitize_type_ident(name: &str) -> String {
    let mut s = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();

    if s.is_empty() {
        s.push('_');
    }

    if s.chars().next().unwrap().is_ascii_digit() {
        s.insert(0, '_');
    }

    s
}

pub fn sanitize_module_ident(name: &str) -> String {
    sanitize_field_ident(name)
}

pub fn module_file_stem(module_ident: &str) -> &str {
    module_ident.trim_start_matches("r#")
}

pub fn sanitize_field_ident(column: &str) -> String {
    let mut s = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    s = heck::ToSnakeCase::to_snake_case(s.as_str());
    if s.is_empty() {
        s.push('_');
    }
    if s.chars().next().unwrap().is_ascii_digit() {
        s.insert(0, '_');
    }
    if is_rust_keyword(&s) {
        format!("r#{s}")
    } else {
        s
    }
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use automodel::{parse_scope, parse_trait, PivotMeta};
    use std::collections::BTreeMap;

    fn col(name: &str, data_type: &str, not_null: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            not_null,
            ordinal: 0,
        }
    }

    fn users_table() -> TableInfo {
        TableInfo {
            name: "users".to_string(),
            comment: Some("Registered application users.".to_string()),
            columns: vec![
                col("id", "bigint", true),
                col("email", "text", true),
                col("type", "text", false),
                col("created_at", "timestamptz", true),
                col("updated_at", "timestamptz", true),
            ],
            primary_key: vec!["id".to_string()],
            foreign_keys: Vec::new(),
            unique_columns: Vec::new(),
        }
    }

    fn render(table: &TableInfo, relations: &[Relationship], scopes: &[ScopeRule]) -> String {
        let type_mapper = TypeMapper::new(BTreeMap::new());
        let categories = TypeCategories::default();
        let traits = vec![parse_trait("SoftDeletes:orm_extras::SoftDeletes").unwrap()];
        let ctx = RenderContext {
            table,
            class: "User",
            relations,
            scopes,
            traits: &traits,
            fillable: &["email".to_string()],
            derives: &["Debug".to_string(), "Clone".to_string(), "orm::Model".to_string()],
            extra_uses: &[],
            type_mapper: &type_mapper,
            categories: &categories,
            resolve_path: &|class| format!("super::{class}"),
        };
        render_model(&ctx).unwrap()
    }

    #[test]
    fn renders_model_attributes_and_fields() {
        let relations = vec![
            Relationship {
                name: "posts".to_string(),
                kind: RelationKind::HasMany,
                class: "Post".to_string(),
                table: "posts".to_string(),
                foreign_key: "user_id".to_string(),
                other_key: "id".to_string(),
                pivot: None,
            },
            Relationship {
                name: "roles".to_string(),
                kind: RelationKind::BelongsToMany,
                class: "Role".to_string(),
                table: "role_user".to_string(),
                foreign_key: "user_id".to_string(),
                other_key: "role_id".to_string(),
                pivot: Some(PivotMeta {
                    columns: vec!["expires_at".to_string()],
                    with_timestamps: true,
                    soft_delete: false,
                }),
            },
        ];
        let scopes = vec![parse_scope("published:status='published'").unwrap()];

        let out = render(&users_table(), &relations, &scopes);

        assert!(out.starts_with("// @generated by automodel\n"));
        assert!(out.contains("use orm_extras::SoftDeletes;\n"));
        assert!(out.contains("/// Registered application users.\n"));
        assert!(out.contains("/// - `id` (integer)\n"));
        assert!(out.contains("/// - `type` (nullable string)\n"));
        assert!(out.contains("/// - `posts` (Vec<Post>)\n"));
        assert!(out.contains("/// - `roles` (Vec<Role>)\n"));
        assert!(out.contains("#[derive(Debug, Clone, orm::Model, SoftDeletes)]\n"));
        assert!(out.contains(
            "#[orm(has_many(super::Post, foreign_key = \"user_id\", other_key = \"id\", as = \"posts\"))]\n"
        ));
        assert!(out.contains(
            "#[orm(belongs_to_many(super::Role, through = \"role_user\", foreign_key = \"user_id\", other_key = \"role_id\", as = \"roles\", with_timestamps, pivot_columns = \"expires_at\"))]\n"
        ));
        assert!(out.contains(
            "#[orm(scope(published, field = \"status\", op = \"=\", value = \"'published'\"))]\n"
        ));
        assert!(out.contains("#[orm(timestamps)]\n"));
        assert!(out.contains("#[orm(fillable(\"email\"))]\n"));
        assert!(out.contains("#[orm(table = \"users\")]\n"));
        assert!(out.contains("    #[orm(id)]\n    pub id: i64,\n"));
        assert!(out.contains("    pub r#type: Option<String>,\n"));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn renders_mod_rs_sorted_with_folders() {
        let out = render_mod_rs(
            &[
                ("users".to_string(), "User".to_string()),
                ("posts".to_string(), "Post".to_string()),
                ("admin".to_string(), "AuditLog".to_string()),
            ],
            &["admin".to_string()],
        );

        let posts_mod = out.find("pub mod posts;").unwrap();
        let users_mod = out.find("pub mod users;").unwrap();
        let admin_mod = out.find("pub mod admin;").unwrap();
        assert!(admin_mod < posts_mod && posts_mod < users_mod);
        assert_eq!(out.matches("pub mod admin;").count(), 1);
        assert!(out.contains("pub use users::User;\n"));
        assert!(out.contains("pub use posts::Post;\n"));
        assert!(out.contains("pub use admin::AuditLog;\n"));
    }

    #[test]
    fn tidy_output_collapses_blank_runs() {
        assert_eq!(tidy_output("a\n\n\n\nb  \n\n"), "a\n\nb\n");
    }

    #[test]
    fn sanitize_idents() {
        assert_eq!(sanitize_field_ident("type"), "r#type");
        assert_eq!(sanitize_field_ident("2fa_enabled"), "_2fa_enabled");
        assert_eq!(sanitize_type_ident("1user"), "_1user");
    }
}
