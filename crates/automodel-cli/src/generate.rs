//! Shared generation pipeline for the `database` and `table` commands.
//!
//! A [`Generator`] ties together the introspected schema, the registry and
//! the config, and turns tables into [`GeneratedFile`]s. Override rules that
//! do not parse and accessor collisions are reported with a log line and do
//! not stop the run.

use crate::config::ProjectConfig;
use crate::registry::{Registry, RegistryEntry};
use crate::render::{
    RenderContext, module_file_stem, render_mod_rs, render_model, sanitize_module_ident,
    sanitize_type_ident,
};
use crate::type_mapper::TypeMapper;
use crate::write::GeneratedFile;
use automodel::{
    DbSchema, RemoveRule, RenameRule, ScopeRule, TableInfo, TraitRule, TypeCategories,
    apply_renames, find_collisions, classify_table, parse_remove, parse_rename, parse_scope,
    parse_trait, should_remove, table_to_class,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio_postgres::NoTls;
use tracing::warn;

pub async fn connect_db(database_url: &str) -> anyhow::Result<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("postgres connection error: {e}");
        }
    });
    Ok(client)
}

pub fn guard_production(project: &ProjectConfig, force: bool) -> anyhow::Result<()> {
    if project.is_production() && !force {
        anyhow::bail!("environment is production, rerun with --force to generate anyway");
    }
    Ok(())
}

pub struct Generator<'a> {
    project: &'a ProjectConfig,
    registry: &'a Registry,
    schema: &'a DbSchema,
    type_mapper: TypeMapper,
    categories: TypeCategories,
    out_dir: PathBuf,
}

impl<'a> Generator<'a> {
    pub fn new(project: &'a ProjectConfig, registry: &'a Registry, schema: &'a DbSchema) -> Self {
        let models = &project.file.models;
        let display = &models.display;
        Self {
            project,
            registry,
            schema,
            type_mapper: TypeMapper::new(models.types.clone()),
            categories: TypeCategories::with_extras(
                &display.integer,
                &display.double,
                &display.boolean,
                &display.date,
            ),
            out_dir: project.resolve_path(&models.out),
        }
    }

    pub fn class_for(&self, table: &str) -> String {
        self.registry
            .find(table)
            .and_then(|e| e.name.clone())
            .unwrap_or_else(|| table_to_class(table))
    }

    fn folder_for(&self, table: &str) -> Option<String> {
        self.registry
            .find(table)
            .and_then(|e| e.folder.clone())
            .filter(|f| !f.trim().is_empty())
    }

    /// Whether the table gets a model file at all.
    pub fn should_generate(&self, table: &str) -> bool {
        match self.registry.find(table) {
            Some(entry) => !entry.pivot && !entry.skip,
            None => true,
        }
    }

    /// Path emitted in relationship attributes for a related model.
    ///
    /// A registry `module` override wins; otherwise models in the same
    /// folder are reachable through `super`, and everything else goes
    /// through the configured models module at the crate root.
    fn model_path(&self, from_table: &str, target_table: &str) -> String {
        let class = sanitize_type_ident(&self.class_for(target_table));

        if let Some(module) = self
            .registry
            .find(target_table)
            .and_then(|e| e.module.clone())
            .filter(|m| !m.trim().is_empty())
        {
            return format!("{module}::{class}");
        }

        if self.folder_for(from_table) == self.folder_for(target_table) {
            return format!("super::{class}");
        }

        format!("crate::{}::{class}", self.project.file.models.module)
    }

    pub fn model_file(&self, table: &TableInfo) -> anyhow::Result<GeneratedFile> {
        let entry = self.registry.find(&table.name).cloned().unwrap_or_default();
        let class = self.class_for(&table.name);
        let (renames, removes, scopes, traits) = parsed_overrides(&table.name, &entry);

        let mut relations = classify_table(self.schema, table, &|t| self.class_for(t));
        relations.retain(|rel| !should_remove(rel, &removes));
        apply_renames(&mut relations, &renames);

        for name in find_collisions(&relations) {
            warn!(
                table = %table.name,
                accessor = %name,
                "duplicate relationship accessor, rename or remove one of them"
            );
        }

        let fillable = self.fillable_for(table, &entry);

        let models = &self.project.file.models;
        let ctx = RenderContext {
            table,
            class: &class,
            relations: &relations,
            scopes: &scopes,
            traits: &traits,
            fillable: &fillable,
            derives: &models.derives,
            extra_uses: &models.extra_uses,
            type_mapper: &self.type_mapper,
            categories: &self.categories,
            resolve_path: &|target_class| {
                // Relationship classes map back to tables via the registry;
                // fall back to a bare `super` path when nothing matches.
                for t in &self.schema.tables {
                    if self.class_for(&t.name) == target_class {
                        return self.model_path(&table.name, &t.name);
                    }
                }
                format!("super::{}", sanitize_type_ident(target_class))
            },
        };

        let content = render_model(&ctx)?;
        Ok(GeneratedFile {
            path: self.model_file_path(&table.name),
            content,
        })
    }

    fn model_file_path(&self, table: &str) -> PathBuf {
        let module_ident = sanitize_module_ident(table);
        let file = format!("{}.rs", module_file_stem(&module_ident));
        match self.folder_for(table) {
            Some(folder) => self
                .out_dir
                .join(module_file_stem(&sanitize_module_ident(&folder)))
                .join(file),
            None => self.out_dir.join(file),
        }
    }

    fn fillable_for(&self, table: &TableInfo, entry: &RegistryEntry) -> Vec<String> {
        if !entry.fillable.is_empty() {
            return entry.fillable.clone();
        }
        let no_fill = &self.project.file.models.no_fill;
        table
            .columns
            .iter()
            .filter(|c| !table.primary_key.contains(&c.name))
            .filter(|c| !no_fill.contains(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    /// mod.rs for the output directory and each folder, rebuilt from the
    /// registry so single-table runs keep the indexes complete.
    pub fn mod_rs_files(&self) -> Vec<GeneratedFile> {
        let mut root_models: Vec<(String, String)> = Vec::new();
        let mut folders: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

        for table in &self.schema.tables {
            if !self.should_generate(&table.name) {
                continue;
            }
            let module = sanitize_module_ident(&table.name);
            let class = sanitize_type_ident(&self.class_for(&table.name));
            match self.folder_for(&table.name) {
                Some(folder) => {
                    let folder = sanitize_module_ident(&folder);
                    folders.entry(folder.clone()).or_default().push((module, class.clone()));
                    root_models.push((folder, class));
                }
                None => root_models.push((module, class)),
            }
        }

        let folder_names: Vec<String> = folders.keys().cloned().collect();
        let mut files = vec![GeneratedFile {
            path: self.out_dir.join("mod.rs"),
            content: render_mod_rs(&root_models, &folder_names),
        }];

        for (folder, models) in &folders {
            files.push(GeneratedFile {
                path: self
                    .out_dir
                    .join(module_file_stem(folder))
                    .join("mod.rs"),
                content: render_mod_rs(models, &[]),
            });
        }

        files
    }
}

fn parsed_overrides(
    table: &str,
    entry: &RegistryEntry,
) -> (
    Vec<RenameRule>,
    Vec<RemoveRule>,
    Vec<ScopeRule>,
    Vec<TraitRule>,
) {
    let mut renames = Vec::new();
    for raw in &entry.renames {
        match parse_rename(raw) {
            Some(rule) => renames.push(rule),
            None => warn!(table, rule = %raw, "unusable rename rule, ignoring"),
        }
    }

    let mut removes = Vec::new();
    for raw in &entry.removes {
        match parse_remove(raw) {
            Some(rule) => removes.push(rule),
            None => warn!(table, rule = %raw, "unusable remove rule, ignoring"),
        }
    }

    let mut scopes = Vec::new();
    for raw in &entry.scopes {
        match parse_scope(raw) {
            Some(rule) => scopes.push(rule),
            None => warn!(table, rule = %raw, "unusable scope rule, ignoring"),
        }
    }

    let mut traits = Vec::new();
    for raw in &entry.traits {
        match parse_trait(raw) {
            Some(rule) => traits.push(rule),
            None => warn!(table, rule = %raw, "unusable trait rule, ignoring"),
        }
    }

    (renames, removes, scopes, traits)
}
