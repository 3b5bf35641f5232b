use crate::cli::TableArgs;
use crate::config::ProjectConfig;
use crate::format::format_files;
use crate::generate::{Generator, connect_db, guard_production};
use crate::registry::{Registry, RegistryEntry};
use crate::write::{GeneratedFile, WriteOptions, apply_generated_files};
use automodel::load_schema_from_db;

pub async fn run(args: TableArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config.clone())?;
    guard_production(&project, args.force)?;

    let database_url = args
        .database
        .clone()
        .unwrap_or_else(|| project.file.database.url.clone());
    let client = connect_db(&database_url).await?;
    let schema = load_schema_from_db(&client, &project.file.database.schema).await?;

    let Some(table) = schema.find_table(&args.table) else {
        anyhow::bail!(
            "table not found in schema {}: {}",
            project.file.database.schema,
            args.table
        );
    };

    let registry_path = project.resolve_path(&project.file.registry.file);
    let mut registry = Registry::load(&registry_path)?;

    let mut entry = registry
        .find(&args.table)
        .cloned()
        .unwrap_or_else(|| RegistryEntry::new(&args.table));
    entry.pivot = table.is_pivot();

    if let Some(name) = args.name {
        entry.name = Some(name);
    }
    if let Some(module) = args.module {
        entry.module = Some(module);
    }
    if let Some(folder) = args.folder {
        entry.folder = Some(folder);
    }
    if !args.scopes.is_empty() {
        entry.scopes = args.scopes;
    }
    if !args.renames.is_empty() {
        entry.renames = args.renames;
    }
    if !args.removes.is_empty() {
        entry.removes = args.removes;
    }
    if !args.traits.is_empty() {
        entry.traits = args.traits;
    }
    if let Some(fillable) = args.fillable {
        entry.fillable = fillable;
    }

    if entry.pivot {
        anyhow::bail!("table {} is a pivot table and gets no model", args.table);
    }
    if entry.skip {
        anyhow::bail!(
            "table {} is flagged skip in the registry, unset the flag to generate it",
            args.table
        );
    }

    registry.upsert(entry);

    let generator = Generator::new(&project, &registry, &schema);
    let mut files = vec![generator.model_file(table)?];
    files.extend(generator.mod_rs_files());

    let registry_file = GeneratedFile {
        path: registry_path,
        content: registry.render()?,
    };
    apply_generated_files(
        &[registry_file],
        WriteOptions {
            dry_run: false,
            check: false,
            overwrite: true,
        },
    )?;
    let summary = apply_generated_files(
        &files,
        WriteOptions {
            dry_run: false,
            check: false,
            overwrite: args.overwrite,
        },
    )?;

    if project.file.models.format {
        format_files(&summary.written)?;
    }

    Ok(())
}
