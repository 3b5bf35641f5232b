use crate::cli::DatabaseArgs;
use crate::config::ProjectConfig;
use crate::format::format_files;
use crate::generate::{Generator, connect_db, guard_production};
use crate::registry::Registry;
use crate::write::{GeneratedFile, WriteOptions, apply_generated_files};
use automodel::load_schema_from_db;
use tracing::{debug, info, warn};

pub async fn run(args: DatabaseArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config.clone())?;
    guard_production(&project, args.force)?;

    let database_url = args
        .database
        .clone()
        .unwrap_or_else(|| project.file.database.url.clone());
    let client = connect_db(&database_url).await?;
    let schema = load_schema_from_db(&client, &project.file.database.schema).await?;

    let registry_path = project.resolve_path(&project.file.registry.file);
    let mut registry = Registry::load(&registry_path)?;

    if !args.skip_sync {
        let summary = registry.sync(&schema, &project.file.models.skip_tables);
        info!(
            added = summary.added.len(),
            removed = summary.removed.len(),
            "registry synced against schema {}",
            schema.schema
        );
    }

    // The registry file always tracks the sync result; --overwrite only
    // guards model files.
    let mut registry_files: Vec<GeneratedFile> = Vec::new();
    if !args.skip_sync {
        registry_files.push(GeneratedFile {
            path: registry_path.clone(),
            content: registry.render()?,
        });
    }

    let mut model_files: Vec<GeneratedFile> = Vec::new();
    if !args.skip_models {
        let generator = Generator::new(&project, &registry, &schema);

        let selected: Vec<&automodel::TableInfo> = match &args.tables {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let found = schema.find_table(name);
                    if found.is_none() {
                        warn!(table = %name, "table not found in schema, skipping");
                    }
                    found
                })
                .collect(),
            None => schema.tables.iter().collect(),
        };

        for table in selected {
            if !generator.should_generate(&table.name) {
                debug!(table = %table.name, "pivot or skip entry, no model generated");
                continue;
            }
            match generator.model_file(table) {
                Ok(file) => model_files.push(file),
                Err(e) => warn!(table = %table.name, "model generation failed: {e:#}"),
            }
        }
        model_files.extend(generator.mod_rs_files());
    }

    let shared = WriteOptions {
        dry_run: args.dry_run,
        check: args.check,
        overwrite: true,
    };
    apply_generated_files(&registry_files, shared)?;
    let summary = apply_generated_files(
        &model_files,
        WriteOptions {
            overwrite: args.overwrite,
            ..shared
        },
    )?;

    if project.file.models.format && !args.dry_run && !args.check {
        format_files(&summary.written)?;
    }

    Ok(())
}
