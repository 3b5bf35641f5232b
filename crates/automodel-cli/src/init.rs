use crate::cli::InitArgs;
use std::path::Path;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)
}

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    let content = r#"
version = "1"
# Set to "production" to require --force for generation runs.
environment = "local"

[database]
url = "${DATABASE_URL}"
schema = "public"

[registry]
file = ".schema.json"

[models]
out = "src/models"
module = "models"
derives = ["Debug", "Clone", "orm::Model"]
extra_uses = []
skip_tables = ["migrations", "password_resets"]
no_fill = ["id", "created_at", "updated_at", "deleted_at"]
format = false

[models.types]
"uuid" = "uuid::Uuid"
"timestamptz" = "chrono::DateTime<chrono::Utc>"
"jsonb" = "serde_json::Value"

# Extra Postgres types per doc-comment display category.
# [models.display]
# integer = []
# double = []
# boolean = []
# date = []
"#
    .trim_start_matches('\n');

    std::fs::write(path, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;

    println!("wrote {}", path.display());
    Ok(())
}
