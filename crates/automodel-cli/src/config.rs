use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;

        let mut file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!("failed to parse config file {}: {e}", config_path.display())
        })?;

        file.expand_env()?;
        file.validate()
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", config_path.display()))?;

        Ok(Self { config_dir, file })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    /// Guard for destructive runs: the config's environment, or `APP_ENV` as
    /// the fallback, marks the target as production.
    pub fn is_production(&self) -> bool {
        let env = self
            .file
            .environment
            .clone()
            .or_else(|| std::env::var("APP_ENV").ok());
        env.as_deref() == Some("production")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub environment: Option<String>,

    pub database: DatabaseConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_file")]
    pub file: String,
}

fn default_registry_file() -> String {
    ".schema.json".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            file: default_registry_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub out: String,

    /// Module path of the models root, used to qualify cross-folder
    /// relationship targets.
    #[serde(default = "default_module")]
    pub module: String,

    #[serde(default = "default_derives")]
    pub derives: Vec<String>,

    #[serde(default)]
    pub extra_uses: Vec<String>,

    /// Tables that never get a model; new registry entries for them are
    /// flagged `skip`.
    #[serde(default = "default_skip_tables")]
    pub skip_tables: Vec<String>,

    /// Columns excluded from the default fillable list.
    #[serde(default = "default_no_fill")]
    pub no_fill: Vec<String>,

    /// Run rustfmt over written model files.
    #[serde(default)]
    pub format: bool,

    #[serde(default)]
    pub types: BTreeMap<String, String>,

    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_module() -> String {
    "models".to_string()
}

fn default_derives() -> Vec<String> {
    vec![
        "Debug".to_string(),
        "Clone".to_string(),
        "orm::Model".to_string(),
    ]
}

fn default_skip_tables() -> Vec<String> {
    vec!["migrations".to_string(), "password_resets".to_string()]
}

fn default_no_fill() -> Vec<String> {
    vec![
        "id".to_string(),
        "created_at".to_string(),
        "updated_at".to_string(),
        "deleted_at".to_string(),
    ]
}

/// Extra normalized Postgres types per doc-comment display category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub integer: Vec<String>,
    #[serde(default)]
    pub double: Vec<String>,
    #[serde(default)]
    pub boolean: Vec<String>,
    #[serde(default)]
    pub date: Vec<String>,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.database.url = expand_env_vars(&self.database.url)?;
        self.database.schema = expand_env_vars(&self.database.schema)?;
        self.registry.file = expand_env_vars(&self.registry.file)?;
        self.models.out = expand_env_vars(&self.models.out)?;

        for v in self.models.types.values_mut() {
            *v = expand_env_vars(v)?;
        }

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        if self.database.schema.trim().is_empty() {
            anyhow::bail!("database.schema must not be empty");
        }
        if self.registry.file.trim().is_empty() {
            anyhow::bail!("registry.file must not be empty");
        }
        if self.models.out.trim().is_empty() {
            anyhow::bail!("models.out must not be empty");
        }
        if self.models.module.trim().is_empty() {
            anyhow::bail!("models.module must not be empty");
        }

        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            while let Some(&ch) = chars.peek() {
                chars.next();
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
