use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Database,
    Table,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Database(DatabaseArgs),
    Table(TableArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone)]
pub struct DatabaseArgs {
    pub config: PathBuf,
    pub database: Option<String>,
    /// Restrict generation to these tables (registry sync still sees all).
    pub tables: Option<Vec<String>>,
    pub overwrite: bool,
    pub skip_sync: bool,
    pub skip_models: bool,
    pub dry_run: bool,
    pub check: bool,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct TableArgs {
    pub config: PathBuf,
    pub database: Option<String>,
    pub table: String,
    pub name: Option<String>,
    pub module: Option<String>,
    pub folder: Option<String>,
    pub scopes: Vec<String>,
    pub renames: Vec<String>,
    pub removes: Vec<String>,
    pub traits: Vec<String>,
    pub fillable: Option<Vec<String>>,
    pub overwrite: bool,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "database" => parse_database(it.map(|s| s.as_str())),
        "table" => parse_table(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_database<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("automodel.toml");
    let mut database: Option<String> = None;
    let mut tables: Option<Vec<String>> = None;
    let mut overwrite = false;
    let mut skip_sync = false;
    let mut skip_models = false;
    let mut dry_run = false;
    let mut check = false;
    let mut force = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Database)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            "--tables" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--tables requires a value");
                };
                let parsed = split_csv(v);
                if parsed.is_empty() {
                    anyhow::bail!("--tables must not be empty");
                }
                tables = Some(parsed);
            }
            _ if token.starts_with("--tables=") => {
                let parsed = split_csv(token.trim_start_matches("--tables="));
                if parsed.is_empty() {
                    anyhow::bail!("--tables must not be empty");
                }
                tables = Some(parsed);
            }
            "--overwrite" => overwrite = true,
            "--skip-sync" => skip_sync = true,
            "--skip-models" => skip_models = true,
            "--dry-run" => dry_run = true,
            "--check" => check = true,
            "--force" => force = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    if skip_sync && skip_models {
        anyhow::bail!("--skip-sync and --skip-models together leave nothing to do");
    }

    Ok(Command::Database(DatabaseArgs {
        config,
        database,
        tables,
        overwrite,
        skip_sync,
        skip_models,
        dry_run,
        check,
        force,
    }))
}

fn parse_table<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("automodel.toml");
    let mut database: Option<String> = None;
    let mut table: Option<String> = None;
    let mut name: Option<String> = None;
    let mut module: Option<String> = None;
    let mut folder: Option<String> = None;
    let mut scopes: Vec<String> = Vec::new();
    let mut renames: Vec<String> = Vec::new();
    let mut removes: Vec<String> = Vec::new();
    let mut traits: Vec<String> = Vec::new();
    let mut fillable: Option<Vec<String>> = None;
    let mut overwrite = false;
    let mut force = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Table)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            "--name" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--name requires a value");
                };
                name = Some(v.to_string());
            }
            _ if token.starts_with("--name=") => {
                name = Some(token.trim_start_matches("--name=").to_string());
            }
            "--module" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--module requires a value");
                };
                module = Some(v.to_string());
            }
            _ if token.starts_with("--module=") => {
                module = Some(token.trim_start_matches("--module=").to_string());
            }
            "--folder" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--folder requires a value");
                };
                folder = Some(v.to_string());
            }
            _ if token.starts_with("--folder=") => {
                folder = Some(token.trim_start_matches("--folder=").to_string());
            }
            "--scope" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--scope requires a value");
                };
                scopes.push(v.to_string());
            }
            _ if token.starts_with("--scope=") => {
                scopes.push(token.trim_start_matches("--scope=").to_string());
            }
            "--rename" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--rename requires a value");
                };
                renames.push(v.to_string());
            }
            _ if token.starts_with("--rename=") => {
                renames.push(token.trim_start_matches("--rename=").to_string());
            }
            "--remove" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--remove requires a value");
                };
                removes.push(v.to_string());
            }
            _ if token.starts_with("--remove=") => {
                removes.push(token.trim_start_matches("--remove=").to_string());
            }
            "--trait" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--trait requires a value");
                };
                traits.push(v.to_string());
            }
            _ if token.starts_with("--trait=") => {
                traits.push(token.trim_start_matches("--trait=").to_string());
            }
            "--fillable" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--fillable requires a value");
                };
                fillable = Some(split_csv(v));
            }
            _ if token.starts_with("--fillable=") => {
                fillable = Some(split_csv(token.trim_start_matches("--fillable=")));
            }
            "--overwrite" => overwrite = true,
            "--force" => force = true,
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => {
                if table.is_none() {
                    table = Some(other.to_string());
                } else {
                    anyhow::bail!("unexpected positional argument: {other}");
                }
            }
        }
    }

    let Some(table) = table else {
        anyhow::bail!("missing table name: usage `automodel table <table>`");
    };

    Ok(Command::Table(TableArgs {
        config,
        database,
        table,
        name,
        module,
        folder,
        scopes,
        renames,
        removes,
        traits,
        fillable,
        overwrite,
        force,
    }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("automodel.toml");

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Init(InitArgs { config }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
automodel - generate ORM models from a live Postgres schema

USAGE:
  automodel <COMMAND> [OPTIONS]

COMMANDS:
  database      Sync the registry and generate models for every table
  table         Generate a model for a single table
  init          Write a starter config file

Run `automodel <command> --help` for more."
            );
        }
        HelpTopic::Database => {
            println!(
                "\
USAGE:
  automodel database [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: automodel.toml)
  --database <URL>      Override database.url from config
  --tables <CSV>        Only generate models for these tables
  --overwrite           Replace model files whose content changed
  --skip-sync           Do not touch the registry file
  --skip-models         Sync the registry only, write no models
  --dry-run             Print files that would change
  --check               Exit non-zero if output would change
  --force               Run even when the environment is production
  -h, --help            Print help"
            );
        }
        HelpTopic::Table => {
            println!(
                "\
USAGE:
  automodel table <table> [OPTIONS]

NOTES:
  Options given here override the table's registry entry for this run
  and are saved back into the registry.

OPTIONS:
  --config <FILE>       Config file path (default: automodel.toml)
  --database <URL>      Override database.url from config
  --name <NAME>         Model struct name (default: inflected from table)
  --module <PATH>       Module path for the generated model
  --folder <DIR>        Subdirectory under the models output directory
  --scope <RULE>        Add a query scope (repeatable)
  --rename <RULE>       Rename a relationship accessor (repeatable)
  --remove <RULE>       Drop a relationship (repeatable)
  --trait <RULE>        Add a derive with its use path (repeatable)
  --fillable <CSV>      Explicit fillable column list
  --overwrite           Replace the model file if its content changed
  --force               Run even when the environment is production
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  automodel init [OPTIONS]

OPTIONS:
  --config <FILE>       Output config path (default: automodel.toml)
  -h, --help            Print help"
            );
        }
    }
}
