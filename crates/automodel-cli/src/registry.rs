//! The model registry.
//!
//! A JSON file (default `.schema.json`) records one entry per table with the
//! overrides applied when its model is generated. Syncing against a live
//! schema drops entries for vanished tables, appends entries for new ones and
//! leaves everything in between untouched, so the file is safe to keep under
//! version control and edit by hand.

use crate::write::write_atomic;
use automodel::DbSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub table: String,

    /// Model struct name; inflected from the table when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Module path override for relationship targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Subdirectory under the models output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    /// Carried for hand-written tooling; generation ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fillable: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pivot: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip: bool,
}

impl RegistryEntry {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    pub entries: Vec<RegistryEntry>,
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl Registry {
    /// Load the registry file. A missing file is an empty registry; a file
    /// that exists but does not parse is fatal, never silently replaced.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                anyhow::bail!("failed to read registry file {}: {e}", path.display());
            }
        };

        let entries: Vec<RegistryEntry> = serde_json::from_str(&raw).map_err(|e| {
            let kind = match e.classify() {
                serde_json::error::Category::Syntax => "invalid JSON syntax",
                serde_json::error::Category::Eof => "truncated JSON",
                serde_json::error::Category::Data => "unexpected entry shape",
                serde_json::error::Category::Io => "read error",
            };
            anyhow::anyhow!("registry file {} is unusable ({kind}): {e}", path.display())
        })?;

        let mut seen: HashSet<&str> = HashSet::new();
        for entry in &entries {
            if entry.table.trim().is_empty() {
                anyhow::bail!(
                    "registry file {} has an entry with an empty table name",
                    path.display()
                );
            }
            if !seen.insert(entry.table.as_str()) {
                anyhow::bail!(
                    "registry file {} has duplicate entries for table {}",
                    path.display(),
                    entry.table
                );
            }
        }

        Ok(Self { entries })
    }

    /// Serialized registry content: sorted by table, pretty-printed, with a
    /// trailing newline. Rendering is deterministic so repeated syncs leave
    /// the file byte-identical.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.table.cmp(&b.table));

        let mut json = serde_json::to_string_pretty(&entries)
            .map_err(|e| anyhow::anyhow!("failed to serialize registry: {e}"))?;
        json.push('\n');
        Ok(json)
    }

    /// Write the rendered registry atomically.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        write_atomic(path, &self.render()?)
    }

    pub fn find(&self, table: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.table == table)
    }

    /// Insert or replace the entry for its table.
    pub fn upsert(&mut self, entry: RegistryEntry) {
        match self.entries.iter_mut().find(|e| e.table == entry.table) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Reconcile with a live schema: drop entries whose table is gone and
    /// append entries for tables the registry has not seen. Existing entries
    /// are preserved as-is.
    pub fn sync(&mut self, schema: &DbSchema, skip_tables: &[String]) -> SyncSummary {
        let mut summary = SyncSummary::default();

        let live: HashSet<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        self.entries.retain(|entry| {
            let keep = live.contains(entry.table.as_str());
            if !keep {
                info!(table = %entry.table, "table no longer exists, dropping registry entry");
                summary.removed.push(entry.table.clone());
            }
            keep
        });

        let known: HashSet<String> = self.entries.iter().map(|e| e.table.clone()).collect();
        for table in &schema.tables {
            if known.contains(&table.name) {
                continue;
            }
            let mut entry = RegistryEntry::new(&table.name);
            entry.pivot = table.is_pivot();
            entry.skip = skip_tables.iter().any(|t| t == &table.name);
            info!(table = %table.name, pivot = entry.pivot, skip = entry.skip, "new table, adding registry entry");
            summary.added.push(table.name.clone());
            self.entries.push(entry);
        }

        summary
    }
}
