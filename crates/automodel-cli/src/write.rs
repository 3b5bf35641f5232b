use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub dry_run: bool,
    pub check: bool,
    /// Replace existing files whose content differs. Without it, changed
    /// files are reported and left alone; new files are always written.
    pub overwrite: bool,
}

#[derive(Debug, Default)]
pub struct WriteSummary {
    pub changed: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

pub fn apply_generated_files(
    files: &[GeneratedFile],
    opts: WriteOptions,
) -> anyhow::Result<WriteSummary> {
    let mut files = files.to_vec();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut summary = WriteSummary::default();

    for f in &files {
        let existing = std::fs::read_to_string(&f.path).ok();
        if existing.as_deref() != Some(f.content.as_str()) {
            summary.changed.push(f.path.clone());
        }
    }

    if opts.dry_run {
        for p in &summary.changed {
            println!("would write {}", p.display());
        }
        return Ok(summary);
    }

    if opts.check {
        if !summary.changed.is_empty() {
            anyhow::bail!("generated files are out of date");
        }
        return Ok(summary);
    }

    for f in &files {
        if !summary.changed.contains(&f.path) {
            continue;
        }
        if !opts.overwrite && f.path.exists() {
            warn!(
                path = %f.path.display(),
                "file exists with different content, rerun with --overwrite to replace it"
            );
            summary.skipped.push(f.path.clone());
            continue;
        }
        write_atomic(&f.path, &f.content)?;
        summary.written.push(f.path.clone());
    }

    for p in &summary.written {
        println!("wrote {}", p.display());
    }

    Ok(summary)
}

pub fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        anyhow::anyhow!(
            "failed to rename {} -> {}: {e}",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_files_are_written_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.rs");
        let files = vec![GeneratedFile {
            path: path.clone(),
            content: "pub struct User;\n".to_string(),
        }];

        let summary = apply_generated_files(
            &files,
            WriteOptions {
                dry_run: false,
                check: false,
                overwrite: false,
            },
        )
        .unwrap();

        assert_eq!(summary.written, vec![path.clone()]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "pub struct User;\n");
    }

    #[test]
    fn changed_files_need_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.rs");
        std::fs::write(&path, "edited by hand\n").unwrap();

        let files = vec![GeneratedFile {
            path: path.clone(),
            content: "pub struct User;\n".to_string(),
        }];

        let summary = apply_generated_files(
            &files,
            WriteOptions {
                dry_run: false,
                check: false,
                overwrite: false,
            },
        )
        .unwrap();
        assert_eq!(summary.skipped, vec![path.clone()]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "edited by hand\n");

        let summary = apply_generated_files(
            &files,
            WriteOptions {
                dry_run: false,
                check: false,
                overwrite: true,
            },
        )
        .unwrap();
        assert_eq!(summary.written, vec![path.clone()]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "pub struct User;\n");
    }

    #[test]
    fn check_fails_on_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![GeneratedFile {
            path: dir.path().join("users.rs"),
            content: "pub struct User;\n".to_string(),
        }];

        let result = apply_generated_files(
            &files,
            WriteOptions {
                dry_run: false,
                check: true,
                overwrite: false,
            },
        );
        assert!(result.is_err());
    }
}
