use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Run rustfmt over the written files. A missing rustfmt is not fatal, the
/// unformatted output is still valid.
pub fn format_files(paths: &[PathBuf]) -> anyhow::Result<()> {
    let rust_files: Vec<&PathBuf> = paths
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rs"))
        .collect();
    if rust_files.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new("rustfmt");
    cmd.arg("--edition").arg("2024");
    for p in &rust_files {
        cmd.arg(p);
    }

    let status = match cmd.status() {
        Ok(status) => status,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("rustfmt not found, skipping formatting");
            return Ok(());
        }
        Err(e) => anyhow::bail!("failed to run rustfmt: {e}"),
    };

    if !status.success() {
        anyhow::bail!("rustfmt exited with {status}");
    }
    debug!(files = rust_files.len(), "formatted generated files");

    Ok(())
}
