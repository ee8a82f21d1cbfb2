//! Single-file transform preview

use agileflow_core::transform_for_target;
use agileflow_profiles::{ArtifactKind, ProfileLoader};
use anyhow::Context;
use std::path::Path;

/// Print `file` as the target IDE would receive it. Warnings go to stderr
/// so stdout stays the transformed document.
pub fn run(loader: &ProfileLoader, ide: &str, kind: ArtifactKind, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let slug = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let transformed = transform_for_target(loader, ide, Some(&content), kind, slug)?;
    print!("{}", transformed.content);
    for warning in &transformed.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}
