//! Multi-target installs
//!
//! Targets write disjoint subtrees of the project, so they run in parallel.
//! Two installs into the same target at once are not supported; the atomic
//! writes only guarantee that neither leaves a torn file.

use super::{IdeInstaller, InstallOptions, InstallReport, ProfileInstaller};
use agileflow_profiles::ProfileLoader;
use rayon::prelude::*;
use std::path::Path;

/// Install into every target in `ids`, one report per id in input order
pub fn install_targets(
    loader: &ProfileLoader,
    ids: &[String],
    root: &Path,
    source_dir: &Path,
    options: &InstallOptions,
) -> Vec<InstallReport> {
    ids.par_iter()
        .map(|id| match ProfileInstaller::for_target(loader, id) {
            Ok(installer) => installer.setup(root, source_dir, options),
            Err(e) => {
                tracing::warn!(ide = %id, error = %e, "cannot build installer");
                InstallReport::failure(id.as_str(), &e)
            }
        })
        .collect()
}

/// Every loadable profile with whether its config directory exists
pub fn detect_targets(loader: &ProfileLoader, root: &Path) -> Vec<(String, bool)> {
    loader
        .load_all()
        .into_keys()
        .filter_map(|id| {
            let installer = ProfileInstaller::for_target(loader, &id).ok()?;
            let detected = installer.detect(root);
            Some((id, detected))
        })
        .collect()
}
