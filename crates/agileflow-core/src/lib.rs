//! AgileFlow Core - content transformer and installer pipeline
//!
//! This crate turns canonical AgileFlow commands and agents into each
//! target IDE's native layout, and merges damage-control hooks into the
//! IDE's hook configuration without disturbing user entries.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod artifact;
pub mod error;
pub mod hooks;
pub mod install;
pub mod transform;
pub mod util;

pub use agileflow_profiles;

pub use artifact::{ArtifactMeta, Discovery, SourceArtifact};
pub use error::{HookError, InstallError, InstallResult, TransformError, TransformResult};
pub use hooks::{merge, HookEntry};
pub use install::{
    detect_targets, install_targets, IdeInstaller, InstallOptions, InstallReport,
    ProfileInstaller,
};
pub use transform::{transform_for_target, TransformWarning, TransformedArtifact, Transformer};

/// Directory and name prefix marking artifacts this tool owns
pub const MANAGED_NAMESPACE: &str = "agileflow";

/// `agileflow-<slug>`, without doubling a prefix the slug already has
pub fn managed_name(slug: &str) -> String {
    let prefix = format!("{MANAGED_NAMESPACE}-");
    if slug.starts_with(&prefix) {
        slug.to_string()
    } else {
        format!("{prefix}{slug}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_name() {
        assert_eq!(managed_name("test-agent"), "agileflow-test-agent");
        assert_eq!(managed_name("agileflow-helper"), "agileflow-helper");
        assert_eq!(managed_name("agileflowish"), "agileflow-agileflowish");
    }
}
