//! Per-IDE installer pipeline
//!
//! Each target runs Detect, Cleanup, Write(commands), Write(agents/skills),
//! MergeHooks and Report in that order. A failure aborts the remaining steps
//! for that target only; the report carries the error.

pub mod layout;
mod orchestrate;
mod pipeline;

pub use orchestrate::{detect_targets, install_targets};
pub use pipeline::ProfileInstaller;

use crate::error::{InstallError, InstallResult};
use serde::Serialize;
use std::path::Path;

/// Options recognized by `setup`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Leave guard scripts and hook files completely untouched
    pub skip_damage_control: bool,
}

/// Outcome of installing into one target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub ide: String,
    pub success: bool,
    pub commands: usize,
    pub agents: usize,
    pub skills: usize,
    /// Owned hook entries registered
    pub hooks: usize,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallReport {
    /// Fresh report, successful until something fails
    pub fn new(ide: impl Into<String>) -> Self {
        Self {
            ide: ide.into(),
            success: true,
            ..Self::default()
        }
    }

    /// Report for a target that could not even start
    pub fn failure(ide: impl Into<String>, error: &InstallError) -> Self {
        let mut report = Self::new(ide);
        report.fail(error);
        report
    }

    pub(crate) fn fail(&mut self, error: &InstallError) {
        self.success = false;
        self.error = Some(error.to_string());
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Contract every per-target installer exposes to the orchestrator
pub trait IdeInstaller {
    /// Profile id of the target
    fn ide(&self) -> &str;

    /// Whether the target's config directory exists under `root`
    fn detect(&self, root: &Path) -> bool;

    /// Remove previously installed artifacts; absence is not an error
    fn cleanup(&self, root: &Path) -> InstallResult<()>;

    /// Run the full pipeline
    fn setup(&self, root: &Path, source_dir: &Path, options: &InstallOptions) -> InstallReport;

    /// Remove artifacts, owned hook entries and guard scripts
    fn uninstall(&self, root: &Path) -> InstallResult<()>;
}
