//! Install-side CLI commands
//!
//! Handles: agileflow install/detect/cleanup/uninstall

use agileflow_core::{
    detect_targets, install_targets, IdeInstaller, InstallOptions, InstallReport, ProfileInstaller,
};
use agileflow_profiles::ProfileLoader;
use anyhow::{bail, Context};
use serde_json::json;
use std::path::Path;

pub fn run_install(
    loader: &ProfileLoader,
    ides: &[String],
    root: &Path,
    source: &Path,
    skip_damage_control: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !source.is_dir() {
        bail!("Source directory does not exist: {}", source.display());
    }

    let ides = if ides.is_empty() {
        loader
            .list_available()
            .context("Failed to list profiles")?
    } else {
        ides.to_vec()
    };

    let options = InstallOptions {
        skip_damage_control,
    };
    let reports = install_targets(loader, &ides, root, source, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let failed = reports.iter().filter(|r| !r.success).count();
    if failed > 0 {
        bail!("{failed} of {} targets failed", reports.len());
    }
    Ok(())
}

fn print_report(report: &InstallReport) {
    if report.success {
        println!(
            "{}: {} commands, {} agents, {} skills, {} hooks",
            report.ide, report.commands, report.agents, report.skills, report.hooks
        );
    } else {
        println!(
            "{}: FAILED - {}",
            report.ide,
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
}

pub fn run_detect(loader: &ProfileLoader, root: &Path, json: bool) -> anyhow::Result<()> {
    let detected = detect_targets(loader, root);

    if json {
        let value: serde_json::Map<String, serde_json::Value> = detected
            .into_iter()
            .map(|(id, found)| (id, json!(found)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for (id, found) in detected {
            let status = if found { "detected" } else { "not found" };
            println!("{id}: {status}");
        }
    }
    Ok(())
}

pub fn run_cleanup(loader: &ProfileLoader, ide: &str, root: &Path) -> anyhow::Result<()> {
    let installer = ProfileInstaller::for_target(loader, ide)?;
    installer.cleanup(root)?;
    println!("Removed AgileFlow artifacts for {}", installer.profile().display_name());
    Ok(())
}

pub fn run_uninstall(loader: &ProfileLoader, ide: &str, root: &Path) -> anyhow::Result<()> {
    let installer = ProfileInstaller::for_target(loader, ide)?;
    installer.uninstall(root)?;
    println!("Uninstalled AgileFlow from {}", installer.profile().display_name());
    Ok(())
}
