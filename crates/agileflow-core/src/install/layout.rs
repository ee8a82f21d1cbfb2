//! Output paths per layout strategy, and cleanup of managed artifacts
//!
//! All paths returned here are relative to the project root. Managed
//! artifacts are the `agileflow` directory and `agileflow-` prefixed entries
//! inside a profile's artifact directories; nothing else is ever removed.

use crate::artifact::SourceArtifact;
use crate::error::{InstallError, InstallResult};
use crate::util::{remove_dir_if_exists, safe_join};
use crate::{managed_name, MANAGED_NAMESPACE};
use agileflow_profiles::{AgentLayout, CapabilityProfile, CommandLayout};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of a skill inside its directory
pub const SKILL_FILE: &str = "SKILL.md";

/// Where `command` lands, or `None` when the profile has no commands dir
pub fn command_path(profile: &CapabilityProfile, command: &SourceArtifact) -> Option<PathBuf> {
    let dir = profile.paths.commands.as_deref()?;
    Some(match profile.layout.commands {
        CommandLayout::Nested => {
            let mut path = dir.join(MANAGED_NAMESPACE);
            if let Some((name, parents)) = command.segments.split_last() {
                path.extend(parents);
                path.push(format!("{name}.md"));
            }
            path
        }
        CommandLayout::Flat => dir
            .join(MANAGED_NAMESPACE)
            .join(format!("{}.md", command.slug)),
        CommandLayout::Prefixed => dir.join(format!("{}.md", managed_name(&command.slug))),
        CommandLayout::Skill => dir.join(managed_name(&command.slug)).join(SKILL_FILE),
    })
}

/// Where `agent` lands as an agent file
pub fn agent_path(profile: &CapabilityProfile, agent: &SourceArtifact) -> Option<PathBuf> {
    match profile.layout.agents {
        AgentLayout::None => None,
        AgentLayout::File => {
            let dir = profile.paths.agents.as_deref()?;
            Some(dir.join(MANAGED_NAMESPACE).join(format!("{}.md", agent.slug)))
        }
    }
}

/// Where `agent` lands when projected into a skill
pub fn skill_path(profile: &CapabilityProfile, agent: &SourceArtifact) -> Option<PathBuf> {
    if !profile.layout.agent_skills {
        return None;
    }
    let dir = profile.paths.skills.as_deref()?;
    Some(dir.join(managed_name(&agent.slug)).join(SKILL_FILE))
}

/// Artifact directories this profile writes into, without duplicates
fn artifact_dirs(profile: &CapabilityProfile) -> Vec<&Path> {
    let mut dirs: Vec<&Path> = Vec::new();
    for dir in [
        profile.paths.commands.as_deref(),
        profile.paths.agents.as_deref(),
        profile.paths.skills.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// Remove every managed artifact, leaving user files alone. Returns the
/// number of entries removed.
pub fn cleanup(root: &Path, profile: &CapabilityProfile) -> InstallResult<usize> {
    let prefix = format!("{MANAGED_NAMESPACE}-");
    let mut removed = 0;

    for dir in artifact_dirs(profile) {
        let dir = safe_join(root, dir)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(InstallError::io(&dir, &e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| InstallError::io(&dir, &e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name != MANAGED_NAMESPACE && !name.starts_with(&prefix) {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| InstallError::io(&path, &e))?;
            if file_type.is_dir() {
                remove_dir_if_exists(&path).map_err(|e| InstallError::io(&path, &e))?;
            } else {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(InstallError::io(&path, &e)),
                }
            }
            tracing::debug!(path = %path.display(), "removed managed artifact");
            removed += 1;
        }
    }

    Ok(removed)
}
