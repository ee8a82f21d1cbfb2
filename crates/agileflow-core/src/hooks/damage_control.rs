//! Damage-control guard wiring
//!
//! Guard scripts are opaque files: they are copied from the source tree into
//! the profile's `hookScripts` directory and registered under the profile's
//! guard events. Nothing here runs them.

use super::{update_hook_file, HookEntry};
use crate::error::{InstallError, InstallResult};
use crate::util::{atomic_write, safe_join};
use agileflow_profiles::{Capability, CapabilityProfile, HookFormat};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Location of the guard scripts inside the source tree
pub const SOURCE_DIR: &str = "scripts/damage-control";
pub const BASH_GUARD: &str = "bash-tool-damage-control.js";
pub const EDIT_GUARD: &str = "edit-tool-damage-control.js";
/// Shared library the guards load; copied but never registered
pub const UTILS: &str = "damage-control-utils.js";

/// Hook timeout, in seconds, for claude-settings entries
const HOOK_TIMEOUT_SECS: u64 = 10;

/// Result of wiring guards into one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wiring {
    /// Owned hook entries registered
    pub hooks: usize,
    pub warnings: Vec<String>,
}

fn script_for(guard: &str) -> Option<&'static str> {
    match guard {
        "bash" => Some(BASH_GUARD),
        "edit" => Some(EDIT_GUARD),
        _ => None,
    }
}

/// `hookScripts` as a forward-slash string, also used as the ownership marker
pub fn marker(profile: &CapabilityProfile) -> Option<String> {
    let scripts = profile.paths.hook_scripts.as_deref()?;
    let parts: Vec<_> = scripts
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

/// Whether the target can have guards registered at all
pub fn supports_guards(profile: &CapabilityProfile) -> bool {
    profile.supports(Capability::Hooks).is_supported()
        && profile.hooks.is_some()
        && profile.paths.hook_config.is_some()
        && profile.paths.hook_scripts.is_some()
}

/// The canonical owned entries for `profile`
pub fn owned_entries(profile: &CapabilityProfile) -> Vec<HookEntry> {
    let (Some(settings), Some(marker)) = (&profile.hooks, marker(profile)) else {
        return Vec::new();
    };

    settings
        .guards
        .iter()
        .filter_map(|(guard, registration)| {
            let script = format!("{marker}/{}", script_for(guard)?);
            let fields = match settings.format {
                HookFormat::ClaudeSettings => {
                    let mut fields = Map::new();
                    fields.insert("type".to_string(), Value::from("command"));
                    fields.insert("command".to_string(), Value::from(format!("node {script}")));
                    fields.insert("timeout".to_string(), Value::from(HOOK_TIMEOUT_SECS));
                    fields
                }
                HookFormat::EventMap => {
                    let mut fields = Map::new();
                    fields.insert("command".to_string(), Value::from("node"));
                    fields.insert("args".to_string(), Value::Array(vec![Value::from(script)]));
                    fields
                }
            };
            Some(HookEntry::new(
                registration.event.clone(),
                registration.matcher.clone(),
                fields,
            ))
        })
        .collect()
}

/// Copy the guard scripts and register them in the hook file
///
/// Targets without hook support and source trees without the scripts are
/// reported as warnings and leave the hook file untouched.
pub fn install(root: &Path, source_dir: &Path, profile: &CapabilityProfile) -> InstallResult<Wiring> {
    let mut wiring = Wiring::default();

    if !supports_guards(profile) {
        wiring.warnings.push(format!(
            "{} has no hook support; damage control skipped",
            profile.display_name()
        ));
        return Ok(wiring);
    }
    let (Some(settings), Some(hook_config), Some(scripts_dir), Some(marker)) = (
        &profile.hooks,
        profile.paths.hook_config.as_deref(),
        profile.paths.hook_scripts.as_deref(),
        marker(profile),
    ) else {
        return Ok(wiring);
    };

    let source = source_dir.join(SOURCE_DIR);
    let required: Vec<&str> = settings
        .guards
        .iter()
        .filter_map(|(guard, _)| script_for(guard))
        .chain(std::iter::once(UTILS))
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|script| !source.join(script).is_file())
        .collect();

    if !missing.is_empty() {
        wiring.warnings.push(format!(
            "damage-control scripts missing from {}: {}; hooks not registered",
            source.display(),
            missing.join(", ")
        ));
        return Ok(wiring);
    }

    let dest = safe_join(root, scripts_dir)?;
    for script in &required {
        let from = source.join(script);
        let bytes = fs::read(&from).map_err(|e| InstallError::io(&from, &e))?;
        let to = dest.join(script);
        atomic_write(&to, &bytes).map_err(|e| InstallError::io(&to, &e))?;
        tracing::debug!(path = %to.display(), "copied guard script");
    }

    let hook_file = safe_join(root, hook_config)?;
    let update = update_hook_file(
        &hook_file,
        settings.format,
        settings.version,
        owned_entries(profile),
        &marker,
    )?;
    wiring.hooks = update.registered;
    Ok(wiring)
}

/// Remove owned hook entries and the copied scripts
pub fn uninstall(root: &Path, profile: &CapabilityProfile) -> InstallResult<()> {
    let (Some(settings), Some(marker)) = (&profile.hooks, marker(profile)) else {
        return Ok(());
    };

    if let Some(hook_config) = profile.paths.hook_config.as_deref() {
        let hook_file = safe_join(root, hook_config)?;
        update_hook_file(&hook_file, settings.format, settings.version, Vec::new(), &marker)?;
    }

    if let Some(scripts_dir) = profile.paths.hook_scripts.as_deref() {
        let dest = safe_join(root, scripts_dir)?;
        crate::util::remove_dir_if_exists(&dest).map_err(|e| InstallError::io(&dest, &e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agileflow_profiles::ProfileLoader;

    #[test]
    fn test_marker_uses_forward_slashes() {
        let cursor = ProfileLoader::builtin().load("cursor").unwrap();
        assert_eq!(marker(&cursor).as_deref(), Some(".cursor/hooks/damage-control"));
    }

    #[test]
    fn test_owned_entries_per_format() {
        let loader = ProfileLoader::builtin();

        let claude = owned_entries(&loader.load("claude-code").unwrap());
        assert_eq!(claude.len(), 2);
        assert_eq!(claude[0].event, "PreToolUse");
        assert_eq!(claude[0].matcher.as_deref(), Some("Bash"));
        assert_eq!(
            claude[0].command(),
            Some("node .claude/hooks/damage-control/bash-tool-damage-control.js")
        );

        let cursor = owned_entries(&loader.load("cursor").unwrap());
        assert_eq!(cursor[1].event, "afterFileEdit");
        assert_eq!(cursor[1].command(), Some("node"));
        assert_eq!(
            cursor[1].args(),
            vec![".cursor/hooks/damage-control/edit-tool-damage-control.js"]
        );
        assert!(cursor.iter().all(|e| e.is_owned(".cursor/hooks/damage-control")));
    }

    #[test]
    fn test_codex_has_no_guards() {
        let codex = ProfileLoader::builtin().load("codex").unwrap();
        assert!(!supports_guards(&codex));
        assert!(owned_entries(&codex).is_empty());
    }
}
