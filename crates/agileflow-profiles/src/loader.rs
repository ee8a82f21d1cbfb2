//! Profile loader with per-instance memoization
//!
//! The first successful `load` of an id parses and validates the YAML
//! document; later loads return the cached `Arc`. The cache belongs to the
//! loader instance, so tests get isolation by building a fresh loader or by
//! calling [`ProfileLoader::clear_cache`].
//!
//! Concurrent readers never block each other. Two threads loading the same
//! uncached id may both parse it; the second insert replaces the first with
//! identical content.

use crate::capability::{CapabilityGroup, CapabilityState};
use crate::error::{ProfileError, ProfileResult};
use crate::store::ProfileStore;
use crate::types::CapabilityProfile;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};
use std::sync::{Arc, PoisonError, RwLock};

/// Top-level sections every profile document must declare
pub const REQUIRED_SECTIONS: &[&str] = &["identity", "paths", "capabilities", "toolNames"];

/// Loads, validates and caches capability profiles
#[derive(Debug, Default)]
pub struct ProfileLoader {
    store: ProfileStore,
    cache: RwLock<HashMap<String, Arc<CapabilityProfile>>>,
}

impl ProfileLoader {
    #[must_use]
    pub fn new(store: ProfileStore) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Loader over the embedded profiles
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(ProfileStore::Builtin)
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Load one profile, memoized
    pub fn load(&self, id: &str) -> ProfileResult<Arc<CapabilityProfile>> {
        if let Some(profile) = self.cached(id) {
            return Ok(profile);
        }

        let yaml = self.store.read(id)?;
        let profile = Arc::new(parse_profile(id, &yaml)?);
        tracing::debug!(profile = id, "loaded capability profile");

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::clone(&profile));

        Ok(profile)
    }

    /// Load every known profile. Malformed profiles are logged and skipped.
    pub fn load_all(&self) -> BTreeMap<String, Arc<CapabilityProfile>> {
        let ids = match self.list_available() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "cannot enumerate profiles");
                return BTreeMap::new();
            }
        };

        let mut profiles = BTreeMap::new();
        for id in ids {
            match self.load(&id) {
                Ok(profile) => {
                    profiles.insert(id, profile);
                }
                Err(e) => {
                    tracing::warn!(profile = %id, error = %e, "skipping malformed profile");
                }
            }
        }
        profiles
    }

    /// Known profile ids, without loading them
    pub fn list_available(&self) -> ProfileResult<Vec<String>> {
        self.store.list_ids()
    }

    /// Whether `id` supports `group.name`. Missing profiles, groups and
    /// capabilities all answer `Unknown`.
    pub fn has_capability(&self, id: &str, group: &str, name: &str) -> CapabilityState {
        self.load(id)
            .map_or(CapabilityState::Unknown, |p| p.capabilities.state(group, name))
    }

    /// Native tool name for an alias
    pub fn tool_name(&self, id: &str, alias: &str) -> Option<String> {
        self.load(id)
            .ok()
            .and_then(|p| p.tool_name(alias).map(ToString::to_string))
    }

    /// Ids of all profiles that support `group.name`
    pub fn find_ides_with_capability(&self, group: &str, name: &str) -> Vec<String> {
        self.load_all()
            .into_iter()
            .filter(|(_, p)| p.capabilities.state(group, name).is_supported())
            .map(|(id, _)| id)
            .collect()
    }

    /// `group.name` across every loadable profile
    pub fn compare_capability(&self, group: &str, name: &str) -> BTreeMap<String, CapabilityState> {
        self.load_all()
            .into_iter()
            .map(|(id, p)| {
                let state = p.capabilities.state(group, name);
                (id, state)
            })
            .collect()
    }

    /// Drop every memoized profile
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Whether `id` is currently memoized
    pub fn is_cached(&self, id: &str) -> bool {
        self.cached(id).is_some()
    }

    fn cached(&self, id: &str) -> Option<Arc<CapabilityProfile>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

/// Parse and validate one profile document
pub fn parse_profile(id: &str, yaml: &str) -> ProfileResult<CapabilityProfile> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| ProfileError::invalid(id, e.to_string()))?;

    let Some(mapping) = value.as_mapping() else {
        return Err(ProfileError::invalid(id, "document is not a mapping"));
    };

    for section in REQUIRED_SECTIONS {
        if !mapping.contains_key(*section) {
            return Err(ProfileError::invalid(
                id,
                format!("missing required section '{section}'"),
            ));
        }
    }

    let profile: CapabilityProfile =
        serde_yaml::from_value(value).map_err(|e| ProfileError::invalid(id, e.to_string()))?;

    validate(id, &profile)?;
    Ok(profile)
}

fn validate(id: &str, profile: &CapabilityProfile) -> ProfileResult<()> {
    if profile.id() != id {
        return Err(ProfileError::invalid(
            id,
            format!("identity.id '{}' does not match profile id", profile.id()),
        ));
    }

    if profile.config_dir().is_empty() || !is_project_relative(Path::new(profile.config_dir())) {
        return Err(ProfileError::invalid(
            id,
            "identity.configDir must be a relative directory name",
        ));
    }

    for (key, path) in profile.paths.entries() {
        if !is_project_relative(path) {
            return Err(ProfileError::invalid(
                id,
                format!("paths.{key} must be relative to the project root: {}", path.display()),
            ));
        }
    }

    for group in profile.capabilities.unknown_groups() {
        tracing::warn!(
            profile = id,
            group,
            known = ?CapabilityGroup::all(),
            "unknown capability group"
        );
    }

    if let Some(hooks) = &profile.hooks {
        let declared = profile.capabilities.hook_events();
        for (guard, registration) in hooks.guards.iter() {
            if !declared.iter().any(|e| *e == registration.event) {
                return Err(ProfileError::invalid(
                    id,
                    format!(
                        "guard '{guard}' uses event '{}' not listed in lifecycle.hookEvents",
                        registration.event
                    ),
                ));
            }
        }
    }

    Ok(())
}

fn is_project_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r"
identity:
  id: zed
  displayName: Zed
  configDir: .zed
paths:
  commands: .zed/commands
capabilities:
  core:
    commands: true
toolNames:
  bash: terminal
";

    #[test]
    fn test_parse_minimal() {
        let profile = parse_profile("zed", MINIMAL).unwrap();
        assert_eq!(profile.display_name(), "Zed");
        assert_eq!(profile.tool_name("bash"), Some("terminal"));
        assert!(profile.hooks.is_none());
    }

    #[test]
    fn test_missing_section_is_invalid() {
        let yaml = MINIMAL.replace("toolNames:\n  bash: terminal\n", "");
        let err = parse_profile("zed", &yaml).unwrap_err();
        assert!(err.to_string().contains("toolNames"));
        assert_eq!(err.code(), "PROFILE_INVALID");
    }

    #[test]
    fn test_id_mismatch_is_invalid() {
        assert!(parse_profile("helix", MINIMAL).is_err());
    }

    #[test]
    fn test_absolute_path_is_invalid() {
        let yaml = MINIMAL.replace(".zed/commands", "/etc/zed/commands");
        let err = parse_profile("zed", &yaml).unwrap_err();
        assert!(err.to_string().contains("paths.commands"));
    }

    #[test]
    fn test_escaping_path_is_invalid() {
        let yaml = MINIMAL.replace(".zed/commands", "../outside/commands");
        assert!(parse_profile("zed", &yaml).is_err());
    }

    #[test]
    fn test_unknown_group_is_tolerated() {
        let yaml = MINIMAL.replace("capabilities:\n", "capabilities:\n  telepathy:\n    mindMeld: true\n");
        let profile = parse_profile("zed", &yaml).unwrap();
        assert_eq!(
            profile.capabilities.state("telepathy", "mindMeld"),
            CapabilityState::Supported
        );
    }

    #[test]
    fn test_non_scalar_capability_values_load() {
        let yaml = MINIMAL.replace(
            "capabilities:\n",
            "capabilities:\n  external:\n    maxTokens: 1.5\n    limits:\n      perMinute: 60\n",
        );
        let profile = parse_profile("zed", &yaml).unwrap();
        assert_eq!(
            profile.capabilities.state("external", "maxTokens"),
            CapabilityState::Unsupported
        );
        assert!(profile.capabilities.get("external", "limits").is_some());
    }

    #[test]
    fn test_guard_event_must_be_declared() {
        let yaml = format!(
            "{MINIMAL}hooks:\n  format: event-map\n  guards:\n    bash:\n      event: beforeShell\n"
        );
        let err = parse_profile("zed", &yaml).unwrap_err();
        assert!(err.to_string().contains("beforeShell"));
    }

    #[test]
    fn test_builtin_profiles_are_valid() {
        let loader = ProfileLoader::builtin();
        let all = loader.load_all();
        assert_eq!(all.len(), 4);
        for (id, profile) in &all {
            assert_eq!(profile.id(), id);
        }
    }
}
