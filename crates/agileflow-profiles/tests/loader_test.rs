//! Profile loader integration tests
//!
//! Exercises the loader against the embedded profiles and against
//! directories of hand-written profile documents.

use agileflow_profiles::{
    tool_alias, CapabilityState, CommandLayout, HookFormat, ProfileError, ProfileLoader,
    ProfileStore, ReferenceStyle,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn profile_yaml(id: &str, interactive: bool) -> String {
    format!(
        r"identity:
  id: {id}
  displayName: {id}
  configDir: .{id}
paths:
  commands: .{id}/commands
capabilities:
  core:
    interactiveInput: {interactive}
toolNames:
  askUser: null
"
    )
}

fn profile_dir(profiles: &[(&str, String)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in profiles {
        fs::write(dir.path().join(name), content).expect("Failed to write profile");
    }
    dir
}

#[test]
fn test_load_unknown_profile() {
    let loader = ProfileLoader::builtin();
    let err = loader.load("notepad").unwrap_err();
    assert!(matches!(err, ProfileError::NotFound { .. }));
    assert_eq!(err.code(), "PROFILE_NOT_FOUND");
}

#[test]
fn test_builtin_profiles_are_typed() {
    let loader = ProfileLoader::builtin();

    let cursor = loader.load("cursor").unwrap();
    assert_eq!(cursor.config_dir(), ".cursor");
    assert_eq!(cursor.layout.commands, CommandLayout::Flat);
    assert_eq!(cursor.layout.reference_style, ReferenceStyle::Hyphenated);
    assert_eq!(cursor.hooks.as_ref().unwrap().format, HookFormat::EventMap);

    let windsurf = loader.load("windsurf").unwrap();
    assert_eq!(windsurf.limits.command_max_chars, Some(12000));
    assert!(windsurf.layout.agent_skills);

    let codex = loader.load("codex").unwrap();
    assert!(codex.hooks.is_none());
    assert_eq!(codex.layout.reference_style, ReferenceStyle::Sigil);
}

#[test]
fn test_load_all_skips_malformed_profile() {
    let dir = profile_dir(&[
        ("good.yaml", profile_yaml("good", true)),
        ("broken.yaml", "identity: [unclosed".to_string()),
        ("partial.yaml", "identity:\n  id: partial\n".to_string()),
    ]);
    let loader = ProfileLoader::new(ProfileStore::directory(dir.path()));

    let all = loader.load_all();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["good"]);

    assert!(matches!(
        loader.load("broken").unwrap_err(),
        ProfileError::Invalid { .. }
    ));
    assert!(matches!(
        loader.load("partial").unwrap_err(),
        ProfileError::Invalid { .. }
    ));
}

#[test]
fn test_list_available_does_not_validate() {
    let dir = profile_dir(&[
        ("good.yaml", profile_yaml("good", true)),
        ("broken.yaml", "not: [valid".to_string()),
    ]);
    let loader = ProfileLoader::new(ProfileStore::directory(dir.path()));

    assert_eq!(loader.list_available().unwrap(), vec!["broken", "good"]);
    assert!(!loader.is_cached("good"));
}

#[test]
fn test_cache_and_clear() {
    let dir = profile_dir(&[("ide.yaml", profile_yaml("ide", true))]);
    let loader = ProfileLoader::new(ProfileStore::directory(dir.path()));

    let first = loader.load("ide").unwrap();
    assert!(loader.is_cached("ide"));

    // Edits on disk are invisible until the cache is cleared
    fs::write(dir.path().join("ide.yaml"), profile_yaml("ide", false)).unwrap();
    let second = loader.load("ide").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        loader.has_capability("ide", "core", "interactiveInput"),
        CapabilityState::Supported
    );

    loader.clear_cache();
    assert!(!loader.is_cached("ide"));
    assert_eq!(
        loader.has_capability("ide", "core", "interactiveInput"),
        CapabilityState::Unsupported
    );
}

#[test]
fn test_capability_queries() {
    let loader = ProfileLoader::builtin();

    assert_eq!(
        loader.has_capability("claude-code", "core", "subAgents"),
        CapabilityState::Supported
    );
    assert_eq!(
        loader.has_capability("cursor", "core", "teleport"),
        CapabilityState::Unknown
    );
    assert_eq!(
        loader.has_capability("cursor", "dreams", "lucid"),
        CapabilityState::Unknown
    );
    assert_eq!(
        loader.has_capability("notepad", "core", "commands"),
        CapabilityState::Unknown
    );

    assert_eq!(
        loader.find_ides_with_capability("lifecycle", "hooks"),
        vec!["claude-code", "cursor", "windsurf"]
    );

    let comparison = loader.compare_capability("core", "interactiveInput");
    assert_eq!(comparison["claude-code"], CapabilityState::Supported);
    assert_eq!(comparison["windsurf"], CapabilityState::Unsupported);
    assert_eq!(comparison.len(), 4);
}

#[test]
fn test_tool_names() {
    let loader = ProfileLoader::builtin();
    assert_eq!(
        loader.tool_name("cursor", tool_alias::BASH).as_deref(),
        Some("run_terminal_cmd")
    );
    assert_eq!(loader.tool_name("cursor", tool_alias::ASK_USER), None);
    assert_eq!(loader.tool_name("cursor", "teleport"), None);
}

#[test]
fn test_concurrent_loads_share_cache() {
    let loader = ProfileLoader::builtin();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for id in ["claude-code", "cursor", "windsurf", "codex"] {
                    assert_eq!(loader.load(id).unwrap().id(), id);
                }
            });
        }
    });

    let a = loader.load("cursor").unwrap();
    let b = loader.load("cursor").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
