//! Read-merge-write wrapper around a hook configuration file

use super::{decode, replace_owned, HookEntry};
use crate::error::{HookError, HookResult};
use crate::util::atomic_write;
use agileflow_profiles::HookFormat;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;

/// Outcome of a hook file update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookUpdate {
    /// Owned entries now registered in the file
    pub registered: usize,
    /// Whether the file was written
    pub changed: bool,
}

/// Load a hook document. `Ok(None)` when the file does not exist.
pub fn read_document(path: &Path) -> HookResult<Option<(String, Map<String, Value>)>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(HookError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(doc)) => Ok(Some((raw, doc))),
        Ok(_) => Err(HookError::Corrupt {
            path: path.to_path_buf(),
            message: "top level is not a JSON object".to_string(),
        }),
        Err(e) => Err(HookError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Merge `owned` into the hook file at `path`
///
/// A missing file counts as empty and is only created when there is
/// something to register. A file with nothing of ours in it is left alone
/// when there is nothing to register. Otherwise the file is rewritten only
/// when its content changes.
pub fn update_hook_file(
    path: &Path,
    format: HookFormat,
    version: Option<u64>,
    owned: Vec<HookEntry>,
    marker: &str,
) -> HookResult<HookUpdate> {
    let registered = owned.len();
    let (original, mut doc) = match read_document(path)? {
        Some((raw, doc)) => (Some(raw), doc),
        None if owned.is_empty() => return Ok(HookUpdate::default()),
        None => (None, Map::new()),
    };

    let corrupt = |e: HookError| HookError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let existing = decode(format, &doc).map_err(corrupt)?;
    if owned.is_empty() && !existing.iter().any(|e| e.is_owned(marker)) {
        tracing::debug!(path = %path.display(), "no registered hooks to remove");
        return Ok(HookUpdate::default());
    }

    let before = doc.clone();
    replace_owned(format, &mut doc, &owned, marker, version).map_err(corrupt)?;

    // Same content in a differently formatted file is left alone
    if original.is_some() && doc == before {
        tracing::debug!(path = %path.display(), "hook file already up to date");
        return Ok(HookUpdate {
            registered,
            changed: false,
        });
    }

    let mut rendered = serde_json::to_string_pretty(&Value::Object(doc)).map_err(|e| {
        HookError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    rendered.push('\n');

    if original.as_deref() == Some(rendered.as_str()) {
        return Ok(HookUpdate {
            registered,
            changed: false,
        });
    }

    atomic_write(path, rendered.as_bytes()).map_err(|e| HookError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!(path = %path.display(), registered, "hook file updated");

    Ok(HookUpdate {
        registered,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const MARKER: &str = ".windsurf/hooks/damage-control";

    fn owned() -> Vec<HookEntry> {
        let Value::Object(fields) =
            json!({"command": "node", "args": [".windsurf/hooks/damage-control/bash-tool-damage-control.js"]})
        else {
            unreachable!()
        };
        vec![HookEntry::new("pre_run_command", None, fields)]
    }

    #[test]
    fn test_missing_file_not_created_without_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.json");

        let update = update_hook_file(&path, HookFormat::EventMap, None, Vec::new(), MARKER).unwrap();
        assert_eq!(update, HookUpdate::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_second_update_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.json");

        let first = update_hook_file(&path, HookFormat::EventMap, None, owned(), MARKER).unwrap();
        assert!(first.changed);
        let bytes = fs::read(&path).unwrap();

        let second = update_hook_file(&path, HookFormat::EventMap, None, owned(), MARKER).unwrap();
        assert!(!second.changed);
        assert_eq!(second.registered, 1);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_unrelated_keys_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.json");
        fs::write(&path, r#"{"theme": "dark", "hooks": {"stop": [{"command": "./bye.sh"}]}}"#).unwrap();

        update_hook_file(&path, HookFormat::EventMap, None, owned(), MARKER).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["hooks"]["stop"][0]["command"], "./bye.sh");
        assert_eq!(doc["hooks"]["pre_run_command"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.json");
        fs::write(&path, "{ not json").unwrap();

        let err = update_hook_file(&path, HookFormat::EventMap, None, owned(), MARKER).unwrap_err();
        assert!(matches!(err, HookError::Corrupt { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_file_without_our_hooks_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"permissions":{"allow":[]}}"#).unwrap();

        let update =
            update_hook_file(&path, HookFormat::ClaudeSettings, None, Vec::new(), MARKER).unwrap();
        assert_eq!(update, HookUpdate::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"permissions":{"allow":[]}}"#);
    }

    #[test]
    fn test_empty_lists_survive_update() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.json");
        fs::write(&path, r#"{"hooks": {"stop": [], "pre_run_command": []}}"#).unwrap();

        update_hook_file(&path, HookFormat::EventMap, None, owned(), MARKER).unwrap();
        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["hooks"]["stop"], json!([]));
        assert_eq!(doc["hooks"]["pre_run_command"].as_array().unwrap().len(), 1);

        update_hook_file(&path, HookFormat::EventMap, None, Vec::new(), MARKER).unwrap();
        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["hooks"], json!({"stop": [], "pre_run_command": []}));
    }
}
