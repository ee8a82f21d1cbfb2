//! Hook registration model and merge
//!
//! Hook files are shared with the user. Entries this tool owns are told apart
//! by a marker (the guard script directory) in their command or arguments;
//! everything else is foreign and passes through untouched.

pub mod damage_control;
mod file;
mod format;

pub use file::{read_document, update_hook_file, HookUpdate};
pub use format::{decode, replace_owned};

use serde_json::{Map, Value};

/// One hook registration, flattened out of the file's nesting
#[derive(Debug, Clone, PartialEq)]
pub struct HookEntry {
    pub event: String,
    pub matcher: Option<String>,
    /// The hook object exactly as it appears in the file
    pub fields: Map<String, Value>,
}

impl HookEntry {
    pub fn new(event: impl Into<String>, matcher: Option<String>, fields: Map<String, Value>) -> Self {
        Self {
            event: event.into(),
            matcher,
            fields,
        }
    }

    pub fn command(&self) -> Option<&str> {
        command(&self.fields)
    }

    pub fn args(&self) -> Vec<&str> {
        args(&self.fields)
    }

    /// Whether this entry was registered by us
    pub fn is_owned(&self, marker: &str) -> bool {
        is_owned_hook(&self.fields, marker)
    }
}

fn command(fields: &Map<String, Value>) -> Option<&str> {
    fields.get("command").and_then(Value::as_str)
}

fn args(fields: &Map<String, Value>) -> Vec<&str> {
    fields
        .get("args")
        .and_then(Value::as_array)
        .map(|args| args.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Whether a raw hook object carries `marker` in its command or arguments
pub(crate) fn is_owned_hook(fields: &Map<String, Value>, marker: &str) -> bool {
    command(fields).is_some_and(|c| c.contains(marker))
        || args(fields).iter().any(|a| a.contains(marker))
}

/// Replace owned entries with `owned`, keeping foreign entries in order
///
/// The new owned entries take the place of the first previously owned entry,
/// or go at the end when there was none. Merging the same `owned` set twice
/// gives the same result.
pub fn merge(existing: Vec<HookEntry>, owned: Vec<HookEntry>, marker: &str) -> Vec<HookEntry> {
    splice(existing, owned, |entry| entry.is_owned(marker))
}

/// [`merge`] over any item type
pub(crate) fn splice<T>(existing: Vec<T>, owned: Vec<T>, is_owned: impl Fn(&T) -> bool) -> Vec<T> {
    let mut merged = Vec::with_capacity(existing.len() + owned.len());
    let mut owned = Some(owned);

    for entry in existing {
        if is_owned(&entry) {
            if let Some(owned) = owned.take() {
                merged.extend(owned);
            }
        } else {
            merged.push(entry);
        }
    }

    if let Some(owned) = owned {
        merged.extend(owned);
    }
    merged
}

/// Drop every owned entry
pub fn remove_owned(existing: Vec<HookEntry>, marker: &str) -> Vec<HookEntry> {
    merge(existing, Vec::new(), marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MARKER: &str = ".cursor/hooks/damage-control";

    fn entry(event: &str, command: &str, args: &[&str]) -> HookEntry {
        let Value::Object(fields) = json!({ "command": command, "args": args }) else {
            unreachable!()
        };
        HookEntry::new(event, None, fields)
    }

    fn owned() -> Vec<HookEntry> {
        vec![
            entry("beforeShellExecution", "node", &[".cursor/hooks/damage-control/bash-tool-damage-control.js"]),
            entry("afterFileEdit", "node", &[".cursor/hooks/damage-control/edit-tool-damage-control.js"]),
        ]
    }

    #[test]
    fn test_ownership_by_command_or_args() {
        assert!(entry("e", "node", &[".cursor/hooks/damage-control/x.js"]).is_owned(MARKER));
        assert!(entry("e", "node .cursor/hooks/damage-control/x.js", &[]).is_owned(MARKER));
        assert!(!entry("e", "./lint.sh", &["--fix"]).is_owned(MARKER));
    }

    #[test]
    fn test_merge_appends_when_nothing_owned() {
        let user = entry("beforeShellExecution", "./audit.sh", &[]);
        let merged = merge(vec![user.clone()], owned(), MARKER);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], user);
    }

    #[test]
    fn test_merge_replaces_in_place_and_is_idempotent() {
        let before = entry("stop", "./before.sh", &[]);
        let after = entry("stop", "./after.sh", &[]);
        let stale = entry("beforeShellExecution", "node", &[".cursor/hooks/damage-control/old.js"]);

        let once = merge(vec![before.clone(), stale, after.clone()], owned(), MARKER);
        assert_eq!(once.len(), 4);
        assert_eq!(once[0], before);
        assert_eq!(&once[1..3], owned().as_slice());
        assert_eq!(once[3], after);

        let twice = merge(once.clone(), owned(), MARKER);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_remove_owned() {
        let user = entry("stop", "./after.sh", &[]);
        let mut existing = owned();
        existing.push(user.clone());
        assert_eq!(remove_owned(existing, MARKER), vec![user]);
    }
}
