//! Reading hook file JSON into [`HookEntry`] lists and splicing owned
//! entries back into it

use super::{is_owned_hook, splice, HookEntry};
use crate::error::{HookError, HookResult};
use agileflow_profiles::HookFormat;
use serde_json::{Map, Value};

/// Read the entries out of a hook document. A document without a `hooks`
/// key has no entries.
pub fn decode(format: HookFormat, doc: &Map<String, Value>) -> HookResult<Vec<HookEntry>> {
    let Some(hooks) = doc.get("hooks") else {
        return Ok(Vec::new());
    };
    let Some(events) = hooks.as_object() else {
        return Err(HookError::Shape("`hooks` is not an object".to_string()));
    };

    let mut entries = Vec::new();

    for (event, list) in events {
        let list = list
            .as_array()
            .ok_or_else(|| HookError::Shape(format!("hooks for '{event}' are not a list")))?;

        for item in list {
            let object = item
                .as_object()
                .ok_or_else(|| HookError::Shape(format!("hook under '{event}' is not an object")))?;

            match format {
                HookFormat::EventMap => {
                    entries.push(HookEntry::new(event.clone(), None, object.clone()));
                }
                HookFormat::ClaudeSettings => {
                    let matcher = object
                        .get("matcher")
                        .and_then(Value::as_str)
                        .map(ToString::to_string);
                    let inner = match object.get("hooks") {
                        None => &[][..],
                        Some(Value::Array(inner)) => inner.as_slice(),
                        Some(_) => {
                            return Err(HookError::Shape(format!(
                                "hook group under '{event}' has a non-list `hooks`"
                            )))
                        }
                    };
                    for hook in inner {
                        let fields = hook.as_object().ok_or_else(|| {
                            HookError::Shape(format!("hook under '{event}' is not an object"))
                        })?;
                        entries.push(HookEntry::new(event.clone(), matcher.clone(), fields.clone()));
                    }
                }
            }
        }
    }

    Ok(entries)
}

/// Swap the hooks carrying `marker` in `doc` for `owned`, in place
///
/// Everything else keeps its shape: other top-level keys, empty event lists,
/// empty groups and any extra keys on a group. Within each event the new
/// entries take the place of the first owned one, or go at the end. Events
/// the file does not list yet are appended. `version` is added to event-map
/// documents that do not declare one.
///
/// # Errors
/// Returns [`HookError::Shape`] when the `hooks` value is not laid out as
/// `format` expects
pub fn replace_owned(
    format: HookFormat,
    doc: &mut Map<String, Value>,
    owned: &[HookEntry],
    marker: &str,
    version: Option<u64>,
) -> HookResult<()> {
    if format == HookFormat::EventMap {
        if let Some(version) = version {
            if !doc.contains_key("version") {
                doc.insert("version".to_string(), Value::from(version));
            }
        }
    }

    let hooks = doc
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(events) = hooks else {
        return Err(HookError::Shape("`hooks` is not an object".to_string()));
    };

    for (event, list) in events.iter_mut() {
        let Value::Array(items) = list else {
            return Err(HookError::Shape(format!("hooks for '{event}' are not a list")));
        };
        let slots = strip_owned(format, std::mem::take(items), marker, event)?;
        let fresh = owned_items(format, owned, event).into_iter().map(Some).collect();
        *items = splice(slots, fresh, Option::is_none)
            .into_iter()
            .flatten()
            .collect();
    }

    for entry in owned {
        if !events.contains_key(&entry.event) {
            let items = owned_items(format, owned, &entry.event);
            events.insert(entry.event.clone(), Value::Array(items));
        }
    }

    Ok(())
}

/// Remove owned hooks from one event list. `None` marks where owned hooks
/// were, so replacements can go back to the same spot.
fn strip_owned(
    format: HookFormat,
    items: Vec<Value>,
    marker: &str,
    event: &str,
) -> HookResult<Vec<Option<Value>>> {
    let mut slots = Vec::with_capacity(items.len());

    for item in items {
        let Value::Object(mut object) = item else {
            return Err(HookError::Shape(format!("hook under '{event}' is not an object")));
        };

        match format {
            HookFormat::EventMap => {
                if is_owned_hook(&object, marker) {
                    slots.push(None);
                } else {
                    slots.push(Some(Value::Object(object)));
                }
            }
            HookFormat::ClaudeSettings => {
                // (removed, left empty)
                let stripped = match object.get_mut("hooks") {
                    Some(Value::Array(hooks)) => {
                        let before = hooks.len();
                        hooks.retain(|h| !h.as_object().is_some_and(|f| is_owned_hook(f, marker)));
                        Some((before - hooks.len(), hooks.is_empty()))
                    }
                    _ => None,
                };
                match stripped {
                    Some((removed, true)) if removed > 0 => slots.push(None),
                    Some((removed, false)) if removed > 0 => {
                        slots.push(Some(Value::Object(object)));
                        slots.push(None);
                    }
                    _ => slots.push(Some(Value::Object(object))),
                }
            }
        }
    }

    Ok(slots)
}

/// File items for the owned entries of `event`. Grouped formats give each
/// entry a group of its own.
fn owned_items(format: HookFormat, owned: &[HookEntry], event: &str) -> Vec<Value> {
    owned
        .iter()
        .filter(|entry| entry.event == event)
        .map(|entry| match format {
            HookFormat::EventMap => Value::Object(entry.fields.clone()),
            HookFormat::ClaudeSettings => {
                let mut group = Map::new();
                if let Some(matcher) = &entry.matcher {
                    group.insert("matcher".to_string(), Value::from(matcher.as_str()));
                }
                group.insert(
                    "hooks".to_string(),
                    Value::Array(vec![Value::Object(entry.fields.clone())]),
                );
                Value::Object(group)
            }
        })
        .collect()
}
