//! Markdown output formatter

use crate::capability::CapabilityValue;
use crate::types::CapabilityProfile;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::sync::Arc;

/// Render every declared capability as a table with one column per IDE
#[must_use]
pub fn capability_matrix(profiles: &BTreeMap<String, Arc<CapabilityProfile>>) -> String {
    let mut output = String::new();

    output.push_str("# IDE Capability Matrix\n\n");
    if profiles.is_empty() {
        output.push_str("_No profiles loaded_\n");
        return output;
    }

    // Union of (group, name) across profiles, so gaps show up as `?`
    let mut keys: BTreeSet<(String, String)> = BTreeSet::new();
    for profile in profiles.values() {
        for (group, caps) in profile.capabilities.groups() {
            for name in caps.keys() {
                keys.insert((group.clone(), name.clone()));
            }
        }
    }

    output.push_str("| Capability |");
    for profile in profiles.values() {
        let _ = write!(output, " {} |", profile.display_name());
    }
    output.push('\n');
    output.push_str("|---|");
    for _ in profiles {
        output.push_str("---|");
    }
    output.push('\n');

    for (group, name) in &keys {
        let _ = write!(output, "| `{group}.{name}` |");
        for profile in profiles.values() {
            let cell = profile
                .capabilities
                .get(group, name)
                .map_or_else(|| "?".to_string(), CapabilityValue::display);
            let _ = write!(output, " {cell} |");
        }
        output.push('\n');
    }

    output.push_str("\n## Tools\n\n| Alias |");
    for profile in profiles.values() {
        let _ = write!(output, " {} |", profile.display_name());
    }
    output.push('\n');
    output.push_str("|---|");
    for _ in profiles {
        output.push_str("---|");
    }
    output.push('\n');

    let aliases: BTreeSet<&String> = profiles
        .values()
        .flat_map(|p| p.tool_names.keys())
        .collect();
    for alias in aliases {
        let _ = write!(output, "| `{alias}` |");
        for profile in profiles.values() {
            let _ = write!(output, " {} |", profile.tool_name(alias).unwrap_or("-"));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ProfileLoader;

    #[test]
    fn test_matrix_has_column_per_profile() {
        let profiles = ProfileLoader::builtin().load_all();
        let md = capability_matrix(&profiles);

        assert!(md.contains("| Capability | Claude Code | Codex | Cursor | Windsurf |"));
        assert!(md.contains("| `core.interactiveInput` | yes | no | no | no |"));
        assert!(md.contains("| `askUser` | AskUserQuestion | - | - | - |"));
    }

    #[test]
    fn test_matrix_empty() {
        let md = capability_matrix(&BTreeMap::new());
        assert!(md.contains("_No profiles loaded_"));
    }
}
