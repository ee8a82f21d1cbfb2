//! Frontmatter reshaping for the target's metadata schema

use super::document::{first_heading, Frontmatter};
use super::TransformWarning;
use crate::managed_name;
use agileflow_profiles::{ArtifactKind, CapabilityProfile};
use serde_yaml::{Mapping, Value};
use std::borrow::Cow;

/// Keys whose values are tool lists
const TOOL_KEYS: &[&str] = &["tools", "allowed-tools"];

/// Version written into skills that must declare one
pub const DEFAULT_VERSION: &str = "1.0.0";

pub(crate) struct Reshape<'a> {
    pub source: &'a CapabilityProfile,
    pub target: &'a CapabilityProfile,
    pub kind: ArtifactKind,
    pub slug: &'a str,
    pub body: &'a str,
}

impl Reshape<'_> {
    /// Render the target frontmatter block, or an empty string for none.
    /// An unchanged mapping keeps the original text byte for byte.
    pub fn apply<F>(
        &self,
        frontmatter: Option<Frontmatter<'_>>,
        rewrite: F,
        warnings: &mut Vec<TransformWarning>,
    ) -> String
    where
        F: Fn(&str) -> Cow<'_, str>,
    {
        let original = match frontmatter.map(|fm| parse_mapping(fm.yaml)) {
            None => Mapping::new(),
            Some(Ok(mapping)) => mapping,
            Some(Err(reason)) => {
                warnings.push(TransformWarning::UnparseableFrontmatter { reason });
                return frontmatter.map_or_else(String::new, |fm| rewrite(fm.raw).into_owned());
            }
        };

        let reshaped = self.reshape(&original, &rewrite);

        if let Some(fm) = frontmatter {
            if reshaped == original {
                return fm.raw.to_string();
            }
        }
        if reshaped.is_empty() {
            return String::new();
        }

        match serde_yaml::to_string(&reshaped) {
            Ok(yaml) => format!("---\n{yaml}---\n"),
            Err(e) => {
                warnings.push(TransformWarning::UnparseableFrontmatter {
                    reason: e.to_string(),
                });
                frontmatter.map_or_else(String::new, |fm| rewrite(fm.raw).into_owned())
            }
        }
    }

    fn reshape<F>(&self, original: &Mapping, rewrite: &F) -> Mapping
    where
        F: Fn(&str) -> Cow<'_, str>,
    {
        let allowed = self.target.frontmatter.for_kind(self.kind);
        let allows = |key: &str| allowed.map_or(true, |keys| keys.iter().any(|k| k == key));
        let lists = |key: &str| allowed.is_some_and(|keys| keys.iter().any(|k| k == key));

        let mut kept = Mapping::new();
        for (key, value) in original {
            let Some(name) = key.as_str() else {
                continue;
            };
            if !allows(name) {
                continue;
            }

            let value = if TOOL_KEYS.contains(&name) {
                match self.map_tools(value) {
                    Some(tools) => tools,
                    None => continue,
                }
            } else if let Value::String(s) = value {
                Value::String(rewrite(s).into_owned())
            } else {
                value.clone()
            };
            kept.insert(key.clone(), value);
        }

        let has = |m: &Mapping, key: &str| m.get(key).is_some_and(|v| !v.is_null());
        let is_skill = self.kind == ArtifactKind::Skill;
        let is_agent = self.kind == ArtifactKind::Agent;

        let name = if is_skill && allows("name") {
            Some(managed_name(self.slug))
        } else if is_agent && allows("name") && !has(&kept, "name") {
            Some(self.slug.to_string())
        } else {
            None
        };

        let description = ((is_skill || is_agent)
            && allows("description")
            && !has(&kept, "description"))
        .then(|| {
            first_heading(self.body)
                .map_or_else(|| self.slug.to_string(), |h| rewrite(h).into_owned())
        });

        let version = (is_skill && lists("version") && !has(&kept, "version"))
            .then(|| DEFAULT_VERSION.to_string());

        let mut out = Mapping::new();
        if let Some(name) = name {
            out.insert(Value::from("name"), Value::from(name));
        }
        if let Some(description) = description {
            out.insert(Value::from("description"), Value::from(description));
        }
        for (key, value) in kept {
            if !out.contains_key(&key) {
                out.insert(key, value);
            }
        }
        if let Some(version) = version {
            out.insert(Value::from("version"), Value::from(version));
        }
        out
    }

    /// Map a tool list through the target's tool names. Tools the target
    /// lacks are dropped; names with no known alias pass through. `None`
    /// when nothing survives.
    fn map_tools(&self, value: &Value) -> Option<Value> {
        let (names, csv): (Vec<&str>, bool) = match value {
            Value::String(s) => (
                s.split(',').map(str::trim).filter(|t| !t.is_empty()).collect(),
                true,
            ),
            Value::Sequence(seq) => (seq.iter().filter_map(Value::as_str).collect(), false),
            other => return Some(other.clone()),
        };

        let mut mapped: Vec<String> = Vec::new();
        for name in names {
            let native = match self.source.tool_alias(name) {
                Some(alias) => self.target.tool_name(alias),
                None => Some(name),
            };
            match native {
                Some(native) if !mapped.iter().any(|m| m == native) => {
                    mapped.push(native.to_string());
                }
                Some(_) => {}
                None => {
                    tracing::debug!(tool = name, target_ide = self.target.id(), "dropping unsupported tool");
                }
            }
        }

        if mapped.is_empty() {
            return None;
        }
        Some(if csv {
            Value::String(mapped.join(", "))
        } else {
            Value::Sequence(mapped.into_iter().map(Value::String).collect())
        })
    }
}

fn parse_mapping(yaml: &str) -> Result<Mapping, String> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err("frontmatter is not a mapping".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::document::split;
    use agileflow_profiles::ProfileLoader;

    fn reshape(
        target: &str,
        kind: ArtifactKind,
        slug: &str,
        content: &str,
    ) -> (String, Vec<TransformWarning>) {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let target = loader.load(target).unwrap();
        let doc = split(content);
        let ctx = Reshape {
            source: &source,
            target: &target,
            kind,
            slug,
            body: doc.body,
        };
        let mut warnings = Vec::new();
        let out = ctx.apply(doc.frontmatter, |s| Cow::Borrowed(s), &mut warnings);
        (out, warnings)
    }

    #[test]
    fn test_cursor_command_drops_unknown_keys() {
        let (out, _) = reshape(
            "cursor",
            ArtifactKind::Command,
            "status",
            "---\ndescription: Show status\nargument-hint: \"[epic]\"\nallowed-tools: Bash, Read\n---\nbody",
        );
        assert_eq!(out, "---\ndescription: Show status\n---\n");
    }

    #[test]
    fn test_unchanged_mapping_keeps_original_text() {
        let raw = "---\ndescription:   'Show status'   # comment\n---\n";
        let (out, _) = reshape("cursor", ArtifactKind::Command, "status", &format!("{raw}body"));
        assert_eq!(out, raw);
    }

    #[test]
    fn test_agent_tools_mapped_and_dropped() {
        let loader = ProfileLoader::builtin();
        let mut target = (*loader.load("cursor").unwrap()).clone();
        target.frontmatter.agent = None;
        let source = loader.load("claude-code").unwrap();

        let content = "---\nname: planner\ntools: AskUserQuestion, Bash, Read, mcp__github\n---\n";
        let doc = split(content);
        let ctx = Reshape {
            source: &source,
            target: &target,
            kind: ArtifactKind::Agent,
            slug: "planner",
            body: doc.body,
        };
        let mut warnings = Vec::new();
        let out = ctx.apply(doc.frontmatter, |s| Cow::Borrowed(s), &mut warnings);
        assert!(out.contains("tools: run_terminal_cmd, read_file, mcp__github\n"));
    }

    #[test]
    fn test_codex_skill_synthesises_required_keys() {
        let (out, _) = reshape(
            "codex",
            ArtifactKind::Skill,
            "epic-planner",
            "---\nname: epic-planner\nmodel: opus\n---\n# Epic Planner\n\nPlans.",
        );
        assert_eq!(
            out,
            "---\nname: agileflow-epic-planner\ndescription: Epic Planner\nversion: 1.0.0\n---\n"
        );
    }

    #[test]
    fn test_skill_name_not_double_prefixed() {
        let (out, _) = reshape("windsurf", ArtifactKind::Skill, "agileflow-helper", "body");
        assert!(out.starts_with("---\nname: agileflow-helper\ndescription: agileflow-helper\n"));
        assert!(!out.contains("version"));
    }

    #[test]
    fn test_command_without_frontmatter_stays_bare() {
        let (out, _) = reshape("cursor", ArtifactKind::Command, "help", "# Help\n");
        assert_eq!(out, "");
    }

    #[test]
    fn test_unparseable_frontmatter_kept_with_warning() {
        let raw = "---\ndescription: [unclosed\n---\n";
        let (out, warnings) = reshape("cursor", ArtifactKind::Command, "x", &format!("{raw}body"));
        assert_eq!(out, raw);
        assert!(matches!(
            warnings.as_slice(),
            [TransformWarning::UnparseableFrontmatter { .. }]
        ));
    }
}
