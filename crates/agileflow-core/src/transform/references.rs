//! Text rewrites applied to canonical content
//!
//! Each rewriter compiles its pattern once per (source, target) pair and is
//! then applied with a single `replace_all`, so rewrites never see each
//! other's output within a pass.

use crate::error::TransformResult;
use crate::MANAGED_NAMESPACE;
use agileflow_profiles::{CapabilityProfile, ReferenceStyle};
use regex::{Captures, NoExpand, Regex};
use std::borrow::Cow;
use std::collections::HashMap;

/// Native invocation syntax for a command identified by its segments
pub fn native_reference(style: ReferenceStyle, segments: &[&str]) -> String {
    match style {
        ReferenceStyle::Namespaced => format!("/{MANAGED_NAMESPACE}:{}", segments.join(":")),
        ReferenceStyle::Hyphenated => format!("/{}", segments.join("-")),
        ReferenceStyle::Prefixed => format!("/{MANAGED_NAMESPACE}-{}", segments.join("-")),
        ReferenceStyle::Sigil => format!("${MANAGED_NAMESPACE}-{}", segments.join("-")),
    }
}

/// Rewrites `/agileflow:group:action` command references
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    pattern: Regex,
    style: ReferenceStyle,
}

impl ReferenceRewriter {
    pub fn new(style: ReferenceStyle) -> TransformResult<Self> {
        // Group 1 is the boundary character, kept as is
        let pattern = Regex::new(&format!(
            r"(^|[^\w/.:-])/{}((?::[A-Za-z0-9][A-Za-z0-9_-]*)+)",
            regex::escape(MANAGED_NAMESPACE)
        ))?;
        Ok(Self { pattern, style })
    }

    /// Number of canonical references in `text`
    pub fn count(&self, text: &str) -> usize {
        self.pattern
            .find_iter(text)
            .filter(|m| ends_reference(text, m.end()))
            .count()
    }

    pub fn rewrite<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.style == ReferenceStyle::Namespaced {
            return Cow::Borrowed(text);
        }
        self.pattern.replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            if caps.get(0).is_some_and(|m| !ends_reference(text, m.end())) {
                return whole.to_string();
            }
            let segments: Vec<&str> = caps[2].split(':').filter(|s| !s.is_empty()).collect();
            format!("{}{}", &caps[1], native_reference(self.style, &segments))
        })
    }
}

/// A reference ends at `end` unless a dangling `:` or a word character
/// follows, in which case the text is not a reference we can translate
fn ends_reference(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .map_or(true, |c| c != ':' && c != '_' && !c.is_alphanumeric())
}

/// Rewrites the source config directory and instructions file names
#[derive(Debug, Clone)]
pub struct PathRewriter {
    rules: Vec<PathRule>,
}

#[derive(Debug, Clone)]
struct PathRule {
    pattern: Regex,
    replacement: String,
    /// Group 1 holds a boundary character that is kept as is
    bounded: bool,
}

impl PathRule {
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.bounded {
            self.pattern
                .replace_all(text, |caps: &Captures| format!("{}{}", &caps[1], self.replacement))
        } else {
            self.pattern.replace_all(text, NoExpand(self.replacement.as_str()))
        }
    }
}

impl PathRewriter {
    pub fn new(source: &CapabilityProfile, target: &CapabilityProfile) -> TransformResult<Self> {
        let mut rules = Vec::new();

        // Every occurrence of the source config dir goes, wherever it sits
        if source.config_dir() != target.config_dir() {
            rules.push(PathRule {
                pattern: Regex::new(&regex::escape(source.config_dir()))?,
                replacement: target.config_dir().to_string(),
                bounded: false,
            });
        }

        if let (Some(from), Some(to)) = (
            source.instructions_file_name(),
            target.instructions_file_name(),
        ) {
            if from != to {
                rules.push(PathRule {
                    pattern: Regex::new(&format!(r"(^|[^\w.-]){}\b", regex::escape(from)))?,
                    replacement: to.to_string(),
                    bounded: true,
                });
            }
        }

        Ok(Self { rules })
    }

    pub fn rewrite<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut out = Cow::Borrowed(text);
        for rule in &self.rules {
            let replaced = match rule.apply(&out) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                out = Cow::Owned(s);
            }
        }
        out
    }
}

/// Rewrites explicit tool references: `` `Bash` ``, `Bash tool`, `name="Bash"`
#[derive(Debug, Clone)]
pub struct ToolRewriter {
    pattern: Option<Regex>,
    names: HashMap<String, String>,
}

impl ToolRewriter {
    pub fn new(source: &CapabilityProfile, target: &CapabilityProfile) -> TransformResult<Self> {
        let names: HashMap<String, String> = source
            .tool_names
            .iter()
            .filter_map(|(alias, canonical)| {
                let canonical = canonical.as_deref()?;
                let native = target.tool_name(alias)?;
                (native != canonical).then(|| (canonical.to_string(), native.to_string()))
            })
            .collect();

        if names.is_empty() {
            return Ok(Self {
                pattern: None,
                names,
            });
        }

        // Longest first so alternation never stops at a shorter name
        let mut canonical: Vec<&str> = names.keys().map(String::as_str).collect();
        canonical.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = canonical
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(
            r#"`({alternation})`|\b({alternation}) tool\b|name="({alternation})""#
        ))?;

        Ok(Self {
            pattern: Some(pattern),
            names,
        })
    }

    pub fn rewrite<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(text);
        };
        pattern.replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            let Some(name) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
                return whole.to_string();
            };
            match self.names.get(name.as_str()) {
                Some(native) => whole.replacen(name.as_str(), native, 1),
                None => whole.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agileflow_profiles::ProfileLoader;

    fn rewriter(style: ReferenceStyle) -> ReferenceRewriter {
        ReferenceRewriter::new(style).unwrap()
    }

    #[test]
    fn test_native_reference_styles() {
        let segs = ["story", "list"];
        assert_eq!(native_reference(ReferenceStyle::Namespaced, &segs), "/agileflow:story:list");
        assert_eq!(native_reference(ReferenceStyle::Hyphenated, &segs), "/story-list");
        assert_eq!(native_reference(ReferenceStyle::Prefixed, &segs), "/agileflow-story-list");
        assert_eq!(native_reference(ReferenceStyle::Sigil, &segs), "$agileflow-story-list");
    }

    #[test]
    fn test_rewrites_every_occurrence() {
        let text = "Run /agileflow:story:list, then /agileflow:epic.\n/agileflow:status";
        let out = rewriter(ReferenceStyle::Hyphenated).rewrite(text);
        assert_eq!(out, "Run /story-list, then /epic.\n/status");
    }

    #[test]
    fn test_adjacent_references() {
        let out = rewriter(ReferenceStyle::Sigil).rewrite("(/agileflow:a /agileflow:b)");
        assert_eq!(out, "($agileflow-a $agileflow-b)");
    }

    #[test]
    fn test_word_boundaries_respected() {
        let r = rewriter(ReferenceStyle::Hyphenated);
        for text in [
            "https://example.com/agileflow:story",
            "docs/agileflow:story",
            "x/agileflow:story",
            "foo:/agileflow:story",
            "/agileflowx:story",
            "/agileflow",
            "/agileflow:story:",
            "/agileflow:storyé",
        ] {
            assert_eq!(r.rewrite(text), text, "{text}");
        }
    }

    #[test]
    fn test_dangling_colon_is_not_rewritten() {
        let r = rewriter(ReferenceStyle::Hyphenated);
        assert_eq!(
            r.rewrite("Try /agileflow:story: or /agileflow:story."),
            "Try /agileflow:story: or /story."
        );
        assert_eq!(r.count("/agileflow:story: /agileflow:epic"), 1);
    }

    #[test]
    fn test_count() {
        let r = rewriter(ReferenceStyle::Prefixed);
        assert_eq!(r.count("/agileflow:a and /agileflow:b:c but not a/agileflow:d"), 2);
    }

    #[test]
    fn test_path_rewriter() {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let target = loader.load("cursor").unwrap();
        let paths = PathRewriter::new(&source, &target).unwrap();

        assert_eq!(
            paths.rewrite("See .claude/agents and CLAUDE.md; not myCLAUDE.md"),
            "See .cursor/agents and AGENTS.md; not myCLAUDE.md"
        );
    }

    #[test]
    fn test_path_rewriter_leaves_no_config_dir() {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let target = loader.load("windsurf").unwrap();
        let paths = PathRewriter::new(&source, &target).unwrap();

        let out = paths.rewrite("Keep .claude_local/x, cfg.claude/y and .claudex in sync.");
        assert_eq!(
            out,
            "Keep .windsurf_local/x, cfg.windsurf/y and .windsurfx in sync."
        );
        assert!(!out.contains(".claude"));
    }

    #[test]
    fn test_tool_rewriter_explicit_only() {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let target = loader.load("cursor").unwrap();
        let tools = ToolRewriter::new(&source, &target).unwrap();

        let out = tools.rewrite(
            "Use the Bash tool or `Read`. <invoke name=\"Grep\">. Bash scripts stay. `TodoWrite`",
        );
        assert_eq!(
            out,
            "Use the run_terminal_cmd tool or `read_file`. <invoke name=\"grep_search\">. Bash scripts stay. `todo_write`"
        );
    }

    #[test]
    fn test_tool_rewriter_noop_for_same_names() {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let tools = ToolRewriter::new(&source, &source).unwrap();
        assert!(matches!(tools.rewrite("the Bash tool"), Cow::Borrowed(_)));
    }
}
