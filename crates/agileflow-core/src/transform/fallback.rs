//! Plain-text substitutes for tool invocations the target cannot perform
//!
//! Canonical content asks structured questions and delegates to sub-agents
//! through inline `<invoke>` blocks. Targets without those capabilities get a
//! numbered prompt or a manual delegation note carrying the same choices.

use super::TransformWarning;
use crate::error::TransformResult;
use agileflow_profiles::{tool_alias, Capability, CapabilityProfile, CapabilityState};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

fn parameter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)<parameter name="([^"]+)">(.*?)</parameter>"#).unwrap()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Question {
    question: String,
    #[serde(default)]
    header: Option<String>,
    #[serde(default)]
    multi_select: bool,
    #[serde(default)]
    options: Vec<QuestionOption>,
}

#[derive(Debug, Deserialize)]
struct QuestionOption {
    label: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Substitute {
    Question,
    Delegation,
}

/// Code fences and `<function_calls>` blocks that may wrap invocations.
/// Group 1 is a fence body, group 2 a `<function_calls>` body.
fn container_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```|<function_calls>(.*?)</function_calls>")
            .unwrap()
    })
}

/// Rule for one capability-gated invocation
#[derive(Debug, Clone)]
struct FallbackRule {
    tool: String,
    substitute: Substitute,
    capability: Capability,
    state: CapabilityState,
}

/// Compiled fallbacks for a (source, target) pair
#[derive(Debug, Clone, Default)]
pub struct CapabilityFallback {
    rules: Vec<FallbackRule>,
    /// Any gated invocation. Group 1 is the tool, group 2 the body.
    invocation: Option<Regex>,
}

/// What fired during one `apply`
#[derive(Debug, Default)]
struct Pass {
    fired: Vec<bool>,
    unparseable: bool,
}

impl CapabilityFallback {
    pub fn new(source: &CapabilityProfile, target: &CapabilityProfile) -> TransformResult<Self> {
        let candidates = [
            (tool_alias::ASK_USER, Capability::InteractiveInput, Substitute::Question),
            (tool_alias::DELEGATE, Capability::SubAgents, Substitute::Delegation),
        ];

        let mut rules = Vec::new();
        for (alias, capability, substitute) in candidates {
            let state = target.supports(capability);
            if state.is_supported() {
                continue;
            }
            let Some(tool) = source.tool_name(alias) else {
                continue;
            };
            rules.push(FallbackRule {
                tool: tool.to_string(),
                substitute,
                capability,
                state,
            });
        }

        let invocation = if rules.is_empty() {
            None
        } else {
            let alternation = rules
                .iter()
                .map(|r| regex::escape(&r.tool))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                r#"(?s)<invoke name="({alternation})">(.*?)</invoke>"#
            ))?)
        };

        Ok(Self { rules, invocation })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replace every gated invocation in `body`
    pub fn apply<'t>(&self, body: &'t str, warnings: &mut Vec<TransformWarning>) -> Cow<'t, str> {
        let Some(invocation) = &self.invocation else {
            return Cow::Borrowed(body);
        };
        if !invocation.is_match(body) {
            return Cow::Borrowed(body);
        }

        let mut pass = Pass {
            fired: vec![false; self.rules.len()],
            unparseable: false,
        };
        let out = self.rewrite(invocation, body, &mut pass);

        for (rule, fired) in self.rules.iter().zip(&pass.fired) {
            if *fired && rule.state == CapabilityState::Unknown {
                let (group, name) = rule.capability.key();
                warnings.push(TransformWarning::CapabilityNotModelled {
                    capability: format!("{group}.{name}"),
                });
            }
        }
        if pass.unparseable {
            warnings.push(TransformWarning::UnparseableQuestions);
        }

        Cow::Owned(out)
    }

    /// Rewrite wrapped invocations first, then bare ones. A wrapper that held
    /// nothing but gated invocations is dropped along with them.
    fn rewrite(&self, invocation: &Regex, text: &str, pass: &mut Pass) -> String {
        let unwrapped = container_pattern().replace_all(text, |caps: &Captures| {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2)))
            else {
                return caps[0].to_string();
            };
            if !invocation.is_match(inner.as_str()) {
                return whole.as_str().to_string();
            }

            let rewritten = self.rewrite(invocation, inner.as_str(), pass);
            if only_invocations(invocation, inner.as_str()) {
                rewritten.trim().to_string()
            } else {
                let offset = whole.start();
                format!(
                    "{}{rewritten}{}",
                    &whole.as_str()[..inner.start() - offset],
                    &whole.as_str()[inner.end() - offset..]
                )
            }
        });

        invocation
            .replace_all(&unwrapped, |caps: &Captures| {
                let Some(index) = self.rules.iter().position(|r| r.tool == caps[1]) else {
                    return caps[0].to_string();
                };
                pass.fired[index] = true;
                let params = parameters(&caps[2]);
                match self.rules[index].substitute {
                    Substitute::Question => {
                        let (text, ok) = question_prompt(&params);
                        pass.unparseable |= !ok;
                        text
                    }
                    Substitute::Delegation => delegation_note(&params),
                }
            })
            .into_owned()
    }
}

/// Whether `text` is only gated invocations, whitespace and call wrappers
fn only_invocations(invocation: &Regex, text: &str) -> bool {
    invocation
        .replace_all(text, "")
        .replace("<function_calls>", "")
        .replace("</function_calls>", "")
        .trim()
        .is_empty()
}

fn parameters(inner: &str) -> HashMap<String, String> {
    parameter_pattern()
        .captures_iter(inner)
        .map(|c| (c[1].to_string(), c[2].trim().to_string()))
        .collect()
}

/// Returns the prompt text and whether the questions parsed
fn question_prompt(params: &HashMap<String, String>) -> (String, bool) {
    let raw = params.get("questions").map_or("", String::as_str);
    let mut out = String::from("Ask the user the following and wait for their reply:\n\n");

    let Ok(questions) = serde_json::from_str::<Vec<Question>>(raw) else {
        out.push_str(&quote(raw));
        return (out, false);
    };

    for (i, q) in questions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match &q.header {
            Some(header) => {
                let _ = writeln!(out, "**{header}**: {}", q.question);
            }
            None => {
                let _ = writeln!(out, "{}", q.question);
            }
        }
        if !q.options.is_empty() {
            out.push('\n');
            for (n, option) in q.options.iter().enumerate() {
                match &option.description {
                    Some(desc) => {
                        let _ = writeln!(out, "{}. {} - {desc}", n + 1, option.label);
                    }
                    None => {
                        let _ = writeln!(out, "{}. {}", n + 1, option.label);
                    }
                }
            }
            out.push('\n');
            out.push_str(if q.multi_select {
                "Reply with one or more numbers, separated by commas.\n"
            } else {
                "Reply with the number of your choice.\n"
            });
        }
    }

    (out, true)
}

fn delegation_note(params: &HashMap<String, String>) -> String {
    let agent = params
        .get("subagent_type")
        .filter(|s| !s.is_empty())
        .map_or_else(|| "a sub-agent".to_string(), |s| format!("the `{s}` agent"));

    let mut out = format!("Delegate manually: this step was written for {agent}");
    if let Some(description) = params.get("description").filter(|s| !s.is_empty()) {
        let _ = write!(out, " ({description})");
    }
    out.push_str(". Carry it out yourself, following that agent's instructions");

    match params.get("prompt").filter(|s| !s.is_empty()) {
        Some(prompt) => {
            out.push_str(", with this prompt:\n\n");
            out.push_str(&quote(prompt));
        }
        None => out.push_str(".\n"),
    }
    out
}

fn quote(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        if line.is_empty() {
            out.push_str(">\n");
        } else {
            let _ = writeln!(out, "> {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agileflow_profiles::ProfileLoader;

    const ASK: &str = r#"Pick one:

```xml
<invoke name="AskUserQuestion">
<parameter name="questions">[{"question": "Which epic?", "header": "Epic", "multiSelect": false, "options": [{"label": "EP-0001", "description": "Auth"}, {"label": "EP-0002"}]}]</parameter>
</invoke>
```

Done.
"#;

    const TASK: &str = r#"<invoke name="Task">
<parameter name="subagent_type">agileflow-epic-planner</parameter>
<parameter name="description">Plan the epic</parameter>
<parameter name="prompt">Break EP-0001 into stories.</parameter>
</invoke>"#;

    fn fallback_for(target: &str) -> CapabilityFallback {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let target = loader.load(target).unwrap();
        CapabilityFallback::new(&source, &target).unwrap()
    }

    #[test]
    fn test_supported_target_has_no_rules() {
        assert!(fallback_for("claude-code").is_empty());
    }

    #[test]
    fn test_question_becomes_numbered_prompt() {
        let mut warnings = Vec::new();
        let out = fallback_for("cursor").apply(ASK, &mut warnings);

        assert!(!out.contains("AskUserQuestion"));
        assert!(!out.contains("```"));
        assert!(out.contains("**Epic**: Which epic?"));
        assert!(out.contains("1. EP-0001 - Auth"));
        assert!(out.contains("2. EP-0002"));
        assert!(out.starts_with("Pick one:"));
        assert!(out.ends_with("Done.\n"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_every_question_in_one_fence_survives() {
        let body = r#"Answer both:

```xml
<function_calls>
<invoke name="AskUserQuestion">
<parameter name="questions">[{"question": "First?", "options": [{"label": "Alpha"}]}]</parameter>
</invoke>
<invoke name="AskUserQuestion">
<parameter name="questions">[{"question": "Second?", "options": [{"label": "Beta"}]}]</parameter>
</invoke>
</function_calls>
```
"#;
        let mut warnings = Vec::new();
        let out = fallback_for("cursor").apply(body, &mut warnings);

        assert!(out.contains("First?"), "{out}");
        assert!(out.contains("1. Alpha"), "{out}");
        assert!(out.contains("Second?"), "{out}");
        assert!(out.contains("1. Beta"), "{out}");
        assert!(!out.contains("<invoke"));
        assert!(!out.contains("function_calls"));
        assert!(!out.contains("```"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_fence_with_other_calls_is_kept() {
        let body = r#"```xml
<invoke name="AskUserQuestion">
<parameter name="questions">[{"question": "Run it?", "options": [{"label": "Yes"}]}]</parameter>
</invoke>
<invoke name="Bash">
<parameter name="command">make test</parameter>
</invoke>
```
"#;
        let mut warnings = Vec::new();
        let out = fallback_for("cursor").apply(body, &mut warnings);

        assert!(out.starts_with("```xml\n"), "{out}");
        assert!(out.contains("1. Yes"));
        assert!(out.contains("<invoke name=\"Bash\">"));
        assert!(out.contains("make test"));
        assert!(!out.contains("AskUserQuestion"));
    }

    #[test]
    fn test_delegation_note() {
        let mut warnings = Vec::new();
        let out = fallback_for("windsurf").apply(TASK, &mut warnings);

        assert!(!out.contains("<invoke"));
        assert!(out.contains("`agileflow-epic-planner` agent (Plan the epic)"));
        assert!(out.contains("> Break EP-0001 into stories."));
    }

    #[test]
    fn test_unparseable_questions_are_quoted() {
        let body = "<invoke name=\"AskUserQuestion\">\n<parameter name=\"questions\">not json</parameter>\n</invoke>";
        let mut warnings = Vec::new();
        let out = fallback_for("codex").apply(body, &mut warnings);

        assert!(out.contains("> not json"));
        assert_eq!(warnings, vec![TransformWarning::UnparseableQuestions]);
    }

    #[test]
    fn test_unmodelled_capability_warns() {
        let loader = ProfileLoader::builtin();
        let source = loader.load("claude-code").unwrap();
        let mut target = (*loader.load("cursor").unwrap()).clone();
        let yaml = "core:\n  commands: true\n";
        target.capabilities = serde_yaml::from_str(yaml).unwrap();

        let fallback = CapabilityFallback::new(&source, &target).unwrap();
        let mut warnings = Vec::new();
        let out = fallback.apply(TASK, &mut warnings);

        assert!(out.starts_with("Delegate manually"));
        assert_eq!(
            warnings,
            vec![TransformWarning::CapabilityNotModelled {
                capability: "core.subAgents".to_string()
            }]
        );
    }
}
