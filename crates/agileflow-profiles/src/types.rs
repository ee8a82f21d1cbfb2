//! Typed capability profile model

use crate::capability::{Capability, CapabilitySet, CapabilityState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Stable internal tool aliases used as keys of `toolNames`
pub mod tool_alias {
    pub const ASK_USER: &str = "askUser";
    pub const DELEGATE: &str = "delegate";
    pub const BASH: &str = "bash";
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
    pub const EDIT: &str = "edit";
    pub const GLOB: &str = "glob";
    pub const GREP: &str = "grep";
    pub const WEB_FETCH: &str = "webFetch";
    pub const WEB_SEARCH: &str = "webSearch";
    pub const TODO_WRITE: &str = "todoWrite";
}

/// Class of artifact being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Command,
    Agent,
    Skill,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Agent => "agent",
            Self::Skill => "skill",
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(Self::Command),
            "agent" => Ok(Self::Agent),
            "skill" => Ok(Self::Skill),
            _ => Err(format!("Unknown artifact kind: {s}")),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who the profile describes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    /// Name of the IDE's configuration directory, e.g. `.cursor`
    pub config_dir: String,
}

/// Where artifacts land, relative to the project root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_config: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_scripts: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<PathBuf>,
}

impl ProfilePaths {
    /// Every declared path with its key
    pub fn entries(&self) -> Vec<(&'static str, &Path)> {
        [
            ("commands", &self.commands),
            ("agents", &self.agents),
            ("skills", &self.skills),
            ("rules", &self.rules),
            ("hookConfig", &self.hook_config),
            ("hookScripts", &self.hook_scripts),
            ("instructions", &self.instructions),
        ]
        .into_iter()
        .filter_map(|(key, path)| path.as_deref().map(|p| (key, p)))
        .collect()
    }
}

/// How generated commands are laid out on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandLayout {
    /// `<commands>/agileflow/<sub>/<name>.md`
    #[default]
    Nested,
    /// `<commands>/agileflow/<slug>.md`
    Flat,
    /// `<commands>/agileflow-<slug>.md`
    Prefixed,
    /// `<commands>/agileflow-<slug>/SKILL.md`
    Skill,
}

/// How generated agents are laid out on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentLayout {
    /// `<agents>/agileflow/<slug>.md`
    #[default]
    File,
    None,
}

/// Native syntax for invoking a command from inside another document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceStyle {
    /// `/agileflow:story:list`
    #[default]
    Namespaced,
    /// `/story-list`
    Hyphenated,
    /// `/agileflow-story-list`
    Prefixed,
    /// `$agileflow-story-list`
    Sigil,
}

/// Output layout strategy for a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default)]
    pub commands: CommandLayout,
    #[serde(default)]
    pub agents: AgentLayout,
    /// Project agents into skills as a second pass
    #[serde(default)]
    pub agent_skills: bool,
    #[serde(default)]
    pub reference_style: ReferenceStyle,
}

/// Frontmatter keys each artifact class may carry. `None` keeps every key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontmatterKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<Vec<String>>,
}

impl FrontmatterKeys {
    pub fn for_kind(&self, kind: ArtifactKind) -> Option<&[String]> {
        match kind {
            ArtifactKind::Command => self.command.as_deref(),
            ArtifactKind::Agent => self.agent.as_deref(),
            ArtifactKind::Skill => self.skill.as_deref(),
        }
    }
}

/// Shape of the IDE's hook configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookFormat {
    /// `{"hooks": {Event: [{"matcher", "hooks": [{"type", "command"}]}]}}`
    ClaudeSettings,
    /// `{"version"?, "hooks": {event: [{"command", "args"}]}}`
    EventMap,
}

/// Event (and optional matcher) a guard is registered under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
}

/// Guard registrations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardEvents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bash: Option<GuardEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<GuardEvent>,
}

impl GuardEvents {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &GuardEvent)> {
        [("bash", &self.bash), ("edit", &self.edit)]
            .into_iter()
            .filter_map(|(name, guard)| guard.as_ref().map(|g| (name, g)))
    }
}

/// Hook file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookSettings {
    pub format: HookFormat,
    /// Schema version written into new event-map files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default)]
    pub guards: GuardEvents,
}

/// Content size ceilings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_max_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_max_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_max_chars: Option<usize>,
}

impl Limits {
    pub fn max_chars(&self, kind: ArtifactKind) -> Option<usize> {
        match kind {
            ArtifactKind::Command => self.command_max_chars,
            ArtifactKind::Agent => self.agent_max_chars,
            ArtifactKind::Skill => self.skill_max_chars,
        }
    }
}

/// Declarative description of one target IDE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityProfile {
    pub identity: Identity,
    pub paths: ProfilePaths,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub frontmatter: FrontmatterKeys,
    pub capabilities: CapabilitySet,
    /// Alias -> native tool name; `None` when the IDE has no such tool
    pub tool_names: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HookSettings>,
    #[serde(default)]
    pub limits: Limits,
}

impl CapabilityProfile {
    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn config_dir(&self) -> &str {
        &self.identity.config_dir
    }

    pub fn supports(&self, capability: Capability) -> CapabilityState {
        self.capabilities.supports(capability)
    }

    /// Native name for a tool alias, `None` when unsupported or unmapped
    pub fn tool_name(&self, alias: &str) -> Option<&str> {
        self.tool_names.get(alias).and_then(|name| name.as_deref())
    }

    /// Reverse lookup: alias for a native tool name
    pub fn tool_alias(&self, native: &str) -> Option<&str> {
        self.tool_names
            .iter()
            .find(|(_, name)| name.as_deref() == Some(native))
            .map(|(alias, _)| alias.as_str())
    }

    /// File name of the instructions document (e.g. `AGENTS.md`)
    pub fn instructions_file_name(&self) -> Option<&str> {
        self.paths
            .instructions
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }
}
