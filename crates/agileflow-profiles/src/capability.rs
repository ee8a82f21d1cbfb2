//! Capability model: groups, values, and typed capability keys

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capability groups a profile may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityGroup {
    Core,
    Planning,
    Lifecycle,
    External,
    Collaboration,
}

impl CapabilityGroup {
    /// Get the YAML key for this group
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Planning => "planning",
            Self::Lifecycle => "lifecycle",
            Self::External => "external",
            Self::Collaboration => "collaboration",
        }
    }

    /// All known groups
    pub fn all() -> &'static [CapabilityGroup] {
        &[
            Self::Core,
            Self::Planning,
            Self::Lifecycle,
            Self::External,
            Self::Collaboration,
        ]
    }
}

impl std::str::FromStr for CapabilityGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(Self::Core),
            "planning" => Ok(Self::Planning),
            "lifecycle" => Ok(Self::Lifecycle),
            "external" => Ok(Self::External),
            "collaboration" => Ok(Self::Collaboration),
            _ => Err(format!("Unknown capability group: {s}")),
        }
    }
}

impl std::fmt::Display for CapabilityGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capabilities the installer branches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Commands,
    Agents,
    Skills,
    InteractiveInput,
    SubAgents,
    PlanMode,
    TodoList,
    Hooks,
    Mcp,
    WebSearch,
    WebFetch,
    ParallelAgents,
}

impl Capability {
    /// The (group, name) pair this capability is declared under
    pub fn key(self) -> (CapabilityGroup, &'static str) {
        match self {
            Self::Commands => (CapabilityGroup::Core, "commands"),
            Self::Agents => (CapabilityGroup::Core, "agents"),
            Self::Skills => (CapabilityGroup::Core, "skills"),
            Self::InteractiveInput => (CapabilityGroup::Core, "interactiveInput"),
            Self::SubAgents => (CapabilityGroup::Core, "subAgents"),
            Self::PlanMode => (CapabilityGroup::Planning, "planMode"),
            Self::TodoList => (CapabilityGroup::Planning, "todoList"),
            Self::Hooks => (CapabilityGroup::Lifecycle, "hooks"),
            Self::Mcp => (CapabilityGroup::External, "mcp"),
            Self::WebSearch => (CapabilityGroup::External, "webSearch"),
            Self::WebFetch => (CapabilityGroup::External, "webFetch"),
            Self::ParallelAgents => (CapabilityGroup::Collaboration, "parallelAgents"),
        }
    }
}

/// Answer to "does this IDE support X?"
///
/// `Unknown` means the profile does not model the capability at all, which
/// is different from an explicit `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityState {
    Supported,
    Unsupported,
    Unknown,
}

impl CapabilityState {
    #[must_use]
    pub fn is_supported(self) -> bool {
        self == Self::Supported
    }
}

impl std::fmt::Display for CapabilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supported => write!(f, "yes"),
            Self::Unsupported => write!(f, "no"),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// A single declared capability value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Flag(bool),
    Number(u64),
    Text(String),
    List(Vec<String>),
    /// Anything else a profile declares (floats, maps, mixed lists)
    Other(serde_yaml::Value),
}

impl CapabilityValue {
    /// Whether this value counts as "supported"
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Number(n) => *n > 0,
            Self::Text(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Other(_) => false,
        }
    }

    /// Short rendering for reports
    pub fn display(&self) -> String {
        match self {
            Self::Flag(true) => "yes".into(),
            Self::Flag(false) => "no".into(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
            Self::Other(value) => serde_yaml::to_string(value)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_else(|_| "?".into()),
        }
    }
}

/// All capabilities of one profile, keyed by group then name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeMap<String, BTreeMap<String, CapabilityValue>>);

impl CapabilitySet {
    /// Raw lookup
    pub fn get(&self, group: &str, name: &str) -> Option<&CapabilityValue> {
        self.0.get(group).and_then(|caps| caps.get(name))
    }

    /// Lookup by string keys, distinguishing "not modelled" from "false"
    pub fn state(&self, group: &str, name: &str) -> CapabilityState {
        match self.get(group, name) {
            Some(value) if value.is_enabled() => CapabilityState::Supported,
            Some(_) => CapabilityState::Unsupported,
            None => CapabilityState::Unknown,
        }
    }

    /// Typed lookup
    pub fn supports(&self, capability: Capability) -> CapabilityState {
        let (group, name) = capability.key();
        self.state(group.as_str(), name)
    }

    /// A list-valued capability, empty when absent or not a list
    pub fn list(&self, group: &str, name: &str) -> &[String] {
        match self.get(group, name) {
            Some(CapabilityValue::List(items)) => items,
            _ => &[],
        }
    }

    /// Iterate groups in key order
    pub fn groups(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, CapabilityValue>)> {
        self.0.iter()
    }

    /// Groups that are not part of the known schema
    pub fn unknown_groups(&self) -> Vec<&str> {
        self.0
            .keys()
            .filter(|g| g.parse::<CapabilityGroup>().is_err())
            .map(String::as_str)
            .collect()
    }

    /// Hook events this profile declares
    pub fn hook_events(&self) -> &[String] {
        self.list(CapabilityGroup::Lifecycle.as_str(), "hookEvents")
    }
}
