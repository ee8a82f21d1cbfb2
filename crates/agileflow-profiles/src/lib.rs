//! AgileFlow Profiles - declarative IDE capability profiles
//!
//! One YAML document per target IDE describes where artifacts land, which
//! capabilities the IDE has, and how tool names map. The loader validates
//! and caches them; the installer and transformer only ever branch on the
//! typed values exposed here.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod capability;
pub mod error;
pub mod loader;
pub mod output;
pub mod store;
pub mod types;

pub use capability::{Capability, CapabilityGroup, CapabilitySet, CapabilityState, CapabilityValue};
pub use error::{ProfileError, ProfileResult};
pub use loader::ProfileLoader;
pub use store::ProfileStore;
pub use types::{
    tool_alias, AgentLayout, ArtifactKind, CapabilityProfile, CommandLayout, GuardEvent,
    HookFormat, HookSettings, ReferenceStyle,
};

/// Id of the profile canonical content is authored in
pub const CANONICAL_PROFILE_ID: &str = "claude-code";
