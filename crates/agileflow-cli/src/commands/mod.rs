//! CLI command implementations

pub mod install;
pub mod profiles;
pub mod transform;
