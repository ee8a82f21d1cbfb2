//! Report formatters for capability profiles

pub mod markdown;
