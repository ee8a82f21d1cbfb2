//! Capability profile store
//!
//! Profiles are YAML documents, one per IDE. The built-in set is embedded at
//! compile time; a directory of `<id>.yaml` files can replace it.

use crate::error::{ProfileError, ProfileResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in profiles embedded at compile time
const BUILTIN_PROFILES: &[(&str, &str)] = &[
    ("claude-code", include_str!("../profiles/claude-code.yaml")),
    ("codex", include_str!("../profiles/codex.yaml")),
    ("cursor", include_str!("../profiles/cursor.yaml")),
    ("windsurf", include_str!("../profiles/windsurf.yaml")),
];

const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Where declarative profile documents come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileStore {
    #[default]
    Builtin,
    Directory(PathBuf),
}

impl ProfileStore {
    #[must_use]
    pub fn builtin() -> Self {
        Self::Builtin
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    /// Profile ids in sorted order, without parsing any document
    pub fn list_ids(&self) -> ProfileResult<Vec<String>> {
        match self {
            Self::Builtin => Ok(BUILTIN_PROFILES.iter().map(|(id, _)| (*id).to_string()).collect()),
            Self::Directory(dir) => {
                let entries = fs::read_dir(dir).map_err(|e| ProfileError::Io {
                    path: dir.clone(),
                    message: e.to_string(),
                })?;

                let mut ids: Vec<String> = entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && has_profile_extension(path))
                    .filter_map(|path| {
                        path.file_stem()
                            .and_then(|s| s.to_str())
                            .map(ToString::to_string)
                    })
                    .collect();
                ids.sort();
                ids.dedup();
                Ok(ids)
            }
        }
    }

    /// Raw YAML for a profile id
    pub fn read(&self, id: &str) -> ProfileResult<String> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(ProfileError::NotFound { id: id.to_string() });
        }

        match self {
            Self::Builtin => BUILTIN_PROFILES
                .iter()
                .find(|(builtin, _)| *builtin == id)
                .map(|(_, yaml)| (*yaml).to_string())
                .ok_or_else(|| ProfileError::NotFound { id: id.to_string() }),
            Self::Directory(dir) => {
                let path = EXTENSIONS
                    .iter()
                    .map(|ext| dir.join(format!("{id}.{ext}")))
                    .find(|p| p.is_file())
                    .ok_or_else(|| ProfileError::NotFound { id: id.to_string() })?;

                fs::read_to_string(&path).map_err(|e| ProfileError::Io {
                    path,
                    message: e.to_string(),
                })
            }
        }
    }
}

fn has_profile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e))
}
