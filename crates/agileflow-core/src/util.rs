//! Path safety and file write helpers

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors related to path validation
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0}")]
    TraversalAttempt(String),

    #[error("Path escapes root directory: {0}")]
    EscapesRoot(String),

    #[error("Invalid path component: {0}")]
    InvalidComponent(String),
}

/// Join a profile-relative path onto the project root, refusing anything
/// that would land outside it
///
/// # Errors
/// Returns an error if the path is absolute or escapes the root
pub fn safe_join(root: &Path, untrusted_path: &Path) -> Result<PathBuf, PathError> {
    let normalized = normalize_path(untrusted_path)?;
    let joined = root.join(&normalized);

    // The file may not exist yet, so this is a logical check
    if !joined.starts_with(root) {
        return Err(PathError::EscapesRoot(joined.display().to_string()));
    }

    Ok(joined)
}

fn normalize_path(path: &Path) -> Result<PathBuf, PathError> {
    let mut normalized = PathBuf::new();
    let mut depth: usize = 0;

    for component in path.components() {
        match component {
            Component::Normal(c) => {
                if c.to_string_lossy().contains('\0') {
                    return Err(PathError::InvalidComponent("Null byte in path".to_string()));
                }
                normalized.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathError::TraversalAttempt(path.display().to_string()));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::InvalidComponent(
                    "Absolute path not allowed".to_string(),
                ));
            }
        }
    }

    Ok(normalized)
}

/// Validate an artifact name segment before it becomes part of a path
///
/// # Errors
/// Returns an error if the name is empty, hidden, or contains separators
pub fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::InvalidComponent("Empty name".to_string()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains path separator: {name}"
        )));
    }

    if name.contains("..") {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains parent directory reference: {name}"
        )));
    }

    if name.starts_with('.') {
        return Err(PathError::InvalidComponent(format!(
            "Name cannot start with dot: {name}"
        )));
    }

    if name.contains('\0') {
        return Err(PathError::InvalidComponent(
            "Name contains null byte".to_string(),
        ));
    }

    Ok(())
}

/// Write `data` to `path` through a temp file in the same directory and a
/// rename, so readers never see a half-written file. Parent directories are
/// created as needed.
///
/// # Errors
/// Returns the underlying I/O error
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove a directory tree, treating "already gone" as success
///
/// # Errors
/// Returns any I/O error other than `NotFound`
pub fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
