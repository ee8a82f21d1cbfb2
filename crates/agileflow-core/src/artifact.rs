//! Canonical source artifacts
//!
//! Commands and agents are markdown files under `<source>/commands` and
//! `<source>/agents`. The relative path is the identity: `story/list.md`
//! becomes the segments `["story", "list"]` and the slug `story-list`.

use crate::error::{InstallError, InstallResult};
use crate::util::validate_name;
use agileflow_profiles::ArtifactKind;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Typed view of the canonical frontmatter
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub argument_hint: Option<String>,
    #[serde(default, alias = "allowed-tools", deserialize_with = "tool_list")]
    pub tools: Vec<String>,
    pub model: Option<String>,
}

/// Tools are written either as `Read, Bash` or as a YAML list
fn tool_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tools {
        Csv(String),
        List(Vec<String>),
    }

    Ok(match Tools::deserialize(deserializer)? {
        Tools::Csv(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .collect(),
        Tools::List(list) => list,
    })
}

/// One canonical command or agent, read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArtifact {
    pub kind: ArtifactKind,
    /// Relative path components without the `.md` extension
    pub segments: Vec<String>,
    pub slug: String,
    pub path: PathBuf,
    pub content: String,
    pub meta: ArtifactMeta,
}

impl SourceArtifact {
    /// Build an artifact from already-read content
    pub fn new(
        kind: ArtifactKind,
        segments: Vec<String>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let meta = parse_meta(&content);
        Self {
            kind,
            slug: segments.join("-"),
            segments,
            path: path.into(),
            content,
            meta,
        }
    }

    /// Human-readable name: frontmatter `name`, else the slug
    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or(&self.slug)
    }
}

/// Frontmatter is metadata only; anything unreadable yields empty metadata
/// and the transformer reports the problem on its own pass.
fn parse_meta(content: &str) -> ArtifactMeta {
    let matter = Matter::<YAML>::new();
    matter
        .parse(content)
        .data
        .and_then(|data| data.deserialize::<ArtifactMeta>().ok())
        .unwrap_or_default()
}

/// Artifacts found under one source directory
#[derive(Debug, Default)]
pub struct Discovery {
    pub artifacts: Vec<SourceArtifact>,
    /// One message per file that was left out
    pub skipped: Vec<String>,
}

/// Read every `.md` artifact under `dir`, sorted by path
///
/// Hidden files and directories are ignored. Files whose names cannot be
/// turned into a safe output path, or whose content is not UTF-8, are
/// skipped and listed in [`Discovery::skipped`].
///
/// # Errors
/// Returns an error if a directory cannot be walked or a file cannot be read
pub fn discover(dir: &Path, kind: ArtifactKind) -> InstallResult<Discovery> {
    let mut found = Discovery::default();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| InstallError::Io {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            message: e.to_string(),
        })?;

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }

        let Some(segments) = segments_of(dir, path) else {
            tracing::warn!(path = %path.display(), "skipping artifact with unusable name");
            found
                .skipped
                .push(format!("skipped {}: unusable name", path.display()));
            continue;
        };

        let bytes = fs::read(path).map_err(|e| InstallError::io(path, &e))?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping artifact that is not UTF-8");
                found
                    .skipped
                    .push(format!("skipped {}: not valid UTF-8", path.display()));
                continue;
            }
        };

        tracing::debug!(path = %path.display(), kind = %kind, "discovered artifact");
        found
            .artifacts
            .push(SourceArtifact::new(kind, segments, path, content));
    }

    Ok(found)
}

fn segments_of(root: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_str().map(ToString::to_string))
        .collect::<Option<_>>()?;

    if segments.is_empty() || segments.iter().any(|s| validate_name(s).is_err()) {
        return None;
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_meta_with_csv_tools() {
        let artifact = SourceArtifact::new(
            ArtifactKind::Agent,
            vec!["epic-planner".into()],
            "agents/epic-planner.md",
            "---\nname: epic-planner\ndescription: Plans epics\ntools: Read, Bash\nmodel: sonnet\n---\nBody\n",
        );
        assert_eq!(artifact.meta.name.as_deref(), Some("epic-planner"));
        assert_eq!(artifact.meta.tools, vec!["Read", "Bash"]);
        assert_eq!(artifact.meta.model.as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_meta_with_allowed_tools_list() {
        let artifact = SourceArtifact::new(
            ArtifactKind::Command,
            vec!["status".into()],
            "commands/status.md",
            "---\ndescription: Show status\nargument-hint: \"[epic]\"\nallowed-tools:\n  - Bash\n  - Grep\n---\n",
        );
        assert_eq!(artifact.meta.argument_hint.as_deref(), Some("[epic]"));
        assert_eq!(artifact.meta.tools, vec!["Bash", "Grep"]);
    }

    #[test]
    fn test_missing_frontmatter_gives_empty_meta() {
        let artifact =
            SourceArtifact::new(ArtifactKind::Command, vec!["help".into()], "help.md", "# Help\n");
        assert_eq!(artifact.meta, ArtifactMeta::default());
        assert_eq!(artifact.display_name(), "help");
    }

    #[test]
    fn test_discover_nested_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("story")).unwrap();
        fs::create_dir_all(dir.path().join(".drafts")).unwrap();
        fs::write(dir.path().join("story/list.md"), "# List").unwrap();
        fs::write(dir.path().join("babysit.md"), "# Babysit").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join(".drafts/wip.md"), "ignored").unwrap();

        let artifacts = discover(dir.path(), ArtifactKind::Command).unwrap().artifacts;
        let slugs: Vec<_> = artifacts.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["babysit", "story-list"]);
        assert_eq!(artifacts[1].segments, vec!["story", "list"]);
    }

    #[test]
    fn test_discover_skips_non_utf8() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.md"), "# Good").unwrap();
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, b'#']).unwrap();

        let found = discover(dir.path(), ArtifactKind::Command).unwrap();
        let slugs: Vec<_> = found.artifacts.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["good"]);
        assert_eq!(found.skipped.len(), 1);
        assert!(found.skipped[0].contains("bad.md"));
    }
}
