//! Content transformer
//!
//! Maps canonical command and agent markdown onto a target profile's native
//! syntax. Everything here is pure: no file I/O, and a given (source, target,
//! input) always produces the same output.
//!
//! Body passes run in a fixed order:
//! 1. capability fallback for invocations the target cannot perform
//! 2. command reference rewrite
//! 3. config directory and instructions file rewrite
//! 4. explicit tool name rewrite
//!
//! The frontmatter is reshaped separately for the target's metadata schema.

mod document;
mod fallback;
mod frontmatter;
mod references;

pub use document::{first_heading, split, Document, Frontmatter};
pub use fallback::CapabilityFallback;
pub use frontmatter::DEFAULT_VERSION;
pub use references::{native_reference, PathRewriter, ReferenceRewriter, ToolRewriter};

use crate::artifact::SourceArtifact;
use crate::error::TransformResult;
use agileflow_profiles::{
    ArtifactKind, CapabilityProfile, ProfileError, ProfileLoader, CANONICAL_PROFILE_ID,
};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

/// Non-fatal problem found while transforming one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransformWarning {
    /// Output is longer than the target accepts for this artifact class
    SizeLimitExceeded {
        kind: ArtifactKind,
        limit: usize,
        actual: usize,
    },
    /// No profile exists for the requested target; content passed through
    UnknownTarget { id: String },
    /// A fallback was applied because the target does not model the capability
    CapabilityNotModelled { capability: String },
    /// Structured question parameters were not valid JSON
    UnparseableQuestions,
    /// Frontmatter could not be parsed and was kept as is
    UnparseableFrontmatter { reason: String },
}

impl std::fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SizeLimitExceeded {
                kind,
                limit,
                actual,
            } => write!(f, "{kind} is {actual} chars, over the {limit} char limit"),
            Self::UnknownTarget { id } => {
                write!(f, "unknown target '{id}', content left unchanged")
            }
            Self::CapabilityNotModelled { capability } => {
                write!(f, "target does not model {capability}; used text fallback")
            }
            Self::UnparseableQuestions => {
                write!(f, "question parameters are not valid JSON; quoted verbatim")
            }
            Self::UnparseableFrontmatter { reason } => {
                write!(f, "frontmatter kept as is: {reason}")
            }
        }
    }
}

/// Target-native rendition of one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedArtifact {
    pub kind: ArtifactKind,
    pub slug: String,
    pub content: String,
    pub warnings: Vec<TransformWarning>,
}

impl TransformedArtifact {
    fn unchanged(kind: ArtifactKind, slug: &str, content: &str) -> Self {
        Self {
            kind,
            slug: slug.to_string(),
            content: content.to_string(),
            warnings: Vec::new(),
        }
    }
}

/// Rewrite rules compiled for one (canonical, target) profile pair
#[derive(Debug, Clone)]
pub struct Transformer {
    source: Arc<CapabilityProfile>,
    target: Arc<CapabilityProfile>,
    fallback: CapabilityFallback,
    references: ReferenceRewriter,
    paths: PathRewriter,
    tools: ToolRewriter,
}

impl Transformer {
    pub fn new(
        source: Arc<CapabilityProfile>,
        target: Arc<CapabilityProfile>,
    ) -> TransformResult<Self> {
        Ok(Self {
            fallback: CapabilityFallback::new(&source, &target)?,
            references: ReferenceRewriter::new(target.layout.reference_style)?,
            paths: PathRewriter::new(&source, &target)?,
            tools: ToolRewriter::new(&source, &target)?,
            source,
            target,
        })
    }

    /// Transformer from the canonical profile to `target_id`
    pub fn for_target(loader: &ProfileLoader, target_id: &str) -> TransformResult<Self> {
        let source = loader.load(CANONICAL_PROFILE_ID)?;
        let target = loader.load(target_id)?;
        Self::new(source, target)
    }

    pub fn source(&self) -> &CapabilityProfile {
        &self.source
    }

    pub fn target(&self) -> &CapabilityProfile {
        &self.target
    }

    fn is_self_target(&self) -> bool {
        self.source.id() == self.target.id()
    }

    /// Transform a source artifact into the given output class
    pub fn transform(&self, artifact: &SourceArtifact, kind: ArtifactKind) -> TransformedArtifact {
        self.transform_content(Some(&artifact.content), kind, &artifact.slug)
    }

    /// Transform raw content. Absent or empty input yields empty output.
    pub fn transform_content(
        &self,
        content: Option<&str>,
        kind: ArtifactKind,
        slug: &str,
    ) -> TransformedArtifact {
        let content = content.unwrap_or_default();
        if content.is_empty() || self.is_self_target() {
            return TransformedArtifact::unchanged(kind, slug, content);
        }

        let mut warnings = Vec::new();
        let doc = split(content);

        let frontmatter = frontmatter::Reshape {
            source: &self.source,
            target: &self.target,
            kind,
            slug,
            body: doc.body,
        }
        .apply(doc.frontmatter, |s| self.rewrite_text(s), &mut warnings);

        let body = self.fallback.apply(doc.body, &mut warnings);
        let body = self.rewrite_text(&body);
        let body = self.tools.rewrite(&body);

        let mut output = frontmatter;
        output.push_str(&body);

        if let Some(limit) = self.target.limits.max_chars(kind) {
            let actual = output.chars().count();
            if actual > limit {
                tracing::warn!(target_ide = self.target.id(), slug, actual, limit, "content over size limit");
                warnings.push(TransformWarning::SizeLimitExceeded {
                    kind,
                    limit,
                    actual,
                });
            }
        }

        TransformedArtifact {
            kind,
            slug: slug.to_string(),
            content: output,
            warnings,
        }
    }

    /// Reference and path rewrites, shared by body and frontmatter values
    fn rewrite_text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.references.rewrite(text) {
            Cow::Borrowed(text) => self.paths.rewrite(text),
            Cow::Owned(text) => Cow::Owned(self.paths.rewrite(&text).into_owned()),
        }
    }
}

/// Transform `content` for the target named `target_id`
///
/// An id with no profile returns the content unchanged together with
/// [`TransformWarning::UnknownTarget`].
///
/// # Errors
/// Returns an error if the canonical profile or the target profile exists
/// but cannot be loaded
pub fn transform_for_target(
    loader: &ProfileLoader,
    target_id: &str,
    content: Option<&str>,
    kind: ArtifactKind,
    slug: &str,
) -> TransformResult<TransformedArtifact> {
    match Transformer::for_target(loader, target_id) {
        Ok(transformer) => Ok(transformer.transform_content(content, kind, slug)),
        Err(crate::error::TransformError::Profile(ProfileError::NotFound { id }))
            if id == target_id =>
        {
            tracing::warn!(target_ide = target_id, "unknown target, passing content through");
            let mut unchanged = TransformedArtifact::unchanged(kind, slug, content.unwrap_or_default());
            unchanged.warnings.push(TransformWarning::UnknownTarget { id });
            Ok(unchanged)
        }
        Err(e) => Err(e),
    }
}
