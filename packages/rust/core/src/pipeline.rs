//! `prepare` pipeline: package dirs → discovery → variables → resolved prompts.
//!
//! The output is ready to hand to a text-generation client; nothing here talks
//! to that client or writes documentation files.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use orgdocs_discovery::{DiscoveryOptions, DiscoveryReporter};
use orgdocs_prompts::{PromptResolver, PromptTemplate, PromptVariables};
use orgdocs_shared::{ArtifactKind, DiscoveredArtifact, OrgDocsError, PackageDirectory, Result};

use crate::classify::{ApexKind, classify_apex};

/// A resolved prompt for one artifact.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub kind: ArtifactKind,
    /// Metadata name (file name without its metadata suffix).
    pub name: String,
    /// File the prompt was built from.
    pub source: String,
    pub template: &'static str,
    /// Set for Apex artifacts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apex_kind: Option<ApexKind>,
    pub prompt: String,
}

impl PreparedPrompt {
    /// Stable hash of template + prompt text, for caching generated output.
    pub fn fingerprint(&self) -> String {
        prompt_hash(&self.prompt, self.template)
    }
}

/// An artifact whose prompt could not be prepared.
#[derive(Debug, Clone, Serialize)]
pub struct PrepareFailure {
    pub source: String,
    pub message: String,
}

/// Result of [`prepare_prompts`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparedBatch {
    pub prompts: Vec<PreparedPrompt>,
    pub failures: Vec<PrepareFailure>,
}

/// Progress callback for the prepare pipeline.
pub trait PrepareProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each artifact, successful or not.
    fn artifact_prepared(&self, name: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl PrepareProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn artifact_prepared(&self, _name: &str, _current: usize, _total: usize) {}
}

/// Template used to describe artifacts of `kind`.
pub fn template_for(kind: ArtifactKind) -> PromptTemplate {
    match kind {
        ArtifactKind::Flow => PromptTemplate::DescribeFlow,
        ArtifactKind::Apex => PromptTemplate::DescribeApex,
        ArtifactKind::Page => PromptTemplate::DescribePage,
        ArtifactKind::Lwc => PromptTemplate::DescribeLwc,
    }
}

/// Metadata name of an artifact path: `Foo` for `.../Foo.flow-meta.xml`,
/// `.../Foo.cls`, `.../Foo.trigger`, `.../Foo.flexipage-meta.xml`.
pub fn artifact_name(path: &str) -> String {
    const SUFFIXES: [&str; 5] = [
        ".flow-meta.xml",
        ".flexipage-meta.xml",
        ".cls",
        ".trigger",
        ".js",
    ];
    let file = path.rsplit('/').next().unwrap_or(path);
    SUFFIXES
        .iter()
        .find_map(|suffix| file.strip_suffix(suffix))
        .unwrap_or(file)
        .to_string()
}

/// Discover artifacts of `kind` and resolve one prompt per artifact.
///
/// A package root that fails to scan is recorded in [`PreparedBatch::failures`]
/// and the artifacts recovered from the other roots are still prepared. Per-
/// artifact read or resolution errors are logged and collected the same way.
/// Other discovery errors (bad ignore patterns) abort the run.
#[instrument(skip_all, fields(%kind, roots = package_dirs.len(), language = resolver.language()))]
pub async fn prepare_prompts(
    kind: ArtifactKind,
    package_dirs: &[PackageDirectory],
    opts: &DiscoveryOptions,
    resolver: &PromptResolver<'_>,
    reporter: &dyn DiscoveryReporter,
    progress: &dyn PrepareProgress,
) -> Result<PreparedBatch> {
    progress.phase(&format!("Discovering {}", kind.plural_label()));
    let mut batch = PreparedBatch::default();
    let artifacts = match orgdocs_discovery::discover_with(kind, package_dirs, opts, reporter).await
    {
        Ok(artifacts) => artifacts,
        Err(OrgDocsError::Discovery {
            failures,
            recovered,
            ..
        }) => {
            batch
                .failures
                .extend(failures.into_iter().map(|f| PrepareFailure {
                    source: f.root.display().to_string(),
                    message: f.message,
                }));
            recovered
        }
        Err(e) => return Err(e),
    };

    progress.phase("Resolving prompts");
    let total = artifacts.len();

    for (index, artifact) in artifacts.iter().enumerate() {
        let source = artifact.primary_path().to_string();
        let name = match artifact {
            DiscoveredArtifact::Component(c) => c.name.clone(),
            DiscoveredArtifact::File(path) => artifact_name(path),
        };

        match prepare_one(kind, &name, artifact, resolver).await {
            Ok((apex_kind, prompt)) => batch.prompts.push(PreparedPrompt {
                kind,
                name: name.clone(),
                source,
                template: template_for(kind).as_str(),
                apex_kind,
                prompt,
            }),
            Err(e) => {
                warn!(%source, error = %e, "could not prepare prompt");
                batch.failures.push(PrepareFailure {
                    source,
                    message: e.to_string(),
                });
            }
        }
        progress.artifact_prepared(&name, index + 1, total);
    }

    info!(
        prepared = batch.prompts.len(),
        failed = batch.failures.len(),
        "prompts prepared"
    );
    Ok(batch)
}

async fn prepare_one(
    kind: ArtifactKind,
    name: &str,
    artifact: &DiscoveredArtifact,
    resolver: &PromptResolver<'_>,
) -> Result<(Option<ApexKind>, String)> {
    let content = read_source(Path::new(artifact.primary_path())).await?;

    let mut apex_kind = None;
    let variables = match kind {
        ArtifactKind::Flow => PromptVariables::new().with("FLOW_XML", content),
        ArtifactKind::Apex => {
            apex_kind = Some(classify_apex(&content));
            PromptVariables::new()
                .with("CLASS_NAME", name)
                .with("APEX_CODE", content)
        }
        ArtifactKind::Page => PromptVariables::new()
            .with("PAGE_NAME", name)
            .with("PAGE_XML", content),
        ArtifactKind::Lwc => PromptVariables::new()
            .with("COMPONENT_NAME", name)
            .with("LWC_CODE", content),
    };

    let prompt = resolver.resolve_template(template_for(kind), &variables)?;
    Ok((apex_kind, prompt))
}

async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| OrgDocsError::io(path, e))
}

/// Compute a prompt hash for cache keying.
fn prompt_hash(content: &str, template: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(template.as_bytes());
    format!("{:x}", hasher.finalize())
}
