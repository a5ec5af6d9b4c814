//! Project artifact discovery.
//!
//! Walks each package directory of a project, picks the files (or component
//! folders) of one [`ArtifactKind`], drops anything under the ignore set, and
//! separates managed-package artifacts from the ones the project team wrote.
//! Managed artifacts are reported through a [`DiscoveryReporter`] and left out
//! of the result.

mod flow;
mod patterns;
mod project;
mod scan;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use orgdocs_shared::{
    ArtifactKind, DiscoveredArtifact, LwcComponent, OrgDocsError, PackageDirectory, Result,
    RootFailure,
};

pub use flow::{FLOW_ELEMENT_GROUPS, is_managed_flow, is_managed_flow_xml};
pub use patterns::{GLOB_IGNORE_PATTERNS, kind_pattern};
pub use project::{SFDX_PROJECT_FILE, is_sfdx_project, load_package_directories};
pub use scan::{NAMESPACE_SEPARATOR, is_namespaced};

use patterns::PatternSet;
use scan::{RootScan, scan_root};

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Receives discovery side-effect reports. Passed explicitly to every
/// discovery entry point.
pub trait DiscoveryReporter: Send + Sync {
    /// Managed artifacts were left out. `paths` is sorted and non-empty.
    fn managed_skipped(&self, kind: ArtifactKind, paths: &[String]);

    /// A package root finished scanning.
    fn root_scanned(&self, _kind: ArtifactKind, _root: &Path, _found: usize) {}
}

/// Reports through `tracing` warn events.
pub struct TracingReporter;

impl DiscoveryReporter for TracingReporter {
    fn managed_skipped(&self, kind: ArtifactKind, paths: &[String]) {
        warn!(
            %kind,
            count = paths.len(),
            "Skipped {} managed {}:",
            paths.len(),
            kind.plural_label()
        );
        for path in paths {
            warn!(%kind, "  {path}");
        }
    }

    fn root_scanned(&self, kind: ArtifactKind, root: &Path, found: usize) {
        debug!(%kind, root = %root.display(), found, "package directory scanned");
    }
}

/// Drops every report.
pub struct SilentReporter;

impl DiscoveryReporter for SilentReporter {
    fn managed_skipped(&self, _kind: ArtifactKind, _paths: &[String]) {}
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tuning for a discovery call.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Ignore globs added to [`GLOB_IGNORE_PATTERNS`].
    pub extra_ignore: Vec<String>,
}

impl From<&orgdocs_shared::DiscoveryConfig> for DiscoveryOptions {
    fn from(config: &orgdocs_shared::DiscoveryConfig) -> Self {
        Self {
            extra_ignore: config.extra_ignore.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Discover artifacts of `kind` with default options.
pub async fn discover(
    kind: ArtifactKind,
    package_dirs: &[PackageDirectory],
    reporter: &dyn DiscoveryReporter,
) -> Result<Vec<DiscoveredArtifact>> {
    discover_with(kind, package_dirs, &DiscoveryOptions::default(), reporter).await
}

/// Discover artifacts of `kind` under every package root.
///
/// Roots are scanned concurrently, each into its own collection; results are
/// concatenated in root order, sorted, and de-duplicated. If any root fails,
/// the error carries the sorted artifacts of the roots that succeeded.
#[instrument(skip_all, fields(%kind, roots = package_dirs.len()))]
pub async fn discover_with(
    kind: ArtifactKind,
    package_dirs: &[PackageDirectory],
    opts: &DiscoveryOptions,
    reporter: &dyn DiscoveryReporter,
) -> Result<Vec<DiscoveredArtifact>> {
    let patterns = Arc::new(PatternSet::for_kind(kind, &opts.extra_ignore)?);

    let handles: Vec<_> = package_dirs
        .iter()
        .map(|dir| {
            let root = dir.path.clone();
            let patterns = Arc::clone(&patterns);
            let handle =
                tokio::task::spawn_blocking(move || scan_root(kind, &root, &patterns));
            (dir.path.clone(), handle)
        })
        .collect();

    let mut artifacts = Vec::new();
    let mut managed = Vec::new();
    let mut failures = Vec::new();

    for (root, handle) in handles {
        match handle.await {
            Ok(Ok(RootScan {
                artifacts: found,
                managed: skipped,
            })) => {
                reporter.root_scanned(kind, &root, found.len());
                artifacts.extend(found);
                managed.extend(skipped);
            }
            Ok(Err(e)) => {
                warn!(root = %root.display(), error = %e, "package directory scan failed");
                failures.push(RootFailure {
                    root,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                failures.push(RootFailure {
                    root,
                    message: format!("scan task failed: {e}"),
                });
            }
        }
    }

    sort_artifacts(&mut artifacts);
    managed.sort();
    managed.dedup();

    if !managed.is_empty() {
        reporter.managed_skipped(kind, &managed);
    }

    if !failures.is_empty() {
        return Err(OrgDocsError::Discovery {
            kind,
            failures,
            recovered: artifacts,
        });
    }

    info!(found = artifacts.len(), managed = managed.len(), "discovery complete");
    Ok(artifacts)
}

/// Sorted, de-duplicated paths of project-owned flows.
pub async fn list_flow_files(
    package_dirs: &[PackageDirectory],
    reporter: &dyn DiscoveryReporter,
) -> Result<Vec<String>> {
    discover(ArtifactKind::Flow, package_dirs, reporter)
        .await
        .map(into_paths)
}

/// Sorted, de-duplicated paths of project-owned Apex classes and triggers.
pub async fn list_apex_files(
    package_dirs: &[PackageDirectory],
    reporter: &dyn DiscoveryReporter,
) -> Result<Vec<String>> {
    discover(ArtifactKind::Apex, package_dirs, reporter)
        .await
        .map(into_paths)
}

/// Sorted, de-duplicated paths of project-owned Lightning pages.
pub async fn list_page_files(
    package_dirs: &[PackageDirectory],
    reporter: &dyn DiscoveryReporter,
) -> Result<Vec<String>> {
    discover(ArtifactKind::Page, package_dirs, reporter)
        .await
        .map(into_paths)
}

/// Project-owned Lightning web components, sorted by name.
pub async fn list_lwc_components(
    package_dirs: &[PackageDirectory],
    reporter: &dyn DiscoveryReporter,
) -> Result<Vec<LwcComponent>> {
    discover(ArtifactKind::Lwc, package_dirs, reporter)
        .await
        .map(|artifacts| {
            artifacts
                .into_iter()
                .filter_map(|a| match a {
                    DiscoveredArtifact::Component(c) => Some(c),
                    DiscoveredArtifact::File(_) => None,
                })
                .collect()
        })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Files by path; components by name, then folder. Duplicates (from
/// overlapping roots) are adjacent after sorting and dropped.
fn sort_artifacts(artifacts: &mut Vec<DiscoveredArtifact>) {
    fn key(artifact: &DiscoveredArtifact) -> (&str, &str) {
        match artifact {
            DiscoveredArtifact::File(path) => (path.as_str(), ""),
            DiscoveredArtifact::Component(c) => (c.name.as_str(), c.folder.as_str()),
        }
    }
    artifacts.sort_by(|a, b| key(a).cmp(&key(b)));
    artifacts.dedup_by(|a, b| a.primary_path() == b.primary_path());
}

fn into_paths(artifacts: Vec<DiscoveredArtifact>) -> Vec<String> {
    artifacts
        .into_iter()
        .map(|a| match a {
            DiscoveredArtifact::File(path) => path,
            DiscoveredArtifact::Component(c) => c.js_file,
        })
        .collect()
}
