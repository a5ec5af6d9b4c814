//! Single-root scan. Runs on a blocking task; owns its result collections.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use orgdocs_shared::{ArtifactKind, DiscoveredArtifact, LwcComponent, OrgDocsError, Result};

use crate::flow::is_managed_flow;
use crate::patterns::PatternSet;

/// Namespace separator marking managed-package metadata names.
pub const NAMESPACE_SEPARATOR: &str = "__";

/// What one package root contributed.
#[derive(Debug, Default)]
pub(crate) struct RootScan {
    pub(crate) artifacts: Vec<DiscoveredArtifact>,
    /// Paths of managed artifacts that were left out.
    pub(crate) managed: Vec<String>,
}

/// `true` when a metadata name carries a namespace prefix (`ns__Name`).
pub fn is_namespaced(name: &str) -> bool {
    name.contains(NAMESPACE_SEPARATOR)
}

pub(crate) fn scan_root(kind: ArtifactKind, root: &Path, patterns: &PatternSet) -> Result<RootScan> {
    let mut scan = RootScan::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(entry, root, patterns));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        let Some(rel) = relative(root, entry.path()) else {
            continue;
        };
        if !patterns.is_candidate(&rel) {
            continue;
        }

        let path = join_normalized(root, &rel);
        match kind {
            ArtifactKind::Flow => {
                if !is_file(&entry) {
                    continue;
                }
                if is_managed_flow(entry.path())? {
                    scan.managed.push(path);
                } else {
                    scan.artifacts.push(DiscoveredArtifact::File(path));
                }
            }
            ArtifactKind::Apex | ArtifactKind::Page => {
                if !is_file(&entry) {
                    continue;
                }
                if is_namespaced(&entry.file_name().to_string_lossy()) {
                    scan.managed.push(path);
                } else {
                    scan.artifacts.push(DiscoveredArtifact::File(path));
                }
            }
            ArtifactKind::Lwc => {
                if !entry.file_type().is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let js_file = format!("{path}/{name}.js");
                if !entry.path().join(format!("{name}.js")).is_file() {
                    continue;
                }
                if is_namespaced(&name) {
                    scan.managed.push(js_file);
                    continue;
                }
                let probe = |file: String| {
                    entry
                        .path()
                        .join(&file)
                        .is_file()
                        .then(|| format!("{path}/{file}"))
                };
                scan.artifacts.push(DiscoveredArtifact::Component(LwcComponent {
                    html_file: probe(format!("{name}.html")),
                    meta_file: probe(format!("{name}.js-meta.xml")),
                    name,
                    js_file,
                    folder: path,
                }));
            }
        }
    }

    Ok(scan)
}

/// Regular files and symlinks to them. Symlinked directories are never walked.
fn is_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

/// Prune hidden entries and ignored directories; the root itself always stays.
fn keep_entry(entry: &DirEntry, root: &Path, patterns: &PatternSet) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return false;
    }
    if entry.file_type().is_dir() {
        if let Some(rel) = relative(root, entry.path()) {
            return !patterns.is_ignored_dir(&rel);
        }
    }
    true
}

/// Root-relative path with forward slashes; `None` for the root itself.
fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// `root/rel` in forward-slash form, without a leading `./`.
pub(crate) fn join_normalized(root: &Path, rel: &str) -> String {
    let root = root.to_string_lossy().replace('\\', "/");
    let root = root.trim_end_matches('/');
    let root = root.strip_prefix("./").unwrap_or(root);
    if root.is_empty() || root == "." {
        rel.to_string()
    } else {
        format!("{root}/{rel}")
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> OrgDocsError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    OrgDocsError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn namespace_detection() {
        assert!(is_namespaced("ns__MyClass.cls"));
        assert!(!is_namespaced("MyClass.cls"));
        assert!(!is_namespaced("My_Class.cls"));
    }

    #[test]
    fn join_strips_current_dir() {
        assert_eq!(join_normalized(Path::new("."), "a/b.cls"), "a/b.cls");
        assert_eq!(join_normalized(Path::new("./force-app"), "a.cls"), "force-app/a.cls");
        assert_eq!(join_normalized(Path::new("force-app/"), "a.cls"), "force-app/a.cls");
        assert_eq!(join_normalized(&PathBuf::from("/tmp/p"), "a.cls"), "/tmp/p/a.cls");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("force-app");
        std::fs::create_dir_all(root.join("classes")).unwrap();
        std::fs::write(dir.path().join("Real.cls"), "public class Real {}").unwrap();
        std::os::unix::fs::symlink("../../Real.cls", root.join("classes/Linked.cls")).unwrap();
        std::os::unix::fs::symlink("../../Real.cls", root.join("classes/ns__Linked.cls")).unwrap();

        let patterns = PatternSet::for_kind(ArtifactKind::Apex, &[]).unwrap();
        let scan = scan_root(ArtifactKind::Apex, &root, &patterns).unwrap();

        let base = root.to_string_lossy().replace('\\', "/");
        assert_eq!(
            scan.artifacts,
            vec![DiscoveredArtifact::File(format!("{base}/classes/Linked.cls"))]
        );
        assert_eq!(scan.managed, vec![format!("{base}/classes/ns__Linked.cls")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_walked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("force-app");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("Far.cls"), "").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("linked")).unwrap();

        let patterns = PatternSet::for_kind(ArtifactKind::Apex, &[]).unwrap();
        let scan = scan_root(ArtifactKind::Apex, &root, &patterns).unwrap();
        assert!(scan.artifacts.is_empty());
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = PatternSet::for_kind(ArtifactKind::Apex, &[]).unwrap();
        let err = scan_root(ArtifactKind::Apex, &dir.path().join("nope"), &patterns).unwrap_err();
        assert!(matches!(err, OrgDocsError::Io { .. }));
    }
}
