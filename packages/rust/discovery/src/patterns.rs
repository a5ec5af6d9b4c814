//! Glob patterns: per-kind include patterns and the shared ignore set.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use orgdocs_shared::{ArtifactKind, OrgDocsError, Result};

/// Paths under these globs are never returned by discovery.
pub const GLOB_IGNORE_PATTERNS: [&str; 8] = [
    "**/node_modules/**",
    "**/.git/**",
    "**/cache/**",
    "**/.npm/**",
    "**/logs/**",
    "**/.sfdx/**",
    "**/.sf/**",
    "**/.vscode/**",
];

/// Root-relative pattern selecting candidates of `kind`.
pub fn kind_pattern(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Flow => "**/*.flow-meta.xml",
        ArtifactKind::Apex => "**/*.{cls,trigger}",
        ArtifactKind::Page => "**/*.flexipage-meta.xml",
        ArtifactKind::Lwc => "**/lwc/*",
    }
}

/// Compiled include + ignore matchers for one discovery call.
#[derive(Debug, Clone)]
pub(crate) struct PatternSet {
    include: GlobSet,
    ignore: GlobSet,
}

impl PatternSet {
    pub(crate) fn for_kind(kind: ArtifactKind, extra_ignore: &[String]) -> Result<Self> {
        let ignore: Vec<&str> = GLOB_IGNORE_PATTERNS
            .iter()
            .copied()
            .chain(extra_ignore.iter().map(String::as_str))
            .collect();

        Ok(Self {
            include: build_globset(&[kind_pattern(kind)])?,
            ignore: build_globset(&ignore)?,
        })
    }

    /// `rel` is root-relative with forward slashes.
    pub(crate) fn is_candidate(&self, rel: &str) -> bool {
        self.include.is_match(rel) && !self.ignore.is_match(rel)
    }

    /// A directory is pruned when anything beneath it would be ignored.
    pub(crate) fn is_ignored_dir(&self, rel: &str) -> bool {
        self.ignore.is_match(format!("{rel}/_"))
    }
}

/// Build a GlobSet where `*` never crosses a path separator.
fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| OrgDocsError::Pattern {
                pattern: (*pattern).to_string(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }

    builder.build().map_err(|e| OrgDocsError::Pattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(kind: ArtifactKind) -> PatternSet {
        PatternSet::for_kind(kind, &[]).unwrap()
    }

    #[test]
    fn apex_matches_classes_and_triggers() {
        let apex = set(ArtifactKind::Apex);
        assert!(apex.is_candidate("main/default/classes/Foo.cls"));
        assert!(apex.is_candidate("main/default/triggers/AccountTrigger.trigger"));
        assert!(apex.is_candidate("Foo.cls"));
        assert!(!apex.is_candidate("main/default/classes/Foo.cls-meta.xml"));
    }

    #[test]
    fn ignore_set_excludes_tooling_dirs() {
        let flows = set(ArtifactKind::Flow);
        assert!(flows.is_candidate("main/default/flows/Onboard.flow-meta.xml"));
        assert!(!flows.is_candidate("node_modules/pkg/Onboard.flow-meta.xml"));
        assert!(!flows.is_candidate("main/.sfdx/cache/Onboard.flow-meta.xml"));
        assert!(!flows.is_candidate("logs/Onboard.flow-meta.xml"));
    }

    #[test]
    fn ignored_dirs_are_pruned() {
        let pages = set(ArtifactKind::Page);
        assert!(pages.is_ignored_dir("node_modules"));
        assert!(pages.is_ignored_dir("main/.vscode"));
        assert!(pages.is_ignored_dir("a/b/cache"));
        assert!(!pages.is_ignored_dir("main/default/flexipages"));
    }

    #[test]
    fn lwc_pattern_is_one_level_deep() {
        let lwc = set(ArtifactKind::Lwc);
        assert!(lwc.is_candidate("main/default/lwc/accountCard"));
        assert!(!lwc.is_candidate("main/default/lwc/accountCard/accountCard.js"));
        assert!(!lwc.is_candidate("main/default/aura/accountCard"));
    }

    #[test]
    fn extra_ignore_patterns_apply() {
        let apex = PatternSet::for_kind(ArtifactKind::Apex, &["**/legacy/**".to_string()]).unwrap();
        assert!(!apex.is_candidate("legacy/classes/Old.cls"));
        assert!(apex.is_candidate("current/classes/New.cls"));
    }

    #[test]
    fn invalid_extra_pattern_is_reported() {
        let err = PatternSet::for_kind(ArtifactKind::Apex, &["**/[oops".to_string()]).unwrap_err();
        assert!(err.to_string().contains("invalid glob pattern"));
    }
}
