//! Core domain types shared by discovery, prompts, and the pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrgDocsError;

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// The four categories of project artifact orgdocs knows how to document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Flow definitions (`*.flow-meta.xml`).
    Flow,
    /// Apex classes and triggers (`*.cls`, `*.trigger`).
    Apex,
    /// Lightning pages (`*.flexipage-meta.xml`).
    Page,
    /// Lightning web components (`lwc/<name>/<name>.js`).
    Lwc,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Apex => "apex",
            Self::Page => "page",
            Self::Lwc => "lwc",
        }
    }

    /// Plural label used in skip summaries ("Skipped 3 managed flows").
    pub fn plural_label(&self) -> &'static str {
        match self {
            Self::Flow => "flows",
            Self::Apex => "Apex",
            Self::Page => "Lightning Pages",
            Self::Lwc => "LWC components",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = OrgDocsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flow" | "flows" => Ok(Self::Flow),
            "apex" | "class" | "classes" => Ok(Self::Apex),
            "page" | "pages" | "flexipage" => Ok(Self::Page),
            "lwc" | "component" | "components" => Ok(Self::Lwc),
            other => Err(OrgDocsError::config(format!(
                "unknown artifact kind '{other}': expected flow, apex, page, or lwc"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// PackageDirectory
// ---------------------------------------------------------------------------

/// One entry of `packageDirectories` in `sfdx-project.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDirectory {
    /// Root path of the package. Relative paths are resolved by the caller.
    pub path: PathBuf,
    /// Whether this is the project's default package directory.
    #[serde(default)]
    pub default: bool,
}

impl PackageDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovered artifacts
// ---------------------------------------------------------------------------

/// A Lightning web component found under an `lwc/` folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwcComponent {
    /// Component name, equal to the folder's base name.
    pub name: String,
    /// Main script, `<folder>/<name>.js`.
    pub js_file: String,
    /// Markup template, if `<name>.html` exists.
    pub html_file: Option<String>,
    /// Descriptor, if `<name>.js-meta.xml` exists.
    pub meta_file: Option<String>,
    /// The component folder.
    pub folder: String,
}

/// A single discovery result: a metadata file path or a component record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscoveredArtifact {
    File(String),
    Component(LwcComponent),
}

impl DiscoveredArtifact {
    /// The file that carries the artifact's source.
    pub fn primary_path(&self) -> &str {
        match self {
            Self::File(path) => path,
            Self::Component(component) => &component.js_file,
        }
    }
}
