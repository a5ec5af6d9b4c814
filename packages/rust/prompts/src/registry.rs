//! Static catalog of prompt templates.
//!
//! Each template declares the variables it requires and carries one body per
//! language. The default-language body is mandatory; other variants are
//! optional and selected by the resolver.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use orgdocs_shared::{DEFAULT_PROMPTS_LANGUAGE, OrgDocsError};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex"));

static BUILTIN: LazyLock<TemplateRegistry> = LazyLock::new(|| {
    TemplateRegistry::new(PromptTemplate::ALL.iter().map(|t| t.definition()))
});

// ---------------------------------------------------------------------------
// PromptTemplate
// ---------------------------------------------------------------------------

/// Identifiers of the built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PromptTemplate {
    SolveDeploymentError,
    DescribeFlow,
    DescribeFlowDiff,
    DescribeObject,
    CompleteObjectAttributesMd,
    DescribeApex,
    DescribePage,
    DescribeLwc,
}

impl PromptTemplate {
    pub const ALL: [PromptTemplate; 8] = [
        Self::SolveDeploymentError,
        Self::DescribeFlow,
        Self::DescribeFlowDiff,
        Self::DescribeObject,
        Self::CompleteObjectAttributesMd,
        Self::DescribeApex,
        Self::DescribePage,
        Self::DescribeLwc,
    ];

    /// Registry key, also the name of the environment variable that may
    /// override the template body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SolveDeploymentError => "PROMPT_SOLVE_DEPLOYMENT_ERROR",
            Self::DescribeFlow => "PROMPT_DESCRIBE_FLOW",
            Self::DescribeFlowDiff => "PROMPT_DESCRIBE_FLOW_DIFF",
            Self::DescribeObject => "PROMPT_DESCRIBE_OBJECT",
            Self::CompleteObjectAttributesMd => "PROMPT_COMPLETE_OBJECT_ATTRIBUTES_MD",
            Self::DescribeApex => "PROMPT_DESCRIBE_APEX",
            Self::DescribePage => "PROMPT_DESCRIBE_PAGE",
            Self::DescribeLwc => "PROMPT_DESCRIBE_LWC",
        }
    }

    /// Variables the template cannot be rendered without.
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            Self::SolveDeploymentError => &["ERROR"],
            Self::DescribeFlow => &["FLOW_XML"],
            Self::DescribeFlowDiff => &["FLOW_XML_NEW", "FLOW_XML_PREVIOUS"],
            Self::DescribeObject => &[
                "OBJECT_NAME",
                "OBJECT_XML",
                "ALL_OBJECTS_LIST",
                "ALL_OBJECT_LINKS",
            ],
            Self::CompleteObjectAttributesMd => &["OBJECT_NAME", "MARKDOWN"],
            Self::DescribeApex => &["CLASS_NAME", "APEX_CODE"],
            Self::DescribePage => &["PAGE_NAME", "PAGE_XML"],
            Self::DescribeLwc => &["COMPONENT_NAME", "LWC_CODE"],
        }
    }

    fn default_body(&self) -> &'static str {
        match self {
            Self::SolveDeploymentError => include_str!("../templates/en/solve_deployment_error.md"),
            Self::DescribeFlow => include_str!("../templates/en/describe_flow.md"),
            Self::DescribeFlowDiff => include_str!("../templates/en/describe_flow_diff.md"),
            Self::DescribeObject => include_str!("../templates/en/describe_object.md"),
            Self::CompleteObjectAttributesMd => {
                include_str!("../templates/en/complete_object_attributes_md.md")
            }
            Self::DescribeApex => include_str!("../templates/en/describe_apex.md"),
            Self::DescribePage => include_str!("../templates/en/describe_page.md"),
            Self::DescribeLwc => include_str!("../templates/en/describe_lwc.md"),
        }
    }

    fn definition(&self) -> TemplateDefinition {
        TemplateDefinition::new(self.as_str(), self.variables(), self.default_body())
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptTemplate {
    type Err = OrgDocsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OrgDocsError::UnknownTemplate(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TemplateDefinition
// ---------------------------------------------------------------------------

/// One template: id, required variables, and per-language bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    id: String,
    variables: Vec<String>,
    text: BTreeMap<String, String>,
}

impl TemplateDefinition {
    /// Create a template with its default-language body.
    pub fn new(id: impl Into<String>, variables: &[&str], default_body: impl Into<String>) -> Self {
        let mut text = BTreeMap::new();
        text.insert(DEFAULT_PROMPTS_LANGUAGE.to_string(), default_body.into());
        Self {
            id: id.into(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            text,
        }
    }

    /// Add (or replace) a pre-written body for `language`.
    pub fn with_variant(mut self, language: impl Into<String>, body: impl Into<String>) -> Self {
        self.text.insert(language.into(), body.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Required variable names, in declaration order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Body written for `language`, if one exists.
    pub fn variant(&self, language: &str) -> Option<&str> {
        self.text.get(language).map(String::as_str)
    }

    pub fn default_body(&self) -> &str {
        // Inserted by `new` and never removed.
        self.text
            .get(DEFAULT_PROMPTS_LANGUAGE)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Languages with a dedicated body.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.text.keys().map(String::as_str)
    }

    /// Placeholder names referenced by the default body.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        PLACEHOLDER_RE
            .captures_iter(self.default_body())
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// TemplateRegistry
// ---------------------------------------------------------------------------

/// Immutable id → template mapping.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateDefinition>,
}

impl TemplateRegistry {
    pub fn new(definitions: impl IntoIterator<Item = TemplateDefinition>) -> Self {
        Self {
            templates: definitions
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        }
    }

    /// The built-in catalog, built on first use.
    pub fn builtin() -> &'static TemplateRegistry {
        &BUILTIN
    }

    pub fn get(&self, id: &str) -> Option<&TemplateDefinition> {
        self.templates.get(id)
    }

    /// Template ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
