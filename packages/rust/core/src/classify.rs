//! Heuristic Apex classification.
//!
//! Rules are checked in order against the lower-cased source; the first rule
//! with a matching marker decides the label.

use std::fmt;

use serde::{Serialize, Serializer};

/// Category assigned to an Apex class or trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApexKind {
    TestSeeAllData,
    Test,
    Invocable,
    Rest,
    Batch,
    Schedulable,
    LightningController,
    VisualforceController,
    TriggerHandler,
    Callout,
    Json,
    Soap,
    Class,
}

impl ApexKind {
    /// Human-readable label used in generated documentation.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TestSeeAllData => "Test (See All Data)",
            Self::Test => "Test",
            Self::Invocable => "Invocable",
            Self::Rest => "REST",
            Self::Batch => "Batch",
            Self::Schedulable => "Schedulable",
            Self::LightningController => "Lightning Controller",
            Self::VisualforceController => "Visualforce Controller",
            Self::TriggerHandler => "Trigger Handler",
            Self::Callout => "Callout",
            Self::Json => "JSON",
            Self::Soap => "SOAP",
            Self::Class => "Class",
        }
    }
}

impl fmt::Display for ApexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ApexKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One step of the classification chain.
#[derive(Debug, Clone, Copy)]
pub struct ApexRule {
    pub kind: ApexKind,
    /// Lower-case substrings; any one of them selects `kind`.
    pub markers: &'static [&'static str],
}

impl ApexRule {
    /// `lowered` must already be lower-case.
    pub fn matches(&self, lowered: &str) -> bool {
        self.markers.iter().any(|m| lowered.contains(m))
    }
}

/// Ordered chain; [`ApexKind::Class`] applies when nothing matches.
pub const APEX_RULES: &[ApexRule] = &[
    ApexRule {
        kind: ApexKind::TestSeeAllData,
        markers: &["@istest(seealldata=true)"],
    },
    ApexRule {
        kind: ApexKind::Test,
        markers: &["@istest"],
    },
    ApexRule {
        kind: ApexKind::Invocable,
        markers: &["@invocablemethod"],
    },
    ApexRule {
        kind: ApexKind::Rest,
        markers: &["@restresource"],
    },
    ApexRule {
        kind: ApexKind::Batch,
        markers: &["implements database.batchable", "implements batchable"],
    },
    ApexRule {
        kind: ApexKind::Schedulable,
        markers: &["implements database.schedulable", "implements schedulable"],
    },
    ApexRule {
        kind: ApexKind::LightningController,
        markers: &["@auraenabled"],
    },
    ApexRule {
        kind: ApexKind::VisualforceController,
        markers: &["apexpages.standardcontroller", "pagereference"],
    },
    ApexRule {
        kind: ApexKind::TriggerHandler,
        markers: &["triggerhandler"],
    },
    ApexRule {
        kind: ApexKind::Callout,
        markers: &["new httprequest"],
    },
    ApexRule {
        kind: ApexKind::Json,
        markers: &["jsonparser parser"],
    },
    ApexRule {
        kind: ApexKind::Soap,
        markers: &["public class soaprequest"],
    },
];

/// Classify Apex source text. Always returns exactly one kind.
pub fn classify_apex(source: &str) -> ApexKind {
    let lowered = source.to_lowercase();
    APEX_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(ApexKind::Class, |rule| rule.kind)
}
