//! Prompt resolution: variable check, override, language selection, substitution.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, instrument};

use orgdocs_shared::{AppConfig, OrgDocsError, Result};

use crate::registry::{PromptTemplate, TemplateRegistry};

// ---------------------------------------------------------------------------
// PromptVariables
// ---------------------------------------------------------------------------

/// Values bound to template placeholders for one resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PromptVariables(BTreeMap<String, String>);

impl PromptVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Absent and empty values both count as missing.
    pub fn is_missing(&self, name: &str) -> bool {
        self.get(name).is_none_or(str::is_empty)
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PromptVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// A source of full replacement bodies keyed by template id.
pub trait PromptOverrides: Send + Sync {
    /// Replacement body for `template_id`, if any.
    fn override_for(&self, template_id: &str) -> Option<&str>;
}

/// No overrides at all.
pub struct NoOverrides;

impl PromptOverrides for NoOverrides {
    fn override_for(&self, _template_id: &str) -> Option<&str> {
        None
    }
}

impl PromptOverrides for BTreeMap<String, String> {
    fn override_for(&self, template_id: &str) -> Option<&str> {
        self.get(template_id).map(String::as_str)
    }
}

impl PromptOverrides for HashMap<String, String> {
    fn override_for(&self, template_id: &str) -> Option<&str> {
        self.get(template_id).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// PromptSettings
// ---------------------------------------------------------------------------

/// Process-wide, read-only prompt settings: language plus override table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub language: String,
    pub overrides: BTreeMap<String, String>,
}

impl PromptSettings {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, template_id: impl Into<String>, body: impl Into<String>) -> Self {
        self.overrides.insert(template_id.into(), body.into());
        self
    }

    /// Resolve settings from config and the process environment.
    ///
    /// An environment variable named after a template id beats the
    /// `[prompts.overrides]` table.
    pub fn from_config(config: &AppConfig, registry: &TemplateRegistry) -> Self {
        Self::from_config_with_env(config, registry, |name| std::env::var(name).ok())
    }

    /// Like [`PromptSettings::from_config`] with an injectable env lookup.
    pub fn from_config_with_env(
        config: &AppConfig,
        registry: &TemplateRegistry,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let language = env(orgdocs_shared::PROMPTS_LANGUAGE_ENV)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| config.prompts.language.clone());

        let mut overrides = config.prompts.overrides.clone();
        for id in registry.ids() {
            if let Some(body) = env(id).filter(|b| !b.is_empty()) {
                overrides.insert(id.to_string(), body);
            }
        }

        Self {
            language,
            overrides,
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self::new(orgdocs_shared::DEFAULT_PROMPTS_LANGUAGE)
    }
}

// ---------------------------------------------------------------------------
// PromptResolver
// ---------------------------------------------------------------------------

/// Turns a template id plus variables into the final prompt text.
pub struct PromptResolver<'a> {
    registry: &'a TemplateRegistry,
    language: &'a str,
    overrides: &'a dyn PromptOverrides,
}

impl<'a> PromptResolver<'a> {
    pub fn new(
        registry: &'a TemplateRegistry,
        language: &'a str,
        overrides: &'a dyn PromptOverrides,
    ) -> Self {
        Self {
            registry,
            language,
            overrides,
        }
    }

    pub fn from_settings(registry: &'a TemplateRegistry, settings: &'a PromptSettings) -> Self {
        Self::new(registry, &settings.language, &settings.overrides)
    }

    pub fn language(&self) -> &str {
        self.language
    }

    /// Resolve a built-in template.
    pub fn resolve_template(
        &self,
        template: PromptTemplate,
        variables: &PromptVariables,
    ) -> Result<String> {
        self.resolve(template.as_str(), variables)
    }

    /// Build the prompt for `template_id`.
    ///
    /// Fails with `UnknownTemplate` or `MissingVariables`; never returns a
    /// partially bound prompt.
    #[instrument(skip_all, fields(template = template_id, language = self.language))]
    pub fn resolve(&self, template_id: &str, variables: &PromptVariables) -> Result<String> {
        let template = self
            .registry
            .get(template_id)
            .ok_or_else(|| OrgDocsError::UnknownTemplate(template_id.to_string()))?;

        let missing: Vec<String> = template
            .variables()
            .iter()
            .filter(|name| variables.is_missing(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(OrgDocsError::MissingVariables {
                template: template_id.to_string(),
                names: missing,
            });
        }

        let body = match self
            .overrides
            .override_for(template_id)
            .filter(|b| !b.is_empty())
        {
            Some(body) => {
                debug!("using override body");
                body.to_string()
            }
            None => match template.variant(self.language) {
                Some(body) => body.to_string(),
                None => {
                    debug!("no variant for language, appending answer-language instruction");
                    format!(
                        "{}{}",
                        template.default_body(),
                        language_instruction(self.language)
                    )
                }
            },
        };

        Ok(substitute(&body, variables))
    }
}

/// Sentence appended to the default body when `language` has no variant.
pub fn language_instruction(language: &str) -> String {
    format!("\nPlease answer using the language corresponding to \"{language}\"")
}

/// Replace every `{{NAME}}` whose name is bound in `variables`.
///
/// Single left-to-right pass: inserted values are copied to the output and
/// never scanned again. Unbound placeholders are left as they are.
pub fn substitute(body: &str, variables: &PromptVariables) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let inner = &rest[open + 2..];
        if let Some(close) = inner.find("}}") {
            if let Some(value) = variables.get(&inner[..close]) {
                out.push_str(value);
                rest = &inner[close + 2..];
                continue;
            }
        }
        out.push('{');
        rest = &rest[open + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TemplateDefinition;

    fn registry() -> TemplateRegistry {
        TemplateRegistry::new([
            TemplateDefinition::new("GREET", &["A", "B"], "Hi {{A}} and {{B}}."),
            TemplateDefinition::new("ECHO", &["X"], "{{X}}|{{X}}|{{X}}")
                .with_variant("fr", "Écho {{X}}"),
        ])
    }

    fn resolve(language: &str, overrides: &dyn PromptOverrides, id: &str, vars: &PromptVariables) -> Result<String> {
        let registry = registry();
        PromptResolver::new(&registry, language, overrides).resolve(id, vars)
    }

    #[test]
    fn unknown_template_fails() {
        let err = resolve("en", &NoOverrides, "NOPE", &PromptVariables::new()).unwrap_err();
        assert!(matches!(err, OrgDocsError::UnknownTemplate(id) if id == "NOPE"));
    }

    #[test]
    fn missing_variables_are_all_named() {
        let err = resolve("en", &NoOverrides, "GREET", &PromptVariables::new()).unwrap_err();
        match err {
            OrgDocsError::MissingVariables { template, names } => {
                assert_eq!(template, "GREET");
                assert_eq!(names, vec!["A", "B"]);
            }
            other => panic!("expected MissingVariables, got {other:?}"),
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let vars = PromptVariables::new().with("A", "x").with("B", "");
        let err = resolve("en", &NoOverrides, "GREET", &vars).unwrap_err();
        assert!(err.to_string().ends_with(": B"));
    }

    #[test]
    fn variables_collect_from_pairs() {
        let vars: PromptVariables = [("A", "x"), ("B", "y")].into_iter().collect();
        assert_eq!(vars, PromptVariables::new().with("A", "x").with("B", "y"));
        let text = resolve("en", &NoOverrides, "GREET", &vars).unwrap();
        assert_eq!(text, "Hi x and y.");
    }

    #[test]
    fn substitution_replaces_every_occurrence() {
        let vars = PromptVariables::new().with("X", "v");
        let text = resolve("en", &NoOverrides, "ECHO", &vars).unwrap();
        assert_eq!(text, "v|v|v");
        assert!(!text.contains("{{X}}"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let vars = PromptVariables::new().with("A", "Ann").with("B", "Bob");
        let first = resolve("de", &NoOverrides, "GREET", &vars).unwrap();
        let second = resolve("de", &NoOverrides, "GREET", &vars).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_language_variant_appends_instruction() {
        let vars = PromptVariables::new().with("A", "Ann").with("B", "Bob");
        let text = resolve("de", &NoOverrides, "GREET", &vars).unwrap();
        assert_eq!(
            text,
            "Hi Ann and Bob.\nPlease answer using the language corresponding to \"de\""
        );
    }

    #[test]
    fn dedicated_variant_has_no_instruction() {
        let vars = PromptVariables::new().with("X", "v");
        let text = resolve("fr", &NoOverrides, "ECHO", &vars).unwrap();
        assert_eq!(text, "Écho v");
        assert!(!text.contains(&language_instruction("fr")));
    }

    #[test]
    fn default_language_has_no_instruction() {
        let vars = PromptVariables::new().with("A", "Ann").with("B", "Bob");
        let text = resolve("en", &NoOverrides, "GREET", &vars).unwrap();
        assert_eq!(text, "Hi Ann and Bob.");
    }

    #[test]
    fn override_takes_precedence() {
        let mut overrides = BTreeMap::new();
        overrides.insert("GREET".to_string(), "Yo {{A}}".to_string());
        let vars = PromptVariables::new().with("A", "Ann").with("B", "Bob");

        let text = resolve("de", &overrides, "GREET", &vars).unwrap();
        assert_eq!(text, "Yo Ann");
    }

    #[test]
    fn override_still_requires_variables() {
        let mut overrides = HashMap::new();
        overrides.insert("GREET".to_string(), "static".to_string());
        let err = resolve("en", &overrides, "GREET", &PromptVariables::new()).unwrap_err();
        assert!(matches!(err, OrgDocsError::MissingVariables { .. }));
    }

    #[test]
    fn empty_override_is_ignored() {
        let mut overrides = BTreeMap::new();
        overrides.insert("ECHO".to_string(), String::new());
        let vars = PromptVariables::new().with("X", "v");
        assert_eq!(resolve("en", &overrides, "ECHO", &vars).unwrap(), "v|v|v");
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let vars = PromptVariables::new()
            .with("A", "{{B}}")
            .with("B", "{{A}}");
        assert_eq!(substitute("{{A}} {{B}}", &vars), "{{B}} {{A}}");
    }

    #[test]
    fn unbound_placeholders_stay_literal() {
        let vars = PromptVariables::new().with("A", "1");
        assert_eq!(substitute("{{A}} {{Z}} {{ A }}", &vars), "1 {{Z}} {{ A }}");
    }

    #[test]
    fn extra_braces_around_placeholder() {
        let vars = PromptVariables::new().with("A", "1");
        assert_eq!(substitute("{{{A}}}", &vars), "{1}");
        assert_eq!(substitute("{{", &vars), "{{");
        assert_eq!(substitute("}}{{A", &vars), "}}{{A");
    }

    #[test]
    fn builtin_apex_prompt() {
        let settings = PromptSettings::default();
        let resolver = PromptResolver::from_settings(TemplateRegistry::builtin(), &settings);
        let vars = PromptVariables::new()
            .with("CLASS_NAME", "AccountService")
            .with("APEX_CODE", "public class AccountService {}");

        let text = resolver
            .resolve_template(PromptTemplate::DescribeApex, &vars)
            .unwrap();
        assert!(text.contains("Apex class \"AccountService\""));
        assert!(text.contains("public class AccountService {}"));
        assert!(!text.contains("{{"));
    }

    #[test]
    fn settings_env_beats_config() {
        let mut config = AppConfig::default();
        config.prompts.language = "fr".into();
        config
            .prompts
            .overrides
            .insert("PROMPT_DESCRIBE_FLOW".into(), "from config".into());
        config
            .prompts
            .overrides
            .insert("PROMPT_DESCRIBE_PAGE".into(), "page from config".into());

        let env = |name: &str| match name {
            "PROMPTS_LANGUAGE" => Some("es".to_string()),
            "PROMPT_DESCRIBE_FLOW" => Some("from env".to_string()),
            "PROMPT_DESCRIBE_APEX" => Some(String::new()),
            _ => None,
        };
        let settings =
            PromptSettings::from_config_with_env(&config, TemplateRegistry::builtin(), env);

        assert_eq!(settings.language, "es");
        assert_eq!(settings.overrides["PROMPT_DESCRIBE_FLOW"], "from env");
        assert_eq!(settings.overrides["PROMPT_DESCRIBE_PAGE"], "page from config");
        assert!(!settings.overrides.contains_key("PROMPT_DESCRIBE_APEX"));
    }

    #[test]
    fn settings_fall_back_to_config_language() {
        let mut config = AppConfig::default();
        config.prompts.language = "ja".into();
        let settings =
            PromptSettings::from_config_with_env(&config, TemplateRegistry::builtin(), |_| None);
        assert_eq!(settings.language, "ja");
        assert!(settings.overrides.is_empty());
    }
}
