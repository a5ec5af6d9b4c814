//! Application configuration for orgdocs.
//!
//! User config lives at `~/.orgdocs/orgdocs.toml`.
//! Environment variables override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrgDocsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "orgdocs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".orgdocs";

/// Environment variable that overrides `prompts.language`.
pub const PROMPTS_LANGUAGE_ENV: &str = "PROMPTS_LANGUAGE";

/// Language every prompt template carries a body for.
pub const DEFAULT_PROMPTS_LANGUAGE: &str = "en";

// ---------------------------------------------------------------------------
// Config structs (matching orgdocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prompt language and template overrides.
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Artifact discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// `[prompts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Language code prompts should be answered in.
    #[serde(default = "default_language")]
    pub language: String,

    /// Replacement prompt bodies keyed by template id.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            overrides: BTreeMap::new(),
        }
    }
}

fn default_language() -> String {
    DEFAULT_PROMPTS_LANGUAGE.into()
}

/// `[discovery]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Ignore globs applied on top of the built-in ignore set.
    #[serde(default)]
    pub extra_ignore: Vec<String>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.orgdocs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OrgDocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.orgdocs/orgdocs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OrgDocsError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        OrgDocsError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    if config.prompts.language.trim().is_empty() {
        return Err(OrgDocsError::config(format!(
            "{}: prompts.language must not be empty",
            path.display()
        )));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| OrgDocsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OrgDocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OrgDocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("language = \"en\""));
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[prompts]
language = "fr"

[prompts.overrides]
PROMPT_DESCRIBE_APEX = "Summarize {{CLASS_NAME}}"

[discovery]
extra_ignore = ["**/legacy/**"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.prompts.language, "fr");
        assert_eq!(
            config.prompts.overrides.get("PROMPT_DESCRIBE_APEX").map(String::as_str),
            Some("Summarize {{CLASS_NAME}}")
        );
        assert_eq!(config.discovery.extra_ignore, vec!["**/legacy/**"]);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse empty");
        assert_eq!(config.prompts.language, DEFAULT_PROMPTS_LANGUAGE);
        assert!(config.prompts.overrides.is_empty());
        assert!(config.discovery.extra_ignore.is_empty());
    }

    #[test]
    fn load_rejects_blank_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[prompts]\nlanguage = \"  \"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("prompts.language"));
    }

    #[test]
    fn load_reports_toml_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[prompts\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
