//! Shared types, error model, and configuration for orgdocs.
//!
//! This crate is the foundation depended on by all other orgdocs crates.
//! It provides:
//! - [`OrgDocsError`]: the unified error type
//! - Domain types ([`ArtifactKind`], [`PackageDirectory`], [`DiscoveredArtifact`], [`LwcComponent`])
//! - Configuration ([`AppConfig`], [`PromptsConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_PROMPTS_LANGUAGE, DiscoveryConfig, PROMPTS_LANGUAGE_ENV, PromptsConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{OrgDocsError, Result, RootFailure};
pub use types::{ArtifactKind, DiscoveredArtifact, LwcComponent, PackageDirectory};
