//! Core domain logic for orgdocs.
//!
//! Ties discovery and prompt resolution together (`pipeline`) and hosts the
//! Apex classifier whose label callers feed into prompts and docs.

pub mod classify;
pub mod pipeline;
