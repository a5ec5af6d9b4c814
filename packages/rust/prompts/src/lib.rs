//! Prompt templates and their resolution into final prompt text.
//!
//! The [`TemplateRegistry`] is an immutable catalog built once per process.
//! A [`PromptResolver`] checks the variable bag against a template's
//! requirements, picks an override or a language variant, and substitutes
//! `{{NAME}}` placeholders in a single pass.

mod registry;
mod resolver;

pub use registry::{PromptTemplate, TemplateDefinition, TemplateRegistry};
pub use resolver::{
    NoOverrides, PromptOverrides, PromptResolver, PromptSettings, PromptVariables,
    language_instruction, substitute,
};
