//! Prompt templates for specialist agents.

mod template;

pub use template::{PromptTemplate, PromptVars};
