//! Prompt Template System
//!
//! Loads and renders the `.pmt` (prompt template) files that make up a RAG prompt:
//! `system`, `document` (once per retrieved chunk) and `footer`.
//!
//! Template loading chain:
//! 1. `.ragprompt/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod kind;
mod loader;
mod variables;

pub use kind::PromptKind;
pub use loader::{
    MissingVariablePolicy, PromptLoader, REPO_PROMPTS_DIR, TEMPLATE_EXT, TemplateReport, TemplateSource,
    USER_PROMPTS_DIR,
};
pub use variables::{Variables, placeholders};
