//! ragprompt - prompt templates for retrieval-augmented generation
//!
//! A RAG prompt is assembled from three templates:
//!
//! - **system**: fixed assistant guidelines
//! - **document**: one block per retrieved chunk (`doc_num`, `chunk_text`)
//! - **footer**: the user's question (`query`) and the answer cue
//!
//! The final prompt is always system, then document blocks in rank order,
//! then footer.
//!
//! # Example
//!
//! ```ignore
//! use ragprompt::{PromptAssembler, PromptLoader, RetrievedChunk};
//!
//! let loader = PromptLoader::embedded_only()?;
//! let chunks = vec![RetrievedChunk::new("X is a letter.")];
//! let prompt = PromptAssembler::new(&loader).assemble("What is X?", &chunks)?;
//! println!("{}", prompt);
//! ```
//!
//! # Modules
//!
//! - [`prompts`] - Template loading, override chain and rendering
//! - [`assembly`] - Concatenating rendered templates into a full prompt
//! - [`error`] - Error taxonomy
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod assembly;
pub mod cli;
pub mod config;
pub mod error;
pub mod prompts;

pub use assembly::{AssembleOptions, AssembledPrompt, PromptAssembler, PromptMessages, RetrievedChunk};
pub use config::{AssemblyConfig, Config, PromptsConfig};
pub use error::PromptError;
pub use prompts::{
    MissingVariablePolicy, PromptKind, PromptLoader, TemplateReport, TemplateSource, Variables, placeholders,
};

/// Default text between the system prompt and the user message
pub const DEFAULT_SEPARATOR: &str = "\n\n";
