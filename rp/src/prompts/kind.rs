//! Prompt kinds
//!
//! A RAG prompt is built from exactly three templates. Each kind knows its
//! template name and the variables it expects.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One of the three templates that make up a RAG prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Assistant guidelines, no variables
    System,
    /// One block per retrieved chunk
    #[value(alias = "doc")]
    Document,
    /// Trailing question block
    Footer,
}

impl PromptKind {
    /// All kinds in assembly order
    pub fn all() -> [PromptKind; 3] {
        [Self::System, Self::Document, Self::Footer]
    }

    /// Get the display name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Document => "Document",
            Self::Footer => "Footer",
        }
    }

    /// Get the template name (file stem of the `.pmt` file) for this kind
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Document => "document",
            Self::Footer => "footer",
        }
    }

    /// Variables a template of this kind is expected to reference
    pub fn required_variables(&self) -> &'static [&'static str] {
        match self {
            Self::System => &[],
            Self::Document => &["doc_num", "chunk_text"],
            Self::Footer => &["query"],
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
