//! Prompt assembly
//!
//! Builds a complete RAG prompt in a fixed order: the system prompt, one
//! document block per retrieved chunk in rank order, then the footer.

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AssemblyConfig;
use crate::error::PromptError;
use crate::prompts::PromptLoader;

/// A retrieved chunk, as produced by a search step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk content, inserted verbatim
    pub text: String,
    /// Where the chunk came from (file, URL, document id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Retrieval score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievedChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
            score: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Parse JSON Lines input, one chunk object per line
    ///
    /// Blank lines are skipped. Errors name the 1-based line number.
    pub fn parse_jsonl(input: &str) -> eyre::Result<Vec<Self>> {
        debug!(input_len = input.len(), "RetrievedChunk::parse_jsonl: called");
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<Self>(line).wrap_err_with(|| format!("Invalid chunk on line {}", i + 1))
            })
            .collect()
    }
}

impl From<&str> for RetrievedChunk {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RetrievedChunk {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Limits applied while assembling
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Maximum number of document blocks
    pub max_documents: Option<usize>,
    /// Maximum total characters across document blocks
    pub max_context_chars: Option<usize>,
    /// Placed between the system prompt and the user message
    pub separator: String,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            max_documents: None,
            max_context_chars: None,
            separator: crate::DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl From<&AssemblyConfig> for AssembleOptions {
    fn from(config: &AssemblyConfig) -> Self {
        Self {
            max_documents: config.max_documents,
            max_context_chars: config.max_context_chars,
            separator: config.separator.clone(),
        }
    }
}

/// System and user halves of an assembled prompt, for chat-style APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessages {
    pub system: String,
    pub user: String,
}

/// A fully rendered prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system: String,
    /// Rendered document blocks, in rank order
    pub documents: Vec<String>,
    pub footer: String,
    pub separator: String,
}

impl AssembledPrompt {
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Document blocks followed by the footer
    pub fn user_message(&self) -> String {
        let mut user = self.documents.concat();
        user.push_str(&self.footer);
        user
    }

    /// The whole prompt as a single string
    pub fn text(&self) -> String {
        format!("{}{}{}", self.system, self.separator, self.user_message())
    }

    pub fn messages(&self) -> PromptMessages {
        PromptMessages {
            system: self.system.clone(),
            user: self.user_message(),
        }
    }
}

impl std::fmt::Display for AssembledPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Assembles prompts from a loader's templates
pub struct PromptAssembler<'a> {
    loader: &'a PromptLoader,
    options: AssembleOptions,
}

impl<'a> PromptAssembler<'a> {
    pub fn new(loader: &'a PromptLoader) -> Self {
        Self {
            loader,
            options: AssembleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssembleOptions) -> Self {
        self.options = options;
        self
    }

    /// Assemble a prompt for `query` from chunks in retrieval-rank order
    ///
    /// Blank chunks are skipped without using up a document number. When a
    /// limit is hit, the remaining lower-ranked chunks are dropped whole.
    pub fn assemble(&self, query: &str, chunks: &[RetrievedChunk]) -> Result<AssembledPrompt, PromptError> {
        debug!(chunks = chunks.len(), options = ?self.options, "PromptAssembler::assemble: called");
        let system = self.loader.render_system()?;

        let mut documents: Vec<String> = Vec::new();
        let mut context_chars = 0;
        for (rank, chunk) in chunks.iter().enumerate() {
            if chunk.text.trim().is_empty() {
                debug!(%rank, "PromptAssembler::assemble: skipping blank chunk");
                continue;
            }

            if let Some(max) = self.options.max_documents {
                if documents.len() >= max {
                    warn!("Document limit of {} reached, dropping chunks from rank {}", max, rank + 1);
                    break;
                }
            }

            let block = self.loader.render_document(documents.len() + 1, &chunk.text)?;
            let block_chars = block.chars().count();

            if let Some(max) = self.options.max_context_chars {
                if context_chars + block_chars > max {
                    warn!(
                        "Context budget of {} chars reached, dropping chunks from rank {}",
                        max,
                        rank + 1
                    );
                    break;
                }
            }

            context_chars += block_chars;
            documents.push(block);
        }

        let footer = self.loader.render_footer(query)?;
        info!(
            "Assembled prompt with {} of {} chunks ({} context chars)",
            documents.len(),
            chunks.len(),
            context_chars
        );

        Ok(AssembledPrompt {
            system,
            documents,
            footer,
            separator: self.options.separator.clone(),
        })
    }
}
