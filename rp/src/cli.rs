//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::prompts::{MissingVariablePolicy, PromptKind};

/// rp - render and assemble RAG prompts
#[derive(Parser, Debug)]
#[command(name = "rp")]
#[command(author, version, about = "Render and assemble retrieval-augmented generation prompts", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Directory of .pmt template overrides
    #[arg(long, global = true)]
    pub prompts_dir: Option<PathBuf>,

    /// What to do when a template variable has no value
    #[arg(long, global = true, value_enum)]
    pub missing_variable: Option<MissingVariablePolicy>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the system prompt
    System,

    /// Print one document block
    Document {
        /// Document number (1-based rank)
        #[arg(short = 'n', long = "num", default_value = "1")]
        doc_num: usize,

        /// Chunk text (reads stdin when neither --text nor --file is given)
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read chunk text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the footer for a question
    Footer {
        /// The user's question
        query: String,
    },

    /// Assemble a complete prompt
    Assemble {
        /// The user's question
        #[arg(short, long)]
        query: String,

        /// Chunk files in rank order, one chunk per file
        chunks: Vec<PathBuf>,

        /// JSON Lines file of chunks ({"text": ...} per line), "-" for stdin
        #[arg(long, conflicts_with = "chunks")]
        jsonl: Option<PathBuf>,

        /// Maximum number of document blocks
        #[arg(long)]
        max_documents: Option<usize>,

        /// Maximum total characters across document blocks
        #[arg(long)]
        max_context_chars: Option<usize>,

        /// Output format (text, json)
        #[arg(short = 'F', long, default_value = "text")]
        format: OutputFormat,
    },

    /// List templates with their source and placeholders
    List,

    /// Print a raw template
    Show {
        /// Template to show (system, document, footer)
        kind: PromptKind,
    },

    /// Check templates for unknown or unused variables
    Check,
}

/// Output format for assembled prompts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}
