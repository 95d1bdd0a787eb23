//! rp - RAG prompt renderer
//!
//! CLI entry point for rendering and assembling prompts.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use ragprompt::cli::{Cli, Command, OutputFormat};
use ragprompt::config::Config;
use ragprompt::{AssembleOptions, PromptAssembler, PromptKind, PromptLoader, RetrievedChunk};

/// Log level with priority: CLI --log-level > config file > default (WARN)
fn resolve_log_level(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> tracing::Level {
    match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let level = resolve_log_level(cli_log_level, config_log_level);

    // stdout carries prompt text only
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.prompts_dir.clone() {
        config.prompts.dir = Some(dir);
    }
    if let Some(policy) = cli.missing_variable {
        config.prompts.missing_variable = policy;
    }

    let root = std::env::current_dir().context("Failed to determine current directory")?;
    let loader = PromptLoader::from_config(&config, &root).context("Failed to load prompt templates")?;
    info!("rp loaded templates (policy: {:?})", loader.policy());

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::System => cmd_system(&loader),
        Command::Document { doc_num, text, file } => cmd_document(&loader, doc_num, text, file),
        Command::Footer { query } => cmd_footer(&loader, &query),
        Command::Assemble {
            query,
            chunks,
            jsonl,
            max_documents,
            max_context_chars,
            format,
        } => {
            let mut options = AssembleOptions::from(&config.assembly);
            if max_documents.is_some() {
                options.max_documents = max_documents;
            }
            if max_context_chars.is_some() {
                options.max_context_chars = max_context_chars;
            }
            cmd_assemble(&loader, &query, &chunks, jsonl.as_deref(), options, format)
        }
        Command::List => cmd_list(&loader),
        Command::Show { kind } => cmd_show(&loader, kind),
        Command::Check => cmd_check(&loader),
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
    Ok(buf)
}

fn cmd_system(loader: &PromptLoader) -> Result<()> {
    debug!("cmd_system: called");
    println!("{}", loader.render_system()?);
    Ok(())
}

fn cmd_document(loader: &PromptLoader, doc_num: usize, text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    debug!(%doc_num, "cmd_document: called");
    let chunk_text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            std::fs::read_to_string(&path).context(format!("Failed to read chunk {}", path.display()))?
        }
        (None, None) => read_stdin()?,
    };
    print!("{}", loader.render_document(doc_num, &chunk_text)?);
    Ok(())
}

fn cmd_footer(loader: &PromptLoader, query: &str) -> Result<()> {
    debug!("cmd_footer: called");
    println!("{}", loader.render_footer(query)?);
    Ok(())
}

fn load_chunks(files: &[PathBuf], jsonl: Option<&Path>) -> Result<Vec<RetrievedChunk>> {
    debug!(files = files.len(), ?jsonl, "load_chunks: called");
    if let Some(path) = jsonl {
        let input = if path == Path::new("-") {
            read_stdin()?
        } else {
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?
        };
        return RetrievedChunk::parse_jsonl(&input);
    }

    files
        .iter()
        .map(|path| -> Result<RetrievedChunk> {
            let text = std::fs::read_to_string(path).context(format!("Failed to read chunk {}", path.display()))?;
            Ok(RetrievedChunk::new(text).with_source(path.display().to_string()))
        })
        .collect()
}

fn cmd_assemble(
    loader: &PromptLoader,
    query: &str,
    files: &[PathBuf],
    jsonl: Option<&Path>,
    options: AssembleOptions,
    format: OutputFormat,
) -> Result<()> {
    debug!(?format, "cmd_assemble: called");
    let chunks = load_chunks(files, jsonl)?;
    let prompt = PromptAssembler::new(loader).with_options(options).assemble(query, &chunks)?;

    match format {
        OutputFormat::Text => println!("{}", prompt),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&prompt.messages()).context("Failed to serialize prompt")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn cmd_list(loader: &PromptLoader) -> Result<()> {
    debug!("cmd_list: called");
    for kind in PromptKind::all() {
        let source = loader.source(kind).ok_or_else(|| eyre!("Template not loaded: {}", kind))?;
        let vars = loader
            .placeholders(kind)
            .map(|p| p.iter().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!(
            "{:<10} {:<40} {}",
            kind.template_name().cyan(),
            source.to_string().dimmed(),
            if vars.is_empty() { "-".to_string() } else { vars }
        );
    }
    Ok(())
}

fn cmd_show(loader: &PromptLoader, kind: PromptKind) -> Result<()> {
    debug!(%kind, "cmd_show: called");
    let template = loader.template(kind).ok_or_else(|| eyre!("Template not loaded: {}", kind))?;
    print!("{}", template);
    Ok(())
}

fn cmd_check(loader: &PromptLoader) -> Result<()> {
    debug!("cmd_check: called");
    let mut failures = 0;
    for kind in PromptKind::all() {
        let report = loader.inspect(kind).ok_or_else(|| eyre!("Template not loaded: {}", kind))?;
        if report.is_ok() {
            println!("{} {} ({})", "✓".green(), kind.template_name(), report.source);
            continue;
        }

        failures += 1;
        println!("{} {} ({})", "✗".red(), kind.template_name(), report.source);
        for name in &report.unknown {
            println!("    unknown variable: {}", name.yellow());
        }
        for name in &report.missing {
            println!("    never uses: {}", name.yellow());
        }
    }

    if failures > 0 {
        return Err(eyre!("{} template(s) failed checks", failures));
    }
    Ok(())
}
