//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.
//! Every template is resolved and compiled once, when the loader is built,
//! and is read-only afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use handlebars::template::Template;
use handlebars::{Handlebars, RenderError, RenderErrorReason};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::embedded;
use super::kind::PromptKind;
use super::variables::{Variables, template_placeholders};
use crate::config::Config;
use crate::error::PromptError;

/// User override directory, relative to the project root
pub const USER_PROMPTS_DIR: &str = ".ragprompt/prompts";

/// Repo default directory, relative to the project root
pub const REPO_PROMPTS_DIR: &str = "prompts";

/// File extension of prompt template files
pub const TEMPLATE_EXT: &str = "pmt";

/// What to do when a template references a variable the caller did not supply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingVariablePolicy {
    /// Fail with `PromptError::MissingVariable`
    #[default]
    Strict,
    /// Leave the placeholder in the output as `{{name}}`
    Preserve,
    /// Substitute the empty string
    Empty,
}

/// Where a template was resolved from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum TemplateSource {
    /// `.ragprompt/prompts/{name}.pmt` or the configured prompts dir
    User(PathBuf),
    /// `prompts/{name}.pmt`
    Repo(PathBuf),
    /// Compiled into the binary
    Embedded,
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(path) => write!(f, "user ({})", path.display()),
            Self::Repo(path) => write!(f, "repo ({})", path.display()),
            Self::Embedded => write!(f, "embedded"),
        }
    }
}

/// Result of checking a template against the variables its kind provides
#[derive(Debug, Clone, Serialize)]
pub struct TemplateReport {
    pub kind: PromptKind,
    pub source: TemplateSource,
    /// Every placeholder the template references
    pub placeholders: Vec<String>,
    /// Placeholders no caller of this kind will ever supply
    pub unknown: Vec<String>,
    /// Expected variables the template never references
    pub missing: Vec<String>,
}

impl TemplateReport {
    pub fn is_ok(&self) -> bool {
        self.unknown.is_empty() && self.missing.is_empty()
    }
}

#[derive(Debug, Clone)]
struct LoadedTemplate {
    content: String,
    source: TemplateSource,
    placeholders: BTreeSet<String>,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine, one registered template per kind
    hbs: Handlebars<'static>,
    /// Resolved template text and metadata
    templates: BTreeMap<PromptKind, LoadedTemplate>,
    policy: MissingVariablePolicy,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at a project directory
    ///
    /// # Arguments
    /// * `root` - Project root (used to find `.ragprompt/prompts/` and `prompts/`)
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PromptError> {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        Self::from_dirs(Some(root.join(USER_PROMPTS_DIR)), Some(root.join(REPO_PROMPTS_DIR)))
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Result<Self, PromptError> {
        debug!("PromptLoader::embedded_only: called");
        Self::from_dirs(None, None)
    }

    /// Create a loader from configuration
    ///
    /// `prompts.dir` replaces the user override directory when set.
    pub fn from_config(config: &Config, root: impl AsRef<Path>) -> Result<Self, PromptError> {
        let root = root.as_ref();
        debug!(?root, prompts_dir = ?config.prompts.dir, "PromptLoader::from_config: called");
        let user_dir = config
            .prompts
            .dir
            .clone()
            .unwrap_or_else(|| root.join(USER_PROMPTS_DIR));
        let loader = Self::from_dirs(Some(user_dir), Some(root.join(REPO_PROMPTS_DIR)))?;
        Ok(loader.with_policy(config.prompts.missing_variable))
    }

    /// Create a loader with explicit override directories
    ///
    /// Directories that do not exist are skipped.
    pub fn from_dirs(user_dir: Option<PathBuf>, repo_dir: Option<PathBuf>) -> Result<Self, PromptError> {
        debug!(?user_dir, ?repo_dir, "PromptLoader::from_dirs: called");
        let user_dir = user_dir.filter(|dir| {
            let exists = dir.is_dir();
            debug!(?dir, %exists, "PromptLoader::from_dirs: checking user override directory");
            exists
        });
        let repo_dir = repo_dir.filter(|dir| {
            let exists = dir.is_dir();
            debug!(?dir, %exists, "PromptLoader::from_dirs: checking repo directory");
            exists
        });

        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(true);

        let mut templates = BTreeMap::new();
        for kind in PromptKind::all() {
            let name = kind.template_name();
            let (content, source) = load_template(name, user_dir.as_deref(), repo_dir.as_deref())?;

            debug!(%name, "PromptLoader::from_dirs: compiling template");
            let compiled =
                Template::compile_with_name(&content, name.to_string()).map_err(|e| PromptError::InvalidTemplate {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            let found = template_placeholders(&compiled);
            hbs.register_template(name, compiled);

            info!("Loaded template '{}' from {}", name, source);
            templates.insert(
                kind,
                LoadedTemplate {
                    content,
                    source,
                    placeholders: found,
                },
            );
        }

        Ok(Self {
            hbs,
            templates,
            policy: MissingVariablePolicy::Strict,
        })
    }

    /// Set the missing variable policy
    ///
    /// The engine stays in strict mode under every policy, so a reference the
    /// policy cannot fill still fails with `MissingVariable`.
    pub fn with_policy(mut self, policy: MissingVariablePolicy) -> Self {
        debug!(?policy, "PromptLoader::with_policy: called");
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MissingVariablePolicy {
        self.policy
    }

    /// Raw template text for a kind
    pub fn template(&self, kind: PromptKind) -> Option<&str> {
        self.templates.get(&kind).map(|t| t.content.as_str())
    }

    /// Where the template for a kind was loaded from
    pub fn source(&self, kind: PromptKind) -> Option<&TemplateSource> {
        self.templates.get(&kind).map(|t| &t.source)
    }

    /// Placeholders referenced by the template for a kind
    pub fn placeholders(&self, kind: PromptKind) -> Option<&BTreeSet<String>> {
        self.templates.get(&kind).map(|t| &t.placeholders)
    }

    /// Compare a template's placeholders with the variables its kind supplies
    pub fn inspect(&self, kind: PromptKind) -> Option<TemplateReport> {
        debug!(%kind, "PromptLoader::inspect: called");
        let template = self.templates.get(&kind)?;
        let expected = kind.required_variables();

        let unknown = template
            .placeholders
            .iter()
            .filter(|name| !expected.contains(&name.as_str()))
            .cloned()
            .collect();
        let missing = expected
            .iter()
            .filter(|name| !template.placeholders.contains(**name))
            .map(|name| name.to_string())
            .collect();

        Some(TemplateReport {
            kind,
            source: template.source.clone(),
            placeholders: template.placeholders.iter().cloned().collect(),
            unknown,
            missing,
        })
    }

    /// Render a template with the given variables
    ///
    /// Variables the template does not reference are ignored. Values are
    /// inserted verbatim: no escaping, and no further substitution inside them.
    pub fn render(&self, kind: PromptKind, vars: &Variables) -> Result<String, PromptError> {
        let name = kind.template_name();
        debug!(%name, vars = vars.len(), policy = ?self.policy, "PromptLoader::render: called");
        let template = self.templates.get(&kind).ok_or_else(|| PromptError::Render {
            name: name.to_string(),
            message: "template not loaded".to_string(),
        })?;

        let missing = vars.missing(&template.placeholders);
        if missing.is_empty() {
            return self.hbs.render(name, vars).map_err(|e| render_error(name, e));
        }

        debug!(?missing, "PromptLoader::render: variables missing");
        let context = match self.policy {
            MissingVariablePolicy::Strict => {
                return Err(PromptError::MissingVariable {
                    template: name.to_string(),
                    variable: missing[0].clone(),
                });
            }
            MissingVariablePolicy::Preserve => fill_missing(vars, &missing, |var| format!("{{{{{}}}}}", var)),
            MissingVariablePolicy::Empty => fill_missing(vars, &missing, |_| String::new()),
        };

        self.hbs
            .render(name, &context)
            .map_err(|e| render_error(name, e))
    }

    /// Render the system prompt
    pub fn render_system(&self) -> Result<String, PromptError> {
        debug!("PromptLoader::render_system: called");
        self.render(PromptKind::System, &Variables::new())
    }

    /// Render one document block
    ///
    /// `doc_num` is the 1-based rank of the chunk.
    pub fn render_document(&self, doc_num: usize, chunk_text: &str) -> Result<String, PromptError> {
        debug!(%doc_num, chunk_len = chunk_text.len(), "PromptLoader::render_document: called");
        if doc_num == 0 {
            return Err(PromptError::InvalidDocNum(doc_num));
        }
        let vars = Variables::new()
            .with("doc_num", doc_num)
            .with("chunk_text", chunk_text);
        self.render(PromptKind::Document, &vars)
    }

    /// Render the footer for a query
    pub fn render_footer(&self, query: &str) -> Result<String, PromptError> {
        debug!(query_len = query.len(), "PromptLoader::render_footer: called");
        self.render(PromptKind::Footer, &Variables::new().with("query", query))
    }
}

/// Load a template by name
///
/// Checks in order:
/// 1. User override: `{user_dir}/{name}.pmt`
/// 2. Repo default: `{repo_dir}/{name}.pmt`
/// 3. Embedded fallback
fn load_template(
    name: &str,
    user_dir: Option<&Path>,
    repo_dir: Option<&Path>,
) -> Result<(String, TemplateSource), PromptError> {
    debug!(%name, "load_template: called");
    let file_name = format!("{}.{}", name, TEMPLATE_EXT);

    if let Some(dir) = user_dir {
        let path = dir.join(&file_name);
        if path.exists() {
            debug!(?path, "load_template: found in user override");
            let content = read_template(&path)?;
            return Ok((content, TemplateSource::User(path)));
        }
        debug!(?path, "load_template: not found in user override");
    }

    if let Some(dir) = repo_dir {
        let path = dir.join(&file_name);
        if path.exists() {
            debug!(?path, "load_template: found in repo");
            let content = read_template(&path)?;
            return Ok((content, TemplateSource::Repo(path)));
        }
        debug!(?path, "load_template: not found in repo");
    }

    debug!("load_template: trying embedded fallback");
    match embedded::get_embedded(name) {
        Some(content) => Ok((content.to_string(), TemplateSource::Embedded)),
        None => Err(PromptError::InvalidTemplate {
            name: name.to_string(),
            message: "no template file and no embedded default".to_string(),
        }),
    }
}

fn read_template(path: &Path) -> Result<String, PromptError> {
    std::fs::read_to_string(path).map_err(|source| PromptError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a render context that also holds a value for every missing placeholder
///
/// Dotted paths become nested objects. A path that cannot be placed, like
/// `query.len` when `query` is already text, stays missing.
fn fill_missing(vars: &Variables, missing: &[String], value: impl Fn(&str) -> String) -> Value {
    let mut context: Map<String, Value> = vars
        .iter()
        .map(|(name, text)| (name.to_string(), Value::String(text.to_string())))
        .collect();
    for var in missing {
        insert_path(&mut context, var, value(var));
    }
    Value::Object(context)
}

fn insert_path(context: &mut Map<String, Value>, path: &str, value: String) {
    let segments: Vec<&str> = path.split(['.', '/']).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = context;
    for segment in parents {
        node = match node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            _ => return,
        };
    }
    node.entry(last.to_string()).or_insert(Value::String(value));
}

fn render_error(name: &str, err: RenderError) -> PromptError {
    match err.reason() {
        RenderErrorReason::MissingVariable(var) => PromptError::MissingVariable {
            template: name.to_string(),
            variable: var.clone().unwrap_or_else(|| "unknown".to_string()),
        },
        _ => PromptError::Render {
            name: name.to_string(),
            message: err.to_string(),
        },
    }
}
