//! ragprompt configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompts::MissingVariablePolicy;

/// Project-local config file name
pub const LOCAL_CONFIG: &str = ".ragprompt.yml";

/// Main ragprompt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Template lookup and rendering
    pub prompts: PromptsConfig,

    /// Prompt assembly limits
    pub assembly: AssemblyConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .ragprompt.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/ragprompt/ragprompt.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ragprompt").join("ragprompt.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|config| config.log_level)
    }

    /// Check settings that have no useful meaning for prompt assembly
    pub fn validate(&self) -> Result<()> {
        if self.assembly.separator.is_empty() {
            return Err(eyre!("assembly.separator must not be empty"));
        }
        if self.assembly.max_documents == Some(0) {
            return Err(eyre!("assembly.max-documents must be at least 1"));
        }
        if self.assembly.max_context_chars == Some(0) {
            return Err(eyre!("assembly.max-context-chars must be at least 1"));
        }
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let mut config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;

        // relative prompts dir is resolved against the config file's directory
        if let (Some(dir), Some(base)) = (config.prompts.dir.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }
}

/// Template lookup and rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory of `.pmt` overrides, replacing `.ragprompt/prompts`
    pub dir: Option<PathBuf>,

    /// Policy for placeholders the caller did not supply
    #[serde(rename = "missing-variable")]
    pub missing_variable: MissingVariablePolicy,
}

/// Prompt assembly limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Maximum number of document blocks
    #[serde(rename = "max-documents")]
    pub max_documents: Option<usize>,

    /// Maximum total characters across document blocks
    #[serde(rename = "max-context-chars")]
    pub max_context_chars: Option<usize>,

    /// Text placed between the system prompt and the rest
    pub separator: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_documents: None,
            max_context_chars: None,
            separator: crate::DEFAULT_SEPARATOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.log_level.is_none());
        assert!(config.prompts.dir.is_none());
        assert_eq!(config.prompts.missing_variable, MissingVariablePolicy::Strict);
        assert_eq!(config.assembly.separator, "\n\n");
        assert!(config.assembly.max_documents.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

prompts:
  dir: /etc/ragprompt/prompts
  missing-variable: preserve

assembly:
  max-documents: 5
  max-context-chars: 8000
  separator: "\n"
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.prompts.dir, Some(PathBuf::from("/etc/ragprompt/prompts")));
        assert_eq!(config.prompts.missing_variable, MissingVariablePolicy::Preserve);
        assert_eq!(config.assembly.max_documents, Some(5));
        assert_eq!(config.assembly.max_context_chars, Some(8000));
        assert_eq!(config.assembly.separator, "\n");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
prompts:
  missing-variable: empty
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.prompts.missing_variable, MissingVariablePolicy::Empty);

        // Defaults for unspecified
        assert!(config.prompts.dir.is_none());
        assert_eq!(config.assembly.separator, "\n\n");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let yaml = "prompts:\n  missing-variable: ignore\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("ragprompt.yml");
        fs::write(&path, "log-level: warn\nassembly:\n  max-documents: 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.assembly.max_documents, Some(3));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_rejects_unusable_assembly_settings() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("ragprompt.yml");

        for yaml in [
            "assembly:\n  separator: \"\"\n",
            "assembly:\n  max-documents: 0\n",
            "assembly:\n  max-context-chars: 0\n",
        ] {
            fs::write(&path, yaml).unwrap();
            let err = Config::load(Some(&path)).unwrap_err();
            assert!(format!("{:?}", err).contains("assembly."), "unexpected error for {:?}: {:?}", yaml, err);
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_relative_prompts_dir_follows_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("ragprompt.yml");
        fs::write(&path, "prompts:\n  dir: templates\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.prompts.dir, Some(temp.path().join("templates")));

        fs::write(&path, "prompts:\n  dir: /abs/templates\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.prompts.dir, Some(PathBuf::from("/abs/templates")));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/ragprompt.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
