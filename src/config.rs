//! Configuration loaded from TOML.

use error_set::error_set;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the repository root when no explicit path is given
pub const CONFIG_FILE_NAME: &str = ".diff-overlay.toml";

error_set! {
    /// Errors from loading configuration
    ConfigError := {
        #[display("Failed to read config file {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to parse config file {path}: {message}")]
        ParseFailed { path: String, message: String },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Revision the working tree is compared against
    pub reference: String,
    /// Context lines requested from the diff command
    pub context_lines: u32,
    /// Git executable
    pub git: String,
    /// Hint appended to every hunk summary
    pub instructions: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference: "HEAD".to_string(),
            context_lines: 3,
            git: "git".to_string(),
            instructions: "accept: a | reject: r | accept all: A".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `explicit` if given, else [`CONFIG_FILE_NAME`] in `repo` if it
    /// exists, else defaults.
    pub fn load(repo: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let candidate: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = repo.join(CONFIG_FILE_NAME);
                if !default_path.is_file() {
                    tracing::debug!("No config file at {}, using defaults", default_path.display());
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let config = Self::from_file(&candidate)?;
        tracing::debug!("Loaded config from {}", candidate.display());
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml("reference = \"main\"\ncontext_lines = 0\n").unwrap();
        assert_eq!(config.reference, "main");
        assert_eq!(config.context_lines, 0);
        assert_eq!(config.git, "git");
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::from_toml("colour = true\n").is_err());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(dir.path(), None).unwrap(), Config::default());
    }

    #[test]
    fn load_reads_repo_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "instructions = \"y/n\"\n").unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.instructions, "y/n");
    }

    #[test]
    fn load_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path(), Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn load_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "context_lines = \"three\"\n").unwrap();
        let result = Config::load(dir.path(), Some(&path));
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }
}
