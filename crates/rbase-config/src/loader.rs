//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::settings::{OptionValue, Settings};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override options
pub const ENV_OPTION_PREFIX: &str = "RBASE_OPTION_";

/// Name of the project settings file
const PROJECT_FILE: &str = "rbase.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.rbase/config.toml) - lowest priority
/// 2. Project config (./rbase.toml) - overrides global
/// 3. Environment variables (RBASE_OPTION_*) - overrides project
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global and project settings merged
    pub settings: Settings,

    /// Raw environment overrides, keyed by the upper-cased suffix after
    /// `RBASE_OPTION_`. The runtime resolves them against its registry.
    pub env_options: Vec<(String, OptionValue)>,

    /// Project root directory (where rbase.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global settings file instead of ~/.rbase/config.toml
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find rbase.toml, then merges it over
    /// the global config and applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_settings) = self.find_project_settings(start_dir)?;

        let mut settings = self.load_global_settings()?;
        settings.merge(&project_settings);

        Ok(Config {
            settings,
            env_options: collect_env_options(env::vars()),
            project_root,
        })
    }

    /// Load configuration from a specific project settings file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_settings = Settings::load_from_file(config_path)?;
        let mut settings = self.load_global_settings()?;
        settings.merge(&project_settings);

        Ok(Config {
            settings,
            env_options: collect_env_options(env::vars()),
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find project settings by walking up the directory tree
    fn find_project_settings(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, Settings)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                let settings = Settings::load_from_file(&config_path)?;
                return Ok((Some(current), settings));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, Settings::default())),
            }
        }
    }

    /// Load global settings; a missing file is not an error
    fn load_global_settings(&mut self) -> ConfigResult<Settings> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match Settings::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(Settings::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(Settings::default());
        }

        Settings::load_from_file(&path)
    }

    /// Get the global configuration directory (~/.rbase)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".rbase"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a project settings file was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Find the environment override for an option name.
    ///
    /// `keep.source` is looked up as `RBASE_OPTION_KEEP_SOURCE`.
    pub fn env_override(&self, option: &str) -> Option<&OptionValue> {
        let key = env_key(option);
        self.env_options
            .iter()
            .rev()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

/// Environment key suffix for an option name
pub fn env_key(option: &str) -> String {
    option
        .chars()
        .map(|c| if c == '.' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

fn collect_env_options(vars: impl Iterator<Item = (String, String)>) -> Vec<(String, OptionValue)> {
    let mut found: Vec<(String, OptionValue)> = vars
        .filter_map(|(name, raw)| {
            name.strip_prefix(ENV_OPTION_PREFIX)
                .filter(|suffix| !suffix.is_empty())
                .map(|suffix| (suffix.to_string(), OptionValue::parse_env(&raw)))
        })
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}
