//! Settings files (~/.rbase/config.toml and ./rbase.toml)
//!
//! Both files share one schema:
//!
//! ```toml
//! [options]
//! digits = 10
//! OutDec = ","
//!
//! [session]
//! seed = 42
//! tmpdir = "/var/tmp"
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Scalar value of an `[options]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl OptionValue {
    /// Parse an environment-variable string, trying logical, integer,
    /// double and finally falling back to a plain string.
    pub fn parse_env(raw: &str) -> Self {
        match raw {
            "TRUE" | "true" | "T" => return OptionValue::Bool(true),
            "FALSE" | "false" | "F" => return OptionValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return OptionValue::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return OptionValue::Float(f);
        }
        OptionValue::String(raw.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => write!(f, "TRUE"),
            OptionValue::Bool(false) => write!(f, "FALSE"),
            OptionValue::Integer(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seed applied to the RNG when the session starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Parent directory for the session temporary directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpdir: Option<PathBuf>,
}

/// One settings file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Overrides for the options registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, OptionValue>>,

    /// Session settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,
}

impl Settings {
    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::from_toml_str(&content, path)
    }

    /// Parse settings from TOML text; `origin` is used for error messages
    pub fn from_toml_str(content: &str, origin: &Path) -> ConfigResult<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: origin.to_path_buf(),
            error: e,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(options) = &self.options {
            for name in options.keys() {
                if name.is_empty() || name.chars().any(char::is_whitespace) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("options.{}", name),
                        reason: "option names must be non-empty and contain no whitespace"
                            .to_string(),
                    });
                }
            }
        }

        if let Some(session) = &self.session {
            if let Some(seed) = session.seed {
                if seed < i64::from(i32::MIN) + 1 || seed > i64::from(i32::MAX) {
                    return Err(ConfigError::InvalidValue {
                        field: "session.seed".to_string(),
                        reason: format!("seed {} does not fit in an integer", seed),
                    });
                }
            }
        }

        Ok(())
    }

    /// Get the global settings file path (~/.rbase/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".rbase").join("config.toml"))
    }

    /// Merge another settings file into this one.
    /// Option entries merge key by key; session fields override when set.
    pub fn merge(&mut self, other: &Settings) {
        if let Some(other_options) = &other.options {
            let options = self.options.get_or_insert_with(BTreeMap::new);
            for (name, value) in other_options {
                options.insert(name.clone(), value.clone());
            }
        }

        if let Some(other_session) = &other.session {
            let session = self.session.get_or_insert_with(SessionConfig::default);
            if other_session.seed.is_some() {
                session.seed = other_session.seed;
            }
            if other_session.tmpdir.is_some() {
                session.tmpdir = other_session.tmpdir.clone();
            }
        }
    }

    /// Iterate option overrides in name order
    pub fn option_overrides(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options
            .iter()
            .flat_map(|options| options.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn seed(&self) -> Option<i64> {
        self.session.as_ref().and_then(|s| s.seed)
    }

    pub fn tmpdir(&self) -> Option<&Path> {
        self.session.as_ref().and_then(|s| s.tmpdir.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_table() {
        let toml = r#"
[options]
digits = 10
OutDec = ","
"ts.eps" = 0.5
"#;

        let settings: Settings = toml::from_str(toml).unwrap();
        let options = settings.options.unwrap();
        assert_eq!(options["digits"], OptionValue::Integer(10));
        assert_eq!(options["OutDec"], OptionValue::String(",".to_string()));
        assert_eq!(options["ts.eps"], OptionValue::Float(0.5));
    }

    #[test]
    fn test_quoted_dotted_key() {
        let toml = r#"
[options]
"keep.source" = true
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(
            settings.options.unwrap()["keep.source"],
            OptionValue::Bool(true)
        );
    }

    #[test]
    fn test_unknown_section_rejected() {
        let toml = r#"
[lsp]
hover = true
"#;
        assert!(toml::from_str::<Settings>(toml).is_err());
    }

    #[test]
    fn test_seed_out_of_range() {
        let settings = Settings {
            session: Some(SessionConfig {
                seed: Some(1 << 40),
                tmpdir: None,
            }),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_merge_settings() {
        let mut base: Settings = toml::from_str(
            r#"
[options]
digits = 7
width = 80

[session]
seed = 1
"#,
        )
        .unwrap();
        let project: Settings = toml::from_str(
            r#"
[options]
digits = 12

[session]
tmpdir = "/tmp/project"
"#,
        )
        .unwrap();

        base.merge(&project);
        let options = base.options.as_ref().unwrap();
        assert_eq!(options["digits"], OptionValue::Integer(12));
        assert_eq!(options["width"], OptionValue::Integer(80));
        assert_eq!(base.seed(), Some(1));
        assert_eq!(base.tmpdir(), Some(Path::new("/tmp/project")));
    }

    #[test]
    fn test_parse_env_values() {
        assert_eq!(OptionValue::parse_env("TRUE"), OptionValue::Bool(true));
        assert_eq!(OptionValue::parse_env("12"), OptionValue::Integer(12));
        assert_eq!(OptionValue::parse_env("1e-3"), OptionValue::Float(1e-3));
        assert_eq!(
            OptionValue::parse_env("native.enc"),
            OptionValue::String("native.enc".to_string())
        );
    }
}
