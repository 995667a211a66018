//! Settings that seed an rbase session
//!
//! Options and session parameters are read from up to three places, each
//! overriding the one before:
//!
//! 1. `~/.rbase/config.toml`
//! 2. the nearest `rbase.toml` at or above the working directory
//! 3. `RBASE_OPTION_<NAME>` environment variables (options only)
//!
//! Option names are not validated here; the runtime ignores names it does
//! not know and falls back to its built-in defaults for everything unset.
//!
//! ```no_run
//! use rbase_config::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! println!("seed: {:?}", config.settings.seed());
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no settings file at {0}")]
    NotFound(PathBuf),

    #[error("cannot read settings: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{file} is not valid TOML: {error}")]
    TomlParseError { file: PathBuf, error: toml::de::Error },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("cannot locate the home directory")]
    HomeNotFound,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader, ENV_OPTION_PREFIX};
pub use settings::{OptionValue, SessionConfig, Settings};
