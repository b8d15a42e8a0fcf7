//! Configuration system for studyhelper.
//!
//! Provides TOML-based configuration with:
//! - Config file layering (user config dir + project-local `studyhelper.toml`)
//! - Defaults for every setting, so an empty config is a working config
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{LoadedConfig, load_config_file, load_config_with_options, xdg_config_dir};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_api_key};
pub use types::*;
