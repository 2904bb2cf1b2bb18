//! Runtime configuration
//!
//! Settings for the engine debug flag, log output and the static group
//! directory used by the CLI. See [`loader`] for source precedence.

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::{AppConfig, DirectoryConfig, EngineConfig, LogFormat, LoggingConfig};
