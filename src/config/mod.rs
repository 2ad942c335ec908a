//! Configuration for procsig
//!
//! Loading, validation and default settings for the scanner and
//! logging, backed by a TOML file.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, Config, ConfigError, ConfigLoader, LoggingConfig, ScannerConfig};
pub use validator::{validate_config, ConfigValidator};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
