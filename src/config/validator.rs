//! Configuration validator for procsig
//!
//! Checks that configured values fall inside acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, ScannerConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.max_threads == 0 {
            return Err(ConfigError::Invalid(
                "Scanner threads must be at least 1".to_string(),
            ));
        }

        if scanner.max_threads > 128 {
            return Err(ConfigError::Invalid(
                "Scanner threads cannot exceed 128".to_string(),
            ));
        }

        // Power-of-2 chunks keep reads page-aligned
        if scanner.chunk_size == 0 || !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2".to_string(),
            ));
        }

        if scanner.max_results == 0 {
            return Err(ConfigError::Invalid(
                "Maximum results must be at least 1".to_string(),
            ));
        }

        if scanner.cancel_check_interval == 0 {
            return Err(ConfigError::Invalid(
                "Cancellation check interval must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let mut config = Config::default();
        config.scanner.max_threads = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_excessive_threads_rejected() {
        let mut config = Config::default();
        config.scanner.max_threads = 129;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_chunk_size_must_be_power_of_two() {
        let mut config = Config::default();
        config.scanner.chunk_size = 65537;
        assert!(validate_config(&config).is_err());

        config.scanner.chunk_size = 0;
        assert!(validate_config(&config).is_err());

        config.scanner.chunk_size = 4096;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_cancel_interval_rejected() {
        let mut config = Config::default();
        config.scanner.cancel_check_interval = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_log_levels() {
        let mut config = Config::default();
        for level in ["trace", "debug", "info", "warn", "error", "off", "WARN"] {
            config.logging.level = level.to_string();
            assert!(validate_config(&config).is_ok(), "level {level}");
        }

        config.logging.level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }
}
