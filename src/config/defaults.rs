//! Default configuration values for procsig

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub max_threads: usize,
    pub chunk_size: usize,
    pub max_results: usize,
    pub cancel_check_interval: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            max_threads: num_cpus::get().min(8),
            chunk_size: 65536, // 64KB
            max_results: 1000,
            cancel_check_interval: 4096,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}
