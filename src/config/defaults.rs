//! Default configuration values for memsearch

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
    pub parallel: bool,
    pub max_threads: usize,
    pub chunk_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub ansi: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            parallel: true,
            max_threads: num_cpus::get().min(8),
            chunk_size: 16777216, // 16MB
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            ansi: false,
        },
    }
}
