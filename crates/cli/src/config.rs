//! Environment-driven configuration.

use std::path::PathBuf;

use stockroom_inventory::{DEFAULT_DATA_FILE, DEFAULT_EXPORT_FILE};
use stockroom_observability::LogFormat;

pub const DATA_FILE_VAR: &str = "STOCKROOM_DATA_FILE";
pub const EXPORT_FILE_VAR: &str = "STOCKROOM_EXPORT_FILE";
pub const LOG_FORMAT_VAR: &str = "STOCKROOM_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockroomConfig {
    pub data_file: PathBuf,
    pub export_file: PathBuf,
    pub log_format: LogFormat,
}

impl Default for StockroomConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            export_file: PathBuf::from(DEFAULT_EXPORT_FILE),
            log_format: LogFormat::default(),
        }
    }
}

impl StockroomConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset
    /// or empty values. An unrecognized log format falls back to text.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_format = match get(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse::<LogFormat>().unwrap_or_else(|err| {
                eprintln!("warning: {err}; using text logs");
                LogFormat::Text
            }),
            None => defaults.log_format,
        };

        Self {
            data_file: get(DATA_FILE_VAR).map(PathBuf::from).unwrap_or(defaults.data_file),
            export_file: get(EXPORT_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.export_file),
            log_format,
        }
    }
}
