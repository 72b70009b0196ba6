// Configuration loading

pub mod services;
pub mod settings;

use std::fmt;

pub use services::{ExtenderConfig, ReconciliatorConfig, ServicesConfig};
pub use settings::Settings;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// TOML parse / serialization error.
    Parse(String),
    /// Settings parsed but violate a constraint.
    Validation(String),
    /// File could not be read or written.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "settings parse error: {msg}"),
            Self::Validation(msg) => write!(f, "settings validation error: {msg}"),
            Self::Io(msg) => write!(f, "settings IO error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
