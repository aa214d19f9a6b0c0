//! Error types for Modelaudit core.

use thiserror::Error;

/// Errors that can occur while configuring or running an audit.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Sheet list unavailable: {0}")]
    SheetList(String),

    #[error("Failed to load sheet '{sheet}': {message}")]
    SheetLoad { sheet: String, message: String },
}

pub type Result<T> = std::result::Result<T, AuditError>;
