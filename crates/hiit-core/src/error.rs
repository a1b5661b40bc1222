//! Core error types for hiit-core.
//!
//! The timer itself never fails: invalid transitions are ignored and
//! out-of-range settings are clamped. Errors only come from the file-backed
//! collaborators (configuration and saved workout plans).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hiit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Workout plan storage errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Workout plan storage errors.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Failed to read or parse the plan file
    #[error("Failed to load plans from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the plan file
    #[error("Failed to save plans to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// No plan with that name
    #[error("plan not found: {0}")]
    NotFound(String),

    /// Plan names must be non-empty
    #[error("plan name must not be empty")]
    EmptyName,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
