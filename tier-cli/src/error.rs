//! CLI Error Types

use thiserror::Error;

use tier_core::TierError;
use tier_storage::StorageError;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Inventory file could not be used
    #[error("Inventory error: {path}: {message}")]
    InventoryError { path: String, message: String },

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Engine error
    #[error("{0}")]
    CoreError(#[from] TierError),

    /// Storage layer error
    #[error("{0}")]
    StorageError(#[from] StorageError),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CliError::ConfigError {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_arg(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an inventory error
    pub fn inventory(path: impl Into<String>, message: impl Into<String>) -> Self {
        CliError::InventoryError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigError { .. } => 1,
            CliError::InvalidArgument { .. } => 2,
            CliError::InventoryError { .. } => 3,
            CliError::IoError(_) => 5,
            CliError::JsonError(_) => 6,
            CliError::CoreError(err) => core_exit_code(err),
            CliError::StorageError(StorageError::Core(err)) => core_exit_code(err),
            CliError::StorageError(StorageError::Configuration(_)) => 1,
            CliError::StorageError(_) => 20,
        }
    }
}

fn core_exit_code(err: &TierError) -> i32 {
    match err {
        TierError::ConfigurationError { .. } => 1,
        TierError::UnknownRestoreTier { .. } | TierError::InvalidInput { .. } => 2,
        TierError::NotFound { .. } => 4,
        TierError::InvalidTransition { .. } | TierError::ConcurrentModification { .. } => 10,
        TierError::ExternalOperationFailure { .. } => 11,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("Missing inventory");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("Missing inventory"));
    }

    #[test]
    fn test_invalid_argument() {
        let err = CliError::invalid_arg("Days must be positive");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_core_errors_keep_codes() {
        let err: CliError = TierError::UnknownRestoreTier {
            key: "instant".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("TIER-RST-001"));

        let err: CliError = StorageError::Core(TierError::configuration("bad days")).into();
        assert_eq!(err.exit_code(), 1);
    }
}
