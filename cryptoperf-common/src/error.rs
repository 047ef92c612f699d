//cryptoperf-common/src/error.rs
//! Standardized error types for all cryptoperf components

use thiserror::Error;

/// Standard result type used throughout cryptoperf
pub type BenchResult<T> = std::result::Result<T, BenchError>;

/// Comprehensive error type for benchmarking and estimation
#[derive(Error, Debug)]
pub enum BenchError {
    // Unknown algorithm, unsupported operation, bad key size, invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    // A primitive kept failing after the throttle exhausted its retries
    #[error("Operation failed after {attempts} attempt(s): {message}")]
    OperationFailed { attempts: u32, message: String },

    // No record matched an (algorithm, operation) pair
    #[error("No data available for {algorithm} {operation}")]
    NoDataAvailable { algorithm: String, operation: String },

    // Record store could not be read or written
    #[error("Store I/O error: {0}")]
    StoreIo(String),

    // Raw primitive failure before retry handling
    #[error("Crypto error: {0}")]
    Crypto(String),

    // Shutdown was requested while waiting or between cells
    #[error("Cancelled: {0}")]
    Cancelled(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rocksdb::Error> for BenchError {
    fn from(err: rocksdb::Error) -> Self {
        BenchError::StoreIo(err.into_string())
    }
}

impl BenchError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new crypto error
    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreIo(msg.into())
    }

    /// Create a new cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a no-data error for an (algorithm, operation) pair
    pub fn no_data(algorithm: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NoDataAvailable {
            algorithm: algorithm.into(),
            operation: operation.into(),
        }
    }

    /// Create an operation failure carrying the number of attempts made
    pub fn operation_failed(attempts: u32, msg: impl Into<String>) -> Self {
        Self::OperationFailed {
            attempts,
            message: msg.into(),
        }
    }

    /// Whether this error must abort a whole benchmark run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreIo(_) | Self::Cancelled(_))
    }
}

/// Convenience macro for creating BenchError instances
#[macro_export]
macro_rules! bench_error {
    ($variant:ident, $($arg:tt)*) => {
        $crate::error::BenchError::$variant(format!($($arg)*))
    };
}

/// Convenience macro for returning early with a BenchError
#[macro_export]
macro_rules! bench_bail {
    ($variant:ident, $($arg:tt)*) => {
        return Err($crate::bench_error!($variant, $($arg)*))
    };
}
