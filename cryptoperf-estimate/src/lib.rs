//! # Cryptoperf Estimate
//!
//! Turns stored benchmark records into processing-time estimates.
//!
//! [`rates::RateTable`] groups records by `(algorithm, operation)` and keeps
//! a mean rate per key size where several were measured. A
//! [`rates::RateBoard`] publishes rebuilt tables as whole snapshots, and
//! [`estimator::TimeEstimator`] answers "how long for N bytes" against one
//! snapshot, with a table of comparison intervals around the target.
//!
//! Asymmetric rates stay in bytes per second and everything else in MB per
//! second; the [`cryptoperf_common::types::Rate`] type carries the unit.
//!
//! ## Example
//!
//! ```rust
//! use cryptoperf_common::prelude::*;
//! use cryptoperf_estimate::prelude::*;
//! use std::sync::Arc;
//!
//! let records = vec![BenchmarkRecord::from_measurement(
//!     Algorithm::Aes,
//!     Operation::Encryption,
//!     Some(KeySize::Bits(128)),
//!     "10mb",
//!     10 * BYTES_PER_MB,
//!     0.1,
//! )];
//! let estimator = TimeEstimator::new(Arc::new(RateTable::from_records(&records)));
//! let result = estimator
//!     .estimate("AES", "encryption", 50 * BYTES_PER_MB, None)
//!     .unwrap();
//! assert!((result.estimated_time_seconds - 0.5).abs() < 1e-9);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// Rate aggregation
pub mod rates;

/// Time estimation
pub mod estimator;

/// Commonly used types
pub mod prelude {
    pub use crate::estimator::{EstimateStatus, EstimationResult, IntervalRow, TimeEstimator};
    pub use crate::rates::{RateBoard, RateEntry, RateRow, RateStat, RateTable};
}

/// Cryptoperf Estimate crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
