//! # Cryptoperf Common
//!
//! Shared model, error taxonomy and record persistence for the cryptoperf
//! workspace. Every other crate depends on this one for the canonical
//! algorithm names, the unit-tagged [`types::Rate`], and the
//! [`database::RecordStore`] contract.
//!
//! ## Modules
//!
//! - **types**: algorithms, operations, key sizes, rates and units
//! - **record**: benchmark records and their upsert identity
//! - **database**: record store trait with RocksDB and in-memory backends
//! - **validation**: key-size and configuration range checks
//! - **error**: `BenchError` and the `bench_error!` / `bench_bail!` macros
//!
//! ## Example Usage
//!
//! ```rust
//! use cryptoperf_common::prelude::*;
//!
//! let record = BenchmarkRecord::from_measurement(
//!     Algorithm::Aes,
//!     Operation::Encryption,
//!     Some(KeySize::Bits(128)),
//!     "10mb",
//!     10 * BYTES_PER_MB,
//!     0.1,
//! );
//! assert!((record.rate - 100.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod database;
pub mod error;
pub mod record;
pub mod types;
pub mod validation;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use crate::database::{MemoryRecordStore, RecordStore, RocksRecordStore, UpsertOutcome};
    pub use crate::error::{BenchError, BenchResult};
    pub use crate::record::{BenchmarkRecord, RecordKey, ResourceSample};
    pub use crate::types::{
        Algorithm, Family, KeySize, Operation, Rate, RateUnit, BYTES_PER_MB, INTERVAL_FACTORS,
    };
    pub use crate::validation::ValidationUtils;
    pub use crate::{bench_bail, bench_error};
}

/// Cryptoperf Common crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
