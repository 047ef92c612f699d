// lib.rs - Cryptoperf Core Library
//! # Cryptoperf Core
//!
//! Measures symmetric ciphers, public key schemes and hash functions across
//! a grid of algorithm, key size and input size, and stores one record per
//! measured operation.
//!
//! ## Architecture
//!
//! - **Harness**: one blocking task per `(algorithm, key_size)` pair, bounded
//!   by a worker semaphore, writing records as they are produced
//! - **Throttle**: CPU-aware cooldown and retries around key exchange, one
//!   controller per key-exchange pair
//! - **Samples**: labelled inputs, from disk or generated
//!
//! ## Example
//!
//! ```no_run
//! use cryptoperf_core::prelude::*;
//! use cryptoperf_common::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CryptoperfConfig::quick();
//!     let store = Arc::new(RocksRecordStore::open(config.db_path())?);
//!     let samples = SampleSet::from_config(&config.samples)?;
//!     let harness = Harness::new(
//!         &config,
//!         store,
//!         samples,
//!         Arc::new(SystemProbe::new()),
//!         Shutdown::new(),
//!     )?;
//!
//!     let report = harness.run(&config.grid.resolve()?).await?;
//!     println!("{} records written", report.written());
//!     Ok(())
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// Configuration module
pub mod config;

/// Benchmark harness
pub mod harness;

/// CPU and memory snapshots
pub mod resources;

/// Benchmark inputs
pub mod samples;

/// Adaptive throttling
pub mod throttle;

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::config::{
        CryptoperfConfig, GridConfig, GridEntry, HarnessConfig, SampleConfig, ThrottleConfig,
    };
    pub use crate::harness::{CellFailure, Harness, PairThrottle, RunReport};
    pub use crate::resources::{
        ResourceMonitor, ResourceSampler, ResourceSnapshot, SamplerFactory,
    };
    pub use crate::samples::{FileSample, GeneratedSample, SampleRef, SampleSet, SampleSource};
    pub use crate::throttle::{
        CpuProbe, FixedProbe, Shutdown, SystemProbe, ThrottleController, ThrottleReport,
        ThrottleState, Throttled,
    };
}

/// Cryptoperf Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
