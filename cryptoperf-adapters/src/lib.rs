//! # Cryptoperf Adapters
//!
//! One [`Adapter`] type in front of every primitive the benchmark grid
//! measures. Each algorithm is backed by an engine implementing one or more
//! capability traits ([`CipherOps`], [`SignatureOps`], [`KeyExchangeOps`],
//! [`DigestOps`]); the adapter resolves them once when it is built, so
//! callers ask [`Adapter::supports`] instead of matching on names.
//!
//! ```rust
//! use cryptoperf_adapters::Adapter;
//! use cryptoperf_common::prelude::*;
//!
//! let adapter = Adapter::new(Algorithm::Aes, Some(KeySize::Bits(128)))?;
//! assert!(adapter.supports(Operation::Encryption));
//! let ciphertext = adapter.encrypt("plain text")?;
//! assert_eq!(adapter.decrypt(&ciphertext)?, b"plain text");
//! # Ok::<(), BenchError>(())
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod asymmetric;
pub mod digest;
pub mod exchange;
pub mod symmetric;
pub mod traits;

pub use adapter::Adapter;
pub use traits::{CipherOps, DigestOps, KeyExchangeOps, SignatureOps};
