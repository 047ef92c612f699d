//! Processing-time estimates for unseen input sizes

use crate::rates::{RateBoard, RateStat, RateTable};
use cryptoperf_common::prelude::*;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Estimated,
    /// The group exists but its mean rate is zero
    RateUnavailable,
}

/// One comparison row around the target size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalRow {
    /// Bytes, rounded to the nearest whole byte
    pub size: u64,
    pub estimated_time: f64,
    /// Always MB/s, whatever the algorithm's native unit
    pub rate: f64,
    pub is_target: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    pub algorithm: Algorithm,
    pub operation: Operation,
    /// Bytes
    pub target_size: u64,
    pub estimated_time_seconds: f64,
    pub rate_used: Rate,
    /// Per-key-size row that was consulted, if any
    pub key_size_used: Option<KeySize>,
    pub samples_used: usize,
    pub status: EstimateStatus,
    pub intervals: Vec<IntervalRow>,
}

/// Estimates against one immutable [`RateTable`] snapshot
#[derive(Debug, Clone)]
pub struct TimeEstimator {
    table: Arc<RateTable>,
}

impl TimeEstimator {
    pub fn new(table: Arc<RateTable>) -> Self {
        Self { table }
    }

    /// Estimator over whatever the board currently publishes
    pub fn from_board(board: &RateBoard) -> Self {
        Self::new(board.snapshot())
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Estimate how long `operation` takes on `target_size_bytes` of input.
    ///
    /// When `key_size` names a measured key size its mean is used, otherwise
    /// the group's overall mean. Unknown algorithms, operations the algorithm
    /// does not support and malformed key sizes are `Configuration` errors;
    /// a supported pair without records is `NoDataAvailable`.
    pub fn estimate(
        &self,
        algorithm: &str,
        operation: &str,
        target_size_bytes: u64,
        key_size: Option<&str>,
    ) -> BenchResult<EstimationResult> {
        let algorithm: Algorithm = algorithm.parse()?;
        let operation: Operation = operation.parse()?;
        let key_size = key_size.map(str::parse::<KeySize>).transpose()?;
        self.estimate_for(algorithm, operation, target_size_bytes, key_size.as_ref())
    }

    /// Typed form of [`TimeEstimator::estimate`]
    pub fn estimate_for(
        &self,
        algorithm: Algorithm,
        operation: Operation,
        target_size_bytes: u64,
        key_size: Option<&KeySize>,
    ) -> BenchResult<EstimationResult> {
        if !algorithm.supports(operation) {
            bench_bail!(
                Configuration,
                "{} does not support {}",
                algorithm,
                operation
            );
        }
        let entry = self
            .table
            .get(algorithm, operation)
            .ok_or_else(|| BenchError::no_data(algorithm.name(), operation.as_str()))?;

        let (stat, key_size_used) = match key_size.and_then(|k| entry.for_key(k).map(|s| (s, k))) {
            Some((stat, key)) => (stat, Some(key.clone())),
            None => (entry.overall(), None),
        };

        Ok(build_result(algorithm, operation, target_size_bytes, stat, key_size_used))
    }

    /// One estimate per operation of `algorithm` that has data
    pub fn estimate_all(
        &self,
        algorithm: &str,
        target_size_bytes: u64,
        key_size: Option<&str>,
    ) -> BenchResult<Vec<EstimationResult>> {
        let algorithm: Algorithm = algorithm.parse()?;
        let key_size = key_size.map(str::parse::<KeySize>).transpose()?;

        let operations = self.table.operations_for(algorithm);
        if operations.is_empty() {
            return Err(BenchError::no_data(algorithm.name(), "any"));
        }
        operations
            .into_iter()
            .map(|operation| self.estimate_for(algorithm, operation, target_size_bytes, key_size.as_ref()))
            .collect()
    }

    /// One estimate per measured key size, smallest first.
    ///
    /// Algorithms measured at a single key size yield their one overall estimate.
    pub fn key_size_breakdown(
        &self,
        algorithm: &str,
        operation: &str,
        target_size_bytes: u64,
    ) -> BenchResult<Vec<EstimationResult>> {
        let algorithm: Algorithm = algorithm.parse()?;
        let operation: Operation = operation.parse()?;
        // Validates support and presence before fanning out
        let overall = self.estimate_for(algorithm, operation, target_size_bytes, None)?;

        let key_sizes = self
            .table
            .get(algorithm, operation)
            .map(|entry| entry.key_sizes())
            .unwrap_or_default();
        if key_sizes.is_empty() {
            return Ok(vec![overall]);
        }
        key_sizes
            .iter()
            .map(|key| self.estimate_for(algorithm, operation, target_size_bytes, Some(key)))
            .collect()
    }
}

fn build_result(
    algorithm: Algorithm,
    operation: Operation,
    target_size: u64,
    stat: RateStat,
    key_size_used: Option<KeySize>,
) -> EstimationResult {
    let rate = stat.rate;
    let (estimated_time_seconds, status) = match rate.time_for_bytes(target_size) {
        Some(seconds) => (seconds, EstimateStatus::Estimated),
        None => (0.0, EstimateStatus::RateUnavailable),
    };

    let intervals = INTERVAL_FACTORS
        .iter()
        .map(|&factor| IntervalRow {
            size: (target_size as f64 * factor).round() as u64,
            estimated_time: estimated_time_seconds * factor,
            rate: rate.as_megabytes_per_sec(),
            is_target: factor == 1.0,
        })
        .collect();

    EstimationResult {
        algorithm,
        operation,
        target_size,
        estimated_time_seconds,
        rate_used: rate,
        key_size_used,
        samples_used: stat.samples,
        status,
        intervals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured(
        algorithm: Algorithm,
        operation: Operation,
        key: Option<KeySize>,
        label: &str,
        bytes: u64,
        seconds: f64,
    ) -> BenchmarkRecord {
        BenchmarkRecord::from_measurement(algorithm, operation, key, label, bytes, seconds)
    }

    fn estimator(records: &[BenchmarkRecord]) -> TimeEstimator {
        TimeEstimator::new(Arc::new(RateTable::from_records(records)))
    }

    #[test]
    fn test_symmetric_estimate_in_megabytes() {
        let est = estimator(&[measured(
            Algorithm::Aes,
            Operation::Encryption,
            Some(KeySize::Bits(256)),
            "10mb",
            10 * BYTES_PER_MB,
            0.1,
        )]);

        let result = est.estimate("AES", "encryption", 50 * BYTES_PER_MB, None).unwrap();
        assert_eq!(result.rate_used.unit, RateUnit::MegabytesPerSec);
        assert!((result.rate_used.value - 100.0).abs() < 1e-9);
        assert!((result.estimated_time_seconds - 0.5).abs() < 1e-9);
        assert_eq!(result.status, EstimateStatus::Estimated);
    }

    #[test]
    fn test_asymmetric_estimate_in_bytes() {
        let est = estimator(&[measured(
            Algorithm::Rsa,
            Operation::Encryption,
            Some(KeySize::Bits(2048)),
            "100bytes",
            100,
            0.002,
        )]);

        let result = est.estimate("rsa", "encrypt", 1000, Some("2048")).unwrap();
        assert_eq!(result.rate_used.unit, RateUnit::BytesPerSec);
        assert!((result.rate_used.value - 50_000.0).abs() < 1e-6);
        assert!((result.estimated_time_seconds - 0.02).abs() < 1e-12);
        // Row rates are MB/s even for byte-rate algorithms
        let target = result.intervals.iter().find(|row| row.is_target).unwrap();
        assert!((target.rate - 50_000.0 / BYTES_PER_MB as f64).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_reproduces_measured_time() {
        let bytes = 5 * BYTES_PER_MB;
        let est = estimator(&[measured(
            Algorithm::Sha3_256,
            Operation::Hashing,
            None,
            "5mb",
            bytes,
            0.0371,
        )]);
        let result = est.estimate("SHA3-256", "hashing", bytes, None).unwrap();
        assert!((result.estimated_time_seconds - 0.0371).abs() < 1e-12);
    }

    #[test]
    fn test_intervals_are_ordered_with_one_target() {
        let est = estimator(&[measured(
            Algorithm::Blowfish,
            Operation::Decryption,
            Some(KeySize::Bits(128)),
            "2mb",
            2 * BYTES_PER_MB,
            0.04,
        )]);
        let result = est.estimate("blowfish", "decryption", 1000, None).unwrap();

        assert_eq!(result.intervals.len(), INTERVAL_FACTORS.len());
        assert_eq!(result.intervals.iter().filter(|r| r.is_target).count(), 1);
        assert_eq!(result.intervals[3].size, 1000);
        assert_eq!(result.intervals[0].size, 400);
        assert!(result
            .intervals
            .windows(2)
            .all(|w| w[0].estimated_time <= w[1].estimated_time && w[0].size <= w[1].size));
    }

    #[test]
    fn test_zero_rate_is_flagged_not_an_error() {
        let est = estimator(&[measured(Algorithm::Md5, Operation::Hashing, None, "1mb", BYTES_PER_MB, 0.0)]);
        let result = est.estimate("MD5", "hashing", 1000, None).unwrap();
        assert_eq!(result.status, EstimateStatus::RateUnavailable);
        assert_eq!(result.estimated_time_seconds, 0.0);
    }

    #[test]
    fn test_errors() {
        let est = estimator(&[measured(Algorithm::Md5, Operation::Hashing, None, "1mb", BYTES_PER_MB, 0.01)]);

        assert!(matches!(
            est.estimate("ROT13", "hashing", 10, None),
            Err(BenchError::Configuration(_))
        ));
        assert!(matches!(
            est.estimate("MD5", "signing", 10, None),
            Err(BenchError::Configuration(_))
        ));
        assert!(matches!(
            est.estimate("SHA-1", "hashing", 10, None),
            Err(BenchError::NoDataAvailable { .. })
        ));
    }

    #[test]
    fn test_key_size_preference_and_fallback() {
        let est = estimator(&[
            measured(Algorithm::Rsa, Operation::Signing, Some(KeySize::Bits(2048)), "100bytes", 100, 0.001),
            measured(Algorithm::Rsa, Operation::Signing, Some(KeySize::Bits(4096)), "100bytes", 100, 0.004),
        ]);

        let exact = est.estimate("RSA", "signing", 100, Some("4096")).unwrap();
        assert_eq!(exact.key_size_used, Some(KeySize::Bits(4096)));
        assert!((exact.estimated_time_seconds - 0.004).abs() < 1e-12);

        let fallback = est.estimate("RSA", "signing", 100, Some("3072")).unwrap();
        assert_eq!(fallback.key_size_used, None);
        assert_eq!(fallback.samples_used, 2);

        let breakdown = est.key_size_breakdown("RSA", "signing", 100).unwrap();
        let keys: Vec<_> = breakdown.iter().map(|r| r.key_size_used.clone()).collect();
        assert_eq!(keys, vec![Some(KeySize::Bits(2048)), Some(KeySize::Bits(4096))]);
    }

    #[test]
    fn test_estimate_all_covers_measured_operations() {
        let est = estimator(&[
            measured(Algorithm::Des, Operation::Encryption, Some(KeySize::Bits(64)), "1mb", BYTES_PER_MB, 0.05),
            measured(Algorithm::Des, Operation::Decryption, Some(KeySize::Bits(64)), "1mb", BYTES_PER_MB, 0.04),
        ]);
        let results = est.estimate_all("DES", BYTES_PER_MB, None).unwrap();
        let ops: Vec<_> = results.iter().map(|r| r.operation).collect();
        assert_eq!(ops, vec![Operation::Encryption, Operation::Decryption]);

        assert!(matches!(
            est.estimate_all("AES", 10, None),
            Err(BenchError::NoDataAvailable { .. })
        ));
    }

    #[test]
    fn test_result_serializes_with_unit() {
        let est = estimator(&[measured(Algorithm::Sha1, Operation::Hashing, None, "1mb", BYTES_PER_MB, 0.5)]);
        let json = serde_json::to_value(est.estimate("SHA1", "hashing", 10, None).unwrap()).unwrap();
        assert_eq!(json["algorithm"], "SHA-1");
        assert_eq!(json["rate_used"]["unit"], "megabytes_per_sec");
        assert_eq!(json["status"], "estimated");
    }
}
