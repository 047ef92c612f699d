//! Benchmark records and their identity

use crate::types::{Algorithm, KeySize, Operation, Rate, RateUnit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CPU and RAM deltas observed across one measured operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Change in global CPU utilisation, in percentage points
    pub cpu_percent_delta: f64,
    /// Change in used RAM as a percentage of total RAM
    pub ram_percent_delta: f64,
}

impl ResourceSample {
    /// Average a set of samples; empty input averages to zero
    pub fn mean(samples: &[ResourceSample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        Self {
            cpu_percent_delta: samples.iter().map(|s| s.cpu_percent_delta).sum::<f64>() / n,
            ram_percent_delta: samples.iter().map(|s| s.ram_percent_delta).sum::<f64>() / n,
        }
    }
}

/// One measured cell of the benchmark grid.
///
/// The serialized field set is exactly what external consumers read:
/// `algorithm, operation, key_size, data_size_label, time_taken_seconds, rate`.
/// The rate's unit follows from the algorithm's family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub algorithm: String,
    pub operation: Operation,
    pub key_size: Option<KeySize>,
    pub data_size_label: String,
    pub time_taken_seconds: f64,
    pub rate: f64,
    #[serde(skip)]
    pub resources: Option<ResourceSample>,
}

impl BenchmarkRecord {
    /// Build a record from a measurement, deriving the rate from the sample size
    pub fn from_measurement(
        algorithm: Algorithm,
        operation: Operation,
        key_size: Option<KeySize>,
        data_size_label: impl Into<String>,
        size_bytes: u64,
        time_taken_seconds: f64,
    ) -> Self {
        let time_taken_seconds = time_taken_seconds.max(0.0);
        let rate = Rate::measured(
            size_bytes,
            time_taken_seconds,
            algorithm.family().rate_unit(),
        );
        Self {
            algorithm: algorithm.name().to_string(),
            operation,
            key_size,
            data_size_label: data_size_label.into(),
            time_taken_seconds,
            rate: rate.value,
            resources: None,
        }
    }

    /// Attach averaged resource deltas
    pub fn with_resources(mut self, resources: ResourceSample) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Identity used for upserts
    pub fn key(&self) -> RecordKey {
        RecordKey {
            algorithm: self.algorithm.clone(),
            operation: self.operation,
            key_size: self.key_size.clone(),
            data_size_label: self.data_size_label.clone(),
        }
    }

    /// Rate with its unit attached; `None` for unknown algorithm names
    pub fn tagged_rate(&self) -> Option<Rate> {
        let unit: RateUnit = Algorithm::lookup(&self.algorithm)?.family().rate_unit();
        Some(Rate {
            value: self.rate,
            unit,
        })
    }
}

/// `(algorithm, operation, key_size, data_size_label)` identity of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub algorithm: String,
    pub operation: Operation,
    pub key_size: Option<KeySize>,
    pub data_size_label: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_size = self
            .key_size
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}|{}|{}|{}",
            self.algorithm, self.operation, key_size, self.data_size_label
        )
    }
}
