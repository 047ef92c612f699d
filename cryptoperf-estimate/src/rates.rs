//! Mean rates per `(algorithm, operation)`, optionally split by key size

use cryptoperf_common::prelude::*;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Mean rate over a group of records
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateStat {
    pub rate: Rate,
    pub samples: usize,
}

impl RateStat {
    fn mean(values: &[f64], unit: RateUnit) -> Self {
        let value = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        Self {
            rate: Rate { value, unit },
            samples: values.len(),
        }
    }
}

/// Aggregated rate for one `(algorithm, operation)`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateEntry {
    /// Measured at a single key size (or none)
    Single(RateStat),
    /// Measured at several key sizes
    ByKeySize {
        per_key: BTreeMap<KeySize, RateStat>,
        overall: RateStat,
    },
}

impl RateEntry {
    /// Mean over every record in the group
    pub fn overall(&self) -> RateStat {
        match self {
            RateEntry::Single(stat) => *stat,
            RateEntry::ByKeySize { overall, .. } => *overall,
        }
    }

    pub fn for_key(&self, key_size: &KeySize) -> Option<RateStat> {
        match self {
            RateEntry::Single(_) => None,
            RateEntry::ByKeySize { per_key, .. } => per_key.get(key_size).copied(),
        }
    }

    pub fn key_sizes(&self) -> Vec<KeySize> {
        match self {
            RateEntry::Single(_) => Vec::new(),
            RateEntry::ByKeySize { per_key, .. } => per_key.keys().cloned().collect(),
        }
    }
}

/// One flattened line of a [`RateTable`], for printing and export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub algorithm: Algorithm,
    pub operation: Operation,
    /// `None` for the overall or single mean
    pub key_size: Option<KeySize>,
    pub rate: Rate,
    pub samples: usize,
}

/// Immutable aggregate of every record, rebuilt wholesale
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    entries: BTreeMap<(Algorithm, Operation), RateEntry>,
    records: usize,
    skipped: usize,
}

impl RateTable {
    /// Group records by canonical algorithm and operation.
    ///
    /// Records naming an unknown algorithm are skipped with a warning.
    pub fn from_records(records: &[BenchmarkRecord]) -> Self {
        let mut groups: BTreeMap<(Algorithm, Operation), Vec<(Option<KeySize>, f64)>> =
            BTreeMap::new();
        let mut skipped = 0;

        for record in records {
            let Some(algorithm) = Algorithm::lookup(&record.algorithm) else {
                tracing::warn!(
                    algorithm = %record.algorithm,
                    operation = record.operation.as_str(),
                    "Skipping record for unknown algorithm"
                );
                skipped += 1;
                continue;
            };
            groups
                .entry((algorithm, record.operation))
                .or_default()
                .push((record.key_size.clone(), record.rate));
        }

        let entries = groups
            .into_iter()
            .map(|((algorithm, operation), rows)| {
                let unit = algorithm.family().rate_unit();
                let all: Vec<f64> = rows.iter().map(|(_, rate)| *rate).collect();
                let overall = RateStat::mean(&all, unit);

                let distinct: BTreeSet<&Option<KeySize>> = rows.iter().map(|(key, _)| key).collect();
                let entry = if distinct.len() > 1 {
                    let mut by_key: BTreeMap<KeySize, Vec<f64>> = BTreeMap::new();
                    for (key, rate) in &rows {
                        if let Some(key) = key {
                            by_key.entry(key.clone()).or_default().push(*rate);
                        }
                    }
                    RateEntry::ByKeySize {
                        per_key: by_key
                            .into_iter()
                            .map(|(key, values)| (key, RateStat::mean(&values, unit)))
                            .collect(),
                        overall,
                    }
                } else {
                    RateEntry::Single(overall)
                };
                ((algorithm, operation), entry)
            })
            .collect();

        Self {
            entries,
            records: records.len() - skipped,
            skipped,
        }
    }

    pub fn get(&self, algorithm: Algorithm, operation: Operation) -> Option<&RateEntry> {
        self.entries.get(&(algorithm, operation))
    }

    /// Operations of `algorithm` that have data, in reporting order
    pub fn operations_for(&self, algorithm: Algorithm) -> Vec<Operation> {
        self.entries
            .keys()
            .filter(|(a, _)| *a == algorithm)
            .map(|(_, op)| *op)
            .collect()
    }

    /// Records aggregated into the table
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Records dropped for naming an unknown algorithm
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn rows(&self) -> Vec<RateRow> {
        let mut rows = Vec::new();
        for ((algorithm, operation), entry) in &self.entries {
            if let RateEntry::ByKeySize { per_key, .. } = entry {
                for (key_size, stat) in per_key {
                    rows.push(RateRow {
                        algorithm: *algorithm,
                        operation: *operation,
                        key_size: Some(key_size.clone()),
                        rate: stat.rate,
                        samples: stat.samples,
                    });
                }
            }
            let overall = entry.overall();
            rows.push(RateRow {
                algorithm: *algorithm,
                operation: *operation,
                key_size: None,
                rate: overall.rate,
                samples: overall.samples,
            });
        }
        rows
    }
}

/// Publishes fully built [`RateTable`] snapshots to concurrent readers
#[derive(Debug, Default)]
pub struct RateBoard {
    current: RwLock<Arc<RateTable>>,
}

impl RateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<RateTable> {
        self.current.read().clone()
    }

    pub fn publish(&self, table: RateTable) -> Arc<RateTable> {
        let table = Arc::new(table);
        *self.current.write() = table.clone();
        table
    }

    /// Rebuild from every stored record and publish the result
    pub async fn rebuild(&self, store: &dyn RecordStore) -> BenchResult<Arc<RateTable>> {
        let records = store.load_all().await?;
        let table = RateTable::from_records(&records);
        tracing::info!(
            records = table.record_count(),
            groups = table.len(),
            skipped = table.skipped(),
            "Rate table rebuilt"
        );
        Ok(self.publish(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn record(algorithm: &str, operation: Operation, key: Option<KeySize>, label: &str, rate: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            algorithm: algorithm.to_string(),
            operation,
            key_size: key,
            data_size_label: label.to_string(),
            time_taken_seconds: 1.0,
            rate,
            resources: None,
        }
    }

    #[test]
    fn test_single_key_size_gives_one_mean() {
        let table = RateTable::from_records(&[
            record("SHA-256", Operation::Hashing, None, "1mb", 300.0),
            record("sha256", Operation::Hashing, None, "2mb", 500.0),
        ]);
        let entry = table.get(Algorithm::Sha256, Operation::Hashing).unwrap();
        let stat = entry.overall();
        assert!(matches!(entry, RateEntry::Single(_)));
        assert_eq!(stat.rate, Rate::megabytes_per_sec(400.0));
        assert_eq!(stat.samples, 2);
    }

    #[test]
    fn test_multiple_key_sizes_split_with_overall_mean() {
        let table = RateTable::from_records(&[
            record("RSA", Operation::Signing, Some(KeySize::Bits(2048)), "50bytes", 100.0),
            record("RSA", Operation::Signing, Some(KeySize::Bits(2048)), "100bytes", 200.0),
            record("RSA", Operation::Signing, Some(KeySize::Bits(4096)), "50bytes", 30.0),
        ]);
        let entry = table.get(Algorithm::Rsa, Operation::Signing).unwrap();
        assert_eq!(entry.key_sizes(), vec![KeySize::Bits(2048), KeySize::Bits(4096)]);

        let per_2048 = entry.for_key(&KeySize::Bits(2048)).unwrap();
        assert_eq!(per_2048.rate, Rate::bytes_per_sec(150.0));
        assert_eq!(per_2048.samples, 2);
        // Mean of all three records, not of the per-key means
        assert!((entry.overall().rate.value - 110.0).abs() < 1e-9);
        assert_eq!(entry.overall().samples, 3);
    }

    #[test]
    fn test_aliases_share_a_group() {
        let table = RateTable::from_records(&[
            record("ECDSA", Operation::Signing, Some(KeySize::Named("P-256".into())), "50bytes", 10.0),
            record("ECC", Operation::Signing, Some(KeySize::Named("P-256".into())), "100bytes", 20.0),
            record("Blowfish", Operation::Encryption, Some(KeySize::Bits(128)), "1mb", 80.0),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(Algorithm::Ecc, Operation::Signing).unwrap().overall().samples,
            2
        );
        assert_eq!(table.operations_for(Algorithm::Blowfish), vec![Operation::Encryption]);
    }

    #[traced_test]
    #[test]
    fn test_unknown_algorithms_are_skipped() {
        let table = RateTable::from_records(&[
            record("ROT13", Operation::Encryption, None, "1mb", 1.0),
            record("MD5", Operation::Hashing, None, "1mb", 900.0),
        ]);
        assert_eq!(table.skipped(), 1);
        assert_eq!(table.record_count(), 1);
        assert!(logs_contain("unknown algorithm"));
    }

    #[test]
    fn test_zero_mean_is_data_not_absence() {
        let table = RateTable::from_records(&[record("AES", Operation::Encryption, Some(KeySize::Bits(128)), "1mb", 0.0)]);
        let entry = table.get(Algorithm::Aes, Operation::Encryption).unwrap();
        assert_eq!(entry.overall().rate.value, 0.0);
        assert!(table.get(Algorithm::Aes, Operation::Decryption).is_none());
    }

    #[tokio::test]
    async fn test_board_publishes_whole_snapshots() {
        let store = MemoryRecordStore::new();
        store
            .upsert(&record("SHA-1", Operation::Hashing, None, "1mb", 600.0))
            .await
            .unwrap();

        let board = RateBoard::new();
        let before = board.snapshot();
        assert!(before.is_empty());

        board.rebuild(&store).await.unwrap();
        assert!(before.is_empty());
        assert_eq!(board.snapshot().len(), 1);
        assert_eq!(board.snapshot().rows().len(), 1);
    }
}
