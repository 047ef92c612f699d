//! Benchmark harness.
//!
//! Runs every `(algorithm, key_size, sample)` cell of a plan, measuring each
//! operation the adapter supports. Work is scheduled per `(algorithm,
//! key_size)` pair on Tokio's blocking pool, bounded by a worker semaphore;
//! key-exchange pairs additionally hold a permit from a smaller semaphore and
//! go through their own [`ThrottleController`]. Records are upserted as soon
//! as they are produced, so a run that stops early keeps its partial results.

use crate::config::{CryptoperfConfig, GridEntry, HarnessConfig, ThrottleConfig};
use crate::resources::{ResourceMonitor, ResourceSampler, SamplerFactory};
use crate::samples::{SampleRef, SampleSet};
use crate::throttle::{CpuProbe, Shutdown, ThrottleController, ThrottleReport};
use cryptoperf_adapters::Adapter;
use cryptoperf_common::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// A grid cell that produced no record
#[derive(Debug, Clone, Serialize)]
pub struct CellFailure {
    pub algorithm: Algorithm,
    pub key_size: Option<KeySize>,
    pub sample: String,
    /// `None` when the failure happened before any operation ran
    pub operation: Option<Operation>,
    pub error: String,
}

/// Throttling spent on one key-exchange pair
#[derive(Debug, Clone, Serialize)]
pub struct PairThrottle {
    pub algorithm: Algorithm,
    pub key_size: Option<KeySize>,
    pub report: ThrottleReport,
}

/// Outcome of a harness run
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub inserted: usize,
    pub updated: usize,
    /// Records written during this run, in completion order
    pub records: Vec<BenchmarkRecord>,
    pub failures: Vec<CellFailure>,
    /// Cells not attempted because of shutdown or an aborted run
    pub skipped: usize,
    /// Set when shutdown caused at least one cell to be skipped
    pub cancelled: bool,
    pub throttled: Vec<PairThrottle>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

enum Event {
    Measured(BenchmarkRecord),
    Failed(CellFailure),
    Skipped { cells: usize, cancelled: bool },
    Throttled(PairThrottle),
}

/// Inputs a measured operation needs, produced outside the timer
enum Prepared {
    Nothing,
    Ciphertext(Vec<u8>),
    Signature(Vec<u8>),
    PeerKey(Vec<u8>),
}

struct Measurement {
    seconds: f64,
    resources: Option<ResourceSample>,
}

/// Identity of a spawned pair and how far it got, for reporting a task that died
struct PairCells {
    algorithm: Algorithm,
    key_size: Option<KeySize>,
    samples: Vec<String>,
    finished: Arc<AtomicUsize>,
}

impl PairCells {
    fn unfinished(&self, error: &BenchError) -> Vec<CellFailure> {
        let done = self.finished.load(Ordering::SeqCst).min(self.samples.len());
        self.samples[done..]
            .iter()
            .map(|sample| CellFailure {
                algorithm: self.algorithm,
                key_size: self.key_size.clone(),
                sample: sample.clone(),
                operation: None,
                error: error.to_string(),
            })
            .collect()
    }
}

pub struct Harness {
    config: HarnessConfig,
    throttle: ThrottleConfig,
    store: Arc<dyn RecordStore>,
    samples: SampleSet,
    probe: Arc<dyn CpuProbe>,
    samplers: Option<SamplerFactory>,
    shutdown: Shutdown,
}

impl Harness {
    pub fn new(
        config: &CryptoperfConfig,
        store: Arc<dyn RecordStore>,
        samples: SampleSet,
        probe: Arc<dyn CpuProbe>,
        shutdown: Shutdown,
    ) -> BenchResult<Self> {
        config.validate()?;
        let samplers = config
            .harness
            .profile_resources
            .then(ResourceMonitor::factory);

        Ok(Self {
            config: config.harness.clone(),
            throttle: config.throttle.clone(),
            store,
            samples,
            probe,
            samplers,
            shutdown,
        })
    }

    /// Profile resources with samplers from `factory`, one per pair
    pub fn with_resource_sampler(mut self, factory: SamplerFactory) -> Self {
        self.samplers = Some(factory);
        self
    }

    /// Run every cell of `plan`.
    ///
    /// Cell failures are logged and collected into the report. Only a store
    /// failure aborts the run, in which case the store error is returned once
    /// in-flight pairs have wound down.
    pub async fn run(&self, plan: &[GridEntry]) -> BenchResult<RunReport> {
        let started = Instant::now();
        let workers = Arc::new(Semaphore::new(self.config.workers));
        let key_exchange = Arc::new(Semaphore::new(self.config.key_exchange_concurrency));
        let abort = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<Event>(64);

        let pairs: usize = plan.iter().map(|entry| entry.key_sizes.len()).sum();
        tracing::info!(
            pairs,
            workers = self.config.workers,
            iterations = self.config.iterations,
            "Starting benchmark run"
        );

        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::with_capacity(pairs);
        for entry in plan {
            for key_size in &entry.key_sizes {
                let throttle = if entry.algorithm.is_key_exchange() {
                    Some(ThrottleController::new(
                        self.throttle.clone(),
                        self.probe.clone(),
                        self.shutdown.clone(),
                    )?)
                } else {
                    None
                };
                let samples = self.samples.for_family(entry.algorithm.family()).to_vec();
                let finished = Arc::new(AtomicUsize::new(0));
                let cells = PairCells {
                    algorithm: entry.algorithm,
                    key_size: key_size.clone(),
                    samples: samples.iter().map(|s| s.label().to_string()).collect(),
                    finished: finished.clone(),
                };
                let job = PairJob {
                    algorithm: entry.algorithm,
                    key_size: key_size.clone(),
                    samples,
                    iterations: self.config.iterations,
                    throttle,
                    sampler: self.samplers.as_ref().map(|factory| factory()),
                    shutdown: self.shutdown.clone(),
                    abort: abort.clone(),
                    finished,
                    tx: tx.clone(),
                };
                let workers = workers.clone();
                let key_exchange = key_exchange.clone();

                let handle = tasks.spawn(async move {
                    let _exchange_permit = if job.algorithm.is_key_exchange() {
                        Some(key_exchange.acquire_owned().await.map_err(|e| {
                            BenchError::internal(format!("key exchange semaphore closed: {e}"))
                        })?)
                    } else {
                        None
                    };
                    let _worker_permit = workers
                        .acquire_owned()
                        .await
                        .map_err(|e| BenchError::internal(format!("worker semaphore closed: {e}")))?;

                    tokio::task::spawn_blocking(move || job.run())
                        .await
                        .map_err(|e| BenchError::internal(format!("benchmark task failed: {e}")))?
                });
                spawned.insert(handle.id(), cells);
            }
        }
        drop(tx);

        let mut report = RunReport::default();
        let mut store_error: Option<BenchError> = None;

        while let Some(event) = rx.recv().await {
            match event {
                Event::Measured(record) => {
                    if store_error.is_some() {
                        report.skipped += 1;
                        continue;
                    }
                    match self.store.upsert(&record).await {
                        Ok(outcome) => {
                            match outcome {
                                UpsertOutcome::Inserted => report.inserted += 1,
                                UpsertOutcome::Updated => report.updated += 1,
                            }
                            report.records.push(record);
                        }
                        Err(err) => {
                            tracing::error!(record = %record.key(), error = %err, "Record store failed, aborting run");
                            abort.store(true, Ordering::SeqCst);
                            store_error = Some(err);
                        }
                    }
                }
                Event::Failed(failure) => report.failures.push(failure),
                Event::Skipped { cells, cancelled } => {
                    report.skipped += cells;
                    report.cancelled |= cancelled;
                }
                Event::Throttled(throttled) => report.throttled.push(throttled),
            }
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, err) = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((id, Err(err))) => (id, err),
                Err(join_err) => (
                    join_err.id(),
                    BenchError::internal(format!("benchmark pair panicked: {join_err}")),
                ),
            };
            let Some(cells) = spawned.remove(&id) else {
                tracing::error!(error = %err, "Unknown benchmark pair did not complete");
                continue;
            };
            tracing::error!(
                algorithm = %cells.algorithm,
                key_size = %cells.key_size.as_ref().map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
                error = %err,
                "Benchmark pair did not complete"
            );
            report.failures.extend(cells.unfinished(&err));
        }

        if let Some(err) = store_error {
            return Err(err);
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            inserted = report.inserted,
            updated = report.updated,
            failures = report.failures.len(),
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Benchmark run finished in {:.2}s",
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}

/// All cells of one `(algorithm, key_size)` pair, run sequentially on a blocking thread
struct PairJob {
    algorithm: Algorithm,
    key_size: Option<KeySize>,
    samples: Vec<SampleRef>,
    iterations: usize,
    /// Present for key-exchange pairs only
    throttle: Option<ThrottleController>,
    sampler: Option<Box<dyn ResourceSampler>>,
    shutdown: Shutdown,
    abort: Arc<AtomicBool>,
    /// Samples fully processed so far
    finished: Arc<AtomicUsize>,
    tx: mpsc::Sender<Event>,
}

impl PairJob {
    fn stopping(&self) -> bool {
        self.shutdown.is_triggered() || self.abort.load(Ordering::SeqCst)
    }

    fn key_label(&self) -> String {
        self.key_size
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    fn emit(&self, event: Event) {
        // The receiver only goes away once the run itself is gone
        let _ = self.tx.blocking_send(event);
    }

    fn skip(&self, cells: usize) {
        self.emit(Event::Skipped {
            cells,
            cancelled: self.shutdown.is_triggered(),
        });
    }

    fn fail(&self, sample: &str, operation: Option<Operation>, error: &BenchError) {
        tracing::warn!(
            algorithm = %self.algorithm,
            key_size = %self.key_label(),
            sample,
            operation = operation.map(|op| op.as_str()).unwrap_or("-"),
            error = %error,
            "Benchmark cell failed"
        );
        self.emit(Event::Failed(CellFailure {
            algorithm: self.algorithm,
            key_size: self.key_size.clone(),
            sample: sample.to_string(),
            operation,
            error: error.to_string(),
        }));
    }

    fn build_adapter(&self) -> BenchResult<Adapter> {
        if let Some(throttle) = &self.throttle {
            let label = format!("{} {} parameters", self.algorithm, self.key_label());
            let built = throttle.execute(&label, || Adapter::new(self.algorithm, self.key_size.clone()))?;
            tracing::debug!(
                algorithm = %self.algorithm,
                key_size = %self.key_label(),
                attempts = built.report.attempts,
                cooldowns = built.report.cooldowns,
                "Generated key exchange parameters"
            );
            Ok(built.value)
        } else {
            Adapter::new(self.algorithm, self.key_size.clone())
        }
    }

    fn run(mut self) -> BenchResult<()> {
        let outcome = self.run_cells();
        if let Some(throttle) = &self.throttle {
            self.emit(Event::Throttled(PairThrottle {
                algorithm: self.algorithm,
                key_size: self.key_size.clone(),
                report: throttle.totals(),
            }));
        }
        outcome
    }

    fn run_cells(&mut self) -> BenchResult<()> {
        if self.stopping() {
            self.skip(self.samples.len());
            return Ok(());
        }

        let adapter = match self.build_adapter() {
            Ok(adapter) => adapter,
            Err(BenchError::Cancelled(_)) => {
                self.skip(self.samples.len());
                return Ok(());
            }
            Err(err) => {
                let err = into_cell_error(err);
                for sample in &self.samples {
                    self.fail(sample.label(), None, &err);
                }
                return Ok(());
            }
        };
        let operations = adapter.operations();
        let samples = self.samples.clone();
        let mut sampler = self.sampler.take();

        for (index, sample) in samples.iter().enumerate() {
            if self.stopping() {
                self.skip(samples.len() - index);
                return Ok(());
            }

            let data = match sample.read() {
                Ok(data) => data,
                Err(err) => {
                    self.fail(sample.label(), None, &err);
                    self.finished.store(index + 1, Ordering::SeqCst);
                    continue;
                }
            };

            for &operation in &operations {
                match self.measure(&adapter, operation, &data, sampler.as_deref_mut()) {
                    Ok(measurement) => {
                        let mut record = BenchmarkRecord::from_measurement(
                            self.algorithm,
                            operation,
                            self.key_size.clone(),
                            sample.label(),
                            sample.size_bytes(),
                            measurement.seconds,
                        );
                        if let Some(resources) = measurement.resources {
                            record = record.with_resources(resources);
                        }
                        tracing::debug!(
                            algorithm = %self.algorithm,
                            key_size = %self.key_label(),
                            sample = sample.label(),
                            operation = operation.as_str(),
                            seconds = record.time_taken_seconds,
                            rate = record.rate,
                            cpu_delta = record.resources.map(|r| r.cpu_percent_delta),
                            "Measured"
                        );
                        self.emit(Event::Measured(record));
                    }
                    Err(BenchError::Cancelled(_)) => {
                        self.skip(samples.len() - index);
                        return Ok(());
                    }
                    Err(err) => self.fail(sample.label(), Some(operation), &into_cell_error(err)),
                }
            }
            self.finished.store(index + 1, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Untimed setup for operations that consume another operation's output
    fn prepare(&self, adapter: &Adapter, operation: Operation, data: &[u8]) -> BenchResult<Prepared> {
        Ok(match operation {
            Operation::Decryption => Prepared::Ciphertext(adapter.encrypt(data)?),
            Operation::Verification => Prepared::Signature(adapter.sign(data)?),
            Operation::KeyExchange => Prepared::PeerKey(adapter.generate_peer_public_key()?),
            Operation::Encryption | Operation::Signing | Operation::Hashing => Prepared::Nothing,
        })
    }

    fn measure(
        &self,
        adapter: &Adapter,
        operation: Operation,
        data: &[u8],
        mut sampler: Option<&mut (dyn ResourceSampler + 'static)>,
    ) -> BenchResult<Measurement> {
        let prepared = self.prepare(adapter, operation, data)?;
        let mut total = Duration::ZERO;
        let mut deltas = Vec::with_capacity(self.iterations);

        for _ in 0..self.iterations {
            let before = sampler.as_mut().map(|s| s.snapshot());

            let elapsed = match (operation, &prepared) {
                (Operation::Encryption, _) => timed(|| adapter.encrypt(data))?.0,
                (Operation::Decryption, Prepared::Ciphertext(ciphertext)) => {
                    let (elapsed, plaintext) = timed(|| adapter.decrypt(ciphertext))?;
                    if plaintext != data {
                        bench_bail!(Crypto, "decryption did not reproduce the input");
                    }
                    elapsed
                }
                (Operation::Signing, _) => timed(|| adapter.sign(data))?.0,
                (Operation::Verification, Prepared::Signature(signature)) => {
                    let (elapsed, valid) = timed(|| adapter.verify(data, signature))?;
                    if !valid {
                        bench_bail!(Crypto, "signature did not verify");
                    }
                    elapsed
                }
                (Operation::KeyExchange, Prepared::PeerKey(peer)) => match &self.throttle {
                    Some(throttle) => {
                        let label = format!("{} {} exchange", self.algorithm, self.key_label());
                        throttle
                            .execute(&label, || timed(|| adapter.exchange(peer)))?
                            .value
                            .0
                    }
                    None => timed(|| adapter.exchange(peer))?.0,
                },
                (Operation::Hashing, _) => timed(|| adapter.hash(data))?.0,
                (op, _) => bench_bail!(Internal, "no preparation for {}", op),
            };

            total += elapsed;
            if let (Some(sampler), Some(before)) = (sampler.as_mut(), before) {
                deltas.push(before.delta(&sampler.snapshot()));
            }
        }

        Ok(Measurement {
            seconds: total.as_secs_f64() / self.iterations as f64,
            resources: sampler.map(|_| ResourceSample::mean(&deltas)),
        })
    }
}

fn timed<T>(op: impl FnOnce() -> BenchResult<T>) -> BenchResult<(Duration, T)> {
    let start = Instant::now();
    let value = op()?;
    Ok((start.elapsed(), value))
}

/// Raw primitive failures outside the throttle count as a single failed attempt
fn into_cell_error(err: BenchError) -> BenchError {
    match err {
        BenchError::Crypto(message) => BenchError::operation_failed(1, message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceSnapshot;
    use crate::samples::{GeneratedSample, SampleSource};
    use crate::throttle::FixedProbe;

    fn small_samples() -> SampleSet {
        SampleSet::new(
            vec![Arc::new(GeneratedSample::bytes(4096)) as SampleRef],
            vec![Arc::new(GeneratedSample::bytes(64)) as SampleRef],
        )
    }

    fn harness(store: Arc<dyn RecordStore>) -> Harness {
        let mut config = CryptoperfConfig::quick();
        config.harness.profile_resources = false;
        Harness::new(
            &config,
            store,
            small_samples(),
            Arc::new(FixedProbe(5.0)),
            Shutdown::new(),
        )
        .unwrap()
    }

    fn plan(entries: &[(Algorithm, Option<KeySize>)]) -> Vec<GridEntry> {
        entries
            .iter()
            .map(|(algorithm, key_size)| GridEntry {
                algorithm: *algorithm,
                key_sizes: vec![key_size.clone()],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_measures_every_supported_operation() {
        let store = Arc::new(MemoryRecordStore::new());
        let harness = harness(store.clone());
        let report = harness
            .run(&plan(&[
                (Algorithm::Aes, Some(KeySize::Bits(128))),
                (Algorithm::Sha256, None),
                (Algorithm::Rsa, Some(KeySize::Bits(1024))),
            ]))
            .await
            .unwrap();

        // AES: 2 ops, SHA-256: 1 op, RSA: 4 ops
        assert_eq!(report.inserted, 7);
        assert!(report.failures.is_empty());
        assert_eq!(store.count().await.unwrap(), 7);

        let rsa: Vec<_> = report
            .records
            .iter()
            .filter(|r| r.algorithm == "RSA")
            .collect();
        assert_eq!(rsa.len(), 4);
        assert!(rsa.iter().all(|r| r.data_size_label == "64bytes"));
        assert!(report.records.iter().all(|r| r.rate >= 0.0));
    }

    #[tokio::test]
    async fn test_rerun_updates_in_place() {
        let store = Arc::new(MemoryRecordStore::new());
        let harness = harness(store.clone());
        let grid = plan(&[(Algorithm::Md5, None), (Algorithm::Rc4, Some(KeySize::Bits(40)))]);

        let first = harness.run(&grid).await.unwrap();
        let second = harness.run(&grid).await.unwrap();
        assert_eq!(first.inserted, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_cells() {
        let store = Arc::new(MemoryRecordStore::new());
        let shutdown = Shutdown::new();
        let harness = Harness::new(
            &CryptoperfConfig::quick(),
            store.clone(),
            small_samples(),
            Arc::new(FixedProbe(5.0)),
            shutdown.clone(),
        )
        .unwrap();
        shutdown.trigger();

        let report = harness
            .run(&plan(&[(Algorithm::Aes, Some(KeySize::Bits(256)))]))
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    /// Reports `10 * n` percent CPU on its n-th snapshot
    struct CountingSampler {
        snapshots: u32,
    }

    impl ResourceSampler for CountingSampler {
        fn snapshot(&mut self) -> ResourceSnapshot {
            self.snapshots += 1;
            std::thread::yield_now();
            ResourceSnapshot {
                cpu_percent: 10.0 * self.snapshots as f64,
                ram_percent: 50.0,
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_pairs_keep_their_own_resource_baselines() {
        let mut config = CryptoperfConfig::quick();
        config.harness.workers = 3;
        config.harness.iterations = 3;
        config.harness.profile_resources = false;

        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let factory: SamplerFactory = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingSampler { snapshots: 0 }) as Box<dyn ResourceSampler>
        });
        let harness = Harness::new(
            &config,
            Arc::new(MemoryRecordStore::new()),
            small_samples(),
            Arc::new(FixedProbe(5.0)),
            Shutdown::new(),
        )
        .unwrap()
        .with_resource_sampler(factory);

        let report = harness
            .run(&plan(&[
                (Algorithm::Sha256, None),
                (Algorithm::Md5, None),
                (Algorithm::Sha1, None),
            ]))
            .await
            .unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 3);
        assert_eq!(report.records.len(), 3);
        for record in &report.records {
            let resources = record.resources.unwrap();
            // Every delta spans exactly one snapshot of the pair's own sampler
            assert_eq!(resources.cpu_percent_delta, 10.0);
            assert_eq!(resources.ram_percent_delta, 0.0);
        }
    }

    /// Requests shutdown as soon as it is read
    struct ShutdownOnRead {
        inner: GeneratedSample,
        shutdown: Shutdown,
    }

    impl SampleSource for ShutdownOnRead {
        fn label(&self) -> &str {
            self.inner.label()
        }
        fn size_bytes(&self) -> u64 {
            self.inner.size_bytes()
        }
        fn read(&self) -> BenchResult<Vec<u8>> {
            self.shutdown.trigger();
            self.inner.read()
        }
    }

    #[tokio::test]
    async fn test_shutdown_between_samples_keeps_finished_cells() {
        let shutdown = Shutdown::new();
        let samples = SampleSet::new(
            vec![
                Arc::new(GeneratedSample::bytes(1000)) as SampleRef,
                Arc::new(ShutdownOnRead {
                    inner: GeneratedSample::bytes(2000),
                    shutdown: shutdown.clone(),
                }) as SampleRef,
                Arc::new(GeneratedSample::bytes(3000)) as SampleRef,
            ],
            vec![Arc::new(GeneratedSample::bytes(64)) as SampleRef],
        );
        let store = Arc::new(MemoryRecordStore::new());
        let harness = Harness::new(
            &CryptoperfConfig::quick(),
            store.clone(),
            samples,
            Arc::new(FixedProbe(5.0)),
            shutdown,
        )
        .unwrap();

        let report = harness.run(&plan(&[(Algorithm::Md5, None)])).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.skipped, 1);
        assert!(report.failures.is_empty());
        let labels: Vec<_> = report.records.iter().map(|r| r.data_size_label.as_str()).collect();
        assert_eq!(labels, vec!["1000bytes", "2000bytes"]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    struct CrashingSample;

    impl SampleSource for CrashingSample {
        fn label(&self) -> &str {
            "crash"
        }
        fn size_bytes(&self) -> u64 {
            16
        }
        fn read(&self) -> BenchResult<Vec<u8>> {
            panic!("sample reader crashed")
        }
    }

    #[tokio::test]
    async fn test_crashed_pair_reports_unfinished_cells() {
        let samples = SampleSet::new(
            vec![
                Arc::new(GeneratedSample::bytes(1000)) as SampleRef,
                Arc::new(CrashingSample) as SampleRef,
                Arc::new(GeneratedSample::bytes(3000)) as SampleRef,
            ],
            vec![Arc::new(GeneratedSample::bytes(64)) as SampleRef],
        );
        let mut config = CryptoperfConfig::quick();
        config.harness.profile_resources = false;
        let harness = Harness::new(
            &config,
            Arc::new(MemoryRecordStore::new()),
            samples,
            Arc::new(FixedProbe(5.0)),
            Shutdown::new(),
        )
        .unwrap();

        let report = harness.run(&plan(&[(Algorithm::Md5, None)])).await.unwrap();
        assert_eq!(report.inserted, 1);
        let failed: Vec<_> = report.failures.iter().map(|f| f.sample.as_str()).collect();
        assert_eq!(failed, vec!["crash", "3000bytes"]);
        assert!(report
            .failures
            .iter()
            .all(|f| f.operation.is_none() && f.algorithm == Algorithm::Md5));
        assert!(!report.cancelled);
    }

    /// Requests shutdown while storing each record
    struct ShutdownOnUpsert {
        inner: MemoryRecordStore,
        shutdown: Shutdown,
    }

    #[async_trait::async_trait]
    impl RecordStore for ShutdownOnUpsert {
        async fn upsert(&self, record: &BenchmarkRecord) -> BenchResult<UpsertOutcome> {
            self.shutdown.trigger();
            self.inner.upsert(record).await
        }
        async fn get(&self, key: &RecordKey) -> BenchResult<Option<BenchmarkRecord>> {
            self.inner.get(key).await
        }
        async fn load_all(&self) -> BenchResult<Vec<BenchmarkRecord>> {
            self.inner.load_all().await
        }
        async fn count(&self) -> BenchResult<usize> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_shutdown_after_last_cell_is_not_a_cancellation() {
        let shutdown = Shutdown::new();
        let store = Arc::new(ShutdownOnUpsert {
            inner: MemoryRecordStore::new(),
            shutdown: shutdown.clone(),
        });
        let mut config = CryptoperfConfig::quick();
        config.harness.profile_resources = false;
        let harness = Harness::new(
            &config,
            store,
            small_samples(),
            Arc::new(FixedProbe(5.0)),
            shutdown.clone(),
        )
        .unwrap();

        let report = harness.run(&plan(&[(Algorithm::Sha256, None)])).await.unwrap();
        assert!(shutdown.is_triggered());
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 0);
        assert!(!report.cancelled);
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl RecordStore for BrokenStore {
        async fn upsert(&self, _record: &BenchmarkRecord) -> BenchResult<UpsertOutcome> {
            Err(BenchError::store("disk full"))
        }
        async fn get(&self, _key: &RecordKey) -> BenchResult<Option<BenchmarkRecord>> {
            Ok(None)
        }
        async fn load_all(&self) -> BenchResult<Vec<BenchmarkRecord>> {
            Ok(Vec::new())
        }
        async fn count(&self) -> BenchResult<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_store_failure_aborts_run() {
        let harness = harness(Arc::new(BrokenStore));
        let err = harness
            .run(&plan(&[(Algorithm::Sha1, None), (Algorithm::Md5, None)]))
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::StoreIo(_)));
    }

    #[test]
    fn test_crypto_errors_become_single_attempt_failures() {
        match into_cell_error(BenchError::crypto("bad padding")) {
            BenchError::OperationFailed { attempts, message } => {
                assert_eq!(attempts, 1);
                assert!(message.contains("bad padding"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            into_cell_error(BenchError::config("x")),
            BenchError::Configuration(_)
        ));
    }
}
