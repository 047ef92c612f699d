//! Adaptive throttling around expensive operations.
//!
//! The controller samples CPU utilisation before each operation and cools
//! down while the host is above the configured threshold, retries failed
//! attempts with a fixed delay, and keeps a minimum gap between successive
//! operations. Every wait is bounded and wakes early on shutdown.

use crate::config::ThrottleConfig;
use cryptoperf_common::prelude::*;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Source of global CPU utilisation, in percent
pub trait CpuProbe: Send + Sync {
    fn cpu_usage(&self) -> f64;
}

/// CPU probe backed by `sysinfo`.
///
/// Usage is only recomputed once `MINIMUM_CPU_UPDATE_INTERVAL` has passed
/// since the last refresh; callers in between see the previous reading, so
/// concurrent callers cannot shrink each other's measurement window.
pub struct SystemProbe {
    state: Mutex<ProbeState>,
}

struct ProbeState {
    system: System,
    refreshed: Instant,
    usage: f64,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // The first refresh only establishes a baseline
        system.refresh_cpu();
        Self {
            state: Mutex::new(ProbeState {
                system,
                refreshed: Instant::now(),
                usage: 0.0,
            }),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuProbe for SystemProbe {
    fn cpu_usage(&self) -> f64 {
        let mut state = self.state.lock();
        if state.refreshed.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL {
            state.system.refresh_cpu();
            state.usage = state.system.global_cpu_info().cpu_usage() as f64;
            state.refreshed = Instant::now();
        }
        state.usage
    }
}

/// Probe that always reports the same utilisation
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub f64);

impl CpuProbe for FixedProbe {
    fn cpu_usage(&self) -> f64 {
        self.0
    }
}

#[derive(Default)]
struct ShutdownInner {
    triggered: Mutex<bool>,
    wake: Condvar,
}

/// Cooperative shutdown signal shared by the harness and the throttle
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every sleeper
    pub fn trigger(&self) {
        let mut triggered = self.inner.triggered.lock();
        *triggered = true;
        self.inner.wake.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.triggered.lock()
    }

    /// Sleep for `duration`, returning `Cancelled` as soon as shutdown is requested
    pub fn sleep(&self, duration: Duration) -> BenchResult<()> {
        let deadline = Instant::now() + duration;
        let mut triggered = self.inner.triggered.lock();
        while !*triggered {
            if self.inner.wake.wait_until(&mut triggered, deadline).timed_out() {
                return Ok(());
            }
        }
        Err(BenchError::cancelled("shutdown requested while waiting"))
    }
}

/// Where the controller is in handling an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThrottleState {
    Ready,
    Running,
    Cooling,
    Failed,
}

/// Waits and attempts spent on one operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ThrottleReport {
    pub attempts: u32,
    pub cooldowns: u32,
    pub cooling: Duration,
    pub retry_wait: Duration,
    pub pacing: Duration,
}

impl ThrottleReport {
    /// Add another operation's costs to this one
    pub fn absorb(&mut self, other: &ThrottleReport) {
        self.attempts += other.attempts;
        self.cooldowns += other.cooldowns;
        self.cooling += other.cooling;
        self.retry_wait += other.retry_wait;
        self.pacing += other.pacing;
    }
}

/// A successful result together with what it cost to get it
#[derive(Debug)]
pub struct Throttled<T> {
    pub value: T,
    pub report: ThrottleReport,
}

/// Throttles one sequence of operations.
///
/// Pacing and the reports describe that sequence, so concurrent callers each
/// need their own controller.
pub struct ThrottleController {
    config: ThrottleConfig,
    probe: Arc<dyn CpuProbe>,
    shutdown: Shutdown,
    state: Mutex<ThrottleState>,
    last_finished: Mutex<Option<Instant>>,
    last_report: Mutex<ThrottleReport>,
    totals: Mutex<ThrottleReport>,
}

impl ThrottleController {
    pub fn new(
        config: ThrottleConfig,
        probe: Arc<dyn CpuProbe>,
        shutdown: Shutdown,
    ) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            probe,
            shutdown,
            state: Mutex::new(ThrottleState::Ready),
            last_finished: Mutex::new(None),
            last_report: Mutex::new(ThrottleReport::default()),
            totals: Mutex::new(ThrottleReport::default()),
        })
    }

    pub fn state(&self) -> ThrottleState {
        *self.state.lock()
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Report of the most recent operation, successful or not
    pub fn last_report(&self) -> ThrottleReport {
        *self.last_report.lock()
    }

    /// Sum over every operation this controller has run
    pub fn totals(&self) -> ThrottleReport {
        *self.totals.lock()
    }

    fn set_state(&self, state: ThrottleState) {
        *self.state.lock() = state;
    }

    /// Run `op` under throttling.
    ///
    /// `Configuration` and fatal errors from `op` are returned immediately.
    /// Other errors are retried up to `max_retries` times; when all attempts
    /// fail the result is `OperationFailed` with the attempt count and the
    /// last error message.
    pub fn execute<T, F>(&self, label: &str, mut op: F) -> BenchResult<Throttled<T>>
    where
        F: FnMut() -> BenchResult<T>,
    {
        let mut report = ThrottleReport::default();
        let outcome = self.run(label, &mut op, &mut report);
        *self.last_report.lock() = report;
        self.totals.lock().absorb(&report);
        *self.last_finished.lock() = Some(Instant::now());
        outcome.map(|value| Throttled { value, report })
    }

    fn run<T, F>(&self, label: &str, op: &mut F, report: &mut ThrottleReport) -> BenchResult<T>
    where
        F: FnMut() -> BenchResult<T>,
    {
        self.pace(report)?;
        self.cool_down(label, report)?;

        let total_attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=total_attempts {
            self.set_state(ThrottleState::Running);
            report.attempts = attempt;

            match op() {
                Ok(value) => {
                    self.set_state(ThrottleState::Ready);
                    return Ok(value);
                }
                Err(err) if err.is_fatal() || matches!(err, BenchError::Configuration(_)) => {
                    self.set_state(ThrottleState::Ready);
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        operation = label,
                        attempt,
                        total_attempts,
                        error = %err,
                        "Throttled operation failed"
                    );
                    last_error = Some(err);
                    if attempt < total_attempts {
                        let delay = self.config.retry_delay();
                        self.wait(delay)?;
                        report.retry_wait += delay;
                    }
                }
            }
        }

        self.set_state(ThrottleState::Failed);
        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        // The caller owns reporting the failure
        tracing::debug!(
            operation = label,
            attempts = total_attempts,
            "Throttled operation exhausted its retries: {}",
            message
        );
        Err(BenchError::operation_failed(total_attempts, message))
    }

    // Keep at least min_inter_op_delay between the end of one operation and the start of the next
    fn pace(&self, report: &mut ThrottleReport) -> BenchResult<()> {
        let min_gap = self.config.min_inter_op_delay();
        let last_finished = *self.last_finished.lock();
        if let Some(elapsed) = last_finished.map(|t| t.elapsed()) {
            if elapsed < min_gap {
                let gap = min_gap - elapsed;
                self.wait(gap)?;
                report.pacing = gap;
            }
        }
        Ok(())
    }

    fn cool_down(&self, label: &str, report: &mut ThrottleReport) -> BenchResult<()> {
        let cap = self.config.cool_down_cap();
        let threshold = self.config.throttle_threshold;

        loop {
            let usage = self.probe.cpu_usage();
            if usage <= threshold {
                return Ok(());
            }

            let remaining = cap.saturating_sub(report.cooling);
            let wanted = Duration::from_secs_f64(self.config.cool_down_base * usage / threshold);
            let sleep = wanted.min(remaining);
            if sleep.is_zero() {
                tracing::warn!(
                    operation = label,
                    cpu = usage,
                    "Cooldown budget spent, proceeding at {:.1}% CPU",
                    usage
                );
                return Ok(());
            }

            self.set_state(ThrottleState::Cooling);
            tracing::warn!(
                operation = label,
                cpu = usage,
                threshold,
                "CPU above threshold, cooling down for {:.3}s",
                sleep.as_secs_f64()
            );
            self.wait(sleep)?;
            report.cooling += sleep;
            report.cooldowns += 1;
        }
    }

    fn wait(&self, duration: Duration) -> BenchResult<()> {
        if duration.is_zero() {
            return Ok(());
        }
        self.shutdown.sleep(duration).inspect_err(|_| {
            self.set_state(ThrottleState::Ready);
        })
    }
}
