//! CPU and memory snapshots taken around measured operations

use cryptoperf_common::record::ResourceSample;
use std::sync::Arc;
use sysinfo::System;

/// Point-in-time CPU and RAM utilisation, both in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSnapshot {
    pub cpu_percent: f64,
    pub ram_percent: f64,
}

impl ResourceSnapshot {
    /// Change from `self` to `later`
    pub fn delta(&self, later: &ResourceSnapshot) -> ResourceSample {
        ResourceSample {
            cpu_percent_delta: later.cpu_percent - self.cpu_percent,
            ram_percent_delta: later.ram_percent - self.ram_percent,
        }
    }
}

/// Source of resource snapshots for one sequence of measurements.
///
/// CPU usage is reported for the interval since the sampler's previous
/// snapshot, so a sampler must not be shared between concurrent jobs.
pub trait ResourceSampler: Send {
    fn snapshot(&mut self) -> ResourceSnapshot;
}

/// Builds one sampler per job
pub type SamplerFactory = Arc<dyn Fn() -> Box<dyn ResourceSampler> + Send + Sync>;

/// Sampler backed by its own `sysinfo` view of the host
pub struct ResourceMonitor {
    system: System,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();
        Self { system }
    }

    /// Factory handing every job a fresh monitor
    pub fn factory() -> SamplerFactory {
        Arc::new(|| Box::new(ResourceMonitor::new()) as Box<dyn ResourceSampler>)
    }
}

impl ResourceSampler for ResourceMonitor {
    fn snapshot(&mut self) -> ResourceSnapshot {
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let ram_percent = if total > 0 {
            self.system.used_memory() as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        ResourceSnapshot {
            cpu_percent: self.system.global_cpu_info().cpu_usage() as f64,
            ram_percent,
        }
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
