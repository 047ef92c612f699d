// config.rs - Configuration for cryptoperf-core
use cryptoperf_common::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoperfConfig {
    /// Path to the record store
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Worker pool and measurement settings
    pub harness: HarnessConfig,

    /// Adaptive throttling around key exchange
    pub throttle: ThrottleConfig,

    /// Where benchmark inputs come from
    pub samples: SampleConfig,

    /// Which algorithms and key sizes to run
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Repetitions averaged into each record
    pub iterations: usize,

    /// Concurrent (algorithm, key size) pairs
    pub workers: usize,

    /// Concurrent key-exchange pairs, on top of the worker limit
    pub key_exchange_concurrency: usize,

    /// Capture CPU/RAM deltas around each measured operation
    pub profile_resources: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// CPU utilisation (percent) above which operations wait
    pub throttle_threshold: f64,

    /// Base cooldown in seconds, scaled by usage / threshold
    pub cool_down_base: f64,

    /// Upper bound on total cooldown per operation, in seconds
    pub cool_down_cap: f64,

    /// Extra attempts after the first failure
    pub max_retries: u32,

    /// Wait between attempts, in seconds
    pub retry_delay_secs: f64,

    /// Minimum gap between successive throttled operations, in seconds
    pub min_inter_op_delay_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Directory of `.txt` inputs for symmetric and hash algorithms
    pub large_dir: Option<PathBuf>,

    /// Directory of `.txt` inputs for asymmetric algorithms
    pub small_dir: Option<PathBuf>,

    /// Generated inputs, in MB, used when `large_dir` is unset
    pub generated_large_mb: Vec<u64>,

    /// Generated inputs, in bytes, used when `small_dir` is unset
    pub generated_small_bytes: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Algorithms to run; empty runs all of them
    pub algorithms: Vec<String>,

    /// Key-size overrides per algorithm name
    pub key_sizes: BTreeMap<String, Vec<String>>,
}

/// One algorithm and the key sizes to benchmark it at
#[derive(Debug, Clone, PartialEq)]
pub struct GridEntry {
    pub algorithm: Algorithm,
    pub key_sizes: Vec<Option<KeySize>>,
}

impl Default for CryptoperfConfig {
    fn default() -> Self {
        Self {
            db_path: "./cryptoperf_db".to_string(),
            log_level: "info".to_string(),
            harness: HarnessConfig::default(),
            throttle: ThrottleConfig::default(),
            samples: SampleConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            large_dir: None,
            small_dir: None,
            generated_large_mb: vec![1, 2, 5, 10],
            generated_small_bytes: vec![50, 100, 150, 200],
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            iterations: 2,
            workers: (cores / 2).max(1),
            key_exchange_concurrency: 1,
            profile_resources: true,
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            throttle_threshold: 70.0,
            cool_down_base: 1.0,
            cool_down_cap: 2.0,
            max_retries: 3,
            retry_delay_secs: 1.0,
            min_inter_op_delay_secs: 0.5,
        }
    }
}

impl ThrottleConfig {
    /// Validate ranges and ordering between fields
    pub fn validate(&self) -> BenchResult<()> {
        ValidationUtils::validate_open_closed("throttle_threshold", self.throttle_threshold, 0.0, 100.0)?;
        ValidationUtils::validate_non_negative("cool_down_base", self.cool_down_base)?;
        ValidationUtils::validate_non_negative("cool_down_cap", self.cool_down_cap)?;
        ValidationUtils::validate_non_negative("retry_delay_secs", self.retry_delay_secs)?;
        ValidationUtils::validate_non_negative("min_inter_op_delay_secs", self.min_inter_op_delay_secs)?;

        if self.cool_down_cap < self.cool_down_base {
            bench_bail!(
                Configuration,
                "cool_down_cap ({}) must be >= cool_down_base ({})",
                self.cool_down_cap,
                self.cool_down_base
            );
        }
        Ok(())
    }

    pub fn cool_down_cap(&self) -> Duration {
        Duration::from_secs_f64(self.cool_down_cap)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs)
    }

    pub fn min_inter_op_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_inter_op_delay_secs)
    }

    /// Worst-case waiting for one operation: full cooldown plus every retry delay
    pub fn max_wait(&self) -> Duration {
        self.cool_down_cap() + self.retry_delay() * self.max_retries
    }
}

impl GridConfig {
    /// Resolve names and key sizes into a validated plan
    pub fn resolve(&self) -> BenchResult<Vec<GridEntry>> {
        let algorithms: Vec<Algorithm> = if self.algorithms.is_empty() {
            Algorithm::ALL.to_vec()
        } else {
            self.algorithms
                .iter()
                .map(|name| name.parse())
                .collect::<BenchResult<_>>()?
        };

        let mut overrides: BTreeMap<Algorithm, Vec<Option<KeySize>>> = BTreeMap::new();
        for (name, sizes) in &self.key_sizes {
            let algorithm: Algorithm = name.parse()?;
            let parsed = sizes
                .iter()
                .map(|size| size.parse::<KeySize>().map(Some))
                .collect::<BenchResult<Vec<_>>>()?;
            overrides.insert(algorithm, parsed);
        }

        let mut plan = Vec::with_capacity(algorithms.len());
        for algorithm in algorithms {
            let key_sizes = overrides
                .remove(&algorithm)
                .unwrap_or_else(|| algorithm.default_key_sizes());
            for key_size in &key_sizes {
                ValidationUtils::validate_key_size(algorithm, key_size.as_ref())?;
            }
            plan.push(GridEntry {
                algorithm,
                key_sizes,
            });
        }
        Ok(plan)
    }
}

impl CryptoperfConfig {
    /// Load configuration, picking the format from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config: Self = match extension.as_str() {
            "toml" => toml::from_str(&contents)
                .map_err(|e| BenchError::config(format!("Invalid TOML in {}: {}", path.display(), e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| BenchError::config(format!("Invalid YAML in {}: {}", path.display(), e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| BenchError::config(format!("Invalid JSON in {}: {}", path.display(), e)))?,
            other => bench_bail!(Configuration, "Unsupported config format: {:?}", other),
        };

        config.validate()?;
        Ok(config)
    }

    /// Small, fast grid for smoke runs: one iteration, small inputs, short waits
    pub fn quick() -> Self {
        let mut key_sizes = BTreeMap::new();
        key_sizes.insert("RSA".to_string(), vec!["1024".to_string()]);
        key_sizes.insert("DSA".to_string(), vec!["1024".to_string()]);
        key_sizes.insert("DH".to_string(), vec!["512".to_string()]);
        key_sizes.insert("ECC".to_string(), vec!["P-256".to_string()]);

        Self {
            harness: HarnessConfig {
                iterations: 1,
                ..HarnessConfig::default()
            },
            throttle: ThrottleConfig {
                cool_down_base: 0.1,
                cool_down_cap: 0.2,
                max_retries: 1,
                retry_delay_secs: 0.1,
                min_inter_op_delay_secs: 0.0,
                ..ThrottleConfig::default()
            },
            samples: SampleConfig {
                generated_large_mb: vec![1],
                generated_small_bytes: vec![50, 100],
                ..SampleConfig::default()
            },
            grid: GridConfig {
                algorithms: Vec::new(),
                key_sizes,
            },
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> BenchResult<()> {
        if self.db_path.is_empty() {
            bench_bail!(Configuration, "db_path cannot be empty");
        }
        ValidationUtils::validate_at_least_one("iterations", self.harness.iterations)?;
        ValidationUtils::validate_at_least_one("workers", self.harness.workers)?;
        ValidationUtils::validate_at_least_one(
            "key_exchange_concurrency",
            self.harness.key_exchange_concurrency,
        )?;
        self.throttle.validate()?;

        if self.samples.large_dir.is_none() && self.samples.generated_large_mb.is_empty() {
            bench_bail!(Configuration, "No large samples: set samples.large_dir or generated_large_mb");
        }
        if self.samples.small_dir.is_none() && self.samples.generated_small_bytes.is_empty() {
            bench_bail!(Configuration, "No small samples: set samples.small_dir or generated_small_bytes");
        }

        self.grid.resolve()?;
        Ok(())
    }

    /// Get the database path as PathBuf
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = CryptoperfConfig::default();
        config.validate().unwrap();
        assert_eq!(config.harness.iterations, 2);
        assert_eq!(config.harness.key_exchange_concurrency, 1);
        assert_eq!(config.throttle.throttle_threshold, 70.0);
        assert_eq!(config.throttle.cool_down_cap, 2.0);
        assert_eq!(config.throttle.max_retries, 3);
        assert_eq!(config.throttle.max_wait(), Duration::from_secs(5));
        CryptoperfConfig::quick().validate().unwrap();
    }

    #[test]
    fn test_throttle_ranges() {
        let bad_threshold = ThrottleConfig {
            throttle_threshold: 0.0,
            ..ThrottleConfig::default()
        };
        assert!(bad_threshold.validate().is_err());

        let cap_below_base = ThrottleConfig {
            cool_down_base: 3.0,
            cool_down_cap: 2.0,
            ..ThrottleConfig::default()
        };
        assert!(matches!(
            cap_below_base.validate(),
            Err(BenchError::Configuration(_))
        ));

        let negative_delay = ThrottleConfig {
            retry_delay_secs: -1.0,
            ..ThrottleConfig::default()
        };
        assert!(negative_delay.validate().is_err());
    }

    #[test]
    fn test_grid_resolution() {
        let mut grid = GridConfig {
            algorithms: vec!["aes".to_string(), "ECDSA".to_string()],
            key_sizes: BTreeMap::new(),
        };
        grid.key_sizes
            .insert("AES".to_string(), vec!["256".to_string()]);

        let plan = grid.resolve().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].algorithm, Algorithm::Aes);
        assert_eq!(plan[0].key_sizes, vec![Some(KeySize::Bits(256))]);
        assert_eq!(plan[1].algorithm, Algorithm::Ecc);
        assert_eq!(plan[1].key_sizes.len(), 3);

        grid.key_sizes
            .insert("DES".to_string(), vec!["128".to_string()]);
        grid.algorithms.push("DES".to_string());
        assert!(grid.resolve().is_err());
    }

    #[test]
    fn test_load_all_formats() {
        let dir = tempdir().unwrap();

        let toml_path = dir.path().join("bench.toml");
        std::fs::write(
            &toml_path,
            "db_path = \"/tmp/x\"\n[harness]\niterations = 5\n[throttle]\nmax_retries = 0\n",
        )
        .unwrap();
        let config = CryptoperfConfig::from_file(&toml_path).unwrap();
        assert_eq!(config.harness.iterations, 5);
        assert_eq!(config.throttle.max_retries, 0);
        assert_eq!(config.throttle.cool_down_cap, 2.0);

        let yaml_path = dir.path().join("bench.yaml");
        std::fs::write(&yaml_path, "grid:\n  algorithms: [AES, SHA-256]\n").unwrap();
        let config = CryptoperfConfig::from_file(&yaml_path).unwrap();
        assert_eq!(config.grid.resolve().unwrap().len(), 2);

        let json_path = dir.path().join("bench.json");
        std::fs::write(&json_path, r#"{"throttle": {"throttle_threshold": 150.0}}"#).unwrap();
        assert!(CryptoperfConfig::from_file(&json_path).is_err());

        let ini_path = dir.path().join("bench.ini");
        std::fs::write(&ini_path, "x=1").unwrap();
        assert!(matches!(
            CryptoperfConfig::from_file(&ini_path),
            Err(BenchError::Configuration(_))
        ));
    }
}
