//! Benchmark inputs: text files on disk or generated filler of an exact size

use crate::config::SampleConfig;
use cryptoperf_common::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A labelled input the harness can measure against
pub trait SampleSource: Send + Sync {
    /// Stable tag stored as `data_size_label`, e.g. `10mb`
    fn label(&self) -> &str;

    /// Exact size of [`SampleSource::read`]'s output
    fn size_bytes(&self) -> u64;

    fn read(&self) -> BenchResult<Vec<u8>>;
}

/// Shared handle to a sample
pub type SampleRef = Arc<dyn SampleSource>;

/// Sample backed by a file. The label is the file stem up to the first `_`,
/// so `10mb_text_data.txt` is labelled `10mb`.
#[derive(Debug, Clone)]
pub struct FileSample {
    path: PathBuf,
    label: String,
    size_bytes: u64,
}

impl FileSample {
    pub fn open(path: impl Into<PathBuf>) -> BenchResult<Self> {
        let path = path.into();
        let size_bytes = std::fs::metadata(&path)?.len();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BenchError::config(format!("Unreadable file name: {}", path.display())))?;
        let label = stem.split('_').next().unwrap_or(stem).to_string();
        ValidationUtils::validate_label(&label)?;

        Ok(Self {
            path,
            label,
            size_bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for FileSample {
    fn label(&self) -> &str {
        &self.label
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn read(&self) -> BenchResult<Vec<u8>> {
        let data = std::fs::read(&self.path)?;
        if data.len() as u64 != self.size_bytes {
            bench_bail!(
                Internal,
                "{} changed size since discovery ({} -> {} bytes)",
                self.path.display(),
                self.size_bytes,
                data.len()
            );
        }
        Ok(data)
    }
}

const WORDS: &[&str] = &[
    "cipher", "block", "stream", "key", "nonce", "digest", "signature", "prime", "curve",
    "modulus", "entropy", "padding", "vector", "message", "secret", "public", "channel",
    "random", "hash", "round", "exchange", "benchmark", "latency", "throughput",
];

/// Deterministic filler text of an exact byte length
#[derive(Debug, Clone)]
pub struct GeneratedSample {
    label: String,
    size_bytes: u64,
}

impl GeneratedSample {
    /// `n` MB of text, labelled `{n}mb`
    pub fn megabytes(n: u64) -> Self {
        Self {
            label: format!("{n}mb"),
            size_bytes: n * BYTES_PER_MB,
        }
    }

    /// `n` bytes of text, labelled `{n}bytes`
    pub fn bytes(n: u64) -> Self {
        Self {
            label: format!("{n}bytes"),
            size_bytes: n,
        }
    }

    /// Write the sample as `{label}_text_data.txt` under `dir`
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> BenchResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}_text_data.txt", self.label));
        std::fs::write(&path, self.read()?)?;
        Ok(path)
    }
}

impl SampleSource for GeneratedSample {
    fn label(&self) -> &str {
        &self.label
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn read(&self) -> BenchResult<Vec<u8>> {
        let len = usize::try_from(self.size_bytes)
            .map_err(|_| BenchError::config(format!("Sample {} is too large", self.label)))?;
        let mut rng = StdRng::seed_from_u64(self.size_bytes);
        let mut text = Vec::with_capacity(len + 16);
        let mut words_in_sentence = 0;

        while text.len() < len {
            let word = WORDS[rng.gen_range(0..WORDS.len())];
            text.extend_from_slice(word.as_bytes());
            words_in_sentence += 1;
            if words_in_sentence >= rng.gen_range(6..14) {
                text.extend_from_slice(b". ");
                words_in_sentence = 0;
            } else {
                text.push(b' ');
            }
        }
        text.truncate(len);
        Ok(text)
    }
}

/// `.txt` files in `dir`, smallest first
pub fn discover(dir: impl AsRef<Path>) -> BenchResult<Vec<SampleRef>> {
    let dir = dir.as_ref();
    let mut samples: Vec<FileSample> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
            samples.push(FileSample::open(path)?);
        }
    }

    if samples.is_empty() {
        bench_bail!(Configuration, "No .txt samples found in {}", dir.display());
    }

    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for sample in &samples {
        if let Some(previous) = seen.insert(sample.label.as_str(), sample.path.as_path()) {
            bench_bail!(
                Configuration,
                "Samples {} and {} share the label {}",
                previous.display(),
                sample.path.display(),
                sample.label
            );
        }
    }

    samples.sort_by(|a, b| a.size_bytes.cmp(&b.size_bytes).then_with(|| a.label.cmp(&b.label)));
    tracing::debug!("Discovered {} samples in {}", samples.len(), dir.display());

    Ok(samples
        .into_iter()
        .map(|sample| Arc::new(sample) as SampleRef)
        .collect())
}

/// Large inputs for symmetric and hash algorithms, small inputs for asymmetric ones
#[derive(Clone)]
pub struct SampleSet {
    large: Vec<SampleRef>,
    small: Vec<SampleRef>,
}

impl SampleSet {
    pub fn new(large: Vec<SampleRef>, small: Vec<SampleRef>) -> Self {
        Self { large, small }
    }

    pub fn from_config(config: &SampleConfig) -> BenchResult<Self> {
        let large = match &config.large_dir {
            Some(dir) => discover(dir)?,
            None => config
                .generated_large_mb
                .iter()
                .map(|mb| Arc::new(GeneratedSample::megabytes(*mb)) as SampleRef)
                .collect(),
        };
        let small = match &config.small_dir {
            Some(dir) => discover(dir)?,
            None => config
                .generated_small_bytes
                .iter()
                .map(|n| Arc::new(GeneratedSample::bytes(*n)) as SampleRef)
                .collect(),
        };
        Ok(Self::new(large, small))
    }

    /// Samples an algorithm family is measured against
    pub fn for_family(&self, family: Family) -> &[SampleRef] {
        match family {
            Family::Asymmetric => &self.small,
            Family::Symmetric | Family::Hash => &self.large,
        }
    }

    /// Size in bytes of the sample carrying `label`, searching both sets
    pub fn size_of(&self, label: &str) -> Option<u64> {
        self.large
            .iter()
            .chain(self.small.iter())
            .find(|sample| sample.label() == label)
            .map(|sample| sample.size_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generated_sizes_and_labels() {
        let mb = GeneratedSample::megabytes(1);
        assert_eq!(mb.label(), "1mb");
        assert_eq!(mb.read().unwrap().len() as u64, BYTES_PER_MB);

        let small = GeneratedSample::bytes(150);
        assert_eq!(small.label(), "150bytes");
        let data = small.read().unwrap();
        assert_eq!(data.len(), 150);
        assert!(data.is_ascii());
        assert_eq!(data, small.read().unwrap());
    }

    #[test]
    fn test_file_labels_and_discovery() {
        let dir = tempdir().unwrap();
        GeneratedSample::bytes(200).write_to_dir(dir.path()).unwrap();
        GeneratedSample::bytes(50).write_to_dir(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.md"), b"ignored").unwrap();

        let samples = discover(dir.path()).unwrap();
        let labels: Vec<_> = samples.iter().map(|s| s.label().to_string()).collect();
        assert_eq!(labels, vec!["50bytes", "200bytes"]);
        assert_eq!(samples[1].size_bytes(), 200);
        assert_eq!(samples[1].read().unwrap().len(), 200);
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(matches!(discover(dir.path()), Err(BenchError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_labels_are_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("10mb_a.txt"), b"first").unwrap();
        std::fs::write(dir.path().join("10mb_b.txt"), b"second").unwrap();

        match discover(dir.path()) {
            Err(BenchError::Configuration(message)) => assert!(message.contains("10mb")),
            other => panic!("expected a configuration error, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_family_routing() {
        let set = SampleSet::from_config(&SampleConfig {
            generated_large_mb: vec![1],
            generated_small_bytes: vec![50, 100],
            ..SampleConfig::default()
        })
        .unwrap();

        assert_eq!(set.for_family(Family::Symmetric).len(), 1);
        assert_eq!(set.for_family(Family::Hash)[0].label(), "1mb");
        assert_eq!(set.for_family(Family::Asymmetric).len(), 2);
        assert_eq!(set.size_of("100bytes"), Some(100));
        assert_eq!(set.size_of("3mb"), None);
    }
}
