//! Common type definitions and constants

use crate::error::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bytes in one megabyte, as used for sample sizes and MB/s rates
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Multipliers applied to a target size to build comparison intervals
pub const INTERVAL_FACTORS: [f64; 7] = [0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6];

/// Coarse grouping of algorithms, which also decides the rate unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Block and stream ciphers
    Symmetric,
    /// Public key schemes, measured per byte
    Asymmetric,
    /// Digests and MACs
    Hash,
}

impl Family {
    /// Unit in which this family's rates are recorded
    pub fn rate_unit(self) -> RateUnit {
        match self {
            Family::Asymmetric => RateUnit::BytesPerSec,
            Family::Symmetric | Family::Hash => RateUnit::MegabytesPerSec,
        }
    }
}

/// A benchmarked operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Encrypt a plaintext
    Encryption,
    /// Decrypt a ciphertext
    Decryption,
    /// Produce a signature
    Signing,
    /// Check a signature
    Verification,
    /// Derive a shared secret from a peer public key
    KeyExchange,
    /// Digest or MAC a message
    Hashing,
}

impl Operation {
    /// Every operation, in reporting order
    pub const ALL: [Operation; 6] = [
        Operation::Encryption,
        Operation::Decryption,
        Operation::Signing,
        Operation::Verification,
        Operation::KeyExchange,
        Operation::Hashing,
    ];

    /// Stored name of the operation
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Encryption => "encryption",
            Operation::Decryption => "decryption",
            Operation::Signing => "signing",
            Operation::Verification => "verification",
            Operation::KeyExchange => "key_exchange",
            Operation::Hashing => "hashing",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        let op = match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "encryption" | "encrypt" => Operation::Encryption,
            "decryption" | "decrypt" => Operation::Decryption,
            "signing" | "sign" => Operation::Signing,
            "verification" | "verify" => Operation::Verification,
            "key_exchange" | "exchange" | "keyexchange" => Operation::KeyExchange,
            "hashing" | "hash" => Operation::Hashing,
            other => return Err(BenchError::config(format!("Unknown operation: {other}"))),
        };
        Ok(op)
    }
}

/// Every algorithm the harness knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Algorithm {
    Aes,
    Des,
    TripleDes,
    Rc2,
    Rc4,
    Blowfish,
    Rsa,
    Dsa,
    Ecc,
    DiffieHellman,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Shake128,
    Shake256,
    Md5,
    HmacSha256,
}

// Lookup keys are upper-case with '_' folded to '-'.
const ALIASES: &[(&str, Algorithm)] = &[
    ("AES", Algorithm::Aes),
    ("DES", Algorithm::Des),
    ("3DES", Algorithm::TripleDes),
    ("DES3", Algorithm::TripleDes),
    ("TDES", Algorithm::TripleDes),
    ("TRIPLEDES", Algorithm::TripleDes),
    ("TRIPLE-DES", Algorithm::TripleDes),
    ("RC2", Algorithm::Rc2),
    ("RC4", Algorithm::Rc4),
    ("ARC4", Algorithm::Rc4),
    ("BLOWFISH", Algorithm::Blowfish),
    ("RSA", Algorithm::Rsa),
    ("DSA", Algorithm::Dsa),
    ("ECC", Algorithm::Ecc),
    ("ECDSA", Algorithm::Ecc),
    ("DH", Algorithm::DiffieHellman),
    ("DIFFIE-HELLMAN", Algorithm::DiffieHellman),
    ("DIFFIEHELLMAN", Algorithm::DiffieHellman),
    ("SHA-1", Algorithm::Sha1),
    ("SHA1", Algorithm::Sha1),
    ("SHA-224", Algorithm::Sha224),
    ("SHA224", Algorithm::Sha224),
    ("SHA-256", Algorithm::Sha256),
    ("SHA256", Algorithm::Sha256),
    ("SHA-384", Algorithm::Sha384),
    ("SHA384", Algorithm::Sha384),
    ("SHA-512", Algorithm::Sha512),
    ("SHA512", Algorithm::Sha512),
    ("SHA3-224", Algorithm::Sha3_224),
    ("SHA3-256", Algorithm::Sha3_256),
    ("SHA3-384", Algorithm::Sha3_384),
    ("SHA3-512", Algorithm::Sha3_512),
    ("SHAKE128", Algorithm::Shake128),
    ("SHAKE-128", Algorithm::Shake128),
    ("SHAKE256", Algorithm::Shake256),
    ("SHAKE-256", Algorithm::Shake256),
    ("MD5", Algorithm::Md5),
    ("HMAC", Algorithm::HmacSha256),
    ("HMAC-SHA256", Algorithm::HmacSha256),
    ("HMAC-SHA-256", Algorithm::HmacSha256),
];

impl Algorithm {
    /// Every algorithm, in default benchmark order
    pub const ALL: [Algorithm; 23] = [
        Algorithm::Aes,
        Algorithm::Des,
        Algorithm::TripleDes,
        Algorithm::Rc2,
        Algorithm::Rc4,
        Algorithm::Blowfish,
        Algorithm::Rsa,
        Algorithm::Dsa,
        Algorithm::Ecc,
        Algorithm::DiffieHellman,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
        Algorithm::Sha3_224,
        Algorithm::Sha3_256,
        Algorithm::Sha3_384,
        Algorithm::Sha3_512,
        Algorithm::Shake128,
        Algorithm::Shake256,
        Algorithm::Md5,
        Algorithm::HmacSha256,
    ];

    /// Resolve a user or stored name to an algorithm.
    ///
    /// Matching is case-insensitive and treats `_` like `-`, so `"ecdsa"`,
    /// `"Blowfish"` and `"sha_256"` all resolve.
    pub fn lookup(name: &str) -> Option<Algorithm> {
        let key = name.trim().to_ascii_uppercase().replace('_', "-");
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, algorithm)| *algorithm)
    }

    /// Canonical display and storage name
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::TripleDes => "3DES",
            Algorithm::Rc2 => "RC2",
            Algorithm::Rc4 => "RC4",
            Algorithm::Blowfish => "Blowfish",
            Algorithm::Rsa => "RSA",
            Algorithm::Dsa => "DSA",
            Algorithm::Ecc => "ECC",
            Algorithm::DiffieHellman => "DH",
            Algorithm::Sha1 => "SHA-1",
            Algorithm::Sha224 => "SHA-224",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha384 => "SHA-384",
            Algorithm::Sha512 => "SHA-512",
            Algorithm::Sha3_224 => "SHA3-224",
            Algorithm::Sha3_256 => "SHA3-256",
            Algorithm::Sha3_384 => "SHA3-384",
            Algorithm::Sha3_512 => "SHA3-512",
            Algorithm::Shake128 => "SHAKE128",
            Algorithm::Shake256 => "SHAKE256",
            Algorithm::Md5 => "MD5",
            Algorithm::HmacSha256 => "HMAC-SHA256",
        }
    }

    /// Family this algorithm belongs to
    pub fn family(self) -> Family {
        match self {
            Algorithm::Aes
            | Algorithm::Des
            | Algorithm::TripleDes
            | Algorithm::Rc2
            | Algorithm::Rc4
            | Algorithm::Blowfish => Family::Symmetric,
            Algorithm::Rsa | Algorithm::Dsa | Algorithm::Ecc | Algorithm::DiffieHellman => {
                Family::Asymmetric
            }
            _ => Family::Hash,
        }
    }

    /// Operations this algorithm can be benchmarked on
    pub fn operations(self) -> &'static [Operation] {
        use Operation::*;
        match self {
            Algorithm::Rsa => &[Encryption, Decryption, Signing, Verification],
            Algorithm::Dsa | Algorithm::Ecc => &[Signing, Verification],
            Algorithm::DiffieHellman => &[KeyExchange],
            _ => match self.family() {
                Family::Symmetric => &[Encryption, Decryption],
                _ => &[Hashing],
            },
        }
    }

    /// Whether `operation` applies to this algorithm
    pub fn supports(self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }

    /// Whether adapter construction or operations need the throttle
    pub fn is_key_exchange(self) -> bool {
        self == Algorithm::DiffieHellman
    }

    /// Key sizes benchmarked when the configuration names none
    pub fn default_key_sizes(self) -> Vec<Option<KeySize>> {
        let bits: &[u32] = match self {
            Algorithm::Aes => &[128, 192, 256],
            Algorithm::Des => &[64],
            Algorithm::TripleDes => &[128, 192],
            Algorithm::Rc2 | Algorithm::Rc4 => &[40, 64, 128],
            Algorithm::Blowfish => &[32, 64, 128, 192, 256],
            Algorithm::Rsa | Algorithm::DiffieHellman => &[2048, 3072, 4096],
            Algorithm::Dsa => &[1024, 2048, 3072],
            Algorithm::Ecc => {
                return ["P-256", "P-384", "P-521"]
                    .iter()
                    .map(|curve| Some(KeySize::Named((*curve).to_string())))
                    .collect()
            }
            _ => return vec![None],
        };
        bits.iter().map(|b| Some(KeySize::Bits(*b))).collect()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        Algorithm::lookup(s).ok_or_else(|| BenchError::config(format!("Unknown algorithm: {s}")))
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.name().to_string()
    }
}

impl TryFrom<String> for Algorithm {
    type Error = BenchError;

    fn try_from(value: String) -> BenchResult<Self> {
        value.parse()
    }
}

/// Key size in bits, or a named curve
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum KeySize {
    Bits(u32),
    Named(String),
}

impl KeySize {
    /// Bit length, if this is not a named curve
    pub fn bits(&self) -> Option<u32> {
        match self {
            KeySize::Bits(bits) => Some(*bits),
            KeySize::Named(_) => None,
        }
    }

    /// Whole bytes of key material, for bit sizes divisible by 8
    pub fn bytes(&self) -> Option<usize> {
        self.bits()
            .filter(|bits| bits % 8 == 0)
            .map(|bits| (bits / 8) as usize)
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySize::Bits(bits) => write!(f, "{bits}"),
            KeySize::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for KeySize {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(BenchError::config("Key size cannot be empty"));
        }
        match trimmed.parse::<u32>() {
            Ok(bits) => Ok(KeySize::Bits(bits)),
            Err(_) => {
                let upper = trimmed.to_ascii_uppercase();
                // SECP256R1 and friends are the same curves under another name
                let name = match upper.as_str() {
                    "SECP256R1" | "P256" => "P-256".to_string(),
                    "SECP384R1" | "P384" => "P-384".to_string(),
                    "SECP521R1" | "P521" => "P-521".to_string(),
                    _ => upper,
                };
                Ok(KeySize::Named(name))
            }
        }
    }
}

impl From<u32> for KeySize {
    fn from(bits: u32) -> Self {
        KeySize::Bits(bits)
    }
}

impl From<KeySize> for String {
    fn from(key_size: KeySize) -> Self {
        key_size.to_string()
    }
}

impl TryFrom<String> for KeySize {
    type Error = BenchError;

    fn try_from(value: String) -> BenchResult<Self> {
        value.parse()
    }
}

/// Unit a rate is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    BytesPerSec,
    MegabytesPerSec,
}

impl RateUnit {
    /// Express a byte count in this unit's numerator
    pub fn quantity(self, bytes: u64) -> f64 {
        match self {
            RateUnit::BytesPerSec => bytes as f64,
            RateUnit::MegabytesPerSec => bytes as f64 / BYTES_PER_MB as f64,
        }
    }

    /// Short label for reports
    pub fn label(self) -> &'static str {
        match self {
            RateUnit::BytesPerSec => "B/s",
            RateUnit::MegabytesPerSec => "MB/s",
        }
    }
}

/// A throughput value that always carries its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub value: f64,
    pub unit: RateUnit,
}

impl Rate {
    /// Create a rate in bytes per second
    pub fn bytes_per_sec(value: f64) -> Self {
        Self {
            value,
            unit: RateUnit::BytesPerSec,
        }
    }

    /// Create a rate in megabytes per second
    pub fn megabytes_per_sec(value: f64) -> Self {
        Self {
            value,
            unit: RateUnit::MegabytesPerSec,
        }
    }

    /// Throughput for `bytes` processed in `seconds`, or zero when no time elapsed
    pub fn measured(bytes: u64, seconds: f64, unit: RateUnit) -> Self {
        let value = if seconds > 0.0 {
            unit.quantity(bytes) / seconds
        } else {
            0.0
        };
        Self { value, unit }
    }

    /// Seconds needed to process `bytes` at this rate, `None` when the rate is not positive
    pub fn time_for_bytes(&self, bytes: u64) -> Option<f64> {
        if self.value > 0.0 {
            Some(self.unit.quantity(bytes) / self.value)
        } else {
            None
        }
    }

    /// Same rate expressed in MB/s
    pub fn as_megabytes_per_sec(&self) -> f64 {
        match self.unit {
            RateUnit::MegabytesPerSec => self.value,
            RateUnit::BytesPerSec => self.value / BYTES_PER_MB as f64,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_table_normalisation() {
        assert_eq!(Algorithm::lookup("ecdsa"), Some(Algorithm::Ecc));
        assert_eq!(Algorithm::lookup("BLOWFISH"), Some(Algorithm::Blowfish));
        assert_eq!(Algorithm::lookup("blowfish"), Some(Algorithm::Blowfish));
        assert_eq!(Algorithm::lookup("sha_256"), Some(Algorithm::Sha256));
        assert_eq!(Algorithm::lookup(" des3 "), Some(Algorithm::TripleDes));
        assert_eq!(Algorithm::lookup("rot13"), None);
        assert_eq!(Algorithm::Blowfish.name(), "Blowfish");
        assert_eq!(Algorithm::Ecc.name(), "ECC");
    }

    #[test]
    fn test_every_canonical_name_resolves_to_itself() {
        for algorithm in Algorithm::ALL {
            assert_eq!(Algorithm::lookup(algorithm.name()), Some(algorithm));
        }
    }

    #[test]
    fn test_operations_per_family() {
        assert!(Algorithm::Rsa.supports(Operation::Signing));
        assert!(Algorithm::Rsa.supports(Operation::Encryption));
        assert!(!Algorithm::Ecc.supports(Operation::Encryption));
        assert!(Algorithm::DiffieHellman.supports(Operation::KeyExchange));
        assert_eq!(Algorithm::Md5.operations(), &[Operation::Hashing]);
        assert_eq!(
            Algorithm::Rc4.operations(),
            &[Operation::Encryption, Operation::Decryption]
        );
    }

    #[test]
    fn test_key_size_parsing() {
        assert_eq!("2048".parse::<KeySize>().unwrap(), KeySize::Bits(2048));
        assert_eq!(
            "secp384r1".parse::<KeySize>().unwrap(),
            KeySize::Named("P-384".to_string())
        );
        assert_eq!(KeySize::Bits(128).bytes(), Some(16));
        assert_eq!(KeySize::Bits(0).to_string(), "0");
        assert!("".parse::<KeySize>().is_err());
    }

    #[test]
    fn test_key_size_serializes_as_string() {
        let json = serde_json::to_string(&Some(KeySize::Bits(256))).unwrap();
        assert_eq!(json, "\"256\"");
        let none: Option<KeySize> = serde_json::from_str("null").unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_measured_rate_units() {
        let aes = Rate::measured(10 * BYTES_PER_MB, 0.1, RateUnit::MegabytesPerSec);
        assert!((aes.value - 100.0).abs() < 1e-9);

        let rsa = Rate::measured(100, 0.002, RateUnit::BytesPerSec);
        assert!((rsa.value - 50_000.0).abs() < 1e-6);
        assert!((rsa.time_for_bytes(1000).unwrap() - 0.02).abs() < 1e-12);

        let idle = Rate::measured(100, 0.0, RateUnit::BytesPerSec);
        assert_eq!(idle.value, 0.0);
        assert_eq!(idle.time_for_bytes(100), None);
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("encrypt".parse::<Operation>().unwrap(), Operation::Encryption);
        assert_eq!("Key-Exchange".parse::<Operation>().unwrap(), Operation::KeyExchange);
        assert!("compress".parse::<Operation>().is_err());
    }
}
