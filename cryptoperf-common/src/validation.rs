//! Input validation utilities

use crate::{
    error::{BenchError, BenchResult},
    types::{Algorithm, KeySize},
};

/// Curves accepted for ECC
pub const SUPPORTED_CURVES: [&str; 3] = ["P-256", "P-384", "P-521"];

/// RC4 key lengths in bits, each a key length the `rc4` crate is instantiated at
pub const RC4_KEY_BITS: [u32; 12] = [40, 56, 64, 80, 96, 128, 160, 192, 256, 512, 1024, 2048];

/// Validation utilities for benchmark inputs
pub struct ValidationUtils;

impl ValidationUtils {
    /// Check that `key_size` is acceptable for `algorithm`.
    ///
    /// Hash algorithms take no key size; every other algorithm requires one.
    pub fn validate_key_size(algorithm: Algorithm, key_size: Option<&KeySize>) -> BenchResult<()> {
        let reject = |detail: &str| {
            Err(BenchError::config(format!(
                "Invalid key size {} for {}: {}",
                key_size.map(|k| k.to_string()).unwrap_or_else(|| "none".to_string()),
                algorithm,
                detail
            )))
        };

        let key_size = match (algorithm, key_size) {
            (Algorithm::Aes, None)
            | (Algorithm::Des, None)
            | (Algorithm::TripleDes, None)
            | (Algorithm::Rc2, None)
            | (Algorithm::Rc4, None)
            | (Algorithm::Blowfish, None)
            | (Algorithm::Rsa, None)
            | (Algorithm::Dsa, None)
            | (Algorithm::Ecc, None)
            | (Algorithm::DiffieHellman, None) => return reject("a key size is required"),
            (_, None) => return Ok(()),
            (_, Some(key_size)) => key_size,
        };

        if algorithm == Algorithm::Ecc {
            return match key_size {
                KeySize::Named(curve) if SUPPORTED_CURVES.contains(&curve.as_str()) => Ok(()),
                _ => reject("expected one of P-256, P-384, P-521"),
            };
        }

        let Some(bits) = key_size.bits() else {
            return reject("expected a bit count");
        };
        let whole_bytes = bits % 8 == 0;

        let ok = match algorithm {
            Algorithm::Aes => matches!(bits, 128 | 192 | 256),
            Algorithm::Des => bits == 64,
            Algorithm::TripleDes => matches!(bits, 128 | 192),
            Algorithm::Rc2 => whole_bytes && (8..=1024).contains(&bits),
            Algorithm::Rc4 => RC4_KEY_BITS.contains(&bits),
            Algorithm::Blowfish => whole_bytes && (32..=448).contains(&bits),
            Algorithm::Rsa => bits % 256 == 0 && (1024..=4096).contains(&bits),
            Algorithm::Dsa => matches!(bits, 1024 | 2048 | 3072),
            Algorithm::DiffieHellman => bits % 256 == 0 && (512..=4096).contains(&bits),
            _ => return reject("hash algorithms take no key size"),
        };

        if ok {
            Ok(())
        } else {
            reject("outside the supported range")
        }
    }

    /// Require `value` to lie in `(min, max]`
    pub fn validate_open_closed(name: &str, value: f64, min: f64, max: f64) -> BenchResult<()> {
        if value.is_nan() || value <= min || value > max {
            return Err(BenchError::config(format!(
                "{name} must be in ({min}, {max}], got {value}"
            )));
        }
        Ok(())
    }

    /// Require a finite, non-negative value
    pub fn validate_non_negative(name: &str, value: f64) -> BenchResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(BenchError::config(format!(
                "{name} must be a finite value >= 0, got {value}"
            )));
        }
        Ok(())
    }

    /// Require a count of at least one
    pub fn validate_at_least_one(name: &str, value: usize) -> BenchResult<()> {
        if value == 0 {
            return Err(BenchError::config(format!("{name} must be at least 1")));
        }
        Ok(())
    }

    /// Validate a data-size label such as `10mb` or `200bytes`
    pub fn validate_label(label: &str) -> BenchResult<()> {
        if label.is_empty() {
            return Err(BenchError::config("Sample label cannot be empty"));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(BenchError::config(format!(
                "Sample label {label:?} may only contain letters, digits, '-' and '.'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_des_only_accepts_64_bits() {
        assert!(ValidationUtils::validate_key_size(Algorithm::Des, Some(&KeySize::Bits(64))).is_ok());
        let err =
            ValidationUtils::validate_key_size(Algorithm::Des, Some(&KeySize::Bits(128))).unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)));
    }

    #[test]
    fn test_default_grid_is_valid() {
        for algorithm in Algorithm::ALL {
            for key_size in algorithm.default_key_sizes() {
                ValidationUtils::validate_key_size(algorithm, key_size.as_ref())
                    .unwrap_or_else(|e| panic!("{algorithm} {key_size:?}: {e}"));
            }
        }
    }

    #[test]
    fn test_rc4_lengths() {
        for bits in RC4_KEY_BITS {
            assert!(ValidationUtils::validate_key_size(Algorithm::Rc4, Some(&KeySize::Bits(bits))).is_ok());
        }
        for bits in [36, 48, 4096] {
            assert!(ValidationUtils::validate_key_size(Algorithm::Rc4, Some(&KeySize::Bits(bits))).is_err());
        }
    }

    #[test]
    fn test_hashes_reject_key_sizes() {
        assert!(ValidationUtils::validate_key_size(Algorithm::Sha256, None).is_ok());
        assert!(
            ValidationUtils::validate_key_size(Algorithm::Sha256, Some(&KeySize::Bits(256)))
                .is_err()
        );
    }

    #[test]
    fn test_curves() {
        let p384 = KeySize::Named("P-384".to_string());
        let bogus = KeySize::Named("CURVE25519".to_string());
        assert!(ValidationUtils::validate_key_size(Algorithm::Ecc, Some(&p384)).is_ok());
        assert!(ValidationUtils::validate_key_size(Algorithm::Ecc, Some(&bogus)).is_err());
        assert!(ValidationUtils::validate_key_size(Algorithm::Ecc, Some(&KeySize::Bits(256))).is_err());
    }

    #[test]
    fn test_ranges() {
        assert!(ValidationUtils::validate_open_closed("threshold", 70.0, 0.0, 100.0).is_ok());
        assert!(ValidationUtils::validate_open_closed("threshold", 0.0, 0.0, 100.0).is_err());
        assert!(ValidationUtils::validate_open_closed("threshold", 100.5, 0.0, 100.0).is_err());
        assert!(ValidationUtils::validate_non_negative("delay", -0.1).is_err());
        assert!(ValidationUtils::validate_at_least_one("iterations", 0).is_err());
        assert!(ValidationUtils::validate_label("10mb").is_ok());
        assert!(ValidationUtils::validate_label("10 mb").is_err());
    }
}
