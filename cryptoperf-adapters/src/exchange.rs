//! Finite-field Diffie-Hellman key exchange

use crate::traits::KeyExchangeOps;
use cryptoperf_common::prelude::*;
use hkdf::Hkdf;
use num_bigint_dig::{BigUint, RandBigInt, RandPrime};
use rand::rngs::OsRng;
use sha2::Sha256;

/// Generator used for every parameter set
pub const GENERATOR: u32 = 2;

/// Context string fed to HKDF when expanding the raw shared secret
pub const HKDF_INFO: &[u8] = b"handshake data";

/// Length of the derived key
pub const DERIVED_KEY_LEN: usize = 32;

/// Group parameters `(p, g)`
#[derive(Clone, Debug)]
pub struct DhParameters {
    prime: BigUint,
    generator: BigUint,
}

impl DhParameters {
    /// Generate a random prime modulus of `bits`.
    ///
    /// This is the expensive step, and the one the throttle wraps.
    pub fn generate(bits: u32) -> BenchResult<Self> {
        if bits < 512 {
            bench_bail!(Configuration, "DH modulus must be at least 512 bits, got {}", bits);
        }
        let prime = OsRng.gen_prime(bits as usize);
        Ok(Self {
            prime,
            generator: BigUint::from(GENERATOR),
        })
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.prime.bits()
    }

    // Private exponent in [2, p - 2]
    fn random_private(&self) -> BigUint {
        let low = BigUint::from(2u32);
        let high = &self.prime - BigUint::from(1u32);
        OsRng.gen_biguint_range(&low, &high)
    }

    fn public_for(&self, private: &BigUint) -> BigUint {
        self.generator.modpow(private, &self.prime)
    }
}

/// One side of a Diffie-Hellman exchange
pub struct DhEngine {
    params: DhParameters,
    private: BigUint,
    public: BigUint,
}

impl DhEngine {
    /// Generate parameters of `bits` and a key pair on them
    pub fn generate(bits: u32) -> BenchResult<Self> {
        Ok(Self::with_parameters(DhParameters::generate(bits)?))
    }

    /// Generate a key pair on existing parameters
    pub fn with_parameters(params: DhParameters) -> Self {
        let private = params.random_private();
        let public = params.public_for(&private);
        Self {
            params,
            private,
            public,
        }
    }

    /// Group parameters in use
    pub fn parameters(&self) -> &DhParameters {
        &self.params
    }
}

impl KeyExchangeOps for DhEngine {
    fn public_key(&self) -> Vec<u8> {
        self.public.to_bytes_be()
    }

    fn generate_peer_public_key(&self) -> BenchResult<Vec<u8>> {
        let peer_private = self.params.random_private();
        Ok(self.params.public_for(&peer_private).to_bytes_be())
    }

    fn exchange(&self, peer_public_key: &[u8]) -> BenchResult<Vec<u8>> {
        let peer = BigUint::from_bytes_be(peer_public_key);
        let one = BigUint::from(1u32);
        let upper = &self.params.prime - &one;
        // Reject 0, 1 and p - 1, which leak or fix the shared value
        if peer <= one || peer >= upper {
            bench_bail!(Crypto, "DH peer public value is out of range");
        }

        let shared = peer.modpow(&self.private, &self.params.prime);
        let mut derived = vec![0u8; DERIVED_KEY_LEN];
        Hkdf::<Sha256>::new(None, &shared.to_bytes_be())
            .expand(HKDF_INFO, &mut derived)
            .map_err(|e| BenchError::crypto(format!("HKDF expansion failed: {}", e)))?;
        Ok(derived)
    }
}
