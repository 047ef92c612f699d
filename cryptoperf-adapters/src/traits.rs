//! Capability contracts implemented by the primitive engines

use cryptoperf_common::error::BenchResult;

/// Encrypt and decrypt whole messages
pub trait CipherOps: Send + Sync {
    /// Encrypt `plaintext`; the output carries whatever nonce or IV decryption needs
    fn encrypt(&self, plaintext: &[u8]) -> BenchResult<Vec<u8>>;

    /// Decrypt output previously produced by [`CipherOps::encrypt`]
    fn decrypt(&self, ciphertext: &[u8]) -> BenchResult<Vec<u8>>;
}

/// Sign messages and check signatures
pub trait SignatureOps: Send + Sync {
    /// Sign `message`
    fn sign(&self, message: &[u8]) -> BenchResult<Vec<u8>>;

    /// `Ok(false)` for a well-formed but wrong signature; `Err` when it cannot be parsed
    fn verify(&self, message: &[u8], signature: &[u8]) -> BenchResult<bool>;
}

/// Derive shared secrets with a peer
pub trait KeyExchangeOps: Send + Sync {
    /// Our public value, encoded big-endian
    fn public_key(&self) -> Vec<u8>;

    /// Public value of a fresh peer on the same parameters
    fn generate_peer_public_key(&self) -> BenchResult<Vec<u8>>;

    /// Shared secret with the holder of `peer_public_key`
    fn exchange(&self, peer_public_key: &[u8]) -> BenchResult<Vec<u8>>;
}

/// Digest or MAC a message
pub trait DigestOps: Send + Sync {
    fn hash(&self, data: &[u8]) -> BenchResult<Vec<u8>>;
}
