//! Uniform adapter over every supported primitive

use crate::asymmetric::{DsaEngine, P256Engine, P384Engine, P521Engine, RsaEngine};
use crate::digest::DigestEngine;
use crate::exchange::DhEngine;
use crate::symmetric::{AesGcmEngine, CbcEngine, Rc4Engine};
use crate::traits::{CipherOps, DigestOps, KeyExchangeOps, SignatureOps};
use cryptoperf_common::prelude::*;
use std::fmt;
use std::sync::Arc;

/// A primitive bound to one key size, with its capabilities resolved at construction.
///
/// Key material lives inside the engines and is never printed; `Debug`
/// shows only the algorithm and key size.
#[derive(Clone)]
pub struct Adapter {
    algorithm: Algorithm,
    key_size: Option<KeySize>,
    cipher: Option<Arc<dyn CipherOps>>,
    signer: Option<Arc<dyn SignatureOps>>,
    exchanger: Option<Arc<dyn KeyExchangeOps>>,
    digest: Option<Arc<dyn DigestOps>>,
}

impl Adapter {
    /// Build an adapter, generating fresh key material.
    ///
    /// Fails with `Configuration` when the key size is outside what the
    /// algorithm accepts, and with `Crypto` when key generation itself fails.
    pub fn new(algorithm: Algorithm, key_size: Option<KeySize>) -> BenchResult<Self> {
        ValidationUtils::validate_key_size(algorithm, key_size.as_ref())?;

        let mut adapter = Self {
            algorithm,
            key_size: key_size.clone(),
            cipher: None,
            signer: None,
            exchanger: None,
            digest: None,
        };

        let bits = key_size.as_ref().and_then(KeySize::bits).unwrap_or_default();
        match algorithm {
            Algorithm::Aes => adapter.cipher = Some(Arc::new(AesGcmEngine::generate(bits)?)),
            Algorithm::Des | Algorithm::TripleDes | Algorithm::Rc2 | Algorithm::Blowfish => {
                adapter.cipher = Some(Arc::new(CbcEngine::generate(algorithm, bits)?))
            }
            Algorithm::Rc4 => adapter.cipher = Some(Arc::new(Rc4Engine::generate(bits)?)),
            Algorithm::Rsa => {
                let engine = Arc::new(RsaEngine::generate(bits)?);
                adapter.cipher = Some(engine.clone());
                adapter.signer = Some(engine);
            }
            Algorithm::Dsa => adapter.signer = Some(Arc::new(DsaEngine::generate(bits)?)),
            Algorithm::Ecc => {
                let curve = key_size.as_ref().map(|k| k.to_string()).unwrap_or_default();
                let engine: Arc<dyn SignatureOps> = match curve.as_str() {
                    "P-256" => Arc::new(P256Engine::generate()),
                    "P-384" => Arc::new(P384Engine::generate()),
                    "P-521" => Arc::new(P521Engine::generate()),
                    other => bench_bail!(Configuration, "Unsupported curve: {}", other),
                };
                adapter.signer = Some(engine);
            }
            Algorithm::DiffieHellman => {
                adapter.exchanger = Some(Arc::new(DhEngine::generate(bits)?))
            }
            _ => adapter.digest = Some(Arc::new(DigestEngine::new(algorithm)?)),
        }

        Ok(adapter)
    }

    /// Algorithm this adapter drives
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Key size the adapter was built with
    pub fn key_size(&self) -> Option<&KeySize> {
        self.key_size.as_ref()
    }

    /// Whether the adapter can perform `operation`
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Encryption | Operation::Decryption => self.cipher.is_some(),
            Operation::Signing | Operation::Verification => self.signer.is_some(),
            Operation::KeyExchange => self.exchanger.is_some(),
            Operation::Hashing => self.digest.is_some(),
        }
    }

    /// Operations this adapter supports, in reporting order
    pub fn operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }

    fn unsupported(&self, operation: Operation) -> BenchError {
        BenchError::config(format!("{} does not support {}", self.algorithm, operation))
    }

    /// Encrypt text or raw bytes
    pub fn encrypt(&self, plaintext: impl AsRef<[u8]>) -> BenchResult<Vec<u8>> {
        let cipher = self
            .cipher
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::Encryption))?;
        cipher.encrypt(plaintext.as_ref())
    }

    /// Decrypt output of [`Adapter::encrypt`]
    pub fn decrypt(&self, ciphertext: impl AsRef<[u8]>) -> BenchResult<Vec<u8>> {
        let cipher = self
            .cipher
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::Decryption))?;
        cipher.decrypt(ciphertext.as_ref())
    }

    /// Sign text or raw bytes
    pub fn sign(&self, message: impl AsRef<[u8]>) -> BenchResult<Vec<u8>> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::Signing))?;
        signer.sign(message.as_ref())
    }

    /// Check a signature produced by [`Adapter::sign`]
    pub fn verify(&self, message: impl AsRef<[u8]>, signature: &[u8]) -> BenchResult<bool> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::Verification))?;
        signer.verify(message.as_ref(), signature)
    }

    /// Our public value for key exchange
    pub fn public_key(&self) -> BenchResult<Vec<u8>> {
        let exchanger = self
            .exchanger
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::KeyExchange))?;
        Ok(exchanger.public_key())
    }

    /// Public value of a fresh peer, for driving [`Adapter::exchange`]
    pub fn generate_peer_public_key(&self) -> BenchResult<Vec<u8>> {
        let exchanger = self
            .exchanger
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::KeyExchange))?;
        exchanger.generate_peer_public_key()
    }

    /// Derive the shared secret with a peer
    pub fn exchange(&self, peer_public_key: &[u8]) -> BenchResult<Vec<u8>> {
        let exchanger = self
            .exchanger
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::KeyExchange))?;
        exchanger.exchange(peer_public_key)
    }

    /// Digest text or raw bytes
    pub fn hash(&self, data: impl AsRef<[u8]>) -> BenchResult<Vec<u8>> {
        let digest = self
            .digest
            .as_ref()
            .ok_or_else(|| self.unsupported(Operation::Hashing))?;
        digest.hash(data.as_ref())
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("algorithm", &self.algorithm)
            .field("key_size", &self.key_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_match_algorithm_table() {
        let fast = [
            (Algorithm::Aes, Some(KeySize::Bits(128))),
            (Algorithm::Des, Some(KeySize::Bits(64))),
            (Algorithm::TripleDes, Some(KeySize::Bits(192))),
            (Algorithm::Rc2, Some(KeySize::Bits(64))),
            (Algorithm::Rc4, Some(KeySize::Bits(40))),
            (Algorithm::Blowfish, Some(KeySize::Bits(128))),
            (Algorithm::Rsa, Some(KeySize::Bits(1024))),
            (Algorithm::Ecc, Some(KeySize::Named("P-256".to_string()))),
            (Algorithm::DiffieHellman, Some(KeySize::Bits(512))),
            (Algorithm::Sha256, None),
            (Algorithm::Shake256, None),
        ];
        for (algorithm, key_size) in fast {
            let adapter = Adapter::new(algorithm, key_size).unwrap();
            assert_eq!(adapter.operations(), algorithm.operations(), "{algorithm}");
        }
    }

    #[test]
    fn test_text_and_bytes_inputs() {
        let adapter = Adapter::new(Algorithm::Aes, Some(KeySize::Bits(256))).unwrap();
        let from_text = adapter.encrypt("hello").unwrap();
        let from_bytes = adapter.encrypt(b"hello".to_vec()).unwrap();
        assert_eq!(adapter.decrypt(&from_text).unwrap(), b"hello");
        assert_eq!(adapter.decrypt(from_bytes).unwrap(), b"hello");
    }

    #[test]
    fn test_unsupported_operation_is_configuration_error() {
        let adapter = Adapter::new(Algorithm::Md5, None).unwrap();
        assert!(matches!(
            adapter.encrypt("data"),
            Err(BenchError::Configuration(_))
        ));
        assert!(adapter.hash("data").is_ok());
    }

    #[test]
    fn test_out_of_range_key_size() {
        let err = Adapter::new(Algorithm::Des, Some(KeySize::Bits(56))).unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)));
        assert!(Adapter::new(Algorithm::Aes, None).is_err());
        assert!(Adapter::new(Algorithm::Sha1, Some(KeySize::Bits(160))).is_err());
    }

    #[test]
    fn test_exchange_through_adapter() {
        let adapter = Adapter::new(Algorithm::DiffieHellman, Some(KeySize::Bits(512))).unwrap();
        let peer = adapter.generate_peer_public_key().unwrap();
        assert_eq!(adapter.exchange(&peer).unwrap().len(), 32);
        assert!(!adapter.public_key().unwrap().is_empty());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let adapter = Adapter::new(Algorithm::Rc4, Some(KeySize::Bits(128))).unwrap();
        let debug = format!("{:?}", adapter);
        assert!(debug.contains("Rc4"));
        assert!(!debug.contains("key:"));
    }
}
