//! Public key engines: RSA, DSA and ECDSA over the NIST curves

use crate::traits::{CipherOps, SignatureOps};
use cryptoperf_common::prelude::*;
use rand::rngs::OsRng;
use rsa::pkcs1v15;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// SHA-256 output length, which sizes the OAEP overhead
const OAEP_HASH_LEN: usize = 32;

/// RSA with OAEP(SHA-256) encryption and PKCS#1 v1.5(SHA-256) signatures.
///
/// Messages longer than one OAEP block are split into chunks, each
/// encrypted to a full modulus-sized block.
pub struct RsaEngine {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    signing_key: pkcs1v15::SigningKey<Sha256>,
    verifying_key: pkcs1v15::VerifyingKey<Sha256>,
}

impl RsaEngine {
    /// Generate a key pair with a modulus of `bits`
    pub fn generate(bits: u32) -> BenchResult<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits as usize)
            .map_err(|e| BenchError::crypto(format!("RSA key generation failed: {}", e)))?;
        let public_key = RsaPublicKey::from(&private_key);
        let signing_key = pkcs1v15::SigningKey::<Sha256>::new(private_key.clone());
        let verifying_key = pkcs1v15::VerifyingKey::<Sha256>::new(public_key.clone());

        Ok(Self {
            private_key,
            public_key,
            signing_key,
            verifying_key,
        })
    }

    /// Modulus length in bytes
    pub fn block_len(&self) -> usize {
        self.public_key.size()
    }

    /// Largest plaintext chunk one OAEP block can carry
    pub fn max_chunk_len(&self) -> usize {
        self.block_len() - 2 * OAEP_HASH_LEN - 2
    }
}

impl CipherOps for RsaEngine {
    fn encrypt(&self, plaintext: &[u8]) -> BenchResult<Vec<u8>> {
        let chunk_len = self.max_chunk_len();
        let mut rng = OsRng;
        let mut out = Vec::with_capacity(plaintext.len().div_ceil(chunk_len).max(1) * self.block_len());

        // An empty message still produces one block so decryption round-trips
        let chunks: Vec<&[u8]> = if plaintext.is_empty() {
            vec![plaintext]
        } else {
            plaintext.chunks(chunk_len).collect()
        };

        for chunk in chunks {
            let block = self
                .public_key
                .encrypt(&mut rng, Oaep::new::<Sha256>(), chunk)
                .map_err(|e| BenchError::crypto(format!("RSA-OAEP encryption failed: {}", e)))?;
            out.extend_from_slice(&block);
        }
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> BenchResult<Vec<u8>> {
        let block_len = self.block_len();
        if ciphertext.is_empty() || ciphertext.len() % block_len != 0 {
            bench_bail!(
                Crypto,
                "RSA ciphertext length {} is not a multiple of the {}-byte block",
                ciphertext.len(),
                block_len
            );
        }

        let mut out = Vec::with_capacity(ciphertext.len());
        for block in ciphertext.chunks(block_len) {
            let chunk = self
                .private_key
                .decrypt(Oaep::new::<Sha256>(), block)
                .map_err(|e| BenchError::crypto(format!("RSA-OAEP decryption failed: {}", e)))?;
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

impl SignatureOps for RsaEngine {
    fn sign(&self, message: &[u8]) -> BenchResult<Vec<u8>> {
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut OsRng, message)
            .map_err(|e| BenchError::crypto(format!("RSA signing failed: {}", e)))?;
        Ok(signature.to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> BenchResult<bool> {
        let signature = pkcs1v15::Signature::try_from(signature)
            .map_err(|e| BenchError::crypto(format!("Malformed RSA signature: {}", e)))?;
        Ok(self.verifying_key.verify(message, &signature).is_ok())
    }
}

/// DSA over SHA-256 with freshly generated domain parameters
pub struct DsaEngine {
    signing_key: dsa::SigningKey,
    verifying_key: dsa::VerifyingKey,
}

impl DsaEngine {
    /// Generate parameters and a key pair for an L of `bits` (1024, 2048 or 3072)
    #[allow(deprecated)]
    pub fn generate(bits: u32) -> BenchResult<Self> {
        let key_size = match bits {
            1024 => dsa::KeySize::DSA_1024_160,
            2048 => dsa::KeySize::DSA_2048_256,
            3072 => dsa::KeySize::DSA_3072_256,
            other => bench_bail!(Configuration, "DSA key size must be 1024, 2048 or 3072 bits, got {}", other),
        };

        let mut rng = OsRng;
        let components = dsa::Components::generate(&mut rng, key_size);
        let signing_key = dsa::SigningKey::generate(&mut rng, components);
        let verifying_key = signing_key.verifying_key().clone();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }
}

impl SignatureOps for DsaEngine {
    fn sign(&self, message: &[u8]) -> BenchResult<Vec<u8>> {
        use rsa::signature::DigestSigner;

        let signature: dsa::Signature = self
            .signing_key
            .try_sign_digest(Sha256::new_with_prefix(message))
            .map_err(|e| BenchError::crypto(format!("DSA signing failed: {}", e)))?;
        Ok(signature.to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> BenchResult<bool> {
        use rsa::signature::DigestVerifier;

        let signature = dsa::Signature::try_from(signature)
            .map_err(|e| BenchError::crypto(format!("Malformed DSA signature: {}", e)))?;
        Ok(self
            .verifying_key
            .verify_digest(Sha256::new_with_prefix(message), &signature)
            .is_ok())
    }
}

// Each curve crate exposes the same ECDSA surface under its own module
macro_rules! ecdsa_engine {
    ($name:ident, $curve:ident, $label:literal) => {
        #[doc = concat!("ECDSA over ", $label, " using the curve's standard digest")]
        pub struct $name {
            signing_key: $curve::ecdsa::SigningKey,
            verifying_key: $curve::ecdsa::VerifyingKey,
        }

        impl $name {
            /// Generate a random key pair
            #[allow(clippy::clone_on_copy, clippy::redundant_clone)]
            pub fn generate() -> Self {
                let signing_key = $curve::ecdsa::SigningKey::random(&mut OsRng);
                let verifying_key = $curve::ecdsa::VerifyingKey::from(&signing_key);
                Self {
                    signing_key,
                    verifying_key,
                }
            }
        }

        impl SignatureOps for $name {
            fn sign(&self, message: &[u8]) -> BenchResult<Vec<u8>> {
                use $curve::ecdsa::signature::Signer;

                let signature: $curve::ecdsa::Signature = self
                    .signing_key
                    .try_sign(message)
                    .map_err(|e| BenchError::crypto(format!("{} signing failed: {}", $label, e)))?;
                Ok(signature.to_bytes().to_vec())
            }

            fn verify(&self, message: &[u8], signature: &[u8]) -> BenchResult<bool> {
                use $curve::ecdsa::signature::Verifier;

                let signature = $curve::ecdsa::Signature::from_slice(signature).map_err(|e| {
                    BenchError::crypto(format!("Malformed {} signature: {}", $label, e))
                })?;
                Ok(self.verifying_key.verify(message, &signature).is_ok())
            }
        }
    };
}

ecdsa_engine!(P256Engine, p256, "P-256");
ecdsa_engine!(P384Engine, p384, "P-384");
ecdsa_engine!(P521Engine, p521, "P-521");
