//! Hash functions and HMAC

use crate::symmetric::random_bytes;
use crate::traits::DigestOps;
use cryptoperf_common::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Digest;
use sha3::digest::{ExtendableOutput, Update, XofReader};

/// HMAC key length
pub const HMAC_KEY_LEN: usize = 16;

/// Digest output lengths for the extendable-output functions
pub const SHAKE128_OUTPUT_LEN: usize = 32;
pub const SHAKE256_OUTPUT_LEN: usize = 64;

/// A digest algorithm, with the HMAC key when there is one
pub enum DigestEngine {
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
    HmacSha256 { key: Vec<u8> },
}

impl DigestEngine {
    /// Engine for a hash-family algorithm
    pub fn new(algorithm: Algorithm) -> BenchResult<Self> {
        let engine = match algorithm {
            Algorithm::Sha1 => DigestEngine::Sha1,
            Algorithm::Sha224 => DigestEngine::Sha224,
            Algorithm::Sha256 => DigestEngine::Sha256,
            Algorithm::Sha384 => DigestEngine::Sha384,
            Algorithm::Sha512 => DigestEngine::Sha512,
            Algorithm::Sha3_224 => DigestEngine::Sha3_224,
            Algorithm::Sha3_256 => DigestEngine::Sha3_256,
            Algorithm::Sha3_384 => DigestEngine::Sha3_384,
            Algorithm::Sha3_512 => DigestEngine::Sha3_512,
            Algorithm::Shake128 => DigestEngine::Shake128,
            Algorithm::Shake256 => DigestEngine::Shake256,
            Algorithm::Md5 => DigestEngine::Md5,
            Algorithm::HmacSha256 => DigestEngine::HmacSha256 {
                key: random_bytes(HMAC_KEY_LEN),
            },
            other => bench_bail!(Configuration, "{} is not a hash algorithm", other),
        };
        Ok(engine)
    }
}

fn fixed<D: Digest>(data: &[u8]) -> Vec<u8> {
    D::digest(data).to_vec()
}

fn xof<X: Default + Update + ExtendableOutput>(data: &[u8], len: usize) -> Vec<u8> {
    let mut hasher = X::default();
    hasher.update(data);
    let mut out = vec![0u8; len];
    hasher.finalize_xof().read(&mut out);
    out
}

impl DigestOps for DigestEngine {
    fn hash(&self, data: &[u8]) -> BenchResult<Vec<u8>> {
        let out = match self {
            DigestEngine::Sha1 => fixed::<sha1::Sha1>(data),
            DigestEngine::Sha224 => fixed::<sha2::Sha224>(data),
            DigestEngine::Sha256 => fixed::<sha2::Sha256>(data),
            DigestEngine::Sha384 => fixed::<sha2::Sha384>(data),
            DigestEngine::Sha512 => fixed::<sha2::Sha512>(data),
            DigestEngine::Sha3_224 => fixed::<sha3::Sha3_224>(data),
            DigestEngine::Sha3_256 => fixed::<sha3::Sha3_256>(data),
            DigestEngine::Sha3_384 => fixed::<sha3::Sha3_384>(data),
            DigestEngine::Sha3_512 => fixed::<sha3::Sha3_512>(data),
            DigestEngine::Shake128 => xof::<sha3::Shake128>(data, SHAKE128_OUTPUT_LEN),
            DigestEngine::Shake256 => xof::<sha3::Shake256>(data, SHAKE256_OUTPUT_LEN),
            DigestEngine::Md5 => fixed::<md5::Md5>(data),
            DigestEngine::HmacSha256 { key } => {
                let mut mac = Hmac::<sha2::Sha256>::new_from_slice(key)
                    .map_err(|e| BenchError::crypto(format!("Invalid HMAC key: {}", e)))?;
                Mac::update(&mut mac, data);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(out)
    }
}
