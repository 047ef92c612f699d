//! Block and stream cipher engines

use crate::traits::CipherOps;
use aes_gcm::aead::generic_array::{typenum::Unsigned, GenericArray};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::consts::{U10, U12, U128, U16, U20, U24, U256, U32, U5, U64, U7, U8};
use cbc::cipher::generic_array::ArrayLength;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser, KeyIvInit, StreamCipher};
use cryptoperf_common::prelude::*;
use cryptoperf_common::validation::RC4_KEY_BITS;
use rc4::Rc4;
use rand::RngCore;

type Aes192Gcm = AesGcm<aes_gcm::aes::Aes192, aes_gcm::aead::consts::U12>;

/// AES in GCM mode. Ciphertexts are laid out as `nonce || ciphertext || tag`.
pub struct AesGcmEngine {
    cipher: AesGcmVariant,
}

enum AesGcmVariant {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl AesGcmEngine {
    /// Generate a fresh key of `bits` (128, 192 or 256)
    pub fn generate(bits: u32) -> BenchResult<Self> {
        let key = random_bytes((bits / 8) as usize);
        let invalid = |e| BenchError::crypto(format!("Invalid AES key: {}", e));
        let cipher = match bits {
            128 => AesGcmVariant::Aes128(Aes128Gcm::new_from_slice(&key).map_err(invalid)?),
            192 => AesGcmVariant::Aes192(Aes192Gcm::new_from_slice(&key).map_err(invalid)?),
            256 => AesGcmVariant::Aes256(Aes256Gcm::new_from_slice(&key).map_err(invalid)?),
            other => bench_bail!(Configuration, "AES key size must be 128, 192 or 256 bits, got {}", other),
        };
        Ok(Self { cipher })
    }
}

fn gcm_encrypt<C: Aead + AeadCore>(cipher: &C, plaintext: &[u8]) -> BenchResult<Vec<u8>> {
    let nonce = C::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| BenchError::crypto(format!("AES-GCM encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn gcm_decrypt<C: Aead + AeadCore>(cipher: &C, data: &[u8]) -> BenchResult<Vec<u8>> {
    let nonce_len = C::NonceSize::USIZE;
    if data.len() < nonce_len {
        bench_bail!(Crypto, "AES-GCM ciphertext shorter than its nonce ({} bytes)", data.len());
    }
    let (nonce, ciphertext) = data.split_at(nonce_len);
    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|e| BenchError::crypto(format!("AES-GCM decryption failed: {}", e)))
}

impl CipherOps for AesGcmEngine {
    fn encrypt(&self, plaintext: &[u8]) -> BenchResult<Vec<u8>> {
        match &self.cipher {
            AesGcmVariant::Aes128(c) => gcm_encrypt(c, plaintext),
            AesGcmVariant::Aes192(c) => gcm_encrypt(c, plaintext),
            AesGcmVariant::Aes256(c) => gcm_encrypt(c, plaintext),
        }
    }

    fn decrypt(&self, ciphertext: &[u8]) -> BenchResult<Vec<u8>> {
        match &self.cipher {
            AesGcmVariant::Aes128(c) => gcm_decrypt(c, ciphertext),
            AesGcmVariant::Aes192(c) => gcm_decrypt(c, ciphertext),
            AesGcmVariant::Aes256(c) => gcm_decrypt(c, ciphertext),
        }
    }
}

/// Block ciphers run in CBC mode with PKCS#7 padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbcCipher {
    Des,
    TdesEde2,
    TdesEde3,
    Rc2,
    Blowfish,
}

/// CBC engine holding a key and a per-engine IV.
/// Ciphertexts are laid out as `iv || ciphertext`.
pub struct CbcEngine {
    kind: CbcCipher,
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl CbcEngine {
    /// Generate key and IV for `algorithm` at `bits`
    pub fn generate(algorithm: Algorithm, bits: u32) -> BenchResult<Self> {
        let kind = match (algorithm, bits) {
            (Algorithm::Des, 64) => CbcCipher::Des,
            (Algorithm::TripleDes, 128) => CbcCipher::TdesEde2,
            (Algorithm::TripleDes, 192) => CbcCipher::TdesEde3,
            (Algorithm::Rc2, _) => CbcCipher::Rc2,
            (Algorithm::Blowfish, _) => CbcCipher::Blowfish,
            _ => bench_bail!(Configuration, "{} does not support a {}-bit key in CBC mode", algorithm, bits),
        };

        let engine = Self {
            kind,
            key: random_bytes((bits / 8) as usize),
            iv: random_bytes(kind.block_size()),
        };
        // Surface bad key lengths at construction rather than on first use
        engine.encrypt(&[])?;
        Ok(engine)
    }

    /// Which block cipher this engine drives
    pub fn kind(&self) -> CbcCipher {
        self.kind
    }
}

impl CbcCipher {
    fn block_size(self) -> usize {
        match self {
            CbcCipher::Des => <des::Des as BlockSizeUser>::block_size(),
            CbcCipher::TdesEde2 => <des::TdesEde2 as BlockSizeUser>::block_size(),
            CbcCipher::TdesEde3 => <des::TdesEde3 as BlockSizeUser>::block_size(),
            CbcCipher::Rc2 => <rc2::Rc2 as BlockSizeUser>::block_size(),
            CbcCipher::Blowfish => <blowfish::Blowfish as BlockSizeUser>::block_size(),
        }
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> BenchResult<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + cbc::cipher::KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| BenchError::crypto(format!("Invalid CBC key or IV length: {}", e)))?;
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(iv.len() + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn cbc_decrypt<C>(key: &[u8], iv_len: usize, data: &[u8]) -> BenchResult<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + cbc::cipher::KeyInit,
{
    if data.len() < iv_len {
        bench_bail!(Crypto, "CBC ciphertext shorter than its IV ({} bytes)", data.len());
    }
    let (iv, ciphertext) = data.split_at(iv_len);
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| BenchError::crypto(format!("Invalid CBC key or IV length: {}", e)))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| BenchError::crypto(format!("CBC unpadding failed: {}", e)))
}

impl CipherOps for CbcEngine {
    fn encrypt(&self, plaintext: &[u8]) -> BenchResult<Vec<u8>> {
        match self.kind {
            CbcCipher::Des => cbc_encrypt::<des::Des>(&self.key, &self.iv, plaintext),
            CbcCipher::TdesEde2 => cbc_encrypt::<des::TdesEde2>(&self.key, &self.iv, plaintext),
            CbcCipher::TdesEde3 => cbc_encrypt::<des::TdesEde3>(&self.key, &self.iv, plaintext),
            CbcCipher::Rc2 => cbc_encrypt::<rc2::Rc2>(&self.key, &self.iv, plaintext),
            CbcCipher::Blowfish => cbc_encrypt::<blowfish::Blowfish>(&self.key, &self.iv, plaintext),
        }
    }

    fn decrypt(&self, ciphertext: &[u8]) -> BenchResult<Vec<u8>> {
        let iv_len = self.iv.len();
        match self.kind {
            CbcCipher::Des => cbc_decrypt::<des::Des>(&self.key, iv_len, ciphertext),
            CbcCipher::TdesEde2 => cbc_decrypt::<des::TdesEde2>(&self.key, iv_len, ciphertext),
            CbcCipher::TdesEde3 => cbc_decrypt::<des::TdesEde3>(&self.key, iv_len, ciphertext),
            CbcCipher::Rc2 => cbc_decrypt::<rc2::Rc2>(&self.key, iv_len, ciphertext),
            CbcCipher::Blowfish => cbc_decrypt::<blowfish::Blowfish>(&self.key, iv_len, ciphertext),
        }
    }
}

/// RC4 keystream engine. Encryption and decryption are the same operation.
///
/// Each call starts a fresh keystream from the key, so the same plaintext
/// always maps to the same ciphertext.
pub struct Rc4Engine {
    key: Vec<u8>,
}

impl Rc4Engine {
    /// Generate a key of `bits`, one of [`RC4_KEY_BITS`]
    pub fn generate(bits: u32) -> BenchResult<Self> {
        if !RC4_KEY_BITS.contains(&bits) {
            bench_bail!(Configuration, "RC4 key must be one of {:?} bits, got {}", RC4_KEY_BITS, bits);
        }
        Ok(Self::with_key(random_bytes((bits / 8) as usize)))
    }

    fn with_key(key: Vec<u8>) -> Self {
        Self { key }
    }

    fn apply(&self, data: &[u8]) -> BenchResult<Vec<u8>> {
        let mut out = data.to_vec();
        match self.key.len() {
            5 => rc4_keystream::<U5>(&self.key, &mut out)?,
            7 => rc4_keystream::<U7>(&self.key, &mut out)?,
            8 => rc4_keystream::<U8>(&self.key, &mut out)?,
            10 => rc4_keystream::<U10>(&self.key, &mut out)?,
            12 => rc4_keystream::<U12>(&self.key, &mut out)?,
            16 => rc4_keystream::<U16>(&self.key, &mut out)?,
            20 => rc4_keystream::<U20>(&self.key, &mut out)?,
            24 => rc4_keystream::<U24>(&self.key, &mut out)?,
            32 => rc4_keystream::<U32>(&self.key, &mut out)?,
            64 => rc4_keystream::<U64>(&self.key, &mut out)?,
            128 => rc4_keystream::<U128>(&self.key, &mut out)?,
            256 => rc4_keystream::<U256>(&self.key, &mut out)?,
            other => bench_bail!(Internal, "no RC4 instance for a {}-byte key", other),
        }
        Ok(out)
    }
}

fn rc4_keystream<N: ArrayLength<u8>>(key: &[u8], data: &mut [u8]) -> BenchResult<()> {
    let mut cipher = Rc4::<N>::new_from_slice(key)
        .map_err(|e| BenchError::crypto(format!("Invalid RC4 key length: {}", e)))?;
    cipher.apply_keystream(data);
    Ok(())
}

impl CipherOps for Rc4Engine {
    fn encrypt(&self, plaintext: &[u8]) -> BenchResult<Vec<u8>> {
        self.apply(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> BenchResult<Vec<u8>> {
        self.apply(ciphertext)
    }
}

pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}
