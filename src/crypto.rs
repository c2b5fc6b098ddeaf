//! AES-256-GCM sealing for claim payloads and encrypted key envelopes
//!
//! A sealed blob is laid out as `nonce[12] || ciphertext || tag[16]`, the
//! same layout the container's ciphertext section carries.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key size in bytes
pub const KEY_LEN: usize = 32;
/// 96-bit GCM nonce
pub const NONCE_LEN: usize = 12;
/// 128-bit GCM authentication tag
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Tag mismatch: wrong key, or the data was modified
    #[error("authentication failed: ciphertext or key does not match")]
    Authentication,

    #[error("encryption failed")]
    Encryption,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("sealed data too short: {len} bytes, need at least {min}")]
    SealedTooShort { len: usize, min: usize },
}

/// AES-256 key (32 bytes) that zeroizes on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey([u8; KEY_LEN]);

impl AesKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        AesKey(key)
    }

    /// Create a key from a 32-byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                got: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(AesKey(key))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// All-zero key, for filling in place (KDF output)
    pub(crate) fn zeroed() -> Self {
        AesKey([0u8; KEY_LEN])
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}

/// Generate a random 96-bit nonce
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn cipher(key: &AesKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0))
}

/// Encrypt under an explicit nonce, returning `ciphertext || tag`
pub fn encrypt_with_nonce(
    key: &AesKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)
}

/// Decrypt `ciphertext || tag` under an explicit nonce
pub fn decrypt_with_nonce(
    key: &AesKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::SealedTooShort {
            len: ciphertext.len(),
            min: TAG_LEN,
        });
    }
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}

/// Encrypt with a fresh random nonce; output is `nonce || ciphertext || tag`
pub fn seal(key: &AesKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce = generate_nonce();
    let ciphertext = encrypt_with_nonce(key, &nonce, plaintext)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverse of [`seal`]. Nothing is returned unless the tag verifies.
pub fn open(key: &AesKey, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::SealedTooShort {
            len: sealed.len(),
            min: NONCE_LEN + TAG_LEN,
        });
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let mut nonce_arr = [0u8; NONCE_LEN];
    nonce_arr.copy_from_slice(nonce);
    decrypt_with_nonce(key, &nonce_arr, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() -> Result<(), CryptoError> {
        let key = AesKey::generate();
        let data = b"Hello, license!";

        let sealed = seal(&key, data)?;
        assert_eq!(sealed.len(), NONCE_LEN + data.len() + TAG_LEN);

        let opened = open(&key, &sealed)?;
        assert_eq!(data, opened.as_slice());
        Ok(())
    }

    #[test]
    fn test_open_with_wrong_key_fails() -> Result<(), CryptoError> {
        let sealed = seal(&AesKey::generate(), b"secret")?;
        let result = open(&AesKey::generate(), &sealed);
        assert!(matches!(result, Err(CryptoError::Authentication)));
        Ok(())
    }

    #[test]
    fn test_open_detects_tampering() -> Result<(), CryptoError> {
        let key = AesKey::generate();
        let mut sealed = seal(&key, b"secret")?;
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(open(&key, &sealed), Err(CryptoError::Authentication)));
        Ok(())
    }

    #[test]
    fn test_open_short_input() {
        let key = AesKey::generate();
        let result = open(&key, &[0u8; NONCE_LEN + TAG_LEN - 1]);
        assert!(matches!(result, Err(CryptoError::SealedTooShort { .. })));
    }

    #[test]
    fn test_invalid_key_length() {
        let result = AesKey::from_slice(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength { expected: 32, got: 16 })
        ));
    }

    #[test]
    fn test_generated_keys_and_nonces_differ() {
        assert_ne!(AesKey::generate().as_slice(), AesKey::generate().as_slice());
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
