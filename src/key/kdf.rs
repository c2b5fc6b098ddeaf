//! Passphrase key derivation: PBKDF2-HMAC-SHA256

use crate::crypto::AesKey;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

/// PBKDF2 iteration count
pub const KDF_ROUNDS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_LEN: usize = 32;

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from `passphrase` and `salt`
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> AesKey {
    let mut key = AesKey::zeroed();
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, KDF_ROUNDS, key.as_mut_slice());
    key
}

/// Derive a key under a freshly generated salt
pub fn derive_key_with_new_salt(passphrase: &[u8]) -> (AesKey, [u8; SALT_LEN]) {
    let salt = generate_salt();
    (derive_key(passphrase, &salt), salt)
}
