//! RSA key wrapping schemes
//!
//! [`RsaOaepKem`] is RSA-OAEP with SHA-256 and a fixed label, used for
//! requests. [`RsaIssuerKem`] is the license scheme: the payload key is
//! padded with PKCS#1 v1.5 block type 1 (`00 01 FF.. 00 || key`) and raised
//! to the private exponent, so the public exponent recovers it. It proves the
//! wrapped key came from the private-key holder; it hides nothing from a
//! holder of the public key.

use super::{KemError, KeyEncapsulation};
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

/// Domain-separation label for request key wrapping
pub const OAEP_LABEL: &str = "superlicense";

/// Minimum number of 0xFF padding bytes in a type-1 block
const MIN_PADDING: usize = 8;

/// RSA-OAEP (SHA-256, labelled) key encapsulation for requests
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaOaepKem;

impl RsaOaepKem {
    fn padding() -> Oaep {
        Oaep::new_with_label::<Sha256, _>(OAEP_LABEL)
    }
}

impl KeyEncapsulation for RsaOaepKem {
    type WrapKey = RsaPublicKey;
    type UnwrapKey = RsaPrivateKey;

    fn wrap(&self, key: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, KemError> {
        public_key
            .encrypt(&mut OsRng, Self::padding(), key)
            .map_err(|e| KemError::WrapError(format!("RSA-OAEP encryption failed: {}", e)))
    }

    fn unwrap(&self, wrapped: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, KemError> {
        private_key
            .decrypt(Self::padding(), wrapped)
            .map_err(|e| KemError::UnwrapError(format!("RSA-OAEP decryption failed: {}", e)))
    }
}

/// Private-key wrap / public-key unwrap used by licenses
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaIssuerKem;

impl KeyEncapsulation for RsaIssuerKem {
    type WrapKey = RsaPrivateKey;
    type UnwrapKey = RsaPublicKey;

    fn wrap(&self, key: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, KemError> {
        let k = private_key.size();
        if key.len() + 3 + MIN_PADDING > k {
            return Err(KemError::KeyTooLarge {
                len: key.len(),
                modulus_len: k,
            });
        }

        // Unprefixed PKCS#1 v1.5 signing: the type-1 block raised to d, blinded
        private_key
            .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new_unprefixed(), key)
            .map_err(|e| KemError::WrapError(format!("RSA private-key wrap failed: {}", e)))
    }

    fn unwrap(&self, wrapped: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, KemError> {
        let k = public_key.size();
        if wrapped.len() != k {
            return Err(KemError::UnwrapError(format!(
                "wrapped key is {} bytes, modulus is {}",
                wrapped.len(),
                k
            )));
        }

        let c = BigUint::from_bytes_be(wrapped);
        if &c >= public_key.n() {
            return Err(KemError::UnwrapError(
                "wrapped key out of range for modulus".to_string(),
            ));
        }
        let em = left_pad(&c.modpow(public_key.e(), public_key.n()).to_bytes_be(), k);

        if em[0] != 0x00 || em[1] != 0x01 {
            return Err(KemError::UnwrapError("invalid block type".to_string()));
        }
        let separator = em[2..]
            .iter()
            .position(|&b| b != 0xFF)
            .map(|i| i + 2)
            .ok_or_else(|| KemError::UnwrapError("missing padding separator".to_string()))?;
        if em[separator] != 0x00 || separator - 2 < MIN_PADDING {
            return Err(KemError::UnwrapError("malformed padding".to_string()));
        }

        Ok(em[separator + 1..].to_vec())
    }
}

fn left_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes.to_vec();
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn test_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).unwrap())
    }

    #[test]
    fn test_oaep_roundtrip() {
        let private_key = test_key();
        let public_key = RsaPublicKey::from(private_key);
        let kem = RsaOaepKem;

        let key = b"test_payload_key_32_bytes_long!!";
        let wrapped = kem.wrap(key, &public_key).unwrap();
        assert_eq!(wrapped.len(), 256);

        let unwrapped = kem.unwrap(&wrapped, private_key).unwrap();
        assert_eq!(key.as_slice(), unwrapped.as_slice());
    }

    #[test]
    fn test_oaep_label_is_enforced() {
        let private_key = test_key();
        let public_key = RsaPublicKey::from(private_key);

        // Wrapped without the label, the labelled unwrap must refuse it
        let wrapped = public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &[7u8; 32])
            .unwrap();
        assert!(RsaOaepKem.unwrap(&wrapped, private_key).is_err());
    }

    #[test]
    fn test_oaep_corrupted_ciphertext() {
        let private_key = test_key();
        let public_key = RsaPublicKey::from(private_key);
        let kem = RsaOaepKem;

        let mut wrapped = kem.wrap(&[1u8; 32], &public_key).unwrap();
        wrapped[10] ^= 0xFF;
        assert!(kem.unwrap(&wrapped, private_key).is_err());
    }

    #[test]
    fn test_issuer_roundtrip() {
        let private_key = test_key();
        let public_key = RsaPublicKey::from(private_key);
        let kem = RsaIssuerKem;

        let key = [0x42u8; 32];
        let wrapped = kem.wrap(&key, private_key).unwrap();
        assert_eq!(wrapped.len(), 256);

        let unwrapped = kem.unwrap(&wrapped, &public_key).unwrap();
        assert_eq!(key.as_slice(), unwrapped.as_slice());
    }

    #[test]
    fn test_issuer_wrap_is_type1_block_under_public_exponent() {
        let private_key = test_key();
        let public_key = RsaPublicKey::from(private_key);
        let key = [0x42u8; 32];

        let wrapped = RsaIssuerKem.wrap(&key, private_key).unwrap();
        let em = left_pad(
            &BigUint::from_bytes_be(&wrapped)
                .modpow(public_key.e(), public_key.n())
                .to_bytes_be(),
            256,
        );

        assert_eq!(&em[..2], &[0x00, 0x01]);
        assert!(em[2..256 - 33].iter().all(|&b| b == 0xFF));
        assert_eq!(em[256 - 33], 0x00);
        assert_eq!(&em[256 - 32..], key.as_slice());
    }

    #[test]
    fn test_issuer_wrap_is_deterministic() {
        // Type-1 padding has no randomness; identical input wraps identically
        let private_key = test_key();
        let a = RsaIssuerKem.wrap(&[9u8; 32], private_key).unwrap();
        let b = RsaIssuerKem.wrap(&[9u8; 32], private_key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_issuer_unwrap_with_other_key_fails() {
        let private_key = test_key();
        let other = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let wrapped = RsaIssuerKem.wrap(&[5u8; 32], private_key).unwrap();

        let result = RsaIssuerKem.unwrap(&wrapped, &RsaPublicKey::from(&other));
        assert!(result.is_err());
    }

    #[test]
    fn test_issuer_rejects_wrong_length() {
        let public_key = RsaPublicKey::from(test_key());
        let result = RsaIssuerKem.unwrap(&[0u8; 128], &public_key);
        assert!(matches!(result, Err(KemError::UnwrapError(_))));
    }

    #[test]
    fn test_issuer_rejects_oversized_key() {
        let result = RsaIssuerKem.wrap(&[0u8; 250], test_key());
        assert!(matches!(result, Err(KemError::KeyTooLarge { .. })));
    }

    #[test]
    fn test_left_pad() {
        assert_eq!(left_pad(&[1, 2], 4), vec![0, 0, 1, 2]);
        assert_eq!(left_pad(&[1, 2, 3], 3), vec![1, 2, 3]);
    }
}
