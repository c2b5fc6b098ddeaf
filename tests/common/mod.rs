//! Common test utilities for superlicense integration tests
//!
//! RSA key generation dominates test time, so keys are generated once per
//! test binary and shared.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::sync::OnceLock;

pub use superlicense::prelude::*;

/// Shared 2048-bit RSA key for codec tests
pub fn rsa_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation"))
}

pub fn rsa_public_key() -> RsaPublicKey {
    RsaPublicKey::from(rsa_key())
}

/// Shared 3072-bit key pair produced through the public key API
pub fn rsa_key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| {
        generate_key_pair(KeyAlgorithm::Rsa, Some(3072)).expect("RSA key pair generation")
    })
}

pub fn signing_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// A unix timestamp `hours` from now
pub fn hours_from_now(hours: i64) -> i64 {
    (Utc::now() + Duration::hours(hours)).timestamp()
}

/// Claims that satisfy the built-in `demo` type
pub fn demo_claims() -> Vec<Claim> {
    vec![
        Claim::new("is_try").with_content("t"),
        Claim::new("expired_at").with_expiry(hours_from_now(24)),
        Claim::new("model").with_content("X200"),
    ]
}

pub fn demo_request() -> CreateLicenseRequest {
    CreateLicenseRequest::new("demo", demo_claims())
}

/// Does `haystack` contain `needle` as a contiguous byte run
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
