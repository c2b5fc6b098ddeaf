//! Key wrapping for the container's symmetric payload key
//!
//! The two artifact directions wrap differently:
//!
//! - Requests travel requester → issuer and use [`RsaOaepKem`]: the
//!   recipient's public key wraps, only its private key unwraps.
//! - Licenses travel issuer → customer and use [`RsaIssuerKem`]: the
//!   issuer's private key wraps, anyone with the public key unwraps.

use thiserror::Error;

pub mod rsa;

pub use self::rsa::{RsaIssuerKem, RsaOaepKem, OAEP_LABEL};

/// KEM-related errors
#[derive(Debug, Error)]
pub enum KemError {
    #[error("key wrapping failed: {0}")]
    WrapError(String),

    #[error("key unwrapping failed: {0}")]
    UnwrapError(String),

    #[error("key of {len} bytes does not fit a {modulus_len}-byte RSA modulus")]
    KeyTooLarge { len: usize, modulus_len: usize },
}

/// Wrap and unwrap a short symmetric key with asymmetric key material
///
/// The key halves are associated types because the direction differs per
/// scheme: OAEP wraps with a public key, the issuer scheme with a private one.
pub trait KeyEncapsulation {
    /// Key material used to wrap
    type WrapKey;

    /// Key material used to unwrap
    type UnwrapKey;

    /// Wrap a symmetric key
    fn wrap(&self, key: &[u8], wrap_key: &Self::WrapKey) -> Result<Vec<u8>, KemError>;

    /// Unwrap a symmetric key
    fn unwrap(&self, wrapped: &[u8], unwrap_key: &Self::UnwrapKey) -> Result<Vec<u8>, KemError>;
}
