//! Unified error type for the public API
//!
//! Each module keeps its own error enum for precise matching. This type
//! wraps them for callers who just want one `Result`.
//!
//! # Example
//!
//! ```no_run
//! use superlicense::SuperLicenseError;
//!
//! fn load() -> Result<(), SuperLicenseError> {
//!     // Module errors convert with `?`
//!     Ok(())
//! }
//! ```

use crate::claim::ClaimError;
use crate::container::ContainerError;
use crate::key::KeyError;
use thiserror::Error;

/// Unified error type for all superlicense operations
///
/// # Error Categories
///
/// - **Container**: framing, signature, decryption of licenses and requests
/// - **Key**: key generation, PEM envelopes, passphrases
/// - **Claim**: claim validation against a license type
#[derive(Debug, Error)]
pub enum SuperLicenseError {
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Claim error: {0}")]
    Claim(#[from] ClaimError),
}

impl SuperLicenseError {
    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Container(e) => e.suggestion(),
            Self::Key(e) => e.suggestion(),
            Self::Claim(ClaimError::UnknownLicenseType(_)) => {
                Some("List the registered license types and check the request's Name")
            }
            Self::Claim(_) => None,
        }
    }

    /// Malformed, truncated or unencodable artifact data
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Container(e) => e.is_format_error(),
            Self::Key(KeyError::Format(_)) => true,
            _ => false,
        }
    }

    /// Signature, authentication or key-unwrap failure
    pub fn is_crypto_error(&self) -> bool {
        match self {
            Self::Container(e) => matches!(
                e,
                ContainerError::SignatureInvalid | ContainerError::Crypto(_) | ContainerError::Kem(_)
            ),
            Self::Key(e) => matches!(e, KeyError::Authentication),
            _ => false,
        }
    }

    pub fn is_claim_error(&self) -> bool {
        matches!(self, Self::Claim(_))
    }

    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::Key(_))
    }
}

impl ContainerError {
    /// Framing problems in the input, as opposed to key or signature problems
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::FieldTooLarge { .. }
                | Self::MagicMismatch
                | Self::VersionMismatch { .. }
                | Self::InvalidFlag(_)
                | Self::EmptySection(_)
                | Self::DataOverrun(_)
                | Self::Base64(_)
        )
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::MagicMismatch => Some("The file is not a superlicense artifact"),
            Self::VersionMismatch { .. } => Some("Only version v1 artifacts are supported"),
            Self::SignatureInvalid => {
                Some("Check that the verifying key belongs to the issuer and the file is unmodified")
            }
            Self::MissingKey => Some("The artifact has an encrypted section; supply the RSA key"),
            Self::Kem(_) | Self::Crypto(_) => {
                Some("Check that the RSA key matches the one used to build the artifact")
            }
            Self::Base64(_) => Some("Artifacts are stored as URL-safe base64 text"),
            _ => None,
        }
    }
}

impl KeyError {
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Exists(_) => Some("Choose another file name or remove the existing key files"),
            Self::MissingPassword => Some("The private key is encrypted; supply its passphrase"),
            Self::Authentication => Some("Check the passphrase"),
            Self::InvalidParameter(_) => Some("RSA keys must be 3072 or 4096 bits"),
            Self::UnexpectedAlgorithm { .. } => {
                Some("Signing uses an ed25519 key; encryption uses an rsa key")
            }
            _ => None,
        }
    }
}
