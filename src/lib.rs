//! Offline software licenses and license requests
//!
//! A license is a signed container of [`Claim`]s; a request is an unsigned
//! container of [`Mark`]s. Both share one binary layout: a fixed header,
//! then an optional clear-text section and an optional AES-256-GCM section
//! whose key is wrapped with RSA.
//!
//! ```no_run
//! use superlicense::prelude::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = generate_key_pair(KeyAlgorithm::Ed25519, None)?;
//! let signing_key = issuer.private_key().as_ed25519()?;
//!
//! let registry = ClaimRegistry::with_builtin_types();
//! let request = CreateLicenseRequest::new(
//!     "demo",
//!     vec![Claim::new("expired_at").with_expiry(4_102_444_800)],
//! );
//! let bytes = LicenseV1::issue(&registry, &request, signing_key, None, SectionFlags::RAW)?;
//!
//! let license = LicenseV1::parse(&bytes, &signing_key.verifying_key(), None)?;
//! assert_eq!(license.claims().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod armor;
pub mod binary;
pub mod claim;
pub mod container;
pub mod crypto;
pub mod demo;
pub mod error;
pub mod kem;
pub mod key;
pub mod license;
pub mod mark;
pub mod prelude;
pub mod registry;
pub mod request;

pub use claim::{Claim, ClaimError, ClaimRule};
pub use container::{ContainerError, SectionFlags};
pub use error::SuperLicenseError;
pub use key::{KeyAlgorithm, KeyError, KeyPair, PrivateKey, PublicKey};
pub use license::LicenseV1;
pub use mark::Mark;
pub use registry::{ClaimRegistry, CreateLicenseRequest, LicenseType};
pub use request::RequestV1;
