//! Commonly used types
//!
//! ```rust
//! use superlicense::prelude::*;
//!
//! let flags = SectionFlags::RAW | SectionFlags::CIPHERTEXT;
//! assert!(flags.has_ciphertext());
//! ```

pub use crate::armor;
pub use crate::claim::{Claim, ClaimError, ClaimRule};
pub use crate::container::{ContainerError, SectionFlags, Sections};
pub use crate::error::SuperLicenseError;
pub use crate::key::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key,
    generate_key_pair, read_private_key, read_public_key, write_key_pair, KeyAlgorithm, KeyError,
    KeyPair, PrivateKey, PublicKey,
};
pub use crate::license::LicenseV1;
pub use crate::mark::{MachineId, Mark, MarkSource};
pub use crate::registry::{ClaimRegistry, CreateLicenseRequest, LicenseType, RuleSet};
pub use crate::request::RequestV1;
