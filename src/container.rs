//! Container spine shared by licenses and requests
//!
//! ```text
//! magic[12] | version u32 | [sig_len u16 | sig]        (license only)
//! flag u8
//! [raw_len u64 | raw]                                 if RAW
//! [key_len u16 | wrapped_key | ct_len u64 | nonce || ct || tag]  if CIPHERTEXT
//! ```
//!
//! This module owns the header and the section body. The license and request
//! types add signing and choose the key wrapping scheme.

use crate::binary::{put_prefixed_u16, put_prefixed_u64, put_u32_be, put_u8, ByteReader};
use crate::crypto::{self, AesKey, CryptoError, NONCE_LEN, TAG_LEN};
use crate::kem::{KemError, KeyEncapsulation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::BitOr;
use thiserror::Error;
use tracing::debug;

/// Magic bytes opening every artifact
pub const MAGIC: &[u8; 12] = b"superlicense";

/// The only container version this crate reads or writes
pub const VERSION_V1: u32 = 1;

/// Errors raised while building or parsing a container
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("truncated {field} at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: u64,
        available: usize,
    },

    #[error("{field} is {len} bytes, maximum is {max}")]
    FieldTooLarge {
        field: &'static str,
        len: usize,
        max: u64,
    },

    #[error("magic mismatch: not a superlicense artifact")]
    MagicMismatch,

    #[error("unsupported version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("invalid section flag 0x{0:02x}")]
    InvalidFlag(u8),

    #[error("{0} section is empty")]
    EmptySection(&'static str),

    #[error("missing key: ciphertext section requires a key")]
    MissingKey,

    #[error("failed to encode payload: {0}")]
    PayloadEncode(serde_json::Error),

    #[error("failed to decode payload: {0}")]
    ClaimDecode(serde_json::Error),

    #[error("{0} unexpected bytes after the last section")]
    DataOverrun(usize),

    #[error("raw and ciphertext sections disagree")]
    SectionMismatch,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Kem(#[from] KemError),

    #[error("invalid base64 armor: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which sections a container carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionFlags(u8);

impl SectionFlags {
    /// Claims in the clear
    pub const RAW: SectionFlags = SectionFlags(1 << 0);
    /// Claims AEAD-encrypted under a wrapped key
    pub const CIPHERTEXT: SectionFlags = SectionFlags(1 << 1);

    const KNOWN: u8 = Self::RAW.0 | Self::CIPHERTEXT.0;

    /// Validate a raw flag byte: at least one known bit, no unknown bits
    pub fn from_bits(bits: u8) -> Result<Self, ContainerError> {
        if bits == 0 || bits & !Self::KNOWN != 0 {
            return Err(ContainerError::InvalidFlag(bits));
        }
        Ok(SectionFlags(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: SectionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn has_raw(self) -> bool {
        self.contains(Self::RAW)
    }

    pub fn has_ciphertext(self) -> bool {
        self.contains(Self::CIPHERTEXT)
    }
}

impl BitOr for SectionFlags {
    type Output = SectionFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        SectionFlags(self.0 | rhs.0)
    }
}

impl std::fmt::Display for SectionFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.has_raw(), self.has_ciphertext()) {
            (true, true) => f.write_str("raw|ciphertext"),
            (true, false) => f.write_str("raw"),
            (false, true) => f.write_str("ciphertext"),
            (false, false) => f.write_str("none"),
        }
    }
}

/// Decoded section body of a container
#[derive(Debug, Clone)]
pub struct Sections {
    pub flags: SectionFlags,
    pub raw: Option<Vec<u8>>,
    pub wrapped_key: Option<Vec<u8>>,
    /// `nonce || ciphertext || tag`
    pub ciphertext: Option<Vec<u8>>,
    decrypted: Option<Vec<u8>>,
}

impl Sections {
    /// JSON payload the entries are taken from: `raw` when present,
    /// otherwise the decrypted ciphertext
    pub fn payload(&self) -> Option<&[u8]> {
        self.raw.as_deref().or(self.decrypted.as_deref())
    }

    /// Decrypted ciphertext section, if one was present
    pub fn decrypted(&self) -> Option<&[u8]> {
        self.decrypted.as_deref()
    }

    pub(crate) fn decode_entries<T: DeserializeOwned>(&self) -> Result<Vec<T>, ContainerError> {
        let payload = self.payload().ok_or(ContainerError::EmptySection("payload"))?;
        serde_json::from_slice(payload).map_err(ContainerError::ClaimDecode)
    }

    /// When both sections are present, check they decode to the same entries
    pub(crate) fn check_agree<T>(&self) -> Result<(), ContainerError>
    where
        T: DeserializeOwned + PartialEq,
    {
        let (Some(raw), Some(decrypted)) = (self.raw.as_deref(), self.decrypted.as_deref()) else {
            return Ok(());
        };
        let from_raw: Vec<T> = serde_json::from_slice(raw).map_err(ContainerError::ClaimDecode)?;
        let from_ciphertext: Vec<T> =
            serde_json::from_slice(decrypted).map_err(ContainerError::ClaimDecode)?;
        if from_raw != from_ciphertext {
            return Err(ContainerError::SectionMismatch);
        }
        Ok(())
    }
}

/// Write magic and version
pub(crate) fn write_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(MAGIC);
    put_u32_be(buf, VERSION_V1);
}

/// Read and check magic and version
pub(crate) fn read_header(reader: &mut ByteReader<'_>) -> Result<u32, ContainerError> {
    let magic = reader.read_bytes(MAGIC.len(), "magic")?;
    if magic != MAGIC {
        return Err(ContainerError::MagicMismatch);
    }
    let version = reader.read_u32_be("version")?;
    if version != VERSION_V1 {
        return Err(ContainerError::VersionMismatch {
            found: version,
            expected: VERSION_V1,
        });
    }
    Ok(version)
}

/// Serialize `entries` and encode the section body (flag onward)
pub(crate) fn encode_sections<T, K>(
    entries: &[T],
    flags: SectionFlags,
    kem: &K,
    wrap_key: Option<&K::WrapKey>,
) -> Result<Vec<u8>, ContainerError>
where
    T: Serialize,
    K: KeyEncapsulation,
{
    let flags = SectionFlags::from_bits(flags.bits())?;
    let payload = serde_json::to_vec(entries).map_err(ContainerError::PayloadEncode)?;

    let sealed = if flags.has_ciphertext() {
        let wrap_key = wrap_key.ok_or(ContainerError::MissingKey)?;
        let key = AesKey::generate();
        let ciphertext = crypto::seal(&key, &payload)?;
        let wrapped = kem.wrap(key.as_slice(), wrap_key)?;
        Some((wrapped, ciphertext))
    } else {
        None
    };

    let mut body = Vec::new();
    put_u8(&mut body, flags.bits());
    if flags.has_raw() {
        put_prefixed_u64(&mut body, &payload, "raw")?;
    }
    if let Some((wrapped, ciphertext)) = sealed {
        put_prefixed_u16(&mut body, &wrapped, "wrapped key")?;
        put_prefixed_u64(&mut body, &ciphertext, "ciphertext")?;
    }

    debug!(
        flags = %flags,
        payload_len = payload.len(),
        body_len = body.len(),
        "Encoded container sections"
    );
    Ok(body)
}

/// Decode the section body, consuming the reader to its end
///
/// The ciphertext section is always decrypted when present, so a missing
/// unwrap key is an error even when `raw` is also there.
pub(crate) fn decode_sections<K>(
    reader: &mut ByteReader<'_>,
    kem: &K,
    unwrap_key: Option<&K::UnwrapKey>,
) -> Result<Sections, ContainerError>
where
    K: KeyEncapsulation,
{
    let flags = SectionFlags::from_bits(reader.read_u8("flag")?)?;

    let raw = if flags.has_raw() {
        let raw = reader.read_prefixed_u64("raw")?;
        if raw.is_empty() {
            return Err(ContainerError::EmptySection("raw"));
        }
        Some(raw.to_vec())
    } else {
        None
    };

    let (wrapped_key, ciphertext, decrypted) = if flags.has_ciphertext() {
        let unwrap_key = unwrap_key.ok_or(ContainerError::MissingKey)?;

        let wrapped = reader.read_prefixed_u16("wrapped key")?;
        if wrapped.is_empty() {
            return Err(ContainerError::EmptySection("wrapped key"));
        }
        let sealed_at = reader.position();
        let sealed = reader.read_prefixed_u64("ciphertext")?;
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(ContainerError::Truncated {
                field: "ciphertext",
                offset: sealed_at,
                needed: (NONCE_LEN + TAG_LEN) as u64,
                available: sealed.len(),
            });
        }
        check_consumed(reader)?;

        let key = AesKey::from_slice(&kem.unwrap(wrapped, unwrap_key)?)?;
        let plaintext = crypto::open(&key, sealed)?;
        (Some(wrapped.to_vec()), Some(sealed.to_vec()), Some(plaintext))
    } else {
        check_consumed(reader)?;
        (None, None, None)
    };

    debug!(flags = %flags, "Decoded container sections");
    Ok(Sections {
        flags,
        raw,
        wrapped_key,
        ciphertext,
        decrypted,
    })
}

fn check_consumed(reader: &ByteReader<'_>) -> Result<(), ContainerError> {
    if !reader.is_empty() {
        return Err(ContainerError::DataOverrun(reader.remaining()));
    }
    Ok(())
}
