//! Key generation, DER conversion and key files
//!
//! Keys are closed sums over the two supported algorithms. Anything else
//! decoded from DER is rejected with [`KeyError::UnsupportedAlgorithm`].

use ed25519_dalek::{SigningKey, VerifyingKey};
use pkcs8::{
    spki::SubjectPublicKeyInfoRef, DecodePrivateKey, DecodePublicKey, EncodePrivateKey,
    EncodePublicKey, ObjectIdentifier, PrivateKeyInfo,
};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

pub mod envelope;
pub mod kdf;

pub use envelope::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key, EnvelopeKind,
};

const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// RSA modulus sizes accepted for generation
pub const RSA_KEY_SIZES: [usize; 2] = [3072, 4096];
pub const DEFAULT_RSA_BITS: usize = 4096;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key file already exists: {}", .0.display())]
    Exists(PathBuf),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("private key is encrypted and no passphrase was given")]
    MissingPassword,

    #[error("authentication failed: wrong passphrase or corrupted key")]
    Authentication,

    #[error("malformed key: {0}")]
    Format(String),

    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("expected {expected} key, found {found}")]
    UnexpectedAlgorithm {
        expected: KeyAlgorithm,
        found: KeyAlgorithm,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Ed25519,
    Rsa,
}

impl KeyAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Rsa => "rsa",
        }
    }

    /// File stem used when none is given: `id_ed25519` / `id_rsa`
    pub fn default_stem(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "id_ed25519",
            KeyAlgorithm::Rsa => "id_rsa",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            "rsa" => Ok(KeyAlgorithm::Rsa),
            other => Err(KeyError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Public half of a key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Ed25519(VerifyingKey),
    Rsa(RsaPublicKey),
}

impl PublicKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
        }
    }

    /// SubjectPublicKeyInfo DER
    pub fn to_spki_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = match self {
            PublicKey::Ed25519(key) => key.to_public_key_der(),
            PublicKey::Rsa(key) => key.to_public_key_der(),
        }
        .map_err(|e| KeyError::Format(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn from_spki_der(der: &[u8]) -> Result<Self, KeyError> {
        let info = SubjectPublicKeyInfoRef::try_from(der).map_err(|e| KeyError::Format(e.to_string()))?;
        let oid = info.algorithm.oid;

        if oid == ED25519_OID {
            VerifyingKey::from_public_key_der(der)
                .map(PublicKey::Ed25519)
                .map_err(|e| KeyError::Format(e.to_string()))
        } else if oid == RSA_ENCRYPTION_OID {
            RsaPublicKey::from_public_key_der(der)
                .map(PublicKey::Rsa)
                .map_err(|e| KeyError::Format(e.to_string()))
        } else {
            Err(KeyError::UnsupportedAlgorithm(oid.to_string()))
        }
    }

    pub fn as_ed25519(&self) -> Result<&VerifyingKey, KeyError> {
        match self {
            PublicKey::Ed25519(key) => Ok(key),
            other => Err(KeyError::UnexpectedAlgorithm {
                expected: KeyAlgorithm::Ed25519,
                found: other.algorithm(),
            }),
        }
    }

    pub fn as_rsa(&self) -> Result<&RsaPublicKey, KeyError> {
        match self {
            PublicKey::Rsa(key) => Ok(key),
            other => Err(KeyError::UnexpectedAlgorithm {
                expected: KeyAlgorithm::Rsa,
                found: other.algorithm(),
            }),
        }
    }
}

/// Private half of a key pair
#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(SigningKey),
    Rsa(RsaPrivateKey),
}

impl PrivateKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PrivateKey::Rsa(_) => KeyAlgorithm::Rsa,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
            PrivateKey::Rsa(key) => PublicKey::Rsa(RsaPublicKey::from(key)),
        }
    }

    /// PKCS#8 DER, zeroized on drop
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        let doc = match self {
            PrivateKey::Ed25519(key) => key.to_pkcs8_der(),
            PrivateKey::Rsa(key) => key.to_pkcs8_der(),
        }
        .map_err(|e| KeyError::Format(e.to_string()))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyError> {
        let info = PrivateKeyInfo::try_from(der).map_err(|e| KeyError::Format(e.to_string()))?;
        let oid = info.algorithm.oid;

        if oid == ED25519_OID {
            SigningKey::from_pkcs8_der(der)
                .map(PrivateKey::Ed25519)
                .map_err(|e| KeyError::Format(e.to_string()))
        } else if oid == RSA_ENCRYPTION_OID {
            RsaPrivateKey::from_pkcs8_der(der)
                .map(PrivateKey::Rsa)
                .map_err(|e| KeyError::Format(e.to_string()))
        } else {
            Err(KeyError::UnsupportedAlgorithm(oid.to_string()))
        }
    }

    pub fn as_ed25519(&self) -> Result<&SigningKey, KeyError> {
        match self {
            PrivateKey::Ed25519(key) => Ok(key),
            other => Err(KeyError::UnexpectedAlgorithm {
                expected: KeyAlgorithm::Ed25519,
                found: other.algorithm(),
            }),
        }
    }

    pub fn as_rsa(&self) -> Result<&RsaPrivateKey, KeyError> {
        match self {
            PrivateKey::Rsa(key) => Ok(key),
            other => Err(KeyError::UnexpectedAlgorithm {
                expected: KeyAlgorithm::Rsa,
                found: other.algorithm(),
            }),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey::{}(..)", self.algorithm())
    }
}

impl From<SigningKey> for PrivateKey {
    fn from(key: SigningKey) -> Self {
        PrivateKey::Ed25519(key)
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        PrivateKey::Rsa(key)
    }
}

/// A generated key pair
#[derive(Debug, Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
    bits: Option<usize>,
}

impl KeyPair {
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.private.algorithm()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// RSA modulus size; `None` for Ed25519
    pub fn bits(&self) -> Option<usize> {
        self.bits
    }

    pub fn into_private_key(self) -> PrivateKey {
        self.private
    }
}

/// Generate a key pair
///
/// `bits` applies to RSA only and defaults to [`DEFAULT_RSA_BITS`].
pub fn generate_key_pair(algorithm: KeyAlgorithm, bits: Option<usize>) -> Result<KeyPair, KeyError> {
    let (private, bits) = match algorithm {
        KeyAlgorithm::Ed25519 => (PrivateKey::Ed25519(SigningKey::generate(&mut OsRng)), None),
        KeyAlgorithm::Rsa => {
            let bits = bits.unwrap_or(DEFAULT_RSA_BITS);
            if !RSA_KEY_SIZES.contains(&bits) {
                return Err(KeyError::InvalidParameter(format!(
                    "RSA key size must be 3072 or 4096, got {}",
                    bits
                )));
            }
            debug!(bits, "Generating RSA key");
            let key = RsaPrivateKey::new(&mut OsRng, bits)
                .map_err(|e| KeyError::InvalidParameter(e.to_string()))?;
            (PrivateKey::Rsa(key), Some(bits))
        }
    };

    Ok(KeyPair {
        public: private.public_key(),
        private,
        bits,
    })
}

/// Private and public key file paths for a stem: `<stem>.pem`, `<stem>.pub.pem`
pub fn key_file_paths(stem: &Path) -> (PathBuf, PathBuf) {
    let mut private = stem.as_os_str().to_owned();
    private.push(".pem");
    let mut public = stem.as_os_str().to_owned();
    public.push(".pub.pem");
    (PathBuf::from(private), PathBuf::from(public))
}

/// Write a key pair as two PEM files, refusing to overwrite either
///
/// With no stem, the algorithm's default stem in the current directory is
/// used. An empty passphrase writes the private key unencrypted.
pub fn write_key_pair(
    pair: &KeyPair,
    stem: Option<&Path>,
    passphrase: &[u8],
    comment: &str,
) -> Result<(PathBuf, PathBuf), KeyError> {
    let stem = stem
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(pair.algorithm().default_stem()));
    let (private_path, public_path) = key_file_paths(&stem);

    for path in [&private_path, &public_path] {
        if path.exists() {
            return Err(KeyError::Exists(path.clone()));
        }
    }

    let private_pem = Zeroizing::new(encode_private_key(pair.private_key(), passphrase, comment)?);
    let public_pem = encode_public_key(pair.public_key())?;

    let private = stage(&private_path, private_pem.as_bytes())?;
    let public = stage(&public_path, public_pem.as_bytes())?;
    persist_pair(private, &private_path, public, &public_path)?;

    info!(
        algorithm = %pair.algorithm(),
        private = %private_path.display(),
        public = %public_path.display(),
        "Wrote key pair"
    );
    Ok((private_path, public_path))
}

/// Write `contents` to a temporary file in the directory of `path`
fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile, KeyError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    Ok(file)
}

fn persist_new(staged: NamedTempFile, path: &Path) -> Result<(), KeyError> {
    staged
        .persist_noclobber(path)
        .map(|_| ())
        .map_err(|e| match e.error.kind() {
            ErrorKind::AlreadyExists => KeyError::Exists(path.to_path_buf()),
            _ => KeyError::Io(e.error),
        })
}

/// Move both staged files into place, or neither
fn persist_pair(
    private: NamedTempFile,
    private_path: &Path,
    public: NamedTempFile,
    public_path: &Path,
) -> Result<(), KeyError> {
    persist_new(private, private_path)?;
    if let Err(e) = persist_new(public, public_path) {
        if let Err(cleanup) = std::fs::remove_file(private_path) {
            warn!(path = %private_path.display(), error = %cleanup, "Could not remove private key file");
        }
        return Err(e);
    }
    Ok(())
}

pub fn read_private_key(path: impl AsRef<Path>, passphrase: &[u8]) -> Result<PrivateKey, KeyError> {
    let data = Zeroizing::new(std::fs::read(path.as_ref())?);
    decode_private_key(data.as_slice(), passphrase)
}

pub fn read_public_key(path: impl AsRef<Path>) -> Result<PublicKey, KeyError> {
    let data = std::fs::read(path.as_ref())?;
    decode_public_key(&data)
}
