//! License v1: signed claim container
//!
//! The Ed25519 signature covers the SHA-256 digest of everything after the
//! signature field. Parsing verifies it before looking at any section. The
//! ciphertext section, when present, is keyed with [`RsaIssuerKem`]: the
//! issuer wraps with its RSA private key and the customer unwraps with the
//! matching public key.

use crate::armor;
use crate::binary::{put_prefixed_u16, ByteReader};
use crate::claim::Claim;
use crate::container::{self, ContainerError, SectionFlags, Sections};
use crate::error::SuperLicenseError;
use crate::kem::RsaIssuerKem;
use crate::registry::{ClaimRegistry, CreateLicenseRequest};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};

/// A parsed and verified license
#[derive(Debug, Clone)]
pub struct LicenseV1 {
    signature: Vec<u8>,
    sections: Sections,
    claims: Vec<Claim>,
}

impl LicenseV1 {
    /// Build a license from already-validated claims
    ///
    /// `wrap_key` is required when `flags` includes
    /// [`SectionFlags::CIPHERTEXT`].
    pub fn build(
        claims: &[Claim],
        signing_key: &SigningKey,
        wrap_key: Option<&RsaPrivateKey>,
        flags: SectionFlags,
    ) -> Result<Vec<u8>, ContainerError> {
        let body = container::encode_sections(claims, flags, &RsaIssuerKem, wrap_key)?;

        let digest = Sha256::digest(&body);
        let signature = signing_key.sign(&digest);

        let mut out = Vec::with_capacity(container::MAGIC.len() + 4 + 2 + Signature::BYTE_SIZE + body.len());
        container::write_header(&mut out);
        put_prefixed_u16(&mut out, &signature.to_bytes(), "signature")?;
        out.extend_from_slice(&body);

        debug!(claims = claims.len(), flags = %flags, len = out.len(), "Built license");
        Ok(out)
    }

    /// Validate a creation request through `registry`, then build
    pub fn issue(
        registry: &ClaimRegistry,
        request: &CreateLicenseRequest,
        signing_key: &SigningKey,
        wrap_key: Option<&RsaPrivateKey>,
        flags: SectionFlags,
    ) -> Result<Vec<u8>, SuperLicenseError> {
        let claims = registry.validate_request(request)?;
        Ok(Self::build(&claims, signing_key, wrap_key, flags)?)
    }

    /// Parse and verify a license
    ///
    /// `unwrap_key` is required when the license carries a ciphertext
    /// section, even if a raw section is present too.
    pub fn parse(
        bytes: &[u8],
        verifying_key: &VerifyingKey,
        unwrap_key: Option<&RsaPublicKey>,
    ) -> Result<Self, ContainerError> {
        let mut reader = ByteReader::new(bytes);
        container::read_header(&mut reader)?;

        let signature = reader.read_prefixed_u16("signature")?.to_vec();
        let digest = Sha256::digest(reader.rest());
        let verified = Signature::from_slice(&signature)
            .map(|sig| verifying_key.verify(&digest, &sig).is_ok())
            .unwrap_or(false);
        if !verified {
            warn!(len = bytes.len(), "License signature verification failed");
            return Err(ContainerError::SignatureInvalid);
        }

        let sections = container::decode_sections(&mut reader, &RsaIssuerKem, unwrap_key)?;
        let claims = sections.decode_entries::<Claim>()?;

        debug!(claims = claims.len(), flags = %sections.flags, "Parsed license");
        Ok(Self {
            signature,
            sections,
            claims,
        })
    }

    /// Build, armor and write to a new file
    pub fn build_file(
        path: impl AsRef<Path>,
        claims: &[Claim],
        signing_key: &SigningKey,
        wrap_key: Option<&RsaPrivateKey>,
        flags: SectionFlags,
    ) -> Result<(), ContainerError> {
        let bytes = Self::build(claims, signing_key, wrap_key, flags)?;
        armor::write_artifact(path, &bytes)
    }

    /// Read, de-armor and parse a license file
    pub fn parse_file(
        path: impl AsRef<Path>,
        verifying_key: &VerifyingKey,
        unwrap_key: Option<&RsaPublicKey>,
    ) -> Result<Self, ContainerError> {
        let bytes = armor::read_artifact(path)?;
        Self::parse(&bytes, verifying_key, unwrap_key)
    }

    pub fn version(&self) -> u32 {
        container::VERSION_V1
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn flags(&self) -> SectionFlags {
        self.sections.flags
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn into_claims(self) -> Vec<Claim> {
        self.claims
    }

    /// Claim with the given code
    pub fn claim(&self, code: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.code == code)
    }

    /// Claims whose expiry is at or before `now` (unix seconds)
    pub fn expired_claims(&self, now: i64) -> Vec<&Claim> {
        self.claims.iter().filter(|c| c.is_expired_at(now)).collect()
    }

    /// Check that raw and decrypted sections carry the same claims
    ///
    /// Trivially true unless both sections are present.
    pub fn verify_sections_agree(&self) -> Result<(), ContainerError> {
        self.sections.check_agree::<Claim>()
    }
}
