//! Request v1: unsigned mark container sent from requester to issuer
//!
//! The ciphertext section is keyed with RSA-OAEP under the issuer's public
//! key, so only the issuer can read it.

use crate::armor;
use crate::binary::ByteReader;
use crate::container::{self, ContainerError, SectionFlags, Sections};
use crate::kem::RsaOaepKem;
use crate::mark::Mark;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::Path;
use tracing::debug;

/// Version string accepted by tooling for this format
pub const REQUEST_V1: &str = "v1";

/// A parsed request
#[derive(Debug, Clone)]
pub struct RequestV1 {
    sections: Sections,
    marks: Vec<Mark>,
}

impl RequestV1 {
    /// `wrap_key` is the issuer's public key, required for
    /// [`SectionFlags::CIPHERTEXT`]
    pub fn build(
        marks: &[Mark],
        wrap_key: Option<&RsaPublicKey>,
        flags: SectionFlags,
    ) -> Result<Vec<u8>, ContainerError> {
        let body = container::encode_sections(marks, flags, &RsaOaepKem, wrap_key)?;

        let mut out = Vec::with_capacity(container::MAGIC.len() + 4 + body.len());
        container::write_header(&mut out);
        out.extend_from_slice(&body);

        debug!(marks = marks.len(), flags = %flags, len = out.len(), "Built request");
        Ok(out)
    }

    pub fn parse(bytes: &[u8], unwrap_key: Option<&RsaPrivateKey>) -> Result<Self, ContainerError> {
        let mut reader = ByteReader::new(bytes);
        container::read_header(&mut reader)?;

        let sections = container::decode_sections(&mut reader, &RsaOaepKem, unwrap_key)?;
        let marks = sections.decode_entries::<Mark>()?;

        debug!(marks = marks.len(), flags = %sections.flags, "Parsed request");
        Ok(Self { sections, marks })
    }

    pub fn build_file(
        path: impl AsRef<Path>,
        marks: &[Mark],
        wrap_key: Option<&RsaPublicKey>,
        flags: SectionFlags,
    ) -> Result<(), ContainerError> {
        let bytes = Self::build(marks, wrap_key, flags)?;
        armor::write_artifact(path, &bytes)
    }

    pub fn parse_file(
        path: impl AsRef<Path>,
        unwrap_key: Option<&RsaPrivateKey>,
    ) -> Result<Self, ContainerError> {
        let bytes = armor::read_artifact(path)?;
        Self::parse(&bytes, unwrap_key)
    }

    pub fn version(&self) -> u32 {
        container::VERSION_V1
    }

    pub fn flags(&self) -> SectionFlags {
        self.sections.flags
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn into_marks(self) -> Vec<Mark> {
        self.marks
    }

    pub fn mark(&self, key: &str) -> Option<&Mark> {
        self.marks.iter().find(|m| m.k == key)
    }

    pub fn verify_sections_agree(&self) -> Result<(), ContainerError> {
        self.sections.check_agree::<Mark>()
    }
}
