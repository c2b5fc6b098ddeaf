//! Text armor for artifacts at rest: URL-safe base64 with padding

use crate::container::ContainerError;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode armored text; surrounding and embedded whitespace is ignored
pub fn decode(text: impl AsRef<[u8]>) -> Result<Vec<u8>, ContainerError> {
    let compact: Vec<u8> = text
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(URL_SAFE.decode(compact)?)
}

/// Armor `bytes` and write them to a new file
///
/// The text is staged in a temporary file beside `path` and moved into
/// place only once complete. Fails if the file already exists.
pub fn write_artifact(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), ContainerError> {
    let path = path.as_ref();
    let armored = encode(bytes);

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(armored.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist_noclobber(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), len = armored.len(), "Wrote artifact");
    Ok(())
}

/// Read and de-armor an artifact file
pub fn read_artifact(path: impl AsRef<Path>) -> Result<Vec<u8>, ContainerError> {
    let data = std::fs::read(path.as_ref())?;
    decode(data)
}
