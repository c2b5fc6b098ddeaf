//! Binary framing primitives for the container format
//!
//! All multi-byte integers are big-endian. Reads go through [`ByteReader`],
//! a cursor over an immutable buffer that checks every length against the
//! bytes remaining before slicing. Writes go through the `put_*` helpers,
//! which refuse lengths that do not fit their prefix width.

use crate::container::ContainerError;

/// Bounds-checked cursor over an immutable byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Everything not yet consumed, without advancing
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Read exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], ContainerError> {
        if n > self.remaining() {
            return Err(ContainerError::Truncated {
                field,
                offset: self.pos,
                needed: n as u64,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ContainerError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, field)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, ContainerError> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u16_be(&mut self, field: &'static str) -> Result<u16, ContainerError> {
        Ok(u16::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_u32_be(&mut self, field: &'static str) -> Result<u32, ContainerError> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_u64_be(&mut self, field: &'static str) -> Result<u64, ContainerError> {
        Ok(u64::from_be_bytes(self.read_array(field)?))
    }

    /// Read a u16-length-prefixed field
    pub fn read_prefixed_u16(&mut self, field: &'static str) -> Result<&'a [u8], ContainerError> {
        let len = self.read_u16_be(field)?;
        self.read_bytes(usize::from(len), field)
    }

    /// Read a u64-length-prefixed field
    ///
    /// A declared length larger than the remaining input is rejected before
    /// any conversion to `usize`, so oversized prefixes cannot wrap.
    pub fn read_prefixed_u64(&mut self, field: &'static str) -> Result<&'a [u8], ContainerError> {
        let offset = self.pos;
        let len = self.read_u64_be(field)?;
        if len > self.remaining() as u64 {
            return Err(ContainerError::Truncated {
                field,
                offset,
                needed: len,
                available: self.remaining(),
            });
        }
        self.read_bytes(len as usize, field)
    }
}

pub fn put_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn put_u32_be(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// Write a u16 length prefix followed by `data`
pub fn put_prefixed_u16(
    buf: &mut Vec<u8>,
    data: &[u8],
    field: &'static str,
) -> Result<(), ContainerError> {
    let len = u16::try_from(data.len()).map_err(|_| ContainerError::FieldTooLarge {
        field,
        len: data.len(),
        max: u16::MAX as u64,
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(data);
    Ok(())
}

/// Write a u64 length prefix followed by `data`
pub fn put_prefixed_u64(
    buf: &mut Vec<u8>,
    data: &[u8],
    field: &'static str,
) -> Result<(), ContainerError> {
    let len = u64::try_from(data.len()).map_err(|_| ContainerError::FieldTooLarge {
        field,
        len: data.len(),
        max: u64::MAX,
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_prefixed_roundtrip() {
        let mut buf = Vec::new();
        put_prefixed_u16(&mut buf, b"abc", "field").unwrap();
        assert_eq!(buf, vec![0x00, 0x03, b'a', b'b', b'c']);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_prefixed_u16("field").unwrap(), b"abc");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_u64_prefix_is_big_endian() {
        let mut buf = Vec::new();
        put_prefixed_u64(&mut buf, &[0xAA; 2], "field").unwrap();
        assert_eq!(&buf[..8], &[0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_u16_overflow_is_an_error() {
        let mut buf = Vec::new();
        let big = vec![0u8; u16::MAX as usize + 1];
        let result = put_prefixed_u16(&mut buf, &big, "signature");
        assert!(matches!(
            result,
            Err(ContainerError::FieldTooLarge { field: "signature", .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_short_read_reports_field() {
        let mut reader = ByteReader::new(&[0x00, 0x05, 0x01]);
        let err = reader.read_prefixed_u16("wrapped key").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Truncated {
                field: "wrapped key",
                offset: 2,
                needed: 5,
                available: 1
            }
        ));
    }

    #[test]
    fn test_huge_u64_prefix_does_not_wrap() {
        let mut buf = u64::MAX.to_be_bytes().to_vec();
        buf.extend_from_slice(b"xyz");
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(
            reader.read_prefixed_u64("raw"),
            Err(ContainerError::Truncated { field: "raw", .. })
        ));
    }

    #[test]
    fn test_rest_and_position() {
        let data = [1u8, 2, 3, 4];
        let mut reader = ByteReader::new(&data);
        reader.read_u8("a").unwrap();
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.rest(), &[2, 3, 4]);
        assert!(matches!(
            reader.read_u32_be("version"),
            Err(ContainerError::Truncated { field: "version", offset: 1, needed: 4, available: 3 })
        ));
    }
}
