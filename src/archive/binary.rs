use crate::error::{Result, TmodError};
use std::io::{Read, Write};

/// Longest string a one-byte length prefix can describe
pub const MAX_STRING_LENGTH: usize = u8::MAX as usize;

/// Sequential little-endian cursor over a byte source
///
/// Tracks how many bytes have been consumed so the parser can report where
/// the data section begins without requiring `Seek` on the source.
pub struct BinaryReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> BinaryReader<R> {
    /// Wrap a source positioned at the first byte to decode
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Wrap a source whose cursor already sits at `position`
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    /// Bytes consumed so far, counted from the starting position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Give back the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely or fail with `TruncatedInput`
    pub fn read_into(&mut self, buf: &mut [u8], context: &str) -> Result<()> {
        self.inner
            .read_exact(buf)
            .map_err(|e| TmodError::from_read(e, context, buf.len() as u64))?;
        self.position += buf.len() as u64;
        Ok(())
    }

    pub fn read_u8(&mut self, context: &str) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf, context)?;
        Ok(buf[0])
    }

    pub fn read_i32(&mut self, context: &str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array(context)?))
    }

    /// Read a fixed-size block such as the hash or signature
    pub fn read_array<const N: usize>(&mut self, context: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf, context)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes into a fresh buffer
    pub fn read_exact(&mut self, len: usize, context: &str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf, context)?;
        Ok(buf)
    }

    /// Read a string stored as a one-byte length followed by UTF-8 bytes
    pub fn read_length_prefixed_string(&mut self, context: &str) -> Result<String> {
        let len = self.read_u8(context)? as usize;
        let bytes = self.read_exact(len, context)?;
        String::from_utf8(bytes)
            .map_err(|e| TmodError::InvalidEncoding(format!("{}: {}", context, e)))
    }
}

pub(crate) fn write_i32<W: Write>(mut writer: W, value: i32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_length_prefixed_string<W: Write>(mut writer: W, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > MAX_STRING_LENGTH {
        return Err(TmodError::InvalidManifest(format!(
            "String too long: {} bytes (max {})",
            bytes.len(),
            MAX_STRING_LENGTH
        )));
    }
    writer.write_all(&[bytes.len() as u8])?;
    writer.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian_fields() {
        let mut data = vec![0x07];
        data.extend_from_slice(&(-2i32).to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);

        let mut reader = BinaryReader::new(&data[..]);
        assert_eq!(reader.read_u8("byte").unwrap(), 7);
        assert_eq!(reader.read_i32("int").unwrap(), -2);
        assert_eq!(reader.read_exact(3, "block").unwrap(), vec![1, 2, 3]);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = Vec::new();
        write_length_prefixed_string(&mut buf, "ExampleMod").unwrap();
        write_length_prefixed_string(&mut buf, "").unwrap();

        let mut reader = BinaryReader::new(&buf[..]);
        assert_eq!(reader.read_length_prefixed_string("name").unwrap(), "ExampleMod");
        assert_eq!(reader.read_length_prefixed_string("empty").unwrap(), "");
        assert_eq!(reader.position(), buf.len() as u64);
    }

    #[test]
    fn test_short_string_is_truncated() {
        // Declares 5 bytes, provides 2
        let data = [5u8, b'a', b'b'];
        let mut reader = BinaryReader::new(&data[..]);
        let err = reader.read_length_prefixed_string("name").unwrap_err();
        assert!(matches!(err, TmodError::TruncatedInput { expected: 5, .. }));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let data = [2u8, 0xC3, 0x28];
        let mut reader = BinaryReader::new(&data[..]);
        let err = reader.read_length_prefixed_string("path").unwrap_err();
        assert!(matches!(err, TmodError::InvalidEncoding(_)));
    }

    #[test]
    fn test_truncated_int() {
        let data = [1u8, 2];
        let mut reader = BinaryReader::new(&data[..]);
        assert!(matches!(
            reader.read_i32("count"),
            Err(TmodError::TruncatedInput { expected: 4, .. })
        ));
    }

    #[test]
    fn test_oversized_string_rejected_on_write() {
        let long = "a".repeat(256);
        let mut buf = Vec::new();
        assert!(write_length_prefixed_string(&mut buf, &long).is_err());
        assert!(buf.is_empty());
    }
}
