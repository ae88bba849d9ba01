use crate::archive::binary::{write_i32, write_length_prefixed_string, BinaryReader};
use crate::archive::path::{is_raw_image, normalize_entry_path};
use crate::error::{Result, TmodError};
use std::io::{Read, Write};

/// Magic tag at offset 0 of every package
pub const MAGIC: [u8; 4] = *b"TMOD";

/// Size of the opaque content hash
pub const HASH_SIZE: usize = 20;

/// Size of the opaque package signature
pub const SIGNATURE_SIZE: usize = 256;

/// Size of the unused field between the signature and the package name
pub const RESERVED_SIZE: usize = 4;

/// Package header preceding the manifest
///
/// The hash and signature are carried as-is; nothing here verifies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHeader {
    pub loader_version: String,
    pub hash: [u8; HASH_SIZE],
    pub signature: [u8; SIGNATURE_SIZE],
    pub name: String,
    pub version: String,
    pub entry_count: i32,
}

impl PackageHeader {
    pub fn new(loader_version: &str, name: &str, version: &str) -> Self {
        Self {
            loader_version: loader_version.to_string(),
            hash: [0u8; HASH_SIZE],
            signature: [0u8; SIGNATURE_SIZE],
            name: name.to_string(),
            version: version.to_string(),
            entry_count: 0,
        }
    }

    /// Read the header, validating the magic before anything else
    pub fn read_from<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let found: [u8; 4] = reader.read_array("magic")?;
        if found != MAGIC {
            return Err(TmodError::InvalidHeader { found });
        }

        let loader_version = reader.read_length_prefixed_string("loader version")?;
        let hash = reader.read_array::<HASH_SIZE>("content hash")?;
        let signature = reader.read_array::<SIGNATURE_SIZE>("signature")?;
        let _reserved = reader.read_array::<RESERVED_SIZE>("reserved field")?;
        let name = reader.read_length_prefixed_string("package name")?;
        let version = reader.read_length_prefixed_string("package version")?;

        let entry_count = reader.read_i32("entry count")?;
        if entry_count < 0 {
            return Err(TmodError::InvalidManifest(format!(
                "Negative entry count: {}",
                entry_count
            )));
        }

        Ok(Self {
            loader_version,
            hash,
            signature,
            name,
            version,
            entry_count,
        })
    }

    /// Write the header; the reserved field is written as zeros
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        write_length_prefixed_string(&mut writer, &self.loader_version)?;
        writer.write_all(&self.hash)?;
        writer.write_all(&self.signature)?;
        writer.write_all(&[0u8; RESERVED_SIZE])?;
        write_length_prefixed_string(&mut writer, &self.name)?;
        write_length_prefixed_string(&mut writer, &self.version)?;
        write_i32(&mut writer, self.entry_count)?;
        Ok(())
    }
}

/// Manifest entry describing one payload in the data section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Normalized path, `/`-separated
    pub path: String,
    pub uncompressed_size: i32,
    /// Bytes occupied in the data section
    pub stored_len: i32,
    /// Offset relative to the start of the data section
    pub start: u64,
    pub is_compressed: bool,
}

impl EntryDescriptor {
    pub fn new(path: String, uncompressed_size: i32, stored_len: i32, start: u64) -> Self {
        Self {
            path,
            uncompressed_size,
            stored_len,
            start,
            is_compressed: stored_len != uncompressed_size,
        }
    }

    /// Read one manifest record whose payload begins at `start`
    pub fn read_from<R: Read>(reader: &mut BinaryReader<R>, start: u64) -> Result<Self> {
        let raw_path = reader.read_length_prefixed_string("entry path")?;
        let path = normalize_entry_path(&raw_path)?;
        let uncompressed_size = reader.read_i32("entry size")?;
        let stored_len = reader.read_i32("entry stored length")?;

        if uncompressed_size < 0 {
            return Err(TmodError::InvalidManifest(format!(
                "Negative size {} for {}",
                uncompressed_size, path
            )));
        }
        if stored_len < 0 {
            return Err(TmodError::InvalidManifest(format!(
                "Negative stored length {} for {}",
                stored_len, path
            )));
        }

        Ok(Self::new(path, uncompressed_size, stored_len, start))
    }

    /// Write this entry's manifest record
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        write_length_prefixed_string(&mut writer, &self.path)?;
        write_i32(&mut writer, self.uncompressed_size)?;
        write_i32(&mut writer, self.stored_len)?;
        Ok(())
    }

    /// Offset one past the last payload byte, relative to the data section
    pub fn end(&self) -> u64 {
        self.start + self.stored_len as u64
    }

    pub fn is_raw_image(&self) -> bool {
        is_raw_image(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> PackageHeader {
        let mut header = PackageHeader::new("v2022.9.47.16", "ExampleMod", "1.0.3");
        header.hash = [0xAB; HASH_SIZE];
        header.signature[0] = 0x01;
        header.signature[SIGNATURE_SIZE - 1] = 0xFF;
        header.entry_count = 3;
        header
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();

        let expected_len = 4 + 1 + 13 + HASH_SIZE + SIGNATURE_SIZE + RESERVED_SIZE + 1 + 10 + 1 + 5 + 4;
        assert_eq!(buf.len(), expected_len);

        let mut reader = BinaryReader::new(&buf[..]);
        let parsed = PackageHeader::read_from(&mut reader).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(reader.position(), expected_len as u64);
    }

    #[test]
    fn test_bad_magic_rejected_first() {
        // Nothing after the magic: the magic check must fail before any truncation
        let mut reader = BinaryReader::new(&b"TMOX"[..]);
        match PackageHeader::read_from(&mut reader) {
            Err(TmodError::InvalidHeader { found }) => assert_eq!(&found, b"TMOX"),
            other => panic!("Expected InvalidHeader, got: {:?}", other),
        }
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_negative_entry_count_rejected() {
        let mut header = sample_header();
        header.entry_count = -1;
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();

        let mut reader = BinaryReader::new(&buf[..]);
        assert!(matches!(
            PackageHeader::read_from(&mut reader),
            Err(TmodError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_entry_compression_flag() {
        let stored = EntryDescriptor::new("a.txt".into(), 10, 10, 0);
        let deflated = EntryDescriptor::new("b.txt".into(), 100, 12, 10);
        assert!(!stored.is_compressed);
        assert!(deflated.is_compressed);
        assert_eq!(deflated.end(), 22);
    }

    #[test]
    fn test_entry_record_normalizes_path() {
        let mut buf = Vec::new();
        write_length_prefixed_string(&mut buf, "Items\\./Sword.rawimg").unwrap();
        write_i32(&mut buf, 64).unwrap();
        write_i32(&mut buf, 30).unwrap();

        let mut reader = BinaryReader::new(&buf[..]);
        let entry = EntryDescriptor::read_from(&mut reader, 128).unwrap();
        assert_eq!(entry.path, "Items/Sword.rawimg");
        assert_eq!(entry.start, 128);
        assert!(entry.is_compressed);
        assert!(entry.is_raw_image());
    }

    #[test]
    fn test_negative_stored_length_rejected() {
        let mut buf = Vec::new();
        write_length_prefixed_string(&mut buf, "a.bin").unwrap();
        write_i32(&mut buf, 4).unwrap();
        write_i32(&mut buf, -4).unwrap();

        let mut reader = BinaryReader::new(&buf[..]);
        assert!(matches!(
            EntryDescriptor::read_from(&mut reader, 0),
            Err(TmodError::InvalidManifest(_))
        ));
    }
}
