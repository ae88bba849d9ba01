use crate::archive::entry::deflate_raw;
use crate::archive::format::{EntryDescriptor, PackageHeader, HASH_SIZE, SIGNATURE_SIZE};
use crate::archive::path::normalize_entry_path;
use crate::error::{Result, TmodError};
use crate::raw_image::encode_raw_image;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Threshold below which entries are stored uncompressed (4KB)
pub const MIN_COMPRESSION_SIZE: usize = 4096;

/// Options controlling how payloads are written
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    pub compression: Compression,
    pub min_compression_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            min_compression_size: MIN_COMPRESSION_SIZE,
        }
    }
}

impl WriterOptions {
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_min_compression_size(mut self, size: usize) -> Self {
        self.min_compression_size = size;
        self
    }
}

/// Builds a package in memory and serializes it on `finish`
///
/// The manifest precedes the data section and records no offsets, so payloads
/// are kept until every entry is known. Paths are normalized on insert;
/// adding the same path twice writes two records and readers keep the later one.
pub struct PackageWriter {
    header: PackageHeader,
    entries: Vec<EntryDescriptor>,
    payloads: Vec<Vec<u8>>,
    current_offset: u64,
    options: WriterOptions,
}

impl PackageWriter {
    pub fn new(loader_version: &str, name: &str, version: &str) -> Self {
        Self {
            header: PackageHeader::new(loader_version, name, version),
            entries: Vec::new(),
            payloads: Vec::new(),
            current_offset: 0,
            options: WriterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the opaque content hash carried in the header
    pub fn with_hash(mut self, hash: [u8; HASH_SIZE]) -> Self {
        self.header.hash = hash;
        self
    }

    /// Set the opaque signature carried in the header
    pub fn with_signature(mut self, signature: [u8; SIGNATURE_SIZE]) -> Self {
        self.header.signature = signature;
        self
    }

    /// Add a file, deflating it when that makes the payload smaller
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        if data.len() < self.options.min_compression_size {
            return self.add_file_stored(path, data);
        }

        let compressed = deflate_raw(data, self.options.compression)?;
        // Readers infer compression from the length mismatch, so an equal
        // length stream has to be stored instead
        if compressed.len() < data.len() {
            self.push_entry(path, data.len(), compressed)
        } else {
            self.add_file_stored(path, data)
        }
    }

    /// Add a file without compression
    pub fn add_file_stored(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.push_entry(path, data.len(), data.to_vec())
    }

    /// Add an RGBA8 bitmap as a raw image entry
    pub fn add_raw_image(&mut self, path: &str, width: i32, height: i32, pixels: &[u8]) -> Result<()> {
        let data = encode_raw_image(width, height, pixels)?;
        self.add_file(path, &data)
    }

    /// Number of manifest records written so far
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn push_entry(&mut self, path: &str, size: usize, payload: Vec<u8>) -> Result<()> {
        let normalized = normalize_entry_path(path)?;
        let uncompressed_size = to_i32(size, &normalized)?;
        let stored_len = to_i32(payload.len(), &normalized)?;
        if self.entries.len() >= i32::MAX as usize {
            return Err(TmodError::InvalidManifest("Too many entries".to_string()));
        }

        let entry = EntryDescriptor::new(normalized, uncompressed_size, stored_len, self.current_offset);
        tracing::debug!(
            path = %entry.path,
            start = entry.start,
            stored = stored_len,
            compressed = entry.is_compressed,
            "adding entry"
        );

        self.current_offset += payload.len() as u64;
        self.entries.push(entry);
        self.payloads.push(payload);
        Ok(())
    }

    /// Write header, manifest and data section
    pub fn finish<W: Write>(mut self, mut writer: W) -> Result<()> {
        self.header.entry_count = self.entries.len() as i32;
        self.header.write_to(&mut writer)?;

        for entry in &self.entries {
            entry.write_to(&mut writer)?;
        }
        for payload in &self.payloads {
            writer.write_all(payload)?;
        }
        writer.flush()?;

        tracing::info!(
            name = %self.header.name,
            entries = self.entries.len(),
            data_len = self.current_offset,
            "package written"
        );
        Ok(())
    }

    /// Write the package to a new file at `path`
    pub fn write_to_path<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.finish(BufWriter::new(file))
    }
}

fn to_i32(len: usize, path: &str) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        TmodError::InvalidManifest(format!("{} is too large: {} bytes", path, len))
    })
}
