use crate::archive::binary::BinaryReader;
use crate::archive::entry::read_entry_data;
use crate::archive::format::{EntryDescriptor, PackageHeader};
use crate::archive::manifest::Manifest;
use crate::archive::path::normalize_entry_path;
use crate::error::{Result, TmodError};
use crate::raw_image::{decode_image, DecodedImage};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Everything learned from the header and manifest
#[derive(Debug, Clone)]
pub struct ParsedPackage {
    pub header: PackageHeader,
    pub manifest: Manifest,
    /// Position of the first payload byte in the source
    pub data_offset: u64,
    /// Sum of every manifest record's stored length, duplicates included
    pub data_len: u64,
}

/// Parse the header and manifest from a source positioned at the magic
///
/// `start` is the source position of the magic; `data_offset` is reported
/// relative to the same origin. Entry offsets accumulate over every record in
/// file order, so a record whose path is later overwritten still advances the
/// offset of the records after it.
pub fn parse_package<R: Read>(source: R, start: u64) -> Result<ParsedPackage> {
    let mut reader = BinaryReader::with_position(source, start);
    let header = PackageHeader::read_from(&mut reader)?;

    let mut manifest = Manifest::with_capacity((header.entry_count as usize).min(4096));
    let mut running_offset: u64 = 0;

    for index in 0..header.entry_count {
        let entry = EntryDescriptor::read_from(&mut reader, running_offset)?;
        running_offset += entry.stored_len as u64;

        tracing::debug!(
            index,
            path = %entry.path,
            start = entry.start,
            stored = entry.stored_len,
            compressed = entry.is_compressed,
            "manifest entry"
        );

        if let Some(previous) = manifest.insert(entry) {
            tracing::warn!(
                path = %previous.path,
                replaced_start = previous.start,
                "duplicate manifest path, keeping the later entry"
            );
        }
    }

    Ok(ParsedPackage {
        header,
        manifest,
        data_offset: reader.position(),
        data_len: running_offset,
    })
}

/// Read access to a package through a single seekable handle
pub struct PackageReader<R = BufReader<File>> {
    source: R,
    header: PackageHeader,
    manifest: Manifest,
    data_offset: u64,
    data_len: u64,
}

impl PackageReader<BufReader<File>> {
    /// Open a package file and parse its header and manifest
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "opening package");
        Self::from_source(BufReader::new(file))
    }
}

impl<R: Read + Seek> PackageReader<R> {
    /// Parse a package starting at the source's current position
    pub fn from_source(mut source: R) -> Result<Self> {
        let start = source.stream_position()?;
        let parsed = parse_package(&mut source, start)?;

        tracing::info!(
            name = %parsed.header.name,
            version = %parsed.header.version,
            loader = %parsed.header.loader_version,
            entries = parsed.manifest.len(),
            data_offset = parsed.data_offset,
            "parsed package"
        );

        Ok(Self {
            source,
            header: parsed.header,
            manifest: parsed.manifest,
            data_offset: parsed.data_offset,
            data_len: parsed.data_len,
        })
    }

    /// Get package header information
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Source position where the data section begins
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Bytes the manifest says the data section holds
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Number of distinct entry paths
    pub fn entry_count(&self) -> usize {
        self.manifest.len()
    }

    /// List all entry paths in manifest order
    pub fn list_entries(&self) -> &[String] {
        self.manifest.paths()
    }

    /// Check if an entry exists; the query is normalized first
    pub fn contains(&self, path: &str) -> bool {
        self.get_entry(path).is_some()
    }

    /// Get entry information without reading data
    pub fn get_entry(&self, path: &str) -> Option<&EntryDescriptor> {
        let normalized = normalize_entry_path(path).ok()?;
        self.manifest.get(&normalized)
    }

    /// Read an entry's bytes, inflated if stored compressed
    pub fn read_entry(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .get_entry(path)
            .ok_or_else(|| TmodError::EntryNotFound(path.to_string()))?
            .clone();
        self.read_descriptor(&entry)
    }

    /// Read the bytes behind a descriptor from this package
    pub fn read_descriptor(&mut self, entry: &EntryDescriptor) -> Result<Vec<u8>> {
        read_entry_data(&mut self.source, self.data_offset, entry)
    }

    /// Read and decode a raw image entry
    pub fn read_image(&mut self, path: &str) -> Result<DecodedImage> {
        let data = self.read_entry(path)?;
        decode_image(&data)
    }

    /// Check that the data section holds every byte the manifest declares
    ///
    /// Fails with `TruncatedInput` when the source ends early. Trailing bytes
    /// after the last payload are tolerated.
    pub fn verify_layout(&mut self) -> Result<()> {
        let end = self.source.seek(SeekFrom::End(0))?;
        let available = end.saturating_sub(self.data_offset);

        if available < self.data_len {
            return Err(TmodError::truncated("data section", self.data_len));
        }
        if available > self.data_len {
            tracing::warn!(
                trailing = available - self.data_len,
                "package has bytes after the last payload"
            );
        }
        Ok(())
    }

    /// Serializable summary of the header and manifest
    pub fn info(&self) -> PackageInfo {
        PackageInfo {
            loader_version: self.header.loader_version.clone(),
            name: self.header.name.clone(),
            version: self.header.version.clone(),
            hash: hex::encode(self.header.hash),
            signature: hex::encode(self.header.signature),
            data_offset: self.data_offset,
            data_len: self.data_len,
            entries: self
                .manifest
                .iter()
                .map(|(path, entry)| EntrySummary {
                    path: path.to_string(),
                    size: entry.uncompressed_size,
                    stored_len: entry.stored_len,
                    start: entry.start,
                    compressed: entry.is_compressed,
                })
                .collect(),
        }
    }

    /// Give back the underlying source
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Package summary for listings
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub loader_version: String,
    pub name: String,
    pub version: String,
    /// Content hash, hex encoded
    pub hash: String,
    /// Signature, hex encoded
    pub signature: String,
    pub data_offset: u64,
    pub data_len: u64,
    pub entries: Vec<EntrySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub path: String,
    pub size: i32,
    pub stored_len: i32,
    pub start: u64,
    pub compressed: bool,
}
