//! Extraction of a package into a directory tree
//!
//! The driver walks the manifest in order, decodes each entry through the
//! reader's shared handle and hands the result to an [`EntrySink`]. Raw image
//! entries are decoded and passed on as images under their `.png` path; all
//! other entries are passed on verbatim. Any error aborts the run. Entries
//! written before the failure stay on disk.

use crate::archive::{image_output_path, normalize_entry_path, to_native_path, PackageReader};
use crate::error::{Result, TmodError};
use crate::raw_image::{decode_image, DecodedImage};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Destination for extracted entries
///
/// Paths are normalized, `/`-separated and relative to the sink's root.
pub trait EntrySink {
    /// Store a regular entry verbatim
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Store a decoded raw image; `path` already carries the image extension
    fn write_image(&mut self, path: &str, image: &DecodedImage) -> Result<()>;
}

/// Options for [`extract`]
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Decode `.rawimg` entries and save them as PNG
    pub convert_raw_images: bool,
    /// Skip raw images that fail to decode instead of aborting
    pub skip_malformed_images: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            convert_raw_images: true,
            skip_malformed_images: false,
        }
    }
}

impl ExtractOptions {
    pub fn with_convert_raw_images(mut self, convert: bool) -> Self {
        self.convert_raw_images = convert;
        self
    }

    pub fn with_skip_malformed_images(mut self, skip: bool) -> Self {
        self.skip_malformed_images = skip;
        self
    }
}

/// What an extraction produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files_written: usize,
    pub images_converted: usize,
    /// Entries skipped because their raw image was malformed
    pub skipped: Vec<String>,
}

/// Extract every manifest entry into `sink`
pub fn extract<R, S>(
    reader: &mut PackageReader<R>,
    sink: &mut S,
    options: &ExtractOptions,
) -> Result<ExtractSummary>
where
    R: Read + Seek,
    S: EntrySink + ?Sized,
{
    let entries: Vec<_> = reader.manifest().iter().map(|(_, entry)| entry.clone()).collect();
    let mut summary = ExtractSummary::default();

    for entry in &entries {
        let data = reader.read_descriptor(entry)?;

        if options.convert_raw_images && entry.is_raw_image() {
            match decode_image(&data) {
                Ok(image) => {
                    let target = image_output_path(&entry.path);
                    tracing::debug!(path = %target, width = image.width, height = image.height, "writing image");
                    sink.write_image(&target, &image)?;
                    summary.images_converted += 1;
                }
                Err(err @ TmodError::MalformedImage(_)) if options.skip_malformed_images => {
                    tracing::warn!(path = %entry.path, error = %err, "skipping malformed raw image");
                    summary.skipped.push(entry.path.clone());
                }
                Err(err) => return Err(err),
            }
        } else {
            tracing::debug!(path = %entry.path, len = data.len(), "writing file");
            sink.write_file(&entry.path, &data)?;
            summary.files_written += 1;
        }
    }

    tracing::info!(
        files = summary.files_written,
        images = summary.images_converted,
        skipped = summary.skipped.len(),
        "extraction finished"
    );
    Ok(summary)
}

/// Open the package at `package_path` and extract it under
/// `output_dir/<package name>`
pub fn extract_to_directory<P, Q>(
    package_path: P,
    output_dir: Q,
    options: &ExtractOptions,
) -> Result<(PathBuf, ExtractSummary)>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut reader = PackageReader::open(package_path)?;
    let root = package_root(output_dir.as_ref(), &reader.header().name)?;
    let mut sink = DirectorySink::new(&root);
    let summary = extract(&mut reader, &mut sink, options)?;
    Ok((root, summary))
}

/// Directory a package named `name` extracts into
pub fn package_root(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let normalized = normalize_entry_path(name)?;
    Ok(to_native_path(output_dir, &normalized))
}

/// Writes entries as files below a root directory, creating parents as needed
pub struct DirectorySink {
    root: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            overwrite: true,
        }
    }

    /// Refuse to replace files that already exist
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_bytes(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = to_native_path(&self.root, path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .create_new(!self.overwrite)
            .truncate(true)
            .open(&target)?;
        file.write_all(data)?;
        Ok(())
    }
}

impl EntrySink for DirectorySink {
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.write_bytes(path, data)
    }

    fn write_image(&mut self, path: &str, image: &DecodedImage) -> Result<()> {
        let png = image.encode_png()?;
        self.write_bytes(path, &png)
    }
}
