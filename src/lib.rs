//! tmod-rs: reader, writer and extractor for TMOD mod packages
//!
//! A package is a single file holding:
//! - A header with the loader version, an opaque hash and signature, and the
//!   package name and version
//! - A manifest of entry paths with their uncompressed and stored sizes
//! - A data section with every payload back to back, in manifest order,
//!   raw-deflated when the stored size differs from the uncompressed size
//!
//! Entries ending in `.rawimg` hold raw RGBA bitmaps, which extraction
//! converts to PNG.
//!
//! # Example
//!
//! ```no_run
//! use tmod_rs::{extract, DirectorySink, ExtractOptions, PackageReader};
//!
//! let mut reader = PackageReader::open("ExampleMod.tmod")?;
//! println!("{} {}", reader.header().name, reader.header().version);
//!
//! let mut sink = DirectorySink::new(&reader.header().name);
//! extract(&mut reader, &mut sink, &ExtractOptions::default())?;
//! # Ok::<(), tmod_rs::error::TmodError>(())
//! ```

// Core modules
pub mod archive;
pub mod error;
pub mod extract;
pub mod raw_image;

// Re-export commonly used types
pub use archive::{
    parse_package, EntryDescriptor, Manifest, PackageHeader, PackageInfo, PackageReader,
    PackageWriter, WriterOptions, MAGIC,
};
pub use error::{Result, TmodError};
pub use extract::{
    extract, extract_to_directory, package_root, DirectorySink, EntrySink, ExtractOptions,
    ExtractSummary,
};
pub use raw_image::{decode_image, encode_raw_image, DecodedImage};
