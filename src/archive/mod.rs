mod binary;
mod entry;
mod format;
mod manifest;
mod path;
mod reader;
mod writer;

pub use binary::{BinaryReader, MAX_STRING_LENGTH};
pub use entry::{deflate_raw, inflate_raw, read_entry_data};
pub use format::{
    EntryDescriptor, PackageHeader, HASH_SIZE, MAGIC, RESERVED_SIZE, SIGNATURE_SIZE,
};
pub use manifest::Manifest;
pub use path::{
    image_output_path, is_raw_image, normalize_entry_path, to_native_path, IMAGE_EXTENSION,
    RAW_IMAGE_EXTENSION,
};
pub use reader::{parse_package, EntrySummary, PackageInfo, PackageReader, ParsedPackage};
pub use writer::{PackageWriter, WriterOptions, MIN_COMPRESSION_SIZE};
