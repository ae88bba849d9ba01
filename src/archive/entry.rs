use crate::archive::format::EntryDescriptor;
use crate::error::{Result, TmodError};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Seek, SeekFrom, Write};

/// Upper bound on buffer space reserved from sizes declared in the manifest
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Read an entry's payload and inflate it when compressed
///
/// Seeks `source` to `data_offset + entry.start` before reading, so entries
/// can be decoded in any order through one shared handle.
pub fn read_entry_data<R: Read + Seek>(
    source: &mut R,
    data_offset: u64,
    entry: &EntryDescriptor,
) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(data_offset + entry.start))?;

    let expected = entry.stored_len as u64;
    let mut stored = Vec::with_capacity((expected as usize).min(MAX_PREALLOCATION));
    (&mut *source).take(expected).read_to_end(&mut stored)?;
    if (stored.len() as u64) < expected {
        return Err(TmodError::truncated(format!("payload of {}", entry.path), expected));
    }

    if entry.is_compressed {
        tracing::debug!(
            path = %entry.path,
            stored = entry.stored_len,
            size = entry.uncompressed_size,
            "inflating entry"
        );
        inflate_raw(&stored, entry.uncompressed_size as usize)
    } else {
        Ok(stored)
    }
}

/// Inflate a headerless deflate stream that must expand to `expected_size` bytes
///
/// Output is capped one byte past `expected_size` so a stream that expands
/// further is reported without being fully materialized.
pub fn inflate_raw(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION));
    DeflateDecoder::new(data)
        .take(expected_size as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| TmodError::DecompressionError(format!("Raw deflate stream: {}", e)))?;

    if output.len() != expected_size {
        return Err(TmodError::DecompressionError(format!(
            "Size mismatch: expected {} bytes, got {}{}",
            expected_size,
            output.len(),
            if output.len() > expected_size { " or more" } else { "" }
        )));
    }

    Ok(output)
}

/// Compress `data` into a headerless deflate stream
pub fn deflate_raw(data: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::io::Cursor;

    #[test]
    fn test_raw_deflate_roundtrip_random_buffers() {
        let mut rng = StdRng::seed_from_u64(0x544D_4F44);
        for _ in 0..64 {
            let len = rng.gen_range(0..8192);
            let mut data = vec![0u8; len];
            // Mix incompressible noise with runs so both code paths get exercised
            rng.fill(&mut data[..]);
            if len > 16 && rng.gen_bool(0.5) {
                let run = rng.gen_range(0..len / 2);
                data[..run].fill(0x42);
            }

            let compressed = deflate_raw(&data, Compression::default()).unwrap();
            assert_eq!(inflate_raw(&compressed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_stream_has_no_zlib_header() {
        let compressed = deflate_raw(b"hello hello hello hello", Compression::best()).unwrap();
        // A zlib stream would start with 0x78
        assert_ne!(compressed[0], 0x78);
        assert!(flate2::read::ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut Vec::new())
            .is_err());
    }

    #[test]
    fn test_size_mismatch_is_decompression_error() {
        let compressed = deflate_raw(&[7u8; 100], Compression::default()).unwrap();
        assert!(matches!(inflate_raw(&compressed, 99), Err(TmodError::DecompressionError(_))));
        assert!(matches!(inflate_raw(&compressed, 101), Err(TmodError::DecompressionError(_))));
    }

    #[test]
    fn test_garbage_stream_rejected() {
        // BTYPE = 11 is reserved in deflate
        let garbage = [0xFFu8; 32];
        assert!(matches!(inflate_raw(&garbage, 64), Err(TmodError::DecompressionError(_))));
    }

    #[test]
    fn test_reads_at_data_offset_plus_start() {
        let mut data = b"HEADER".to_vec();
        data.extend_from_slice(b"first");
        data.extend_from_slice(b"second");
        let mut source = Cursor::new(data);

        let second = EntryDescriptor::new("second.txt".into(), 6, 6, 5);
        let first = EntryDescriptor::new("first.txt".into(), 5, 5, 0);

        // Order does not matter: each read seeks first
        assert_eq!(read_entry_data(&mut source, 6, &second).unwrap(), b"second");
        assert_eq!(read_entry_data(&mut source, 6, &first).unwrap(), b"first");
    }

    #[test]
    fn test_short_payload_is_truncated() {
        let mut source = Cursor::new(b"abc".to_vec());
        let entry = EntryDescriptor::new("x.bin".into(), 10, 10, 0);
        assert!(matches!(
            read_entry_data(&mut source, 0, &entry),
            Err(TmodError::TruncatedInput { expected: 10, .. })
        ));
    }

    #[test]
    fn test_compressed_entry_inflated() {
        let original = "Lorem ipsum dolor sit amet ".repeat(40);
        let compressed = deflate_raw(original.as_bytes(), Compression::default()).unwrap();
        let entry = EntryDescriptor::new(
            "lorem.txt".into(),
            original.len() as i32,
            compressed.len() as i32,
            0,
        );
        assert!(entry.is_compressed);

        let mut source = Cursor::new(compressed);
        assert_eq!(read_entry_data(&mut source, 0, &entry).unwrap(), original.as_bytes());
    }
}
