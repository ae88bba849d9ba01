#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use tmod_rs::{decode_image, PackageReader};

fuzz_target!(|data: &[u8]| {
    // Parsing, reading and image decoding must fail cleanly, never panic
    let mut reader = match PackageReader::from_source(Cursor::new(data)) {
        Ok(r) => r,
        Err(_) => return,
    };

    let _ = reader.verify_layout();

    let files: Vec<String> = reader.list_entries().to_vec();
    for file in &files {
        if let Ok(bytes) = reader.read_entry(file) {
            if reader.get_entry(file).is_some_and(|e| e.is_raw_image()) {
                let _ = decode_image(&bytes);
            }
        }
    }

    let _ = reader.info();
    let _ = reader.contains("../../../etc/passwd");
    let _ = reader.contains("");
});
