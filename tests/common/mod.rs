//! Shared fixture helpers for integration tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write a stored-compression jar with the given entry names.
pub fn write_jar(path: &Path, entries: &[&str]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for entry in entries {
        writer.start_file(*entry, options).unwrap();
        writer.write_all(b"\xca\xfe\xba\xbe").unwrap();
    }
    writer.finish().unwrap();
}
