//! Single-archive entry listing.
//!
//! One archive in, one inventory out. The zip handle lives only inside
//! [`scan_archive`] — open, iterate the central directory, drop — so the
//! file is released on both the success and the failure path.

use std::fs::File;
use std::path::Path;

use crate::core::errors::{Result, ShcError};

/// Entry names one archive contributes, keyed by the archive's file name.
///
/// Archive identity is the file name, not a content hash: two differently
/// named archives with identical content are distinct owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInventory {
    /// Archive file name (no directory component).
    pub name: String,
    /// Class-like entry names found inside.
    pub entries: Vec<String>,
}

/// Whether an entry name is class-like.
///
/// Preserved compatibility rule: the FIRST occurrence of the substring
/// "class" must sit at index > 0. So `com/foo/Bar.class` matches,
/// `myclasses.txt` matches, but `classes/Bar.class` does not (index 0).
#[must_use]
pub fn is_class_entry(name: &str) -> bool {
    name.find("class").is_some_and(|idx| idx > 0)
}

/// File-name component of an archive path, lossily decoded.
#[must_use]
pub fn archive_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Scan one archive and list its class-like entry names.
///
/// Failures are unit-scoped ([`ShcError::Archive`], non-fatal): the caller
/// logs them and lets the archive contribute an empty inventory.
pub fn scan_archive(path: &Path) -> Result<ArchiveInventory> {
    let name = archive_name(path);
    let archive_err = |details: String| ShcError::Archive {
        path: path.to_path_buf(),
        details,
    };

    let file = File::open(path).map_err(|e| archive_err(e.to_string()))?;
    let zip = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;
    let entries = zip
        .file_names()
        .filter(|entry| is_class_entry(entry))
        .map(str::to_owned)
        .collect();

    Ok(ArchiveInventory { name, entries })
}

/// Test fixture: write a stored-compression jar with the given entry names.
#[cfg(test)]
pub(crate) fn write_jar(path: &Path, entries: &[&str]) {
    use std::io::Write;

    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for entry in entries {
        // The zip writer keys entries by name and rejects duplicates; a real
        // archive's central directory is likewise deduped on read. Skip an
        // entry the writer refuses (a repeated name) rather than panicking.
        if writer.start_file(*entry, options).is_err() {
            continue;
        }
        writer.write_all(b"\xca\xfe\xba\xbe").unwrap();
    }
    writer.finish().unwrap();
}
