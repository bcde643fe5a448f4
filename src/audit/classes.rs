//! Duplicate-class detection across the archives of a packaged library
//! directory.
//!
//! The library directory is a flat listing; archives are scanned on a
//! worker pool and their inventories merged on the calling thread into an
//! entry-name → owning-archive-set map. Ordered containers keep repeated
//! runs over an unchanged directory byte-identical.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel as channel;
use serde::Serialize;

use crate::audit::archive::{self, ArchiveInventory};
use crate::core::errors::{Result, ShcError};
use crate::report::jsonl::{EventType, Finding, FindingsLog, Severity};

/// Entry-name → owning archives, plus scan bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateClassReport {
    owners: BTreeMap<String, BTreeSet<String>>,
    archives_scanned: usize,
}

impl DuplicateClassReport {
    /// Fold one archive's inventory into the ownership map.
    ///
    /// Set semantics dedupe an entry repeated inside the same archive.
    pub fn absorb(&mut self, inventory: ArchiveInventory) {
        self.archives_scanned += 1;
        for entry in inventory.entries {
            self.owners
                .entry(entry)
                .or_default()
                .insert(inventory.name.clone());
        }
    }

    /// Entries owned by more than one archive, in entry-name order.
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.owners
            .iter()
            .filter(|(_, archives)| archives.len() > 1)
            .map(|(entry, archives)| (entry.as_str(), archives))
    }

    /// Count of distinct duplicated entry names.
    #[must_use]
    pub fn total_duplicate_entries(&self) -> usize {
        self.duplicates().count()
    }

    /// Distinct archives implicated in at least one duplicate. Each archive
    /// counts once no matter how many duplicates it shares.
    #[must_use]
    pub fn implicated_archives(&self) -> BTreeSet<&str> {
        self.duplicates()
            .flat_map(|(_, archives)| archives.iter().map(String::as_str))
            .collect()
    }

    /// Whether any entry has more than one owner.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.duplicates().next().is_some()
    }

    /// Number of archives that contributed an inventory.
    #[must_use]
    pub fn archives_scanned(&self) -> usize {
        self.archives_scanned
    }
}

/// Scan every archive in `lib_dir` and report duplicated entries.
///
/// A missing or empty directory is nothing to report, not an error. An
/// unreadable archive is logged and contributes an empty inventory; the
/// scan continues for the remaining archives.
pub fn scan_library(
    lib_dir: &Path,
    parallelism: usize,
    findings: &mut FindingsLog,
) -> Result<DuplicateClassReport> {
    let mut report = DuplicateClassReport::default();

    if !lib_dir.is_dir() {
        findings.record(
            &Finding::new(EventType::AuditSkipped, Severity::Info)
                .with_path(lib_dir)
                .with_details("library directory absent, duplicate-class check skipped"),
        );
        return Ok(report);
    }

    let archives = list_archives(lib_dir)?;
    if archives.is_empty() {
        return Ok(report);
    }

    let workers = parallelism.max(1).min(archives.len());
    let (work_tx, work_rx) = channel::bounded::<PathBuf>(archives.len());
    let (result_tx, result_rx) = channel::unbounded::<(PathBuf, Result<ArchiveInventory>)>();

    for path in archives {
        work_tx
            .send(path)
            .map_err(|_| ShcError::ChannelClosed {
                component: "class-scan work queue",
            })?;
    }
    drop(work_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(path) = work_rx.recv() {
                    let outcome = archive::scan_archive(&path);
                    if result_tx.send((path, outcome)).is_err() {
                        return;
                    }
                }
            });
        }
        drop(result_tx);

        // Merge on this thread only: per-worker partials, no shared locks.
        for (path, outcome) in result_rx.iter() {
            match outcome {
                Ok(inventory) => report.absorb(inventory),
                Err(error) => {
                    findings.record(
                        &Finding::new(EventType::Error, Severity::Error)
                            .with_path(&path)
                            .with_error_code(error.code())
                            .with_details(error.to_string()),
                    );
                    report.absorb(ArchiveInventory {
                        name: archive::archive_name(&path),
                        entries: Vec::new(),
                    });
                }
            }
        }
    });

    for (entry, owners) in report.duplicates() {
        let mut finding = Finding::new(EventType::DuplicateClass, Severity::Warning);
        finding.entry = Some(entry.to_string());
        finding.archives = Some(owners.iter().cloned().collect());
        findings.record(&finding);
    }

    Ok(report)
}

/// Regular files of the library directory, flat (no recursion), sorted for
/// deterministic work order.
fn list_archives(lib_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    let entries = fs::read_dir(lib_dir).map_err(|source| ShcError::io(lib_dir, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| ShcError::io(lib_dir, source))?;
        let path = entry.path();
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::archive::write_jar;

    #[test]
    fn shared_entry_reported_with_both_owners() {
        // X{a.class, b.class} + Y{a.class, c.class} => a.class owned by both.
        let tmp = tempfile::tempdir().unwrap();
        write_jar(&tmp.path().join("x.jar"), &["a.class", "b.class"]);
        write_jar(&tmp.path().join("y.jar"), &["a.class", "c.class"]);

        let mut findings = FindingsLog::disabled();
        let report = scan_library(tmp.path(), 2, &mut findings).unwrap();

        let dupes: Vec<_> = report.duplicates().collect();
        assert_eq!(dupes.len(), 1);
        let (entry, owners) = &dupes[0];
        assert_eq!(*entry, "a.class");
        let owner_names: Vec<&str> = owners.iter().map(String::as_str).collect();
        assert_eq!(owner_names, vec!["x.jar", "y.jar"]);

        assert_eq!(report.total_duplicate_entries(), 1);
        assert_eq!(report.implicated_archives().len(), 2);
        assert_eq!(report.archives_scanned(), 2);
    }

    #[test]
    fn missing_directory_is_a_quiet_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut findings = FindingsLog::disabled();
        let report = scan_library(&tmp.path().join("absent"), 2, &mut findings).unwrap();
        assert!(!report.has_duplicates());
        assert_eq!(report.archives_scanned(), 0);
    }

    #[test]
    fn empty_directory_is_a_quiet_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut findings = FindingsLog::disabled();
        let report = scan_library(tmp.path(), 2, &mut findings).unwrap();
        assert_eq!(report.archives_scanned(), 0);
    }

    #[test]
    fn unreadable_archive_contributes_empty_inventory() {
        let tmp = tempfile::tempdir().unwrap();
        write_jar(&tmp.path().join("good.jar"), &["a.class"]);
        std::fs::write(tmp.path().join("broken.jar"), b"not a zip").unwrap();

        let mut findings = FindingsLog::disabled();
        let report = scan_library(tmp.path(), 2, &mut findings).unwrap();

        // Both archives counted, no duplicates, run not aborted.
        assert_eq!(report.archives_scanned(), 2);
        assert!(!report.has_duplicates());
    }

    #[test]
    fn repeated_scans_produce_identical_reports() {
        let tmp = tempfile::tempdir().unwrap();
        write_jar(&tmp.path().join("x.jar"), &["a.class", "b.class"]);
        write_jar(&tmp.path().join("y.jar"), &["a.class"]);
        write_jar(&tmp.path().join("z.jar"), &["b.class", "a.class"]);

        let mut findings = FindingsLog::disabled();
        let first = scan_library(tmp.path(), 3, &mut findings).unwrap();
        let second = scan_library(tmp.path(), 1, &mut findings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entry_repeated_inside_one_archive_is_not_a_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        // Zip permits repeated names; the owner set dedupes them.
        write_jar(&tmp.path().join("x.jar"), &["a.class", "a.class"]);

        let mut findings = FindingsLog::disabled();
        let report = scan_library(tmp.path(), 1, &mut findings).unwrap();
        assert!(!report.has_duplicates());
    }
}
