//! Coarse lines-of-code census over configured source and resource roots.
//!
//! Classification is a fixed heuristic, not a parser: after trimming, a
//! line is filler when it is blank, an import, a comment opener (`/`), a
//! block-comment continuation (`*`), or a closing-brace-only line (`}`).
//! Everything else is real. Multi-statement lines count once and a lone
//! opening brace counts as real; that looseness is part of the contract.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::audit::walker::{CensusWalker, WalkSettings};
use crate::core::errors::{Result, ShcError};
use crate::core::paths::display_relative;
use crate::report::jsonl::{EventType, Finding, FindingsLog, Severity};

/// Real/filler line counts. Explicit accumulator value: totals are summed
/// by callers, never stashed in ambient state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineTally {
    /// Substantive lines.
    pub real: u64,
    /// Blank, import, comment, and closing-brace-only lines.
    pub filler: u64,
}

impl LineTally {
    /// Total lines read: real + filler, always.
    #[must_use]
    pub const fn total(self) -> u64 {
        self.real + self.filler
    }

    /// Fold another tally into this one.
    pub fn absorb(&mut self, other: Self) {
        self.real += other.real;
        self.filler += other.filler;
    }
}

/// Census result for one root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootCensus {
    /// Root path as configured.
    pub root: PathBuf,
    /// Root path with the base-directory prefix stripped, for display.
    pub display_path: String,
    /// Aggregated line counts over all matched files.
    pub tally: LineTally,
    /// Number of files that matched the suffix filter.
    pub files: usize,
}

/// Census results over all roots plus the grand totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CensusReport {
    /// Per-root results, in configured order. Missing roots are absent.
    pub roots: Vec<RootCensus>,
    /// Grand total across every root.
    pub totals: LineTally,
}

/// Whether a line is filler after ASCII-whitespace trimming.
///
/// Byte-based so the census is indifferent to the file's encoding.
#[must_use]
pub fn is_filler_line(line: &[u8]) -> bool {
    let trimmed = line.trim_ascii();
    match trimmed {
        [] => true,
        _ => {
            trimmed.starts_with(b"import")
                || matches!(trimmed[0], b'/' | b'*' | b'}')
        }
    }
}

/// Classify every line of one file.
///
/// Lines are the segments between `\n` bytes; a final segment without a
/// trailing newline still counts, a trailing newline does not create an
/// empty extra line.
pub fn tally_file(path: &Path) -> Result<LineTally> {
    let contents = fs::read(path).map_err(|source| ShcError::io(path, source))?;
    Ok(tally_bytes(&contents))
}

fn tally_bytes(contents: &[u8]) -> LineTally {
    let mut tally = LineTally::default();
    let mut start = 0usize;
    for newline in memchr::memchr_iter(b'\n', contents) {
        classify_into(&mut tally, &contents[start..newline]);
        start = newline + 1;
    }
    if start < contents.len() {
        classify_into(&mut tally, &contents[start..]);
    }
    tally
}

fn classify_into(tally: &mut LineTally, line: &[u8]) {
    if is_filler_line(line) {
        tally.filler += 1;
    } else {
        tally.real += 1;
    }
}

/// Census one root directory.
///
/// Returns `None` when the root does not exist (skipped silently, matching
/// the nothing-to-report contract). Unreadable files are logged and
/// contribute nothing; the census continues.
pub fn census_root(
    root: &Path,
    base_dir: &Path,
    settings: &WalkSettings,
    findings: &mut FindingsLog,
    verbose: bool,
) -> Result<Option<RootCensus>> {
    if !root.is_dir() {
        return Ok(None);
    }

    let walker = CensusWalker::new(settings.clone());
    let files = walker.collect(root)?;

    let mut tally = LineTally::default();
    let mut counted = 0usize;
    for file in &files {
        match tally_file(file) {
            Ok(file_tally) => {
                tally.absorb(file_tally);
                counted += 1;
                if verbose {
                    let mut finding = Finding::new(EventType::CensusFile, Severity::Info)
                        .with_path(file);
                    finding.real_lines = Some(file_tally.real);
                    finding.filler_lines = Some(file_tally.filler);
                    findings.record(&finding);
                }
            }
            Err(error) => {
                findings.record(
                    &Finding::new(EventType::Error, Severity::Error)
                        .with_path(file)
                        .with_error_code(error.code())
                        .with_details(error.to_string()),
                );
            }
        }
    }

    let census = RootCensus {
        root: root.to_path_buf(),
        display_path: display_relative(root, base_dir),
        tally,
        files: counted,
    };

    let mut finding = Finding::new(EventType::CensusRoot, Severity::Info).with_path(root);
    finding.real_lines = Some(census.tally.real);
    finding.filler_lines = Some(census.tally.filler);
    finding.files = Some(census.files);
    findings.record(&finding);

    Ok(Some(census))
}

/// Census every configured root under `base_dir`, accumulating the grand
/// totals.
pub fn run_census(
    roots: &[PathBuf],
    base_dir: &Path,
    settings: &WalkSettings,
    findings: &mut FindingsLog,
    verbose: bool,
) -> Result<CensusReport> {
    let mut report = CensusReport::default();
    for root in roots {
        let resolved = if root.is_absolute() {
            root.clone()
        } else {
            base_dir.join(root)
        };
        if let Some(census) = census_root(&resolved, base_dir, settings, findings, verbose)? {
            report.totals.absorb(census.tally);
            report.roots.push(census);
        }
    }
    Ok(report)
}
