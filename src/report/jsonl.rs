//! JSONL findings log: append-only line-delimited JSON for tool-friendly
//! consumption of audit findings.
//!
//! Each line is a self-contained JSON object, assembled in memory and
//! written with a single `write_all` so concurrent tail readers never see
//! a partial line.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. stderr with `[SHC-FINDINGS]` prefix
//! 3. Silent discard (an audit must never fail because its log did)

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Severity level for a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Finding types matching the shipcheck audit model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AuditStart,
    AuditSkipped,
    DuplicateDependency,
    DuplicateClass,
    CensusRoot,
    CensusFile,
    AuditComplete,
    Error,
}

/// A single finding — all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Finding type identifier.
    pub event: EventType,
    /// Severity level.
    pub severity: Severity,
    /// Affected filesystem path (when applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Archive entry name, for duplicate-class findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Archive names owning a duplicated entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archives: Option<Vec<String>>,
    /// Artifact id, for duplicate-dependency findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Identity lines of a duplicate dependency group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    /// Substantive line count, for census findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_lines: Option<u64>,
    /// Filler line count, for census findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filler_lines: Option<u64>,
    /// Matched file count, for census findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<usize>,
    /// SHC error code when the finding records a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Finding {
    /// Create a new finding stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            path: None,
            entry: None,
            archives: None,
            artifact: None,
            members: None,
            real_lines: None,
            filler_lines: None,
            files: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }
}

/// Degradation state of the findings writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Writing to the primary path.
    Normal,
    /// Primary failed, writing to stderr.
    Stderr,
    /// Intentionally or terminally discarding.
    Discard,
}

/// Append-only JSONL findings log with graceful degradation.
pub struct FindingsLog {
    writer: Option<BufWriter<File>>,
    state: WriterState,
}

impl FindingsLog {
    /// Open the findings log. Falls through the degradation chain on failure.
    pub fn open(path: &Path) -> Self {
        match open_append(path) {
            Ok(file) => Self {
                writer: Some(BufWriter::with_capacity(64 * 1024, file)),
                state: WriterState::Normal,
            },
            Err(_) => {
                let _ = writeln!(
                    io::stderr(),
                    "[SHC-FINDINGS] cannot open {}, findings go to stderr",
                    path.display()
                );
                Self {
                    writer: None,
                    state: WriterState::Stderr,
                }
            }
        }
    }

    /// A log that drops everything. For library callers that only want the
    /// returned reports.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            writer: None,
            state: WriterState::Discard,
        }
    }

    /// Record a single finding as one atomic JSONL line.
    pub fn record(&mut self, finding: &Finding) {
        let line = match serde_json::to_string(finding) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                // Serialization failure is a programming error; note it and bail.
                let _ = writeln!(io::stderr(), "[SHC-FINDINGS] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Flush buffered findings.
    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state, for diagnostics.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.degrade();
                        self.write_line(line);
                    }
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[SHC-FINDINGS] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => {
                self.state = WriterState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[SHC-FINDINGS] primary write failed, using stderr"
                );
            }
            WriterState::Stderr => self.state = WriterState::Discard,
            WriterState::Discard => {}
        }
    }
}

impl Drop for FindingsLog {
    fn drop(&mut self) {
        self.flush();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_produces_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("findings.jsonl");
        let mut log = FindingsLog::open(&path);
        assert_eq!(log.state(), "normal");

        log.record(
            &Finding::new(EventType::DuplicateClass, Severity::Warning)
                .with_details("a.class owned twice"),
        );
        log.record(&Finding::new(EventType::AuditComplete, Severity::Info));
        log.flush();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: Finding = serde_json::from_str(line).unwrap();
            assert!(!parsed.ts.is_empty());
        }
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("f.jsonl");
        let mut log = FindingsLog::open(&path);
        log.record(&Finding::new(EventType::AuditStart, Severity::Info));
        log.flush();
        assert!(path.exists());
    }

    #[test]
    fn disabled_log_drops_everything() {
        let mut log = FindingsLog::disabled();
        assert_eq!(log.state(), "discard");
        log.record(&Finding::new(EventType::Error, Severity::Error));
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let finding = Finding::new(EventType::AuditStart, Severity::Info);
        let json = serde_json::to_string(&finding).unwrap();
        assert!(!json.contains("entry"));
        assert!(!json.contains("error_code"));
    }
}
