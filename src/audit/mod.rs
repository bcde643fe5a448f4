//! Audit engines: dependency dedup, duplicate-class scan, code census.
//!
//! The three checks are independent, read-only passes over inputs the
//! build environment supplies. [`run`] chains them for the standard
//! pre-ship audit; each engine is also callable on its own.

pub mod archive;
pub mod census;
pub mod classes;
pub mod deps;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::report::jsonl::{EventType, Finding, FindingsLog, Severity};

/// Inputs for one audit run.
#[derive(Debug, Clone, Default)]
pub struct AuditRequest {
    /// Project base directory; relative config paths resolve against it.
    pub base_dir: PathBuf,
    /// Pre-resolved dependency list (JSON). The dependency check runs only
    /// when this is supplied.
    pub deps_input: Option<PathBuf>,
    /// Library-directory override; falls back to `audit.lib_dir`.
    pub lib_dir: Option<PathBuf>,
    /// Record a per-file census finding for every counted file.
    pub verbose: bool,
}

/// Everything one audit run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditOutcome {
    /// True when `audit.skip` short-circuited the run.
    pub skipped: bool,
    /// Dependency grouping, present when a dependency list was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<deps::DuplicateDependencyReport>,
    /// Duplicate-class scan of the library directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<classes::DuplicateClassReport>,
    /// Code census over the configured roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub census: Option<census::CensusReport>,
}

/// Run the full audit: dependencies (when supplied), duplicate classes,
/// census.
///
/// Absent inputs are nothing-to-report; unit-scoped read failures are
/// logged and skipped; anything else aborts the run with the underlying
/// cause attached.
pub fn run(
    config: &Config,
    request: &AuditRequest,
    findings: &mut FindingsLog,
) -> Result<AuditOutcome> {
    if config.audit.skip {
        findings.record(
            &Finding::new(EventType::AuditSkipped, Severity::Info)
                .with_details("audit.skip is set, nothing checked"),
        );
        return Ok(AuditOutcome {
            skipped: true,
            ..AuditOutcome::default()
        });
    }

    findings.record(&Finding::new(EventType::AuditStart, Severity::Info).with_path(&request.base_dir));
    let mut outcome = AuditOutcome::default();

    if let Some(input) = &request.deps_input {
        let records = deps::load_records(input)?;
        let report = deps::DuplicateDependencyReport::group_by_artifact(&records);
        for (artifact, members) in report.duplicate_groups() {
            let mut finding = Finding::new(EventType::DuplicateDependency, Severity::Warning);
            finding.artifact = Some(artifact.to_string());
            finding.members = Some(
                members
                    .iter()
                    .map(|m| m.identity(config.audit.use_base_version))
                    .collect(),
            );
            findings.record(&finding);
        }
        outcome.dependencies = Some(report);
    }

    let lib_dir = resolve_against(
        &request.base_dir,
        request.lib_dir.as_ref().unwrap_or(&config.audit.lib_dir),
    );
    outcome.classes = Some(classes::scan_library(
        &lib_dir,
        config.scanner.parallelism,
        findings,
    )?);

    let settings = walker::WalkSettings::from_config(&config.scanner, config.census.suffix_set());
    outcome.census = Some(census::run_census(
        &config.census.roots(),
        &request.base_dir,
        &settings,
        findings,
        request.verbose,
    )?);

    findings.record(&Finding::new(EventType::AuditComplete, Severity::Info));
    Ok(outcome)
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
