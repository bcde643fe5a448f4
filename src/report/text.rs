//! Three-section human report: duplicate dependencies, duplicate classes,
//! code census.

use std::io::{self, Write};

use colored::Colorize;

use crate::audit::AuditOutcome;
use crate::audit::census::CensusReport;
use crate::audit::classes::DuplicateClassReport;
use crate::audit::deps::DuplicateDependencyReport;

/// Render the full audit outcome.
pub fn render(
    outcome: &AuditOutcome,
    use_base_version: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    if outcome.skipped {
        return writeln!(out, "Skipping duplicate check.");
    }

    if let Some(dependencies) = &outcome.dependencies {
        render_dependencies(dependencies, use_base_version, out)?;
        writeln!(out)?;
    }
    if let Some(classes) = &outcome.classes {
        render_classes(classes, out)?;
        writeln!(out)?;
    }
    if let Some(census) = &outcome.census {
        render_census(census, out)?;
    }
    Ok(())
}

/// Duplicate-dependency section: one identity line per member, grouped.
pub fn render_dependencies(
    report: &DuplicateDependencyReport,
    use_base_version: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{}", "Duplicate dependencies".bold())?;
    if !report.has_duplicates() {
        return writeln!(out, "  none found");
    }
    for (artifact, members) in report.duplicate_groups() {
        writeln!(out, "  {}", artifact.red())?;
        for member in members {
            writeln!(out, "    {}", member.identity(use_base_version))?;
        }
    }
    Ok(())
}

/// Duplicate-class section: entry name, owning archives, summary counts.
pub fn render_classes(report: &DuplicateClassReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "Duplicate classes".bold())?;
    if !report.has_duplicates() {
        writeln!(
            out,
            "  none found across {} archives",
            report.archives_scanned()
        )?;
        return Ok(());
    }
    for (entry, owners) in report.duplicates() {
        writeln!(out, "  {}", entry.red())?;
        for owner in owners {
            writeln!(out, "    {owner}")?;
        }
    }
    writeln!(
        out,
        "  total: {} duplicate entries in {} archives",
        report.total_duplicate_entries(),
        report.implicated_archives().len()
    )
}

/// Census section: one line per root, then the grand total.
pub fn render_census(report: &CensusReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "Code census".bold())?;
    for root in &report.roots {
        writeln!(
            out,
            "  {} : {} ({}) lines of code in {} files",
            root.display_path, root.tally.filler, root.tally.real, root.files
        )?;
    }
    writeln!(
        out,
        "  TOTAL LINES: {} ({})",
        report.totals.filler, report.totals.real
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::deps::DependencyRecord;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn dependency_section_lists_each_member() {
        plain();
        let records = vec![
            DependencyRecord {
                group: "g1".into(),
                artifact: "A".into(),
                version: "1.0".into(),
                ..DependencyRecord::default()
            },
            DependencyRecord {
                group: "g2".into(),
                artifact: "A".into(),
                version: "2.0".into(),
                ..DependencyRecord::default()
            },
        ];
        let report = DuplicateDependencyReport::group_by_artifact(&records);

        let mut buf = Vec::new();
        render_dependencies(&report, false, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("g1:A:1.0"));
        assert!(text.contains("g2:A:2.0"));
    }

    #[test]
    fn census_section_ends_with_grand_total() {
        plain();
        let report = CensusReport::default();
        let mut buf = Vec::new();
        render_census(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.trim_end().ends_with("TOTAL LINES: 0 (0)"));
    }

    #[test]
    fn skipped_outcome_renders_skip_notice() {
        plain();
        let outcome = AuditOutcome {
            skipped: true,
            ..AuditOutcome::default()
        };
        let mut buf = Vec::new();
        render(&outcome, false, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Skipping duplicate check.\n");
    }
}
