//! Duplicate-dependency detection over a pre-resolved dependency list.
//!
//! The build tool hands us the flattened artifact list; nothing here
//! resolves graphs. Records are grouped by artifact identifier ALONE —
//! group id, version, scope, and classifier are deliberately ignored for
//! the grouping key, so `g1:A` and `g2:A` land in one group. The detection
//! target is "the same jar name arriving twice on the classpath"; cross-
//! group collisions are accepted false positives of that heuristic.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ShcError};

/// One resolved dependency, immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DependencyRecord {
    /// Group identifier.
    pub group: String,
    /// Artifact identifier — the deduplication key.
    pub artifact: String,
    /// Resolved version.
    pub version: String,
    /// Unqualified/unsnapshotted version, when the resolver reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_version: Option<String>,
    /// Optional classifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    /// Artifact type; "pom" entries are aggregator declarations, not real
    /// binary dependencies, and are excluded from grouping.
    #[serde(rename = "type")]
    pub kind: String,
    /// Dependency scope.
    pub scope: String,
    /// Optional-dependency flag.
    pub optional: bool,
}

impl Default for DependencyRecord {
    fn default() -> Self {
        Self {
            group: String::new(),
            artifact: String::new(),
            version: String::new(),
            base_version: None,
            classifier: None,
            kind: "jar".to_string(),
            scope: "compile".to_string(),
            optional: false,
        }
    }
}

impl DependencyRecord {
    /// Whether this record is a "pom"-type aggregator declaration.
    #[must_use]
    pub fn is_pom(&self) -> bool {
        self.kind == "pom"
    }

    /// Full identity line, `group:artifact:version`.
    ///
    /// With `use_base_version`, the base version is preferred when present.
    #[must_use]
    pub fn identity(&self, use_base_version: bool) -> String {
        let version = if use_base_version {
            self.base_version.as_deref().unwrap_or(&self.version)
        } else {
            &self.version
        };
        format!("{}:{}:{}", self.group, self.artifact, version)
    }
}

/// Load a resolved dependency list from a JSON file.
///
/// The expected shape is a top-level array of records. A malformed file is
/// fatal: there is no safe partial result for a half-read dependency list.
pub fn load_records(path: &Path) -> Result<Vec<DependencyRecord>> {
    let raw = fs::read_to_string(path).map_err(|source| ShcError::DependencyInput {
        path: path.to_path_buf(),
        details: source.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|error| ShcError::DependencyInput {
        path: path.to_path_buf(),
        details: error.to_string(),
    })
}

/// Dependency records grouped by artifact identifier.
///
/// Ordered map so reports render identically across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateDependencyReport {
    groups: BTreeMap<String, Vec<DependencyRecord>>,
}

impl DuplicateDependencyReport {
    /// Group `records` by artifact id, excluding pom-type declarations.
    #[must_use]
    pub fn group_by_artifact(records: &[DependencyRecord]) -> Self {
        let mut groups: BTreeMap<String, Vec<DependencyRecord>> = BTreeMap::new();
        for record in records {
            if record.is_pom() {
                continue;
            }
            groups
                .entry(record.artifact.clone())
                .or_default()
                .push(record.clone());
        }
        Self { groups }
    }

    /// Groups with more than one member, in artifact-id order.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&str, &[DependencyRecord])> {
        self.groups
            .iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(artifact, members)| (artifact.as_str(), members.as_slice()))
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn total_duplicate_groups(&self) -> usize {
        self.duplicate_groups().count()
    }

    /// Whether any group has more than one member.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_groups().next().is_some()
    }

    /// All groups (including singletons), for JSON output.
    #[must_use]
    pub fn groups(&self) -> &BTreeMap<String, Vec<DependencyRecord>> {
        &self.groups
    }
}
