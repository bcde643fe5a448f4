//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ShcError};

/// Default census suffix set, matched case-insensitively against the text
/// after the last dot of a file name.
pub const DEFAULT_INCLUDES: [&str; 4] = ["java", "xml", "sql", "properties"];

/// Full shipcheck configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub audit: AuditConfig,
    pub census: CensusConfig,
    pub scanner: ScannerConfig,
    pub paths: PathsConfig,
}

/// Duplicate-audit switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    /// Short-circuit every check when true.
    pub skip: bool,
    /// Use a dependency's base version instead of its resolved version for
    /// the identity line.
    pub use_base_version: bool,
    /// Library directory of the packaged application, holding the bundled
    /// archives. Relative paths resolve against the audited base directory.
    pub lib_dir: PathBuf,
}

/// Code-census roots and suffix filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CensusConfig {
    /// Accepted file suffixes, lowercase.
    pub includes: Vec<String>,
    /// Source roots, relative to the audited base directory.
    pub source_roots: Vec<PathBuf>,
    /// Resource roots, relative to the audited base directory.
    pub resource_roots: Vec<PathBuf>,
}

/// Walker behavior and safety constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    pub max_depth: usize,
    pub parallelism: usize,
    pub follow_symlinks: bool,
    pub cross_devices: bool,
    pub excluded_paths: Vec<PathBuf>,
}

/// Filesystem paths used by shipcheck itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub findings_log: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            skip: false,
            use_base_version: false,
            lib_dir: PathBuf::from("dist/WEB-INF/lib"),
        }
    }
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            includes: DEFAULT_INCLUDES.iter().map(ToString::to_string).collect(),
            source_roots: vec![
                PathBuf::from("src/main/java"),
                PathBuf::from("src/test/java"),
            ],
            resource_roots: vec![
                PathBuf::from("src/main/resources"),
                PathBuf::from("src/test/resources"),
            ],
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            parallelism: std::thread::available_parallelism()
                .map_or(2, |n| n.get().saturating_div(2).max(1)),
            follow_symlinks: false,
            cross_devices: false,
            excluded_paths: Vec::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[SHC-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("shipcheck").join("config.toml");
        let data = home_dir.join(".local").join("share").join("shipcheck");
        Self {
            config_file: cfg,
            findings_log: data.join("findings.jsonl"),
        }
    }
}

impl CensusConfig {
    /// Accepted suffixes as a lowercase lookup set.
    #[must_use]
    pub fn suffix_set(&self) -> HashSet<String> {
        self.includes
            .iter()
            .map(|s| s.trim().to_ascii_lowercase())
            .collect()
    }

    /// Census roots in report order: sources first, then resources.
    #[must_use]
    pub fn roots(&self) -> Vec<PathBuf> {
        self.source_roots
            .iter()
            .chain(self.resource_roots.iter())
            .cloned()
            .collect()
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ShcError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(ShcError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(env_var)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // audit
        if let Some(raw) = lookup("SHC_AUDIT_SKIP") {
            self.audit.skip = parse_env_bool("SHC_AUDIT_SKIP", &raw)?;
        }
        if let Some(raw) = lookup("SHC_AUDIT_USE_BASE_VERSION") {
            self.audit.use_base_version = parse_env_bool("SHC_AUDIT_USE_BASE_VERSION", &raw)?;
        }
        if let Some(raw) = lookup("SHC_AUDIT_LIB_DIR") {
            self.audit.lib_dir = PathBuf::from(raw);
        }

        // census
        if let Some(raw) = lookup("SHC_CENSUS_INCLUDES") {
            self.census.includes = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(raw) = lookup("SHC_CENSUS_SOURCE_ROOTS") {
            self.census.source_roots = split_env_paths(&raw);
        }
        if let Some(raw) = lookup("SHC_CENSUS_RESOURCE_ROOTS") {
            self.census.resource_roots = split_env_paths(&raw);
        }

        // scanner
        if let Some(raw) = lookup("SHC_SCANNER_MAX_DEPTH") {
            self.scanner.max_depth = parse_env_usize("SHC_SCANNER_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("SHC_SCANNER_PARALLELISM") {
            self.scanner.parallelism = parse_env_usize("SHC_SCANNER_PARALLELISM", &raw)?;
        }
        if let Some(raw) = lookup("SHC_SCANNER_FOLLOW_SYMLINKS") {
            self.scanner.follow_symlinks = parse_env_bool("SHC_SCANNER_FOLLOW_SYMLINKS", &raw)?;
        }
        if let Some(raw) = lookup("SHC_SCANNER_CROSS_DEVICES") {
            self.scanner.cross_devices = parse_env_bool("SHC_SCANNER_CROSS_DEVICES", &raw)?;
        }

        // paths
        if let Some(raw) = lookup("SHC_FINDINGS_LOG") {
            self.paths.findings_log = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Normalize for consistent comparison: lowercase suffixes, strip
    /// trailing slashes from roots.
    fn normalize(&mut self) {
        for suffix in &mut self.census.includes {
            *suffix = suffix.trim().to_ascii_lowercase();
        }
        self.census.includes.retain(|s| !s.is_empty());

        for path in self
            .census
            .source_roots
            .iter_mut()
            .chain(self.census.resource_roots.iter_mut())
            .chain(self.scanner.excluded_paths.iter_mut())
        {
            let s = path.to_string_lossy();
            if s.len() > 1
                && let Some(stripped) = s.strip_suffix('/')
            {
                *path = PathBuf::from(stripped);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scanner.parallelism == 0 {
            return Err(ShcError::InvalidConfig {
                details: "scanner.parallelism must be >= 1".to_string(),
            });
        }
        if self.scanner.max_depth == 0 {
            return Err(ShcError::InvalidConfig {
                details: "scanner.max_depth must be >= 1".to_string(),
            });
        }
        if self.census.includes.is_empty() {
            return Err(ShcError::InvalidConfig {
                details: "census.includes must list at least one suffix".to_string(),
            });
        }
        if self.audit.lib_dir.as_os_str().is_empty() {
            return Err(ShcError::InvalidConfig {
                details: "audit.lib_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn split_env_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.parse::<usize>().map_err(|error| ShcError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>().map_err(|error| ShcError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
