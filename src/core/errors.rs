//! SHC-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, ShcError>;

/// Top-level error type for shipcheck.
#[derive(Debug, Error)]
pub enum ShcError {
    #[error("[SHC-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SHC-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SHC-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SHC-1101] unusable resolved-dependency list {path}: {details}")]
    DependencyInput { path: PathBuf, details: String },

    #[error("[SHC-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SHC-2201] archive read failure for {path}: {details}")]
    Archive { path: PathBuf, details: String },

    #[error("[SHC-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SHC-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[SHC-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl ShcError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SHC-1001",
            Self::MissingConfig { .. } => "SHC-1002",
            Self::ConfigParse { .. } => "SHC-1003",
            Self::DependencyInput { .. } => "SHC-1101",
            Self::Serialization { .. } => "SHC-2101",
            Self::Archive { .. } => "SHC-2201",
            Self::Io { .. } => "SHC-3002",
            Self::ChannelClosed { .. } => "SHC-3003",
            Self::Runtime { .. } => "SHC-3900",
        }
    }

    /// Whether the failure must abort the whole audit.
    ///
    /// Archive and plain IO failures are scoped to a single unit (one
    /// archive, one census file); call sites log them and keep going with
    /// an empty contribution. Everything else has no safe partial result.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Archive { .. } | Self::Io { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for ShcError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for ShcError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<ShcError> {
        vec![
            ShcError::InvalidConfig {
                details: String::new(),
            },
            ShcError::MissingConfig {
                path: PathBuf::new(),
            },
            ShcError::ConfigParse {
                context: "",
                details: String::new(),
            },
            ShcError::DependencyInput {
                path: PathBuf::new(),
                details: String::new(),
            },
            ShcError::Serialization {
                context: "",
                details: String::new(),
            },
            ShcError::Archive {
                path: PathBuf::new(),
                details: String::new(),
            },
            ShcError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            ShcError::ChannelClosed { component: "" },
            ShcError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(ShcError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_shc_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("SHC-"),
                "code {} must start with SHC-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = ShcError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("SHC-1001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("bad value"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn unit_scoped_failures_are_not_fatal() {
        assert!(
            !ShcError::Archive {
                path: PathBuf::new(),
                details: String::new(),
            }
            .is_fatal()
        );
        assert!(
            !ShcError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            }
            .is_fatal()
        );

        assert!(
            ShcError::InvalidConfig {
                details: String::new(),
            }
            .is_fatal()
        );
        assert!(
            ShcError::DependencyInput {
                path: PathBuf::new(),
                details: String::new(),
            }
            .is_fatal()
        );
        assert!(ShcError::ChannelClosed { component: "test" }.is_fatal());
        assert!(
            ShcError::Runtime {
                details: String::new(),
            }
            .is_fatal()
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = ShcError::io(
            "/tmp/test.jar",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "SHC-3002");
        assert!(err.to_string().contains("/tmp/test.jar"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ShcError = json_err.into();
        assert_eq!(err.code(), "SHC-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: ShcError = toml_err.into();
        assert_eq!(err.code(), "SHC-1003");
    }
}
