//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use shipcheck::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, ShcError};

// Audit
pub use crate::audit::archive::{ArchiveInventory, scan_archive};
pub use crate::audit::census::{CensusReport, LineTally, RootCensus};
pub use crate::audit::classes::{DuplicateClassReport, scan_library};
pub use crate::audit::deps::{DependencyRecord, DuplicateDependencyReport, load_records};
pub use crate::audit::walker::{CensusWalker, WalkSettings};
pub use crate::audit::{AuditOutcome, AuditRequest, run};

// Report
pub use crate::report::jsonl::{EventType, Finding, FindingsLog, Severity};
