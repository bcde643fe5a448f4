#![forbid(unsafe_code)]

//! shipcheck — pre-ship package auditor.
//!
//! Three independent, read-only checks over a built project:
//! 1. **Duplicate dependencies** — a pre-resolved dependency list grouped
//!    by artifact identifier; groups with more than one member are flagged
//! 2. **Duplicate classes** — class-like entries bundled by more than one
//!    archive in the package's library directory
//! 3. **Code census** — a coarse real/filler lines-of-code count over the
//!    configured source and resource roots
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use shipcheck::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use shipcheck::core::config::Config;
//! use shipcheck::audit::classes::DuplicateClassReport;
//! ```

pub mod prelude;

pub mod audit;
pub mod core;
pub mod report;
