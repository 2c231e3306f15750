//! fldiff Core - tolerance-aware structural comparison of result documents
//!
//! This crate holds the comparison kernel used to validate regression-test
//! output against stored reference documents:
//! - Tolerance specification parsing, label overrides and ignore rules
//! - The recursive comparator producing diagnostics and tallies
//! - Per-document and batch reports with failure classification
//! - The error facility and structured logging facility shared by the tools

pub mod batch;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod policy;
pub mod report;

// Re-exported so the logging macros can reach the schema constants.
pub use fldiff_core_types as core_types;

// Re-export commonly used types
pub use batch::{compare_streams, BatchOutcome, DocumentOutcome};
pub use diff::engine::{compare, CompareOptions, Comparator, Comparison};
pub use diff::model::{Diagnostic, Discrepancy, Tally, Tree};
pub use errors::{ExError, ExErrorKind, FldiffError, Result};
pub use policy::{IgnoreRules, Policy, ResolvedTolerances, ToleranceSpec};
pub use report::{DocumentStats, FailureReason, Report, ReportKeys};
