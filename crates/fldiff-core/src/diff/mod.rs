//! Tolerance-aware document comparison.
//!
//! Compares a data document against a reference document and produces a
//! verdict, a diagnostic tree shaped like the tolerance policy, and a tally
//! of running statistics.
//!
//! ## Entry point
//!
//! ```
//! use fldiff_core::diff::engine::compare;
//! use fldiff_core::policy::ResolvedTolerances;
//! use fldiff_core::core_types::Document;
//!
//! let reference: Document = serde_yaml::from_str("Energy: -1.5").unwrap();
//! let data: Document = serde_yaml::from_str("Energy: -1.5").unwrap();
//! let outcome = compare(&data, &reference, &ResolvedTolerances::exact());
//! assert!(outcome.passed());
//! ```
//!
//! ## Guarantees
//!
//! - **Reflexivity**: a document compared with itself always passes.
//! - **Reference order**: keys are visited, and diagnostics merged, in the
//!   order they appear in the reference.
//! - **No hidden state**: statistics travel in the returned [`model::Tally`].
//! - **Total**: well-formed documents never make the comparator fail or panic;
//!   every mismatch is reported in the diagnostic.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{compare, CompareOptions, Comparator, Comparison};
pub use human_summary::{render_batch_line, render_document_line};
