//! fldiff Loader - YAML streams in, report streams out
//!
//! Provides:
//! - Multi-document YAML stream parsing into `Document`s
//! - Tolerance specification loading
//! - Report stream writing (`---` separated YAML documents)

pub mod errors;
pub mod stream;
pub mod tolerances;
pub mod writer;

// Re-export key types
pub use errors::Result;
pub use stream::{load_stream, parse_stream};
pub use tolerances::{load_tolerance_spec, parse_tolerance_spec};
pub use writer::{render_yaml_document, ReportWriter};
