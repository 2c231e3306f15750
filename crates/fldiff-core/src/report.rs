//! Per-document and batch reports.
//!
//! A [`Report`] is what ends up in the output stream: one per compared
//! document, plus a batch summary when more than one document was compared.
//! Reports are built from [`DocumentStats`], which combine the comparison
//! tally with the bookkeeping values a run records in its own output
//! (elapsed time, leaked memory).

use crate::diff::model::Tally;
use fldiff_core_types::{Document, PathSegment, Scalar};
use serde::Serialize;

/// Platform label used when the data carries none.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Why a document (or batch) failed.
///
/// Listed in priority order: a leak hides everything else, missing items
/// hide plain differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    Memory,
    Information,
    #[serde(rename = "Yaml Standard")]
    YamlStandard,
    Difference,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Memory => "Memory",
            FailureReason::Information => "Information",
            FailureReason::YamlStandard => "Yaml Standard",
            FailureReason::Difference => "Difference",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics of one document, or of a batch once aggregated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentStats {
    /// Failed leaf checks; for a batch, the number of failed documents
    pub failed_checks: usize,
    pub max_discrepancy: f64,
    pub max_tolerance: f64,
    pub elapsed_seconds: f64,
    pub leaked_bytes: i64,
    pub missing_items: Vec<String>,
}

impl DocumentStats {
    /// Combine a comparison tally with the bookkeeping read from `data`.
    ///
    /// The reported tolerance never drops below the global `epsilon`.
    pub fn from_comparison(tally: &Tally, epsilon: f64, data: &Document, keys: &ReportKeys) -> Self {
        Self {
            failed_checks: tally.failed_checks,
            max_discrepancy: tally.max_discrepancy,
            max_tolerance: epsilon.abs().max(tally.max_tolerance),
            elapsed_seconds: keys.elapsed_seconds(data),
            leaked_bytes: keys.leaked_bytes(data),
            missing_items: tally.missing_items.clone(),
        }
    }

    /// Fold per-document statistics into batch statistics.
    ///
    /// The batch check count is the number of failed documents; leaks, times
    /// and missing items add up, discrepancies and tolerances keep the max.
    pub fn aggregate<'a>(documents: impl IntoIterator<Item = &'a DocumentStats>) -> Self {
        documents
            .into_iter()
            .fold(DocumentStats::default(), |mut batch, doc| {
                if doc.failed() {
                    batch.failed_checks += 1;
                }
                batch.max_discrepancy = batch.max_discrepancy.max(doc.max_discrepancy);
                batch.max_tolerance = batch.max_tolerance.max(doc.max_tolerance);
                batch.elapsed_seconds += doc.elapsed_seconds;
                batch.leaked_bytes = batch.leaked_bytes.saturating_add(doc.leaked_bytes);
                batch.missing_items.extend(doc.missing_items.iter().cloned());
                batch
            })
    }

    pub fn failed(&self) -> bool {
        self.failed_checks > 0 || self.leaked_bytes != 0 || !self.missing_items.is_empty()
    }

    /// Failure reason, or `None` for a passing document.
    pub fn classify(&self) -> Option<FailureReason> {
        if !self.failed() {
            return None;
        }
        let reason = if self.leaked_bytes != 0 {
            FailureReason::Memory
        } else if !self.missing_items.is_empty() {
            FailureReason::Information
        } else if self.max_tolerance == 0.0
            && self.max_discrepancy == 0.0
            && self.elapsed_seconds == 0.0
        {
            FailureReason::YamlStandard
        } else {
            FailureReason::Difference
        };
        Some(reason)
    }
}

/// One entry of the report stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Test succeeded")]
    pub succeeded: bool,
    #[serde(rename = "Failure reason", skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    #[serde(rename = "Maximum discrepancy")]
    pub max_discrepancy: f64,
    #[serde(rename = "Maximum tolerance applied")]
    pub max_tolerance: f64,
    #[serde(rename = "Seconds needed for the test")]
    pub elapsed_seconds: f64,
    #[serde(rename = "Memory leaks (B)")]
    pub leaked_bytes: i64,
    #[serde(rename = "Missed Reference Items", skip_serializing_if = "Vec::is_empty")]
    pub missing_items: Vec<String>,
}

impl Report {
    pub fn new(platform: impl Into<String>, stats: &DocumentStats) -> Self {
        let failure_reason = stats.classify();
        Self {
            platform: platform.into(),
            succeeded: failure_reason.is_none(),
            failure_reason,
            max_discrepancy: stats.max_discrepancy,
            max_tolerance: stats.max_tolerance,
            elapsed_seconds: stats.elapsed_seconds,
            leaked_bytes: stats.leaked_bytes,
            missing_items: stats.missing_items.clone(),
        }
    }

    /// The report written when the inputs cannot be compared at all.
    pub fn fatal() -> Self {
        let stats = DocumentStats {
            failed_checks: 1,
            ..DocumentStats::default()
        };
        Self::new("None", &stats)
    }
}

/// Key paths of the bookkeeping values inside a data document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportKeys {
    pub platform: Vec<PathSegment>,
    pub elapsed_time: Vec<PathSegment>,
    pub leaked_memory: Vec<PathSegment>,
}

impl Default for ReportKeys {
    fn default() -> Self {
        Self {
            platform: vec!["Root process Hostname".into()],
            elapsed_time: vec!["Timings for root process".into(), "Elapsed time (s)".into()],
            leaked_memory: vec![
                "Memory Consumption Report".into(),
                "Remaining Memory (B)".into(),
            ],
        }
    }
}

impl ReportKeys {
    /// Platform label of a run, taken from its first data document.
    pub fn platform(&self, first: Option<&Document>) -> String {
        match first.and_then(|doc| doc.get_path(&self.platform)) {
            Some(Document::Scalar(Scalar::Null)) | None => UNKNOWN_PLATFORM.to_string(),
            Some(Document::Scalar(s)) => s.to_string(),
            Some(_) => UNKNOWN_PLATFORM.to_string(),
        }
    }

    pub fn elapsed_seconds(&self, data: &Document) -> f64 {
        data.get_path(&self.elapsed_time)
            .and_then(Document::as_f64)
            .unwrap_or(0.0)
    }

    pub fn leaked_bytes(&self, data: &Document) -> i64 {
        match data.get_path(&self.leaked_memory).and_then(Document::as_scalar) {
            Some(Scalar::Integer(bytes)) => *bytes,
            Some(other) => other.as_f64().map(|b| b as i64).unwrap_or(0),
            None => 0,
        }
    }
}
