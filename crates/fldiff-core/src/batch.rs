//! Pairwise comparison of a reference stream with a data stream.

use crate::diff::engine::{CompareOptions, Comparator, Comparison};
use crate::errors::{FldiffError, Result};
use crate::policy::ResolvedTolerances;
use crate::report::{DocumentStats, Report, ReportKeys};
use crate::{log_op_end, log_op_error, log_op_start};
use fldiff_core_types::Document;
use std::time::Instant;

/// Result of comparing one document pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    /// Position of the pair in both streams
    pub index: usize,
    pub comparison: Comparison,
    pub stats: DocumentStats,
    pub report: Report,
}

impl DocumentOutcome {
    pub fn failed(&self) -> bool {
        !self.report.succeeded
    }
}

/// Result of comparing two whole streams.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub platform: String,
    pub documents: Vec<DocumentOutcome>,
    /// Aggregated statistics over every document
    pub totals: DocumentStats,
    /// Batch report, present only when more than one pair was compared
    pub summary: Option<Report>,
}

impl BatchOutcome {
    /// Reports in output order: every document, then the batch summary.
    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.documents
            .iter()
            .map(|doc| &doc.report)
            .chain(self.summary.iter())
    }

    pub fn failed_documents(&self) -> usize {
        self.documents.iter().filter(|doc| doc.failed()).count()
    }

    pub fn succeeded(&self) -> bool {
        self.failed_documents() == 0
    }
}

/// Compare `data[i]` against `references[i]` for every `i`.
///
/// # Errors
///
/// `DocumentCountMismatch` when the streams hold a different number of
/// documents; nothing is compared in that case.
pub fn compare_streams(
    references: &[Document],
    data: &[Document],
    tolerances: &ResolvedTolerances,
    options: CompareOptions,
    keys: &ReportKeys,
) -> Result<BatchOutcome> {
    let start = Instant::now();
    log_op_start!(
        "compare_streams",
        references = references.len(),
        data = data.len()
    );

    if references.len() != data.len() {
        let err = FldiffError::DocumentCountMismatch {
            reference: references.len(),
            data: data.len(),
        };
        log_op_error!(
            "compare_streams",
            err.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        return Err(err.into());
    }

    let platform = keys.platform(data.first());
    let comparator = Comparator::new(tolerances, options);

    let documents: Vec<DocumentOutcome> = references
        .iter()
        .zip(data)
        .enumerate()
        .map(|(index, (reference, doc))| {
            compare_document(&comparator, index, doc, reference, tolerances.epsilon, keys, &platform)
        })
        .collect();

    let totals = DocumentStats::aggregate(documents.iter().map(|doc| &doc.stats));
    let summary = (documents.len() > 1).then(|| Report::new(platform.clone(), &totals));

    log_op_end!(
        "compare_streams",
        duration_ms = start.elapsed().as_millis() as u64,
        documents = documents.len(),
        failed_documents = totals.failed_checks
    );

    Ok(BatchOutcome {
        platform,
        documents,
        totals,
        summary,
    })
}

fn compare_document(
    comparator: &Comparator<'_>,
    index: usize,
    data: &Document,
    reference: &Document,
    epsilon: f64,
    keys: &ReportKeys,
    platform: &str,
) -> DocumentOutcome {
    let start = Instant::now();
    log_op_start!("compare_document", document_index = index);

    let comparison = comparator.compare_documents(data, reference);
    let stats = DocumentStats::from_comparison(&comparison.tally, epsilon, data, keys);
    let report = Report::new(platform, &stats);

    log_op_end!(
        "compare_document",
        duration_ms = start.elapsed().as_millis() as u64,
        document_index = index,
        failed_checks = stats.failed_checks,
        max_discrepancy = stats.max_discrepancy,
        missing_items = stats.missing_items.len()
    );

    DocumentOutcome {
        index,
        comparison,
        stats,
        report,
    }
}
