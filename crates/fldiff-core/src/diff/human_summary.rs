//! One-line console summaries of comparison outcomes.

use crate::batch::{BatchOutcome, DocumentOutcome};
use crate::report::DocumentStats;

/// Render the console line of one compared document.
pub fn render_document_line(outcome: &DocumentOutcome) -> String {
    format!("#Document: {:2}, {}", outcome.index, render_stats(&outcome.stats))
}

/// Render the console line of a whole batch.
///
/// The check count of a batch is its number of failed documents.
pub fn render_batch_line(outcome: &BatchOutcome) -> String {
    format!(
        "#Batch: {} documents, {}",
        outcome.documents.len(),
        render_stats(&outcome.totals)
    )
}

fn render_stats(stats: &DocumentStats) -> String {
    format!(
        "failed_checks: {}, Max. Diff. {:10.2e}, missed_items: {} memory_leaks (B): {}, Elapsed Time (s): {:7.2}",
        stats.failed_checks,
        stats.max_discrepancy,
        stats.missing_items.len(),
        stats.leaked_bytes,
        stats.elapsed_seconds
    )
}
