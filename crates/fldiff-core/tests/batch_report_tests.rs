#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{stream, yaml, RUN_OUTPUT};
use fldiff_core::diff::human_summary::render_document_line;
use fldiff_core::policy::ToleranceSpec;
use fldiff_core::{compare_streams, CompareOptions, FailureReason, ReportKeys};

const TOLERANCES: &str = r#"
Default tolerances:
  Epsilon: 1.0e-11
  Energies: 1.0e-4
Keys to ignore: [Version Number, "Timings*"]
Patterns to ignore: [CPU]
Cluster:
  Energies: 1.0
"#;

fn run_stream(documents: &[&str]) -> Vec<fldiff_core::core_types::Document> {
    stream(&documents.join("---\n"))
}

#[test]
fn test_passing_and_failing_document_batch() {
    let tolerances = ToleranceSpec::from_document(&yaml(TOLERANCES))
        .unwrap()
        .resolve(None);
    let shifted = RUN_OUTPUT.replace("12.534928", "12.634928");

    let references = run_stream(&[RUN_OUTPUT, RUN_OUTPUT]);
    let data = run_stream(&[RUN_OUTPUT, shifted.as_str()]);

    let outcome = compare_streams(
        &references,
        &data,
        &tolerances,
        CompareOptions::default(),
        &ReportKeys::default(),
    )
    .unwrap();

    let first = &outcome.documents[0];
    assert!(first.report.succeeded);
    assert_eq!(first.report.platform, "node01");
    assert_eq!(first.report.elapsed_seconds, 3.5);
    assert_eq!(first.report.max_tolerance, 1.0e-4);

    let second = &outcome.documents[1];
    assert!(!second.report.succeeded);
    assert_eq!(second.report.failure_reason, Some(FailureReason::Difference));
    assert!((second.report.max_discrepancy - 0.1).abs() < 1e-9);

    let summary = outcome.summary.as_ref().unwrap();
    assert!(!summary.succeeded);
    assert!((summary.max_discrepancy - 0.1).abs() < 1e-9);
    assert_eq!(summary.elapsed_seconds, 7.0);

    assert!(render_document_line(second).starts_with("#Document:  1, failed_checks: 1,"));
}

#[test]
fn test_label_loosens_tolerances() {
    let tolerances = ToleranceSpec::from_document(&yaml(TOLERANCES))
        .unwrap()
        .resolve(Some("Cluster"));
    let shifted = RUN_OUTPUT.replace("12.534928", "12.634928");

    let outcome = compare_streams(
        &run_stream(&[RUN_OUTPUT]),
        &run_stream(&[shifted.as_str()]),
        &tolerances,
        CompareOptions::default(),
        &ReportKeys::default(),
    )
    .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.documents[0].report.max_tolerance, 1.0);
}

#[test]
fn test_missing_items_reported_per_document_and_batch() {
    let tolerances = ToleranceSpec::default().resolve(None);
    let trimmed = RUN_OUTPUT.replace("XC: PBE\n", "");

    let outcome = compare_streams(
        &run_stream(&[RUN_OUTPUT, RUN_OUTPUT]),
        &run_stream(&[trimmed.as_str(), trimmed.as_str()]),
        &tolerances,
        CompareOptions::default(),
        &ReportKeys::default(),
    )
    .unwrap();

    let report = &outcome.documents[0].report;
    assert_eq!(report.failure_reason, Some(FailureReason::Information));
    assert_eq!(report.missing_items, vec!["XC"]);

    let summary = outcome.summary.as_ref().unwrap();
    assert_eq!(summary.missing_items, vec!["XC", "XC"]);
    assert_eq!(summary.failure_reason, Some(FailureReason::Information));
}

#[test]
fn test_report_yaml_field_order() {
    let docs = run_stream(&[RUN_OUTPUT]);
    let outcome = compare_streams(
        &docs,
        &docs,
        &ToleranceSpec::default().resolve(None),
        CompareOptions::default(),
        &ReportKeys::default(),
    )
    .unwrap();

    let text = serde_yaml::to_string(&outcome.documents[0].report).unwrap();
    let keys: Vec<&str> = text
        .lines()
        .filter_map(|line| line.split_once(':').map(|(k, _)| k))
        .collect();
    assert_eq!(
        keys,
        vec![
            "Platform",
            "Test succeeded",
            "Maximum discrepancy",
            "Maximum tolerance applied",
            "Seconds needed for the test",
            "Memory leaks (B)",
        ]
    );
}
