// Integration tests for loading streams and tolerance files from disk
// and writing report streams back

use fldiff_core::errors::ExErrorKind;
use fldiff_core::report::Report;
use fldiff_core::Tree;
use fldiff_loader::{load_stream, load_tolerance_spec, parse_stream, ReportWriter};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_load_reference_stream() {
    let docs = load_stream(&fixtures_dir().join("reference.yaml")).unwrap();

    assert_eq!(docs.len(), 2);
    let first_keys: Vec<&str> = docs[0]
        .as_mapping()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        first_keys,
        vec![
            "Version Number",
            "Root process Hostname",
            "Energies",
            "Orbitals",
            "Timings for root process",
            "Memory Consumption Report",
        ]
    );
}

#[test]
fn test_load_missing_file_is_io_error() {
    let path = fixtures_dir().join("does-not-exist.yaml");
    let err = load_stream(&path).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Io);
    assert!(err.is_format_violation());
    assert!(err.path().unwrap().ends_with("does-not-exist.yaml"));
}

#[test]
fn test_load_malformed_stream_is_parse_error() {
    let err = load_stream(&fixtures_dir().join("malformed.yaml")).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Parse);
    assert!(err.path().unwrap().ends_with("malformed.yaml"));
}

#[test]
fn test_load_tolerances_with_label() {
    let path = fixtures_dir().join("tolerances.yaml");
    let spec = load_tolerance_spec(Some(&path)).unwrap();

    let base = spec.resolve(None);
    assert_eq!(base.epsilon, 1.1e-11);
    assert_eq!(base.defaults.get("Energies"), Some(&Tree::Leaf(1.0e-6)));
    assert!(base.is_ignored("Timings for root process"));
    assert!(base.is_ignored("Memory Consumption Report"));
    assert!(!base.is_ignored("Root process Hostname"));

    let cluster = spec.resolve(Some("Cluster"));
    assert_eq!(cluster.defaults.get("Energies"), Some(&Tree::Leaf(1.0e-3)));
    assert!(cluster.is_ignored("Root process Hostname"));
}

#[test]
fn test_report_stream_round_trips_as_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.yaml");

    let mut writer = ReportWriter::create(Some(&path)).unwrap();
    writer.write_document(&Report::fatal()).unwrap();
    writer.write_document(&Report::fatal()).unwrap();
    writer.finish().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("---\n"));
    assert_eq!(text.matches("---\n").count(), 2);

    let docs = parse_stream(&text).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(
        docs[1].get("Failure reason").and_then(|d| d.as_str()),
        Some("Yaml Standard")
    );
}

#[test]
fn test_report_file_in_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.yaml");

    let err = ReportWriter::create(Some(&path)).err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::Io);
}
