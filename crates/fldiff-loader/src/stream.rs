//! Multi-document YAML stream parsing

use crate::errors::{io_error, parse_error, Result};
use fldiff_core::{log_op_end, log_op_error, log_op_start};
use fldiff_core_types::Document;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Parse a `---` separated stream into documents.
///
/// A stream made only of blank lines and comments holds no documents.
///
/// # Errors
///
/// `Parse` with the index of the first malformed document.
pub fn parse_stream(text: &str) -> Result<Vec<Document>> {
    if !has_content(text) {
        return Ok(Vec::new());
    }
    serde_yaml::Deserializer::from_str(text)
        .enumerate()
        .map(|(index, doc)| {
            Document::deserialize(doc)
                .map_err(|e| parse_error("parse_stream", &e).with_document_index(index))
        })
        .collect()
}

fn has_content(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    })
}

/// Read and parse a stream file.
///
/// # Errors
///
/// `Io` when the file cannot be read, `Parse` when its content is not a
/// valid stream. Both carry the path.
pub fn load_stream(path: &Path) -> Result<Vec<Document>> {
    let start = Instant::now();
    let shown = path.display().to_string();
    log_op_start!("load_stream", path = shown.as_str());

    let result = fs::read_to_string(path)
        .map_err(|e| io_error("load_stream", path, e))
        .and_then(|text| parse_stream(&text).map_err(|e| e.with_path(shown.as_str())));

    match &result {
        Ok(documents) => {
            log_op_end!(
                "load_stream",
                duration_ms = start.elapsed().as_millis() as u64,
                path = shown.as_str(),
                documents = documents.len()
            );
        }
        Err(err) => log_op_error!(
            "load_stream",
            err.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            path = shown.as_str()
        ),
    }
    result
}
