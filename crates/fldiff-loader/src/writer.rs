//! Report stream writing
//!
//! Every document is written with an explicit `---` start marker so that the
//! output is a valid multi-document stream whatever it is appended to.

use crate::errors::{io_error, serialization_error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Render a value as one YAML document with a leading `---` marker.
///
/// # Errors
///
/// `Serialization` when the value cannot be expressed in YAML.
pub fn render_yaml_document<T: Serialize>(value: &T) -> Result<String> {
    let body =
        serde_yaml::to_string(value).map_err(|e| serialization_error("render_yaml", &e))?;
    Ok(format!("---\n{}", body))
}

/// Destination of the report stream.
///
/// Without a path every report is discarded.
pub struct ReportWriter {
    target: Option<(PathBuf, BufWriter<File>)>,
    written: usize,
}

impl ReportWriter {
    /// Open the report file, truncating it.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be created.
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let target = match path {
            Some(path) => {
                let file = File::create(path).map_err(|e| io_error("create_report", path, e))?;
                Some((path.to_path_buf(), BufWriter::new(file)))
            }
            None => None,
        };
        Ok(Self { target, written: 0 })
    }

    /// A writer that discards everything.
    pub fn sink() -> Self {
        Self {
            target: None,
            written: 0,
        }
    }

    /// Append one document to the stream.
    ///
    /// # Errors
    ///
    /// `Serialization` or `Io`.
    pub fn write_document<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let text = render_yaml_document(value)?;
        if let Some((path, out)) = self.target.as_mut() {
            out.write_all(text.as_bytes())
                .map_err(|e| io_error("write_report", path, e))?;
        }
        self.written += 1;
        Ok(())
    }

    /// Number of documents written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush the stream to disk.
    ///
    /// # Errors
    ///
    /// `Io` when buffered reports cannot be flushed.
    pub fn finish(mut self) -> Result<()> {
        if let Some((path, out)) = self.target.as_mut() {
            out.flush().map_err(|e| io_error("write_report", path, e))?;
        }
        Ok(())
    }
}
