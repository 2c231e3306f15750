//! Tolerance specification loading

use crate::errors::{io_error, parse_error, Result};
use fldiff_core::errors::ExError;
use fldiff_core::policy::ToleranceSpec;
use fldiff_core_types::Document;
use std::fs;
use std::path::Path;

/// Parse tolerance specification text.
///
/// Blank text is an empty specification.
///
/// # Errors
///
/// `Parse` for invalid YAML, `InvalidTolerances` for a document that is not
/// a tolerance specification.
pub fn parse_tolerance_spec(text: &str) -> Result<ToleranceSpec> {
    if text.trim().is_empty() {
        return Ok(ToleranceSpec::default());
    }
    let doc: Document =
        serde_yaml::from_str(text).map_err(|e| parse_error("parse_tolerances", &e))?;
    ToleranceSpec::from_document(&doc).map_err(ExError::from)
}

/// Load the tolerance specification at `path`; no path means no tolerances.
///
/// # Errors
///
/// `Io` when the file cannot be read, otherwise as [`parse_tolerance_spec`].
pub fn load_tolerance_spec(path: Option<&Path>) -> Result<ToleranceSpec> {
    let Some(path) = path else {
        return Ok(ToleranceSpec::default());
    };
    let text = fs::read_to_string(path).map_err(|e| io_error("load_tolerances", path, e))?;
    let spec =
        parse_tolerance_spec(&text).map_err(|e| e.with_path(path.display().to_string()))?;
    tracing::debug!(
        path = %path.display(),
        defaults = spec.defaults.len(),
        overrides = spec.overrides.len(),
        "loaded tolerance specification"
    );
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fldiff_core::errors::ExErrorKind;

    #[test]
    fn test_blank_text_is_empty_spec() {
        assert_eq!(parse_tolerance_spec("\n").unwrap(), ToleranceSpec::default());
        assert_eq!(load_tolerance_spec(None).unwrap(), ToleranceSpec::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_tolerance_spec("Default tolerances: {Epsilon: ").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Parse);
    }

    #[test]
    fn test_wrong_shape() {
        let err = parse_tolerance_spec("- 1\n- 2\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidTolerances);
    }
}
