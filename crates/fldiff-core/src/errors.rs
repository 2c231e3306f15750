use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling and for tests. Comparison itself never fails for well-formed
/// documents, so every kind here belongs to input handling or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input streams
    /// A stream is not a valid hierarchical document stream
    Parse,
    /// Reference and data streams hold a different number of documents
    DocumentCountMismatch,

    // Tolerance specification
    /// The tolerance specification is structurally invalid
    InvalidTolerances,

    // Integration/IO
    Io,
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Parse => "ERR_PARSE",
            ExErrorKind::DocumentCountMismatch => "ERR_DOCUMENT_COUNT_MISMATCH",
            ExErrorKind::InvalidTolerances => "ERR_INVALID_TOLERANCES",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }

    /// Whether this kind is a format violation of the inputs.
    ///
    /// Format violations end a run with the minimal failure report instead of
    /// an error exit.
    pub fn is_format_violation(&self) -> bool {
        matches!(
            self,
            ExErrorKind::Parse
                | ExErrorKind::DocumentCountMismatch
                | ExErrorKind::InvalidTolerances
                | ExErrorKind::Io
        )
    }
}

/// Canonical structured error type
///
/// Classification fields support programmatic handling; the optional context
/// (operation, input path, document index) is there for humans reading logs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    document_index: Option<usize>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            document_index: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add input/output path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add the index of the document within its stream
    pub fn with_document_index(mut self, index: usize) -> Self {
        self.document_index = Some(index);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn document_index(&self) -> Option<usize> {
        self.document_index
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    pub fn is_format_violation(&self) -> bool {
        self.kind.is_format_violation()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(index) = self.document_index {
            write!(f, " (document: {})", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures raised while preparing a comparison
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FldiffError {
    /// The two streams cannot be paired document by document
    #[error("Number of documents differ between reference ({reference}) and data ({data})")]
    DocumentCountMismatch { reference: usize, data: usize },

    /// A reserved section of the tolerance specification has the wrong shape
    #[error("Tolerance section `{section}` is malformed: {reason}")]
    InvalidToleranceSection { section: String, reason: String },

    /// A tolerance entry is neither a number nor a nested table
    #[error("Tolerance for `{key}` must be a number or a mapping, found {found}")]
    InvalidToleranceValue { key: String, found: String },
}

impl From<FldiffError> for ExError {
    fn from(err: FldiffError) -> Self {
        let message = err.to_string();
        match err {
            FldiffError::DocumentCountMismatch { .. } => {
                ExError::new(ExErrorKind::DocumentCountMismatch)
                    .with_op("pair_documents")
                    .with_message(message)
            }
            FldiffError::InvalidToleranceSection { .. }
            | FldiffError::InvalidToleranceValue { .. } => {
                ExError::new(ExErrorKind::InvalidTolerances)
                    .with_op("parse_tolerances")
                    .with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExErrorKind::Parse.code(), "ERR_PARSE");
        assert_eq!(
            ExErrorKind::DocumentCountMismatch.code(),
            "ERR_DOCUMENT_COUNT_MISMATCH"
        );
        assert_eq!(ExErrorKind::InvalidTolerances.code(), "ERR_INVALID_TOLERANCES");
    }

    #[test]
    fn test_format_violation_classification() {
        assert!(ExErrorKind::Parse.is_format_violation());
        assert!(ExErrorKind::DocumentCountMismatch.is_format_violation());
        assert!(ExErrorKind::Io.is_format_violation());
        assert!(!ExErrorKind::Serialization.is_format_violation());
        assert!(ExErrorKind::InvalidTolerances.is_format_violation());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::Parse)
            .with_op("load_stream")
            .with_message("unexpected end of stream")
            .with_path("data.yaml")
            .with_document_index(2);
        let text = err.to_string();
        assert!(text.starts_with("[ERR_PARSE] in operation 'load_stream'"));
        assert!(text.contains("unexpected end of stream"));
        assert!(text.contains("(path: data.yaml)"));
        assert!(text.contains("(document: 2)"));
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: ExError = FldiffError::DocumentCountMismatch {
            reference: 2,
            data: 1,
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::DocumentCountMismatch);
        assert!(err.message().contains("reference (2)"));

        let err: ExError = FldiffError::InvalidToleranceValue {
            key: "Energy".to_string(),
            found: "string".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::InvalidTolerances);
        assert_eq!(err.op(), Some("parse_tolerances"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;
        let inner = ExError::new(ExErrorKind::Io).with_message("denied");
        let outer = ExError::new(ExErrorKind::Parse).with_source(inner);
        assert_eq!(outer.source_error().map(|e| e.kind()), Some(ExErrorKind::Io));
        assert!(outer.source().is_some());
    }
}
