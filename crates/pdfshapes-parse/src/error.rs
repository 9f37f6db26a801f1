//! Errors raised while reading PDF objects and running content streams.
//!
//! Most problems inside a content stream are reported as warnings and never
//! surface here. [`BackendError`] covers what the caller has to see: broken
//! page structure, a token or resource that cannot be parsed, an exceeded
//! limit, and interruption. It converts into the public [`PdfError`].

use pdfshapes_core::PdfError;
use thiserror::Error;

/// Failure while resolving page objects or interpreting a content stream.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A PDF object is missing or has the wrong shape (page tree, contents,
    /// functions, color spaces).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// A content stream token or shading could not be used.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// The interrupt flag was raised.
    #[error("interpretation interrupted")]
    Interrupted,

    /// A limit from `InterpretOptions` or another core error.
    #[error(transparent)]
    Core(#[from] PdfError),
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            BackendError::Interpreter(msg) => PdfError::InterpreterError(msg),
            BackendError::Interrupted => PdfError::Interrupted,
            BackendError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lopdf_errors_become_parse_errors() {
        let err: BackendError = lopdf::Error::PageNumberNotFound(3).into();
        assert!(matches!(err, BackendError::Parse(_)));
        assert!(err.to_string().starts_with("PDF parse error: "));
    }

    #[test]
    fn converts_to_public_error() {
        let pdf_err: PdfError = BackendError::Parse("bad /Contents".to_string()).into();
        assert_eq!(pdf_err, PdfError::ParseError("bad /Contents".to_string()));
        let pdf_err: PdfError = BackendError::Interpreter("unterminated array".to_string()).into();
        assert_eq!(
            pdf_err,
            PdfError::InterpreterError("unterminated array".to_string())
        );
        let pdf_err: PdfError = BackendError::Interrupted.into();
        assert_eq!(pdf_err, PdfError::Interrupted);
    }

    #[test]
    fn stream_limit_passes_through_unchanged() {
        let original = PdfError::ResourceLimitExceeded {
            limit_name: "max_stream_bytes".to_string(),
            limit_value: 1024,
            actual_value: 2048,
        };
        let pdf_err: PdfError = BackendError::Core(original.clone()).into();
        assert_eq!(pdf_err, original);
    }
}
