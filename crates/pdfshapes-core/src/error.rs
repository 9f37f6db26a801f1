//! Error and warning types for pdfshapes.
//!
//! Provides [`PdfError`] for fatal errors that stop interpretation,
//! [`ExtractWarning`] for non-fatal issues that allow best-effort continuation,
//! and [`InterpretOptions`] for configuring resource limits and warning behavior.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fatal error types for PDF processing.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// Error resolving font information.
    FontError(String),
    /// Error during content stream interpretation.
    InterpreterError(String),
    /// A configured resource limit was exceeded.
    ResourceLimitExceeded {
        /// Name of the limit that was exceeded (e.g., "max_stream_bytes").
        limit_name: String,
        /// The configured limit value.
        limit_value: usize,
        /// The actual value that exceeded the limit.
        actual_value: usize,
    },
    /// Interpretation was cancelled through the interrupt flag.
    Interrupted,
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::FontError(msg) => write!(f, "font error: {msg}"),
            PdfError::InterpreterError(msg) => write!(f, "interpreter error: {msg}"),
            PdfError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
            ),
            PdfError::Interrupted => write!(f, "interpretation interrupted"),
            PdfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Machine-readable warning code.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum ExtractWarningCode {
    /// A named resource (color space, pattern, XObject, ExtGState, shading)
    /// was not found.
    MissingResource,
    /// A referenced font was not found in page resources.
    MissingFont,
    /// An unknown content stream operator was skipped.
    UnsupportedOperator,
    /// An operator had too few or badly typed operands.
    MalformedOperator,
    /// `Q` without a matching `q`.
    UnbalancedRestore,
    /// A color space could not be resolved and DeviceGray was used.
    ColorSpaceFallback,
    /// A shading type that is not rendered (4-7) or that failed to evaluate.
    UnsupportedShading,
    /// Form or pattern nesting exceeded the configured depth.
    NestingLimit,
    /// Any other warning not covered by specific variants.
    Other(String),
}

impl ExtractWarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &str {
        match self {
            ExtractWarningCode::MissingResource => "MISSING_RESOURCE",
            ExtractWarningCode::MissingFont => "MISSING_FONT",
            ExtractWarningCode::UnsupportedOperator => "UNSUPPORTED_OPERATOR",
            ExtractWarningCode::MalformedOperator => "MALFORMED_OPERATOR",
            ExtractWarningCode::UnbalancedRestore => "UNBALANCED_RESTORE",
            ExtractWarningCode::ColorSpaceFallback => "COLOR_SPACE_FALLBACK",
            ExtractWarningCode::UnsupportedShading => "UNSUPPORTED_SHADING",
            ExtractWarningCode::NestingLimit => "NESTING_LIMIT",
            ExtractWarningCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for ExtractWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal warning encountered during interpretation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractWarning {
    /// Machine-readable warning code.
    pub code: ExtractWarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// Index of the operator in the content stream where the warning occurred.
    pub operator_index: Option<usize>,
    /// Resource name associated with the warning, if applicable.
    pub resource: Option<String>,
}

impl ExtractWarning {
    /// Create a warning with just a description.
    ///
    /// Uses [`ExtractWarningCode::Other`] as the default code.
    pub fn new(description: impl Into<String>) -> Self {
        let desc = description.into();
        Self {
            code: ExtractWarningCode::Other(desc.clone()),
            description: desc,
            operator_index: None,
            resource: None,
        }
    }

    /// Create a warning with a specific code and description.
    pub fn with_code(code: ExtractWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            operator_index: None,
            resource: None,
        }
    }

    /// Attach the operator index (builder pattern).
    pub fn at_operator(mut self, index: usize) -> Self {
        self.operator_index = Some(index);
        self
    }

    /// Attach a resource name (builder pattern).
    pub fn for_resource(mut self, name: impl Into<String>) -> Self {
        self.resource = Some(name.into());
        self
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(ref name) = self.resource {
            write!(f, " [resource {name}]")?;
        }
        if let Some(index) = self.operator_index {
            write!(f, " [operator #{index}]")?;
        }
        Ok(())
    }
}

/// Options controlling interpretation and resource limits.
#[derive(Debug, Clone)]
pub struct InterpretOptions {
    /// Maximum nesting depth for Form XObjects (default: 10).
    pub max_recursion_depth: usize,
    /// Maximum nesting depth for tiling patterns drawn inside tiling
    /// patterns (default: 10).
    pub max_pattern_depth: usize,
    /// Maximum content stream bytes to process (default: 100 MB).
    pub max_stream_bytes: usize,
    /// Largest tile raster side, in pixels (default: 2048).
    pub max_tile_dimension: u32,
    /// Whether to collect warnings during interpretation (default: true).
    pub collect_warnings: bool,
    /// Cooperative cancellation flag, checked before every operator.
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 10,
            max_pattern_depth: 10,
            max_stream_bytes: 100 * 1024 * 1024,
            max_tile_dimension: 2048,
            collect_warnings: true,
            interrupt: None,
        }
    }
}

impl InterpretOptions {
    /// Whether the interrupt flag has been raised.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
