//! pdfshapes: Turn PDF page content into ordered, fully resolved shapes.
//!
//! This is the public API facade crate for pdfshapes. It opens documents
//! with lopdf, runs each page's content stream through the interpreter in
//! pdfshapes-parse and hands back the [`Shapes`] list from pdfshapes-core:
//! paths with device-space transforms and RGB colors, gradient and tile
//! paints, positioned glyph runs, images and clip changes.
//!
//! # Architecture
//!
//! - **pdfshapes-core**: Backend-independent geometry, graphics state and shape types
//! - **pdfshapes-parse**: Tokenizer, color spaces, functions, patterns and the interpreter
//! - **pdfshapes** (this crate): Public API that ties everything together
//!
//! # Example
//!
//! ```ignore
//! use pdfshapes::{Pdf, Shape};
//!
//! let pdf = Pdf::open_file("drawing.pdf", None)?;
//! for page in pdf.pages_iter() {
//!     let page = page?;
//!     let fills = page
//!         .iter()
//!         .filter(|s| matches!(s, Shape::FillPath { .. }))
//!         .count();
//!     println!("page {}: {fills} fills", page.page_number());
//! }
//! ```

mod page;
mod pdf;

pub use page::Page;
pub use pdf::{PagesIter, Pdf};

pub use pdfshapes_core::{
    BBox, Clip, Ctm, ExtractWarning, ExtractWarningCode, FillRule, GlyphRun, GradientStop,
    ImageRef, InterpretOptions, Paint, Path, PdfError, PlacedGlyph, Point, Rgb, Shape, Shapes,
    StrokeStyle,
};
pub use pdfshapes_parse::{
    ContentHandler, FontProvider, ImageDecoder, InterpreterState, Providers, interpret,
};

pub use pdfshapes_core;
pub use pdfshapes_parse;
