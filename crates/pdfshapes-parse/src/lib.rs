//! pdfshapes-parse: lopdf-backed content stream interpreter.
//!
//! This crate turns a page or form content stream into the ordered
//! [`Shapes`](pdfshapes_core::Shapes) list defined in pdfshapes-core. It
//! resolves color spaces, evaluates PDF functions, builds gradient and
//! tiling pattern paints and lays out text through a pluggable
//! [`FontProvider`].

pub mod color_space;
pub mod error;
pub mod font_metrics;
pub mod function;
pub mod handler;
pub mod image;
pub mod interpreter;
pub mod interpreter_state;
pub mod objects;
pub mod pattern;
pub mod raster;
pub mod standard_fonts;
pub mod text_renderer;
pub mod text_state;
pub mod tokenizer;

pub use color_space::{ColorSpace, ColorSpaceCache, cmyk_to_rgb, reverse};
pub use error::BackendError;
pub use font_metrics::{DictFontProvider, FontMetrics, FontProvider, extract_font_metrics};
pub use function::{PdfFunction, ShadingFunction};
pub use handler::{ContentHandler, ShapeEmitter};
pub use image::{ImageDecoder, ImageSource, RawImageDecoder};
pub use interpreter::{Providers, interpret, interpret_content_stream};
pub use interpreter_state::{ColorSlot, InterpreterState};
pub use pattern::{PatternCache, STOP_POSITIONS, Shading, ShadingGeometry};
pub use raster::Canvas;
pub use text_state::{TextParams, TextState};
pub use tokenizer::{Lexer, Operand, Operator, tokenize};

pub use pdfshapes_core;
