//! pdfshapes-core: Backend-independent drawing types.
//!
//! This crate provides the geometry ([`Ctm`], [`BBox`], [`Path`]), the
//! device-independent graphics state, the font engine contract and the
//! [`Shapes`] command list produced by the pdfshapes interpreter.

pub mod error;
pub mod font;
pub mod geometry;
pub mod painting;
pub mod path;
pub mod shapes;
pub mod text;

pub use error::{ExtractWarning, ExtractWarningCode, InterpretOptions, PdfError};
pub use font::{FontEngine, FontHandle};
pub use geometry::{BBox, Ctm, Point};
pub use painting::{
    Clip, ClipPath, DashPattern, ExtGState, FillRule, GraphicsState, LineCap, LineJoin, PaintOp,
    PaintedPath, Rgb, StrokeStyle, clamp_unit,
};
pub use path::{Path, PathBuilder, PathSegment};
pub use shapes::{
    AxialGradient, DecodedImage, GradientStop, ImageRef, Paint, RadialGradient, Shape, Shapes,
    TilePaint,
};
pub use text::{GlyphRun, GlyphRunBuilder, PlacedGlyph, TextRenderMode, glyph_box};
