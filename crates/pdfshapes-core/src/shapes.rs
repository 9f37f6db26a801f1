//! The interpreter's output: an ordered list of drawing commands.
//!
//! Replaying a [`Shapes`] list in order against a fresh surface reproduces
//! the page. State commands (`Set*`, `PushState`, `PopState`) always appear
//! before the drawing commands that depend on them.

use std::sync::Arc;

use crate::error::ExtractWarning;
use crate::geometry::{BBox, Ctm, Point};
use crate::painting::{Clip, FillRule, Rgb, StrokeStyle};
use crate::path::Path;
use crate::text::GlyphRun;

/// A single drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Use a solid color for the next fill, stroke or glyph run.
    SetColor(Rgb),
    /// Use a pattern paint for the next fill or stroke.
    SetPaint(Arc<Paint>),
    /// Stroke parameters, lengths already in device space.
    SetStroke(StrokeStyle),
    /// Maps the image unit square to device space for the next
    /// `DrawImage`. Paths and glyph runs are already in device space.
    SetTransform(Ctm),
    /// Constant alpha for the next drawing command.
    SetAlpha(f32),
    /// Replace the clip. `None` removes clipping.
    SetClip(Option<Clip>),
    /// Fill a device-space path.
    FillPath { path: Path, rule: FillRule },
    /// Stroke a device-space path with the current stroke style.
    StrokePath(Path),
    /// Draw positioned glyphs.
    DrawGlyphRun(GlyphRun),
    /// Draw an image into the unit square of the current transform.
    DrawImage(ImageRef),
    /// Save the surface state.
    PushState,
    /// Restore the state saved by the matching `PushState`.
    PopState,
}

/// Gradient color stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f32,
    pub color: Rgb,
}

/// Axial (type 2) shading evaluated into a linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct AxialGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradientStop>,
    /// Extend before the start and after the end.
    pub extend: [bool; 2],
    /// Shading space to device space.
    pub transform: Ctm,
}

/// Radial (type 3) shading evaluated into a focal radial gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Point,
    pub radius: f64,
    pub focus: Point,
    pub stops: Vec<GradientStop>,
    pub extend: [bool; 2],
    /// Shading space to device space.
    pub transform: Ctm,
}

/// A rasterized tiling-pattern cell, repeated to fill.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePaint {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, first row at the top.
    pub pixels: Vec<u8>,
    /// Pattern cell in pattern space.
    pub bbox: BBox,
    /// Pixel space to device space.
    pub pixel_transform: Ctm,
}

/// A pattern paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Axial(AxialGradient),
    Radial(RadialGradient),
    Tile(TilePaint),
}

/// Pixels produced by an image decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Straight RGBA8, row-major, first row at the top.
    pub rgba: Vec<u8>,
}

/// An image placement.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// XObject resource name; `None` for inline images.
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: Option<u32>,
    pub color_space: Option<String>,
    /// Last filter in the filter chain.
    pub filter: Option<String>,
    /// Whether this is a stencil mask painted with the fill color.
    pub image_mask: bool,
    /// Pixels, when an image decoder was supplied and succeeded.
    pub decoded: Option<Arc<DecodedImage>>,
}

/// The ordered output of one interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shapes {
    items: Vec<Shape>,
    warnings: Vec<ExtractWarning>,
}

impl Shapes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.items.push(shape);
    }

    pub fn push_warning(&mut self, warning: ExtractWarning) {
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Shape] {
        &self.items
    }

    /// Warnings collected while the list was produced.
    pub fn warnings(&self) -> &[ExtractWarning] {
        &self.warnings
    }

    /// Split into commands and warnings.
    pub fn into_parts(self) -> (Vec<Shape>, Vec<ExtractWarning>) {
        (self.items, self.warnings)
    }

    /// Bounding boxes of every filled path, in order.
    pub fn fill_bounds(&self) -> Vec<BBox> {
        self.items
            .iter()
            .filter_map(|s| match s {
                Shape::FillPath { path, .. } => path.bounds(),
                _ => None,
            })
            .collect()
    }

    /// Device-space extent of all filled and stroked paths.
    pub fn path_bounds(&self) -> Option<BBox> {
        self.items
            .iter()
            .filter_map(|s| match s {
                Shape::FillPath { path, .. } | Shape::StrokePath(path) => path.bounds(),
                _ => None,
            })
            .reduce(|a, b| a.union(&b))
    }
}

impl<'a> IntoIterator for &'a Shapes {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Shapes {
    type Item = Shape;
    type IntoIter = std::vec::IntoIter<Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
