//! Colors, line style and the device-independent part of the graphics state.
//!
//! Also implements the path painting operators (S, s, f, F, f*, B, B*, b, b*, n)
//! on [`PathBuilder`], turning a constructed path into a [`PaintedPath`].

use std::sync::Arc;

use crate::geometry::Ctm;
use crate::path::{Path, PathBuilder};
use crate::shapes::Paint;

/// A resolved device RGB color with components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Create a color, clamping every component into `[0.0, 1.0]`.
    ///
    /// NaN components become 0.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
        }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Gray level replicated into all three channels.
    pub fn gray(level: f32) -> Self {
        Self::new(level, level, level)
    }

    /// 8-bit channel values.
    pub fn to_rgb8(&self) -> [u8; 3] {
        [to_u8(self.r), to_u8(self.g), to_u8(self.b)]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::black()
    }
}

/// Clamp a value into `[0.0, 1.0]`, mapping NaN to 0.
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn to_u8(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

/// Fill rule for path painting and clipping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    /// Nonzero winding number rule (default).
    #[default]
    NonZeroWinding,
    /// Even-odd rule.
    EvenOdd,
}

/// Line cap style (`J` operator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    ProjectingSquare,
}

impl LineCap {
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::ProjectingSquare),
            _ => None,
        }
    }
}

/// Line join style (`j` operator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }
}

/// Dash pattern (`d` operator).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashPattern {
    /// Alternating dash and gap lengths. Empty means a solid line.
    pub dash_array: Vec<f64>,
    /// Offset into the pattern at which the dash starts.
    pub dash_phase: f64,
}

impl DashPattern {
    /// Create a dash pattern. Negative entries are dropped and an
    /// all-zero array collapses to a solid line.
    pub fn new(dash_array: Vec<f64>, dash_phase: f64) -> Self {
        let dash_array: Vec<f64> = dash_array.into_iter().filter(|v| *v >= 0.0).collect();
        let dash_array = if dash_array.iter().all(|v| *v == 0.0) {
            Vec::new()
        } else {
            dash_array
        };
        Self {
            dash_array,
            dash_phase,
        }
    }

    pub fn solid() -> Self {
        Self::default()
    }

    pub fn is_solid(&self) -> bool {
        self.dash_array.is_empty()
    }

    /// Scale every length by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            dash_array: self.dash_array.iter().map(|v| v * factor).collect(),
            dash_phase: self.dash_phase * factor,
        }
    }
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: DashPattern,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashPattern::solid(),
        }
    }
}

impl StrokeStyle {
    /// The style with its lengths mapped through `ctm` into device space.
    ///
    /// A zero line width means the thinnest visible line and is kept as 0.
    pub fn to_device(&self, ctm: &Ctm) -> StrokeStyle {
        let scale = ctm.mean_scale();
        StrokeStyle {
            width: self.width * scale,
            dash: self.dash.scaled(scale),
            ..self.clone()
        }
    }
}

/// One clip path: a device-space path and the rule used to test insideness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipPath {
    pub path: Path,
    pub rule: FillRule,
}

/// The current clip: the intersection of every listed path.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clip {
    pub paths: Vec<ClipPath>,
}

impl Clip {
    /// Intersect the clip with another path.
    pub fn intersect(&mut self, path: Path, rule: FillRule) {
        self.paths.push(ClipPath { path, rule });
    }
}

/// Parameters collected from an ExtGState dictionary (`gs` operator).
///
/// Only the keys the interpreter acts on are modeled; each is `None`
/// when absent from the dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtGState {
    /// /LW
    pub line_width: Option<f64>,
    /// /LC
    pub line_cap: Option<LineCap>,
    /// /LJ
    pub line_join: Option<LineJoin>,
    /// /ML
    pub miter_limit: Option<f64>,
    /// /D
    pub dash_pattern: Option<DashPattern>,
    /// /CA
    pub stroke_alpha: Option<f32>,
    /// /ca
    pub fill_alpha: Option<f32>,
    /// /Font: font resource name and size.
    pub font: Option<(String, f64)>,
    /// /RI
    pub rendering_intent: Option<String>,
}

/// Graphics state parameters that do not depend on a PDF backend.
///
/// Color spaces and the CTM live in the interpreter state; this holds the
/// values they resolve to.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub stroke: StrokeStyle,
    /// Resolved stroking color.
    pub stroke_color: Rgb,
    /// Resolved non-stroking color.
    pub fill_color: Rgb,
    /// Pattern paint used for strokes instead of `stroke_color`.
    pub stroke_paint: Option<Arc<Paint>>,
    /// Pattern paint used for fills instead of `fill_color`.
    pub fill_paint: Option<Arc<Paint>>,
    pub stroke_alpha: f32,
    pub fill_alpha: f32,
    /// Device-space clip, `None` when nothing has been clipped.
    pub clip: Option<Clip>,
    pub rendering_intent: String,
    pub flatness: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            stroke: StrokeStyle::default(),
            stroke_color: Rgb::black(),
            fill_color: Rgb::black(),
            stroke_paint: None,
            fill_paint: None,
            stroke_alpha: 1.0,
            fill_alpha: 1.0,
            clip: None,
            rendering_intent: "RelativeColorimetric".to_string(),
            flatness: 1.0,
        }
    }
}

impl GraphicsState {
    /// Apply the values present in an ExtGState. The `/Font` entry is left to
    /// the caller since it belongs to the text state.
    pub fn apply_ext_gstate(&mut self, ext: &ExtGState) {
        if let Some(width) = ext.line_width {
            self.stroke.width = width;
        }
        if let Some(cap) = ext.line_cap {
            self.stroke.cap = cap;
        }
        if let Some(join) = ext.line_join {
            self.stroke.join = join;
        }
        if let Some(limit) = ext.miter_limit {
            self.stroke.miter_limit = limit;
        }
        if let Some(ref dash) = ext.dash_pattern {
            self.stroke.dash = dash.clone();
        }
        if let Some(alpha) = ext.stroke_alpha {
            self.stroke_alpha = clamp_unit(alpha);
        }
        if let Some(alpha) = ext.fill_alpha {
            self.fill_alpha = clamp_unit(alpha);
        }
        if let Some(ref intent) = ext.rendering_intent {
            self.rendering_intent = intent.clone();
        }
    }

    /// Intersect the current clip with a device-space path.
    pub fn clip_to(&mut self, path: Path, rule: FillRule) {
        self.clip.get_or_insert_with(Clip::default).intersect(path, rule);
    }
}

/// How a painting operator uses the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Stroke,
    Fill(FillRule),
    FillAndStroke(FillRule),
    /// `n`: no painting; the path may still be used for clipping.
    None,
}

/// A path taken from the builder by a painting operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedPath {
    pub path: Path,
    pub op: PaintOp,
}

impl PathBuilder {
    /// `S` operator.
    pub fn stroke(&mut self) -> PaintedPath {
        self.finish(PaintOp::Stroke)
    }

    /// `s` operator: `h S`.
    pub fn close_and_stroke(&mut self) -> PaintedPath {
        self.close_path();
        self.stroke()
    }

    /// `f` or `F` operator. Open subpaths are implicitly closed by the painter.
    pub fn fill(&mut self) -> PaintedPath {
        self.finish(PaintOp::Fill(FillRule::NonZeroWinding))
    }

    /// `f*` operator.
    pub fn fill_even_odd(&mut self) -> PaintedPath {
        self.finish(PaintOp::Fill(FillRule::EvenOdd))
    }

    /// `B` operator.
    pub fn fill_and_stroke(&mut self) -> PaintedPath {
        self.finish(PaintOp::FillAndStroke(FillRule::NonZeroWinding))
    }

    /// `B*` operator.
    pub fn fill_even_odd_and_stroke(&mut self) -> PaintedPath {
        self.finish(PaintOp::FillAndStroke(FillRule::EvenOdd))
    }

    /// `b` operator: `h B`.
    pub fn close_fill_and_stroke(&mut self) -> PaintedPath {
        self.close_path();
        self.fill_and_stroke()
    }

    /// `b*` operator: `h B*`.
    pub fn close_fill_even_odd_and_stroke(&mut self) -> PaintedPath {
        self.close_path();
        self.fill_even_odd_and_stroke()
    }

    /// `n` operator: end the path without painting.
    pub fn end_path(&mut self) -> PaintedPath {
        self.finish(PaintOp::None)
    }

    fn finish(&mut self, op: PaintOp) -> PaintedPath {
        PaintedPath {
            path: self.take_and_reset(),
            op,
        }
    }
}
