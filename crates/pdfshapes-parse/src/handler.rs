//! Content handler callback trait and the shape emitter feeding it.
//!
//! The interpreter never writes to a [`ContentHandler`] directly. It goes
//! through [`ShapeEmitter`], which only emits a state command (`SetColor`,
//! `SetStroke`, ...) when the value differs from what the surface already
//! has, and tracks that surface state across `PushState`/`PopState`.

use std::sync::Arc;

use pdfshapes_core::{Clip, Ctm, ExtractWarning, Paint, Rgb, Shape, Shapes, StrokeStyle};

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations, allowing handlers to
/// subscribe only to the events they care about.
pub trait ContentHandler {
    /// Called for every drawing or state command, in page order.
    fn on_shape(&mut self, _shape: Shape) {}

    /// Called when a non-fatal warning is encountered during interpretation.
    ///
    /// The interpreter continues with sensible defaults after every warning.
    fn on_warning(&mut self, _warning: ExtractWarning) {}
}

impl ContentHandler for Shapes {
    fn on_shape(&mut self, shape: Shape) {
        self.push(shape);
    }

    fn on_warning(&mut self, warning: ExtractWarning) {
        self.push_warning(warning);
    }
}

/// The paint source of the next fill or stroke.
#[derive(Debug, Clone)]
enum Source {
    Color(Rgb),
    Paint(Arc<Paint>),
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Source::Color(a), Source::Color(b)) => a == b,
            (Source::Paint(a), Source::Paint(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

/// What the surface has been told so far. `None` means unknown.
///
/// A fresh surface is opaque and unclipped.
#[derive(Debug, Clone)]
struct SurfaceState {
    source: Option<Source>,
    stroke: Option<StrokeStyle>,
    transform: Option<Ctm>,
    alpha: f32,
    clip: Option<Clip>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            source: None,
            stroke: None,
            transform: None,
            alpha: 1.0,
            clip: None,
        }
    }
}

/// Writes shapes to a handler, dropping redundant state commands.
pub struct ShapeEmitter<'h> {
    handler: &'h mut dyn ContentHandler,
    surface: SurfaceState,
    saved: Vec<SurfaceState>,
    collect_warnings: bool,
}

impl<'h> ShapeEmitter<'h> {
    pub fn new(handler: &'h mut dyn ContentHandler, collect_warnings: bool) -> Self {
        Self {
            handler,
            surface: SurfaceState::default(),
            saved: Vec::new(),
            collect_warnings,
        }
    }

    pub fn set_color(&mut self, color: Rgb) {
        let source = Source::Color(color);
        if self.surface.source.as_ref() != Some(&source) {
            self.surface.source = Some(source);
            self.handler.on_shape(Shape::SetColor(color));
        }
    }

    pub fn set_paint(&mut self, paint: Arc<Paint>) {
        let source = Source::Paint(Arc::clone(&paint));
        if self.surface.source.as_ref() != Some(&source) {
            self.surface.source = Some(source);
            self.handler.on_shape(Shape::SetPaint(paint));
        }
    }

    pub fn set_stroke(&mut self, style: StrokeStyle) {
        if self.surface.stroke.as_ref() != Some(&style) {
            self.surface.stroke = Some(style.clone());
            self.handler.on_shape(Shape::SetStroke(style));
        }
    }

    pub fn set_transform(&mut self, ctm: Ctm) {
        if self.surface.transform != Some(ctm) {
            self.surface.transform = Some(ctm);
            self.handler.on_shape(Shape::SetTransform(ctm));
        }
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        if self.surface.alpha != alpha {
            self.surface.alpha = alpha;
            self.handler.on_shape(Shape::SetAlpha(alpha));
        }
    }

    pub fn set_clip(&mut self, clip: Option<Clip>) {
        if self.surface.clip != clip {
            self.surface.clip = clip.clone();
            self.handler.on_shape(Shape::SetClip(clip));
        }
    }

    /// Emit a drawing command (`FillPath`, `StrokePath`, `DrawGlyphRun`,
    /// `DrawImage`).
    pub fn draw(&mut self, shape: Shape) {
        self.handler.on_shape(shape);
    }

    pub fn push_state(&mut self) {
        self.saved.push(self.surface.clone());
        self.handler.on_shape(Shape::PushState);
    }

    /// Ignored when no `PushState` is open.
    pub fn pop_state(&mut self) {
        if let Some(prev) = self.saved.pop() {
            self.surface = prev;
            self.handler.on_shape(Shape::PopState);
        }
    }

    /// Number of open `PushState` commands.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Report a warning, mirrored to `tracing` when that feature is enabled.
    pub fn warn(&mut self, warning: ExtractWarning) {
        #[cfg(feature = "tracing")]
        tracing::warn!(code = warning.code.as_str(), "{}", warning);
        if self.collect_warnings {
            self.handler.on_warning(warning);
        }
    }
}
