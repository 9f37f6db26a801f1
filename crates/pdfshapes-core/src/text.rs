//! Glyph runs: positioned glyphs produced by the text showing operators.

use crate::font::{FontEngine, FontHandle};
use crate::geometry::{BBox, Ctm, Point};

/// Text rendering mode (Tr operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextRenderMode {
    /// Fill character glyphs (default).
    #[default]
    Fill = 0,
    /// Stroke (outline) character glyphs.
    Stroke = 1,
    /// Fill and stroke character glyphs.
    FillStroke = 2,
    /// Neither fill nor stroke (invisible text).
    Invisible = 3,
    /// Fill and add to clipping path.
    FillClip = 4,
    /// Stroke and add to clipping path.
    StrokeClip = 5,
    /// Fill, stroke, and add to clipping path.
    FillStrokeClip = 6,
    /// Add to clipping path only.
    Clip = 7,
}

impl TextRenderMode {
    /// Create a TextRenderMode from an integer value (0-7).
    /// Returns None for invalid values.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Fill),
            1 => Some(Self::Stroke),
            2 => Some(Self::FillStroke),
            3 => Some(Self::Invisible),
            4 => Some(Self::FillClip),
            5 => Some(Self::StrokeClip),
            6 => Some(Self::FillStrokeClip),
            7 => Some(Self::Clip),
            _ => None,
        }
    }

    pub fn fills(self) -> bool {
        matches!(
            self,
            Self::Fill | Self::FillStroke | Self::FillClip | Self::FillStrokeClip
        )
    }

    pub fn strokes(self) -> bool {
        matches!(
            self,
            Self::Stroke | Self::FillStroke | Self::StrokeClip | Self::FillStrokeClip
        )
    }

    /// Whether glyphs shown in this mode join the clip at `ET`.
    pub fn clips(self) -> bool {
        (self as u8) >= 4
    }
}

/// One glyph placed in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub code: u32,
    /// Glyph origin (baseline plus rise) in device space.
    pub origin: Point,
    /// Horizontal displacement in text space, spacing and scaling included.
    pub advance: f64,
}

/// Consecutive glyphs sharing one font, size, render mode and orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub font: FontHandle,
    pub font_size: f64,
    pub render_mode: TextRenderMode,
    /// Linear map from text space units (glyph space / 1000) to device
    /// space, without translation.
    pub glyph_matrix: Ctm,
    pub glyphs: Vec<PlacedGlyph>,
    /// Union of the glyph boxes in device space.
    pub bbox: BBox,
}

/// Glyph box in text space units.
///
/// Uses the font's ascent and descent when they span a positive height,
/// falls back to the font bounding box, and finally to a unit box.
pub fn glyph_box(font: &dyn FontEngine, width: f64) -> BBox {
    let (ascent, descent) = (font.ascent(), font.descent());
    if ascent - descent > 0.0 {
        return BBox::new(0.0, descent / 1000.0, width, ascent / 1000.0);
    }
    if let Some(b) = font.max_char_bounds().filter(|b| b.height() > 0.0) {
        return BBox::new(0.0, b.y0 / 1000.0, width, b.y1 / 1000.0);
    }
    let width = if width > 0.0 { width } else { 1.0 };
    BBox::new(0.0, 0.0, width, 1.0)
}

/// Accumulates glyphs into a [`GlyphRun`].
#[derive(Debug)]
pub struct GlyphRunBuilder {
    font: FontHandle,
    font_size: f64,
    render_mode: TextRenderMode,
    glyph_matrix: Ctm,
    glyphs: Vec<PlacedGlyph>,
    bbox: Option<BBox>,
}

impl GlyphRunBuilder {
    pub fn new(
        font: FontHandle,
        font_size: f64,
        render_mode: TextRenderMode,
        glyph_matrix: Ctm,
    ) -> Self {
        Self {
            font,
            font_size,
            render_mode,
            glyph_matrix,
            glyphs: Vec::new(),
            bbox: None,
        }
    }

    /// Add a glyph. `width` is the glyph's own width in text space units,
    /// used for its box.
    pub fn push(&mut self, glyph: PlacedGlyph, width: f64) {
        let local = glyph_box(self.font.engine(), width);
        let placed = local
            .transform(&self.glyph_matrix)
            .transform(&Ctm::translate(glyph.origin.x, glyph.origin.y));
        self.bbox = Some(match self.bbox {
            Some(b) => b.union(&placed),
            None => placed,
        });
        self.glyphs.push(glyph);
    }

    /// The finished run, or `None` when no glyph was pushed.
    pub fn finish(self) -> Option<GlyphRun> {
        let bbox = self.bbox?;
        Some(GlyphRun {
            font: self.font,
            font_size: self.font_size,
            render_mode: self.render_mode,
            glyph_matrix: self.glyph_matrix,
            glyphs: self.glyphs,
            bbox,
        })
    }
}
