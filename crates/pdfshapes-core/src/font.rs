//! Font engine contract used by the text layout accumulator.
//!
//! Font loading, substitution and glyph rasterization live outside this
//! crate. The interpreter only needs advance widths, vertical metrics and,
//! for painters, optional glyph outlines.

use std::fmt;
use std::sync::Arc;

use crate::geometry::BBox;
use crate::path::Path;

/// Metrics and outlines for one font instance.
///
/// All values are in glyph space: 1000 units per text space unit.
pub trait FontEngine: Send + Sync + fmt::Debug {
    /// Font name for diagnostics (e.g. `Helvetica`).
    fn name(&self) -> &str;

    /// Horizontal advance of the glyph for `code`.
    fn glyph_advance(&self, code: u32) -> f64;

    /// Ascent above the baseline (positive).
    fn ascent(&self) -> f64;

    /// Descent below the baseline (usually negative).
    fn descent(&self) -> f64;

    /// Union of all glyph boxes (the font's /FontBBox).
    fn max_char_bounds(&self) -> Option<BBox>;

    /// Split a shown string into character codes.
    ///
    /// Each entry is `(code, byte_len)`. Word spacing applies only to the
    /// single-byte code 32. The default treats every byte as one code.
    fn decode_codes(&self, bytes: &[u8]) -> Vec<(u32, usize)> {
        bytes.iter().map(|&b| (u32::from(b), 1)).collect()
    }

    /// Glyph outline in glyph space, if the engine can provide one.
    fn glyph_outline(&self, _code: u32) -> Option<Path> {
        None
    }
}

/// Shared handle to a font engine.
///
/// Two handles are equal when they point at the same engine.
#[derive(Clone)]
pub struct FontHandle(pub Arc<dyn FontEngine>);

impl FontHandle {
    pub fn new(engine: Arc<dyn FontEngine>) -> Self {
        Self(engine)
    }

    pub fn engine(&self) -> &dyn FontEngine {
        self.0.as_ref()
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FontHandle").field(&self.0.name()).finish()
    }
}

impl PartialEq for FontHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
