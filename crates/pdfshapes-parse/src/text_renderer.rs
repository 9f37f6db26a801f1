//! Text showing operators (Tj, TJ, ', ") for the content stream interpreter.
//!
//! Places each glyph at the current pen position and advances the text
//! matrix by `(w0/1000 · Tfs + Tc + Tw) · Th`, where `Tw` applies only to the
//! single-byte code 32.

use pdfshapes_core::{Ctm, FontEngine, PlacedGlyph};

use crate::text_state::TextState;

/// An element of a TJ array operand.
#[derive(Debug, Clone, PartialEq)]
pub enum TjElement {
    /// A string of bytes to show.
    String(Vec<u8>),
    /// A displacement in thousandths of a unit of text space. Positive values
    /// move the pen left.
    Adjustment(f64),
}

/// A placed glyph together with its own width in text space units, which
/// sizes its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShownGlyph {
    pub glyph: PlacedGlyph,
    pub width: f64,
}

/// `Tj`: show a string, advancing the text matrix.
pub fn show_string(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &dyn FontEngine,
    bytes: &[u8],
) -> Vec<ShownGlyph> {
    let codes = font.decode_codes(bytes);
    let mut glyphs = Vec::with_capacity(codes.len());

    for (code, len) in codes {
        let origin = text_state.origin(ctm);
        let params = &text_state.params;
        let w0 = font.glyph_advance(code);
        let word_spacing = if code == 32 && len == 1 {
            params.word_spacing
        } else {
            0.0
        };
        let tx = ((w0 / 1000.0) * params.font_size + params.char_spacing + word_spacing)
            * params.h_scale();

        glyphs.push(ShownGlyph {
            glyph: PlacedGlyph {
                code,
                origin,
                advance: tx,
            },
            width: w0 / 1000.0,
        });
        text_state.advance(tx);
    }

    glyphs
}

/// `TJ`: show strings with positioning adjustments.
pub fn show_positioned(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &dyn FontEngine,
    elements: &[TjElement],
) -> Vec<ShownGlyph> {
    let mut glyphs = Vec::new();

    for element in elements {
        match element {
            TjElement::String(bytes) => {
                glyphs.extend(show_string(text_state, ctm, font, bytes));
            }
            TjElement::Adjustment(adj) => {
                let params = &text_state.params;
                let tx = -(adj / 1000.0) * params.font_size * params.h_scale();
                text_state.advance(tx);
            }
        }
    }

    glyphs
}

/// `'`: `T*` then `Tj`.
pub fn quote_show_string(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &dyn FontEngine,
    bytes: &[u8],
) -> Vec<ShownGlyph> {
    text_state.move_to_next_line();
    show_string(text_state, ctm, font, bytes)
}

/// `"`: `aw Tw`, `ac Tc`, then `string '`.
pub fn double_quote_show_string(
    text_state: &mut TextState,
    ctm: &Ctm,
    font: &dyn FontEngine,
    word_spacing: f64,
    char_spacing: f64,
    bytes: &[u8],
) -> Vec<ShownGlyph> {
    text_state.params.word_spacing = word_spacing;
    text_state.params.char_spacing = char_spacing;
    quote_show_string(text_state, ctm, font, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_metrics::FontMetrics;
    use lopdf::dictionary;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// 600 units for every code.
    fn font() -> FontMetrics {
        FontMetrics::default_metrics()
    }

    fn state(size: f64) -> TextState {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.params.font_size = size;
        ts
    }

    #[test]
    fn tj_places_and_advances() {
        let mut ts = state(10.0);
        ts.move_text_position(72.0, 700.0);
        let glyphs = show_string(&mut ts, &Ctm::identity(), &font(), b"AB");
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].glyph.code, 65);
        assert_approx(glyphs[0].glyph.origin.x, 72.0);
        assert_approx(glyphs[0].glyph.origin.y, 700.0);
        assert_approx(glyphs[0].glyph.advance, 6.0);
        assert_approx(glyphs[0].width, 0.6);
        assert_approx(glyphs[1].glyph.origin.x, 78.0);
        assert_approx(ts.text_matrix().e, 84.0);
    }

    #[test]
    fn spacing_and_horizontal_scaling() {
        let mut ts = state(10.0);
        ts.params.char_spacing = 1.0;
        ts.params.word_spacing = 4.0;
        ts.params.h_scaling = 50.0;
        let glyphs = show_string(&mut ts, &Ctm::identity(), &font(), b" A");
        // (6 + 1 + 4) * 0.5
        assert_approx(glyphs[0].glyph.advance, 5.5);
        // (6 + 1) * 0.5
        assert_approx(glyphs[1].glyph.advance, 3.5);
    }

    #[test]
    fn word_spacing_skips_two_byte_codes() {
        let mut doc = lopdf::Document::with_version("1.5");
        let cid = doc.add_object(lopdf::dictionary! { "Subtype" => "CIDFontType2", "DW" => 1000 });
        let type0 = lopdf::dictionary! {
            "Subtype" => "Type0",
            "DescendantFonts" => vec![cid.into()],
        };
        let font = crate::font_metrics::extract_font_metrics(&doc, &type0);
        let mut ts = state(10.0);
        ts.params.word_spacing = 5.0;
        let glyphs = show_string(&mut ts, &Ctm::identity(), &font, &[0x00, 0x20]);
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].glyph.code, 32);
        assert_approx(glyphs[0].glyph.advance, 10.0);
    }

    #[test]
    fn tj_adjustments_move_left() {
        let mut ts = state(10.0);
        let glyphs = show_positioned(
            &mut ts,
            &Ctm::identity(),
            &font(),
            &[
                TjElement::String(b"A".to_vec()),
                TjElement::Adjustment(-200.0),
                TjElement::String(b"B".to_vec()),
            ],
        );
        assert_eq!(glyphs.len(), 2);
        assert_approx(glyphs[1].glyph.origin.x, 8.0);
    }

    #[test]
    fn origin_goes_through_ctm_and_rise() {
        let mut ts = state(10.0);
        ts.params.rise = 2.0;
        let ctm = Ctm::new(2.0, 0.0, 0.0, 2.0, 10.0, 0.0);
        let glyphs = show_string(&mut ts, &ctm, &font(), b"A");
        assert_approx(glyphs[0].glyph.origin.x, 10.0);
        assert_approx(glyphs[0].glyph.origin.y, 4.0);
    }

    #[test]
    fn quote_operators_move_to_next_line() {
        let mut ts = state(10.0);
        ts.params.leading = 12.0;
        let glyphs = quote_show_string(&mut ts, &Ctm::identity(), &font(), b"A");
        assert_approx(glyphs[0].glyph.origin.y, -12.0);

        let glyphs =
            double_quote_show_string(&mut ts, &Ctm::identity(), &font(), 3.0, 1.0, b" ");
        assert_approx(glyphs[0].glyph.origin.y, -24.0);
        assert_approx(glyphs[0].glyph.advance, 10.0);
        assert_eq!(ts.params.word_spacing, 3.0);
        assert_eq!(ts.params.char_spacing, 1.0);
    }
}
