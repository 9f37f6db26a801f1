//! Text state for the content stream interpreter.
//!
//! Splits the PDF text state into the parameters that belong to the graphics
//! state ([`TextParams`], saved by `q` and restored by `Q`) and the text and
//! line matrices, which only live between `BT` and `ET`.

use pdfshapes_core::{Ctm, FontHandle, Point, TextRenderMode};

/// Text parameters that are part of the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    /// Character spacing (Tc).
    pub char_spacing: f64,
    /// Word spacing (Tw), applied to the single-byte code 32 only.
    pub word_spacing: f64,
    /// Horizontal scaling (Tz), as a percentage.
    pub h_scaling: f64,
    /// Leading (TL).
    pub leading: f64,
    /// Font resource name from the last `Tf`.
    pub font_name: String,
    /// Font engine for `font_name`; `None` when the resource was missing.
    pub font: Option<FontHandle>,
    pub font_size: f64,
    pub render_mode: TextRenderMode,
    /// Text rise (Ts).
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: String::new(),
            font: None,
            font_size: 0.0,
            render_mode: TextRenderMode::Fill,
            rise: 0.0,
        }
    }
}

impl TextParams {
    /// Horizontal scaling as a fraction (1.0 = 100%).
    pub fn h_scale(&self) -> f64 {
        self.h_scaling / 100.0
    }
}

/// Text parameters plus the text object matrices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextState {
    pub params: TextParams,
    in_text_object: bool,
    text_matrix: Ctm,
    line_matrix: Ctm,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text_object
    }

    pub fn text_matrix(&self) -> &Ctm {
        &self.text_matrix
    }

    pub fn line_matrix(&self) -> &Ctm {
        &self.line_matrix
    }

    /// `BT`: reset both matrices to identity.
    pub fn begin_text(&mut self) {
        self.text_matrix = Ctm::identity();
        self.line_matrix = Ctm::identity();
        self.in_text_object = true;
    }

    /// `ET`
    pub fn end_text(&mut self) {
        self.in_text_object = false;
    }

    /// `Tm`: replace both matrices.
    pub fn set_text_matrix(&mut self, m: Ctm) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: translate the line matrix and start a new line there.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translate(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: `-ty TL` followed by `tx ty Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`: `0 -TL Td`.
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Move the pen by `tx` text space units along the baseline.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Ctm::translate(tx, 0.0).concat(&self.text_matrix);
    }

    /// Linear map from text space units to user space for the current font
    /// size, horizontal scaling and text matrix, followed by `ctm`.
    pub fn glyph_matrix(&self, ctm: &Ctm) -> Ctm {
        let p = &self.params;
        let m = Ctm::scale(p.font_size * p.h_scale(), p.font_size)
            .concat(&self.text_matrix)
            .concat(ctm);
        Ctm { e: 0.0, f: 0.0, ..m }
    }

    /// Current pen position (baseline plus rise) mapped through `ctm`.
    pub fn origin(&self, ctm: &Ctm) -> Point {
        let m = self.text_matrix.concat(ctm);
        m.transform_point(Point::new(0.0, self.params.rise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn defaults() {
        let ts = TextState::new();
        assert_eq!(ts.params.h_scaling, 100.0);
        assert_eq!(ts.params.render_mode, TextRenderMode::Fill);
        assert!(!ts.in_text_object());
        assert!(ts.params.font.is_none());
    }

    #[test]
    fn begin_text_resets_matrices() {
        let mut ts = TextState::new();
        ts.set_text_matrix(Ctm::new(2.0, 0.0, 0.0, 2.0, 50.0, 60.0));
        ts.begin_text();
        assert!(ts.in_text_object());
        assert!(ts.text_matrix().is_identity());
        assert!(ts.line_matrix().is_identity());
        ts.end_text();
        assert!(!ts.in_text_object());
    }

    #[test]
    fn td_is_relative_to_line_start() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position(100.0, 700.0);
        ts.advance(30.0);
        ts.move_text_position(0.0, -14.0);
        assert_approx(ts.text_matrix().e, 100.0);
        assert_approx(ts.text_matrix().f, 686.0);
    }

    #[test]
    fn td_uses_scaled_line_matrix() {
        let mut ts = TextState::new();
        ts.set_text_matrix(Ctm::new(2.0, 0.0, 0.0, 2.0, 10.0, 10.0));
        ts.move_text_position(5.0, 5.0);
        assert_approx(ts.text_matrix().e, 20.0);
        assert_approx(ts.text_matrix().f, 20.0);
    }

    #[test]
    fn capital_td_sets_leading_and_t_star_uses_it() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position_and_set_leading(0.0, -12.0);
        assert_approx(ts.params.leading, 12.0);
        ts.move_to_next_line();
        assert_approx(ts.text_matrix().f, -24.0);
    }

    #[test]
    fn glyph_matrix_combines_size_scaling_and_ctm() {
        let mut ts = TextState::new();
        ts.params.font_size = 10.0;
        ts.params.h_scaling = 50.0;
        ts.set_text_matrix(Ctm::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0));
        let m = ts.glyph_matrix(&Ctm::scale(2.0, 2.0));
        assert_eq!(m, Ctm::new(10.0, 0.0, 0.0, 20.0, 0.0, 0.0));
    }

    #[test]
    fn origin_includes_rise() {
        let mut ts = TextState::new();
        ts.params.rise = 3.0;
        ts.set_text_matrix(Ctm::translate(100.0, 200.0));
        let p = ts.origin(&Ctm::identity());
        assert_approx(p.x, 100.0);
        assert_approx(p.y, 203.0);
    }
}
