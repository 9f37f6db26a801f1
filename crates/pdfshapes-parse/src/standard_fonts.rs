//! Built-in metrics for the standard 14 fonts.
//!
//! Widths cover the printable ASCII range (codes 32 to 126) in glyph space
//! units, taken from the Adobe AFM files. Other codes use the font's
//! fallback width. Oblique and italic faces share the upright widths.

/// Metrics for one standard font family face.
#[derive(Debug)]
pub struct StandardFont {
    /// Widths of codes 32..=126.
    widths: &'static [u16; 95],
    /// Width used for codes outside the table.
    pub fallback_width: u16,
    pub ascent: i16,
    pub descent: i16,
    /// `[llx, lly, urx, ury]`
    pub font_bbox: [i16; 4],
}

impl StandardFont {
    /// Width of `code`, in glyph space units.
    pub fn width(&self, code: u32) -> f64 {
        match code {
            32..=126 => f64::from(self.widths[(code - 32) as usize]),
            _ => f64::from(self.fallback_width),
        }
    }
}

/// Metrics for a standard font name, ignoring a subset prefix (`ABCDEF+`).
///
/// Symbol and ZapfDingbats have no table; callers use their defaults.
pub fn lookup(base_font: &str) -> Option<&'static StandardFont> {
    let name = base_font
        .split_once('+')
        .filter(|(tag, _)| tag.len() == 6)
        .map_or(base_font, |(_, rest)| rest);
    match name {
        "Courier" | "Courier-Bold" | "Courier-Oblique" | "Courier-BoldOblique" => Some(&COURIER),
        "Helvetica" | "Helvetica-Oblique" | "Arial" | "ArialMT" => Some(&HELVETICA),
        "Helvetica-Bold" | "Helvetica-BoldOblique" | "Arial-BoldMT" => Some(&HELVETICA_BOLD),
        "Times-Roman" | "Times-Italic" | "TimesNewRomanPSMT" => Some(&TIMES_ROMAN),
        "Times-Bold" | "Times-BoldItalic" | "TimesNewRomanPS-BoldMT" => Some(&TIMES_BOLD),
        _ => None,
    }
}

static COURIER: StandardFont = StandardFont {
    widths: &[600; 95],
    fallback_width: 600,
    ascent: 629,
    descent: -157,
    font_bbox: [-23, -250, 715, 805],
};

#[rustfmt::skip]
static HELVETICA: StandardFont = StandardFont {
    widths: &[
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
        556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722, 667,
        611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
        667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500,
        222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ],
    fallback_width: 556,
    ascent: 718,
    descent: -207,
    font_bbox: [-166, -225, 1000, 931],
};

#[rustfmt::skip]
static HELVETICA_BOLD: StandardFont = StandardFont {
    widths: &[
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
        556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722, 722, 667,
        611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
        667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556,
        278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ],
    fallback_width: 556,
    ascent: 718,
    descent: -207,
    font_bbox: [-170, -228, 1003, 962],
};

#[rustfmt::skip]
static TIMES_ROMAN: StandardFont = StandardFont {
    widths: &[
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, 500, 500, 500,
        500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, 921, 722, 667, 667, 722, 611,
        556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722,
        722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500,
        278, 778, 500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
    ],
    fallback_width: 500,
    ascent: 683,
    descent: -217,
    font_bbox: [-168, -218, 1000, 898],
};

#[rustfmt::skip]
static TIMES_BOLD: StandardFont = StandardFont {
    widths: &[
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278, 500, 500, 500,
        500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500, 930, 722, 667, 722, 722, 667,
        611, 778, 778, 389, 500, 778, 667, 944, 722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722,
        722, 667, 333, 278, 333, 581, 500, 333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556,
        278, 833, 556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
    ],
    fallback_width: 500,
    ascent: 683,
    descent: -217,
    font_bbox: [-168, -218, 1000, 935],
};
