//! Font metrics read from PDF font dictionaries, and the default
//! [`FontProvider`].
//!
//! Simple fonts use /Widths, /FirstChar and /FontDescriptor, falling back to
//! the standard 14 tables. Type0 fonts read /W and /DW from their descendant
//! and decode two-byte codes. Type3 widths are scaled by /FontMatrix.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object};
use pdfshapes_core::{BBox, FontEngine, FontHandle};

use crate::objects::{dict_name, dict_number, dict_numbers, number, resolve_ref};
use crate::standard_fonts;

/// Default ascent when not specified (750/1000 of text space).
const DEFAULT_ASCENT: f64 = 750.0;

/// Default descent when not specified (-250/1000 of text space).
const DEFAULT_DESCENT: f64 = -250.0;

/// Default character width when not specified (600/1000 of text space).
const DEFAULT_WIDTH: f64 = 600.0;

/// Default CID width when /DW is absent.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Width table of a simple or composite font.
#[derive(Debug, Clone)]
enum Widths {
    /// /Widths indexed by `code - first_char`.
    Simple {
        widths: Vec<f64>,
        first_char: u32,
    },
    /// Standard 14 table.
    Standard(&'static standard_fonts::StandardFont),
    /// /W overrides with /DW default, two-byte codes.
    Cid {
        widths: HashMap<u32, f64>,
        default_width: f64,
    },
}

/// Metrics for one font resource.
#[derive(Clone)]
pub struct FontMetrics {
    name: String,
    widths: Widths,
    missing_width: f64,
    ascent: f64,
    descent: f64,
    font_bbox: Option<BBox>,
}

impl fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontMetrics")
            .field("name", &self.name)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .finish_non_exhaustive()
    }
}

impl FontMetrics {
    /// Metrics for a simple font with an explicit width array.
    pub fn new(
        name: impl Into<String>,
        widths: Vec<f64>,
        first_char: u32,
        missing_width: f64,
        ascent: f64,
        descent: f64,
        font_bbox: Option<BBox>,
    ) -> Self {
        Self {
            name: name.into(),
            widths: Widths::Simple { widths, first_char },
            missing_width,
            ascent,
            descent,
            font_bbox,
        }
    }

    /// Metrics used when the font resource is missing or unreadable.
    pub fn default_metrics() -> Self {
        Self::new(
            "Default",
            Vec::new(),
            0,
            DEFAULT_WIDTH,
            DEFAULT_ASCENT,
            DEFAULT_DESCENT,
            None,
        )
    }

    /// Width for a character code in glyph space (1/1000 of text space).
    pub fn get_width(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple { widths, first_char } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(self.missing_width),
            Widths::Standard(table) => table.width(code),
            Widths::Cid {
                widths,
                default_width,
            } => widths.get(&code).copied().unwrap_or(*default_width),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.widths, Widths::Cid { .. })
    }
}

impl FontEngine for FontMetrics {
    fn name(&self) -> &str {
        &self.name
    }

    fn glyph_advance(&self, code: u32) -> f64 {
        self.get_width(code)
    }

    fn ascent(&self) -> f64 {
        self.ascent
    }

    fn descent(&self) -> f64 {
        self.descent
    }

    fn max_char_bounds(&self) -> Option<BBox> {
        self.font_bbox
    }

    fn decode_codes(&self, bytes: &[u8]) -> Vec<(u32, usize)> {
        if !self.is_composite() {
            return bytes.iter().map(|&b| (u32::from(b), 1)).collect();
        }
        // Identity-style two-byte codes; a trailing odd byte stands alone.
        bytes
            .chunks(2)
            .map(|pair| match pair {
                [hi, lo] => ((u32::from(*hi) << 8) | u32::from(*lo), 2),
                [single] => (u32::from(*single), 1),
                _ => (0, 0),
            })
            .collect()
    }
}

/// Extract [`FontMetrics`] from a font dictionary.
pub fn extract_font_metrics(doc: &Document, font_dict: &Dictionary) -> FontMetrics {
    let subtype = dict_name(doc, font_dict, b"Subtype").unwrap_or_default();
    let name = dict_name(doc, font_dict, b"BaseFont").unwrap_or_else(|| subtype.clone());

    if subtype == "Type0" {
        if let Some(descendant) = descendant_font(doc, font_dict) {
            return extract_cid_metrics(doc, name, descendant);
        }
    }

    let descriptor = FontDescriptorInfo::parse(doc, font_dict);
    let standard = standard_fonts::lookup(&name);

    let widths = font_dict
        .get(b"Widths")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| number(doc, o).unwrap_or(0.0))
                .collect::<Vec<f64>>()
        });
    let first_char = dict_number(doc, font_dict, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;

    // Type3 glyph space is given by /FontMatrix instead of 1/1000.
    let width_scale = if subtype == "Type3" {
        dict_numbers(doc, font_dict, b"FontMatrix")
            .filter(|m| m.len() == 6)
            .map_or(1.0, |m| m[0] * 1000.0)
    } else {
        1.0
    };

    let widths = match (widths, standard) {
        (Some(w), _) => Widths::Simple {
            widths: w.into_iter().map(|v| v * width_scale).collect(),
            first_char,
        },
        (None, Some(table)) => Widths::Standard(table),
        (None, None) => Widths::Simple {
            widths: Vec::new(),
            first_char: 0,
        },
    };

    FontMetrics {
        name,
        widths,
        missing_width: descriptor.missing_width.unwrap_or(DEFAULT_WIDTH),
        ascent: descriptor
            .ascent
            .or(standard.map(|s| f64::from(s.ascent)))
            .unwrap_or(DEFAULT_ASCENT),
        descent: descriptor
            .descent
            .or(standard.map(|s| f64::from(s.descent)))
            .unwrap_or(DEFAULT_DESCENT),
        font_bbox: descriptor.font_bbox.or(standard.map(|s| {
            let b = s.font_bbox.map(f64::from);
            BBox::new(b[0], b[1], b[2], b[3])
        })),
    }
}

fn descendant_font<'a>(doc: &'a Document, font_dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let arr = resolve_ref(doc, font_dict.get(b"DescendantFonts").ok()?)
        .as_array()
        .ok()?;
    resolve_ref(doc, arr.first()?).as_dict().ok()
}

fn extract_cid_metrics(doc: &Document, name: String, cid_font: &Dictionary) -> FontMetrics {
    let descriptor = FontDescriptorInfo::parse(doc, cid_font);
    let default_width = dict_number(doc, cid_font, b"DW").unwrap_or(DEFAULT_CID_WIDTH);
    let widths = cid_font
        .get(b"W")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .map(|arr| parse_w_array(doc, arr))
        .unwrap_or_default();
    FontMetrics {
        name,
        widths: Widths::Cid {
            widths,
            default_width,
        },
        missing_width: default_width,
        ascent: descriptor.ascent.unwrap_or(DEFAULT_ASCENT),
        descent: descriptor.descent.unwrap_or(DEFAULT_DESCENT),
        font_bbox: descriptor.font_bbox,
    }
}

/// Parse a /W array: `c [w1 w2 ...]` and `c_first c_last w` entries.
pub fn parse_w_array(doc: &Document, objects: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut items = objects.iter().map(|o| resolve_ref(doc, o)).peekable();

    while let Some(first) = items.next() {
        let Some(start) = number(doc, first).filter(|v| *v >= 0.0).map(|v| v as u32) else {
            continue;
        };
        match items.next() {
            Some(Object::Array(run)) => {
                for (offset, w) in run.iter().enumerate() {
                    if let Some(w) = number(doc, w) {
                        widths.insert(start + offset as u32, w);
                    }
                }
            }
            Some(end) => {
                let (Some(end), Some(w)) = (
                    number(doc, end),
                    items.next().and_then(|o| number(doc, o)),
                ) else {
                    continue;
                };
                // ranges beyond 16-bit codes are malformed
                let end = (end as u32).min(start.saturating_add(0xFFFF));
                for cid in start..=end {
                    widths.insert(cid, w);
                }
            }
            None => break,
        }
    }
    widths
}

/// Parsed /FontDescriptor values; `None` where the key is absent.
#[derive(Debug, Default)]
struct FontDescriptorInfo {
    ascent: Option<f64>,
    descent: Option<f64>,
    font_bbox: Option<BBox>,
    missing_width: Option<f64>,
}

impl FontDescriptorInfo {
    fn parse(doc: &Document, font_dict: &Dictionary) -> Self {
        let Some(desc) = font_dict
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_dict().ok())
        else {
            return Self::default();
        };
        let font_bbox = dict_numbers(doc, desc, b"FontBBox")
            .filter(|b| b.len() == 4)
            .map(|b| BBox::new(b[0].min(b[2]), b[1].min(b[3]), b[0].max(b[2]), b[1].max(b[3])));
        Self {
            ascent: dict_number(doc, desc, b"Ascent"),
            descent: dict_number(doc, desc, b"Descent"),
            font_bbox,
            missing_width: dict_number(doc, desc, b"MissingWidth"),
        }
    }
}

/// Supplies font engines for `Tf` font resources.
pub trait FontProvider: Send + Sync + fmt::Debug {
    /// Load the font for resource `name` with dictionary `font_dict`.
    ///
    /// Returning `None` makes the interpreter warn and use default metrics.
    fn load_font(&self, doc: &Document, name: &str, font_dict: &Dictionary) -> Option<FontHandle>;
}

/// Reads metrics straight from font dictionaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct DictFontProvider;

impl FontProvider for DictFontProvider {
    fn load_font(&self, doc: &Document, _name: &str, font_dict: &Dictionary) -> Option<FontHandle> {
        Some(FontHandle::new(Arc::new(extract_font_metrics(doc, font_dict))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn width_lookup_within_and_outside_range() {
        let metrics = FontMetrics::new(
            "Test",
            vec![250.0, 500.0],
            65,
            300.0,
            DEFAULT_ASCENT,
            DEFAULT_DESCENT,
            None,
        );
        assert_eq!(metrics.get_width(65), 250.0);
        assert_eq!(metrics.get_width(66), 500.0);
        assert_eq!(metrics.get_width(64), 300.0);
        assert_eq!(metrics.get_width(67), 300.0);
    }

    #[test]
    fn default_metrics_values() {
        let m = FontMetrics::default_metrics();
        assert_eq!(m.get_width(65), DEFAULT_WIDTH);
        assert_eq!(m.ascent(), DEFAULT_ASCENT);
        assert_eq!(m.descent(), DEFAULT_DESCENT);
        assert!(m.max_char_bounds().is_none());
    }

    #[test]
    fn extract_widths_and_descriptor() {
        let mut doc = Document::with_version("1.5");
        let desc = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "Ascent" => 800,
            "Descent" => -200,
            "MissingWidth" => 111,
            "FontBBox" => vec![0.into(), (-200).into(), 1000.into(), 900.into()],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Custom",
            "FirstChar" => 32,
            "Widths" => vec![250.into(), Object::Real(333.5)],
            "FontDescriptor" => desc,
        };
        let m = extract_font_metrics(&doc, &font);
        assert_eq!(m.name(), "Custom");
        assert_eq!(m.get_width(32), 250.0);
        assert_eq!(m.get_width(33), 333.5);
        assert_eq!(m.get_width(34), 111.0);
        assert_eq!(m.ascent(), 800.0);
        assert_eq!(m.descent(), -200.0);
        assert_eq!(
            m.max_char_bounds(),
            Some(BBox::new(0.0, -200.0, 1000.0, 900.0))
        );
    }

    #[test]
    fn standard_font_without_widths_uses_builtin_table() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        let m = extract_font_metrics(&doc, &font);
        assert_eq!(m.get_width(u32::from(b'A')), 667.0);
        assert_eq!(m.ascent(), 718.0);
        assert_eq!(m.descent(), -207.0);
    }

    #[test]
    fn empty_font_dict_uses_defaults() {
        let doc = Document::with_version("1.5");
        let m = extract_font_metrics(&doc, &dictionary! {});
        assert_eq!(m.get_width(65), DEFAULT_WIDTH);
        assert_eq!(m.ascent(), DEFAULT_ASCENT);
    }

    #[test]
    fn type3_widths_follow_font_matrix() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type3",
            "FirstChar" => 0,
            "Widths" => vec![5.into()],
            "FontMatrix" => vec![
                Object::Real(0.1), 0.into(), 0.into(), Object::Real(0.1), 0.into(), 0.into()
            ],
        };
        let m = extract_font_metrics(&doc, &font);
        assert!((m.get_width(0) - 500.0).abs() < 1e-3);
    }

    #[test]
    fn w_array_both_forms() {
        let doc = Document::with_version("1.5");
        let w = vec![
            1.into(),
            Object::Array(vec![500.into(), 600.into()]),
            10.into(),
            12.into(),
            700.into(),
        ];
        let widths = parse_w_array(&doc, &w);
        assert_eq!(widths.get(&1), Some(&500.0));
        assert_eq!(widths.get(&2), Some(&600.0));
        assert_eq!(widths.get(&11), Some(&700.0));
        assert_eq!(widths.get(&13), None);
    }

    #[test]
    fn type0_font_decodes_two_byte_codes() {
        let mut doc = Document::with_version("1.5");
        let cid_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 900,
            "W" => vec![0x41.into(), Object::Array(vec![500.into()])],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "CJK",
            "DescendantFonts" => vec![cid_font.into()],
        };
        let m = extract_font_metrics(&doc, &font);
        assert!(m.is_composite());
        assert_eq!(m.decode_codes(&[0x00, 0x41, 0x00, 0x42, 0x07]), vec![
            (0x41, 2),
            (0x42, 2),
            (0x07, 1)
        ]);
        assert_eq!(m.get_width(0x41), 500.0);
        assert_eq!(m.get_width(0x42), 900.0);
    }

    #[test]
    fn dict_provider_wraps_metrics() {
        let doc = Document::with_version("1.5");
        let font = dictionary! { "BaseFont" => "Courier" };
        let handle = DictFontProvider.load_font(&doc, "F1", &font).unwrap();
        assert_eq!(handle.engine().name(), "Courier");
        assert_eq!(handle.engine().glyph_advance(65), 600.0);
    }
}
