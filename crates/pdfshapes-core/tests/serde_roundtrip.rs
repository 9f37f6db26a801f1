//! Serde serialization/deserialization round-trip tests.
//!
//! These tests verify that the plain-data shape types can be serialized to
//! JSON and deserialized back, producing equal values.

#![cfg(feature = "serde")]

use pdfshapes_core::*;

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

// --- Geometry types ---

#[test]
fn test_serde_point() {
    roundtrip(&Point::new(3.25, 2.5));
}

#[test]
fn test_serde_ctm() {
    roundtrip(&Ctm::new(2.0, 0.0, 0.0, 3.0, 10.0, 20.0));
    roundtrip(&Ctm::identity());
}

#[test]
fn test_serde_bbox() {
    roundtrip(&BBox::new(10.0, 20.0, 100.0, 200.0));
}

// --- Paths and painting ---

#[test]
fn test_serde_path() {
    roundtrip(&Path::new(vec![
        PathSegment::MoveTo(Point::new(0.0, 0.0)),
        PathSegment::LineTo(Point::new(10.0, 0.0)),
        PathSegment::CurveTo {
            cp1: Point::new(12.0, 2.0),
            cp2: Point::new(12.0, 8.0),
            end: Point::new(10.0, 10.0),
        },
        PathSegment::ClosePath,
    ]));
}

#[test]
fn test_serde_stroke_style() {
    roundtrip(&StrokeStyle {
        width: 2.5,
        cap: LineCap::Round,
        join: LineJoin::Bevel,
        miter_limit: 4.0,
        dash: DashPattern::new(vec![3.0, 1.0], 0.5),
    });
}

#[test]
fn test_serde_clip() {
    let mut clip = Clip::default();
    clip.intersect(
        Path::from_bbox(&BBox::new(0.0, 0.0, 5.0, 5.0)),
        FillRule::EvenOdd,
    );
    roundtrip(&clip);
}

#[test]
fn test_serde_rgb() {
    roundtrip(&Rgb::new(0.25, 0.5, 1.0));
}

#[test]
fn test_serde_text_render_mode() {
    roundtrip(&TextRenderMode::FillStrokeClip);
}

// --- Warnings ---

#[test]
fn test_serde_extract_warning() {
    roundtrip(
        &ExtractWarning::with_code(ExtractWarningCode::MissingFont, "font F3 not found")
            .at_operator(7)
            .for_resource("F3"),
    );
    roundtrip(&ExtractWarning::new("something odd"));
}
