//! Property-based tests for color conversion and fail-soft interpretation.

use std::sync::Arc;

use lopdf::{Dictionary, Document};
use pdfshapes_core::{InterpretOptions, Shape};
use pdfshapes_parse::{ColorSpace, InterpreterState, Lexer, cmyk_to_rgb, interpret};
use proptest::prelude::*;

fn unit() -> impl Strategy<Value = f32> {
    0.0..=1.0f32
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        (-500.0..500.0f64).prop_map(|v| format!("{v:.2}")),
        (-5i32..5).prop_map(|v| v.to_string()),
        Just("/F1".to_string()),
        Just("(ab)".to_string()),
        Just("[1 2]".to_string()),
    ]
}

fn operator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "q", "Q", "cm", "m", "l", "c", "v", "y", "h", "re", "f", "F", "f*", "S", "s", "B", "b",
        "n", "W", "W*", "w", "J", "j", "M", "d", "rg", "RG", "g", "G", "k", "K", "sc", "scn",
        "cs", "CS", "BT", "ET", "Tf", "Td", "TD", "Tm", "T*", "Tj", "TJ", "'", "\"", "Tc", "Tw",
        "Tz", "TL", "Tr", "Ts", "Do", "sh", "gs", "BX", "EX", "ri", "i", "XX",
    ])
}

fn content_stream() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::collection::vec(operand(), 0..4), operator()), 0..40).prop_map(
        |ops| {
            ops.into_iter()
                .map(|(operands, op)| format!("{} {op}", operands.join(" ")))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )
}

fn in_unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

proptest! {
    #[test]
    fn cmyk_conversion_stays_in_gamut(c in unit(), m in unit(), y in unit(), k in unit()) {
        let rgb = cmyk_to_rgb(c, m, y, k);
        prop_assert!(in_unit(rgb.r) && in_unit(rgb.g) && in_unit(rgb.b), "{:?}", rgb);
    }

    #[test]
    fn full_black_ink_is_black(c in unit(), m in unit(), y in unit()) {
        let rgb = cmyk_to_rgb(c, m, y, 1.0);
        prop_assert!(rgb.r < 0.01 && rgb.g < 0.01 && rgb.b < 0.01, "{:?}", rgb);
    }

    #[test]
    fn indexed_lookup_clamps_the_index(index in -10.0..10.0f32) {
        let space = ColorSpace::Indexed {
            base: Arc::new(ColorSpace::DeviceRgb),
            hival: 1,
            lookup: vec![255, 0, 0, 0, 0, 255],
        };
        let rgb = space.to_rgb(&[index]);
        if index < 1.0 {
            prop_assert_eq!((rgb.r, rgb.b), (1.0, 0.0));
        } else {
            prop_assert_eq!((rgb.r, rgb.b), (0.0, 1.0));
        }
    }

    #[test]
    fn device_gray_is_neutral(v in unit()) {
        let rgb = ColorSpace::DeviceGray.to_rgb(&[v]);
        prop_assert_eq!(rgb.r, rgb.g);
        prop_assert_eq!(rgb.g, rgb.b);
    }

    #[test]
    fn lexer_always_makes_progress(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let items = Lexer::new(&bytes).take(bytes.len() + 1).count();
        prop_assert!(items <= bytes.len());
    }

    #[test]
    fn interpretation_never_fails_on_operator_soup(content in content_stream()) {
        let doc = Document::with_version("1.5");
        let shapes = interpret(
            &doc,
            content.as_bytes(),
            &Dictionary::new(),
            InterpreterState::default(),
            &InterpretOptions::default(),
        );
        let shapes = shapes.map_err(|e| TestCaseError::fail(e.to_string()))?;
        let pushes = shapes.iter().filter(|s| **s == Shape::PushState).count();
        let pops = shapes.iter().filter(|s| **s == Shape::PopState).count();
        prop_assert_eq!(pushes, pops);
    }
}
