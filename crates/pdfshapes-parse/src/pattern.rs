//! Pattern paints: shading patterns become gradients, tiling patterns become
//! rasterized tiles.
//!
//! Paints are built the first time a pattern is selected with `scn`/`SCN`
//! and memoized per pattern object, base CTM and (for uncolored tiling
//! patterns) inherited color. A slot is marked in progress before a tile's
//! content is interpreted, so a pattern that paints with itself gets no
//! paint instead of recursing forever.

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfshapes_core::{
    AxialGradient, BBox, Ctm, ExtractWarning, ExtractWarningCode, FillRule, GradientStop,
    Paint, Path, Point, RadialGradient, Rgb, Shapes, TilePaint,
};

use crate::color_space::{ColorSpace, ColorSpaceCache, reverse};
use crate::error::BackendError;
use crate::function::ShadingFunction;
use crate::handler::ShapeEmitter;
use crate::interpreter::{Frame, Interpreter};
use crate::interpreter_state::InterpreterState;
use crate::objects::{
    as_dict, decode_stream, dict_bool_pair, dict_dict, dict_matrix, dict_number, dict_numbers,
    dict_rect, lookup_resource, resolve_ref,
};
use crate::raster::Canvas;

/// Positions at which gradient ramps are sampled.
pub const STOP_POSITIONS: [f32; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// The geometry of a supported shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadingGeometry {
    /// Type 2: `[x0 y0 x1 y1]`.
    Axial { start: Point, end: Point },
    /// Type 3: `[x0 y0 r0 x1 y1 r1]`.
    Radial {
        start: Point,
        r0: f64,
        end: Point,
        r1: f64,
    },
}

/// A parsed axial or radial shading dictionary.
#[derive(Debug, Clone)]
pub struct Shading {
    pub geometry: ShadingGeometry,
    pub color_space: Arc<ColorSpace>,
    pub domain: [f32; 2],
    pub extend: [bool; 2],
    pub function: ShadingFunction,
    /// Shading space bounds, if given.
    pub bbox: Option<BBox>,
}

impl Shading {
    /// Parse a shading dictionary or stream.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Interpreter`] for shading types other than 2
    /// and 3 and for dictionaries missing their coordinates or function.
    pub fn parse(
        doc: &Document,
        resources: &Dictionary,
        obj: &Object,
        color_spaces: &mut ColorSpaceCache,
    ) -> Result<Self, BackendError> {
        let dict = as_dict(resolve_ref(doc, obj))
            .ok_or_else(|| BackendError::Interpreter("shading is not a dictionary".to_string()))?;
        let shading_type = dict_number(doc, dict, b"ShadingType").unwrap_or(0.0) as i64;
        let coords = dict_numbers(doc, dict, b"Coords").unwrap_or_default();
        let geometry = match (shading_type, coords.as_slice()) {
            (2, &[x0, y0, x1, y1]) => ShadingGeometry::Axial {
                start: Point::new(x0, y0),
                end: Point::new(x1, y1),
            },
            (3, &[x0, y0, r0, x1, y1, r1]) => ShadingGeometry::Radial {
                start: Point::new(x0, y0),
                r0,
                end: Point::new(x1, y1),
                r1,
            },
            (2 | 3, _) => {
                return Err(BackendError::Interpreter(format!(
                    "shading type {shading_type} has malformed /Coords"
                )));
            }
            _ => {
                return Err(BackendError::Interpreter(format!(
                    "shading type {shading_type} is not supported"
                )));
            }
        };

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| color_spaces.resolve(doc, resources, cs))
            .unwrap_or_else(|| Arc::new(ColorSpace::DeviceGray));
        let domain = match dict_numbers(doc, dict, b"Domain").as_deref() {
            Some(&[t0, t1]) => [t0 as f32, t1 as f32],
            _ => [0.0, 1.0],
        };
        let function = dict
            .get(b"Function")
            .map_err(|_| BackendError::Interpreter("shading has no /Function".to_string()))
            .and_then(|f| ShadingFunction::parse(doc, f))?;

        Ok(Self {
            geometry,
            color_space,
            domain,
            extend: dict_bool_pair(doc, dict, b"Extend"),
            function,
            bbox: dict_rect(doc, dict, b"BBox"),
        })
    }

    /// Sample the color ramp at [`STOP_POSITIONS`]. `None` if any sample
    /// fails to evaluate.
    pub fn stops(&self) -> Option<Vec<GradientStop>> {
        let [t0, t1] = self.domain;
        let natural = matches!(*self.color_space, ColorSpace::DeviceN { .. });
        STOP_POSITIONS
            .iter()
            .map(|&s| {
                let out = self.function.evaluate(&[t0 + (t1 - t0) * s])?;
                let stack = if natural { out } else { reverse(&out) };
                Some(GradientStop {
                    offset: s,
                    color: self.color_space.rgb_from_stack(&stack),
                })
            })
            .collect()
    }

    /// The gradient paint, with `transform` mapping shading space to device
    /// space. A radial shading whose radii are both zero has no paint.
    pub fn to_paint(&self, transform: Ctm) -> Option<Paint> {
        let stops = self.stops()?;
        match self.geometry {
            ShadingGeometry::Axial { start, end } => Some(Paint::Axial(AxialGradient {
                start,
                end,
                stops,
                extend: self.extend,
                transform,
            })),
            ShadingGeometry::Radial { start, r0, end, r1 } => {
                if r0 == 0.0 && r1 == 0.0 {
                    return None;
                }
                Some(Paint::Radial(RadialGradient {
                    center: start,
                    radius: r0.max(r1),
                    focus: end,
                    stops,
                    extend: self.extend,
                    transform,
                }))
            }
        }
    }
}

/// Which pattern a cache entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PatternRef {
    Object(ObjectId),
    /// Direct pattern dictionaries have no id; keyed by resource name.
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PatternKey {
    pattern: PatternRef,
    base_ctm: [u64; 6],
    color: Option<[u8; 3]>,
}

#[derive(Debug, Clone)]
enum Slot {
    InProgress,
    Ready(Option<Arc<Paint>>),
}

/// Per-interpretation memo of built pattern paints.
#[derive(Debug, Default)]
pub struct PatternCache {
    slots: HashMap<PatternKey, Slot>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A parsed tiling pattern stream.
#[derive(Debug, Clone)]
struct TilingPattern<'a> {
    bbox: BBox,
    x_step: f64,
    y_step: f64,
    uncolored: bool,
    matrix: Ctm,
    dict: &'a Dictionary,
}

impl<'a> TilingPattern<'a> {
    fn parse(doc: &Document, dict: &'a Dictionary) -> Option<Self> {
        let x_step = dict_number(doc, dict, b"XStep")?.abs();
        let y_step = dict_number(doc, dict, b"YStep")?.abs();
        if !(x_step.is_finite() && y_step.is_finite()) || x_step == 0.0 || y_step == 0.0 {
            return None;
        }
        Some(Self {
            bbox: dict_rect(doc, dict, b"BBox")?,
            x_step,
            y_step,
            uncolored: dict_number(doc, dict, b"PaintType") == Some(2.0),
            matrix: dict_matrix(doc, dict, b"Matrix").unwrap_or_default(),
            dict,
        })
    }
}

impl Interpreter<'_> {
    /// Paint for pattern resource `name`, building it on first use.
    ///
    /// `inherited` colors uncolored tiling patterns. Failures are reported
    /// as warnings and yield `Ok(None)`; only interruption is an error.
    pub(crate) fn pattern_paint(
        &mut self,
        name: &str,
        frame: &Frame<'_>,
        inherited: Rgb,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Result<Option<Arc<Paint>>, BackendError> {
        let doc = self.doc;
        let Some((obj, id)) = lookup_resource(doc, frame.resources, b"Pattern", name) else {
            out.warn(
                ExtractWarning::with_code(ExtractWarningCode::MissingResource, "pattern not found")
                    .for_resource(name)
                    .at_operator(op_index),
            );
            return Ok(None);
        };
        let Some(dict) = as_dict(obj) else {
            out.warn(
                ExtractWarning::with_code(
                    ExtractWarningCode::MissingResource,
                    "pattern is not a dictionary",
                )
                .for_resource(name)
                .at_operator(op_index),
            );
            return Ok(None);
        };
        let pattern_type = dict_number(doc, dict, b"PatternType").unwrap_or(0.0) as i64;
        let uncolored = pattern_type == 1 && dict_number(doc, dict, b"PaintType") == Some(2.0);
        let key = PatternKey {
            pattern: id.map_or_else(|| PatternRef::Name(name.to_string()), PatternRef::Object),
            base_ctm: frame.base_ctm.to_array().map(f64::to_bits),
            color: uncolored.then(|| inherited.to_rgb8()),
        };

        match self.patterns.slots.get(&key) {
            Some(Slot::Ready(paint)) => return Ok(paint.clone()),
            Some(Slot::InProgress) => {
                out.warn(
                    ExtractWarning::with_code(
                        ExtractWarningCode::NestingLimit,
                        "pattern paints with itself",
                    )
                    .for_resource(name)
                    .at_operator(op_index),
                );
                return Ok(None);
            }
            None => {}
        }
        if self.pattern_depth >= self.options.max_pattern_depth {
            out.warn(
                ExtractWarning::with_code(
                    ExtractWarningCode::NestingLimit,
                    format!(
                        "pattern nesting exceeds limit {}",
                        self.options.max_pattern_depth
                    ),
                )
                .for_resource(name)
                .at_operator(op_index),
            );
            return Ok(None);
        }

        self.patterns.slots.insert(key.clone(), Slot::InProgress);
        let built = match pattern_type {
            1 => match obj {
                Object::Stream(stream) => {
                    self.tile_paint(stream, frame, inherited, out, op_index)
                }
                _ => Ok(None),
            },
            2 => Ok(self.shading_pattern_paint(dict, frame, out, op_index, name)),
            _ => {
                out.warn(
                    ExtractWarning::with_code(
                        ExtractWarningCode::MissingResource,
                        format!("unknown pattern type {pattern_type}"),
                    )
                    .for_resource(name)
                    .at_operator(op_index),
                );
                Ok(None)
            }
        };
        let paint = match built {
            Ok(paint) => paint.map(Arc::new),
            Err(e) => {
                self.patterns.slots.remove(&key);
                return Err(e);
            }
        };
        self.patterns.slots.insert(key, Slot::Ready(paint.clone()));
        Ok(paint)
    }

    fn shading_pattern_paint(
        &mut self,
        dict: &Dictionary,
        frame: &Frame<'_>,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
        name: &str,
    ) -> Option<Paint> {
        let doc = self.doc;
        let matrix = dict_matrix(doc, dict, b"Matrix").unwrap_or_default();
        let shading = dict.get(b"Shading").ok().map(|obj| {
            Shading::parse(doc, frame.resources, obj, &mut self.color_spaces)
        });
        let paint = match shading {
            Some(Ok(shading)) => shading.to_paint(matrix.concat(&frame.base_ctm)),
            Some(Err(e)) => {
                out.warn(
                    ExtractWarning::with_code(ExtractWarningCode::UnsupportedShading, e.to_string())
                        .for_resource(name)
                        .at_operator(op_index),
                );
                return None;
            }
            None => None,
        };
        if paint.is_none() {
            out.warn(
                ExtractWarning::with_code(
                    ExtractWarningCode::UnsupportedShading,
                    "shading pattern has no paintable gradient",
                )
                .for_resource(name)
                .at_operator(op_index),
            );
        }
        paint
    }

    /// Interpret a tiling pattern's cell into a raster.
    fn tile_paint(
        &mut self,
        stream: &lopdf::Stream,
        frame: &Frame<'_>,
        inherited: Rgb,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Result<Option<Paint>, BackendError> {
        let doc = self.doc;
        let Some(tiling) = TilingPattern::parse(doc, &stream.dict) else {
            out.warn(
                ExtractWarning::with_code(
                    ExtractWarningCode::MalformedOperator,
                    "tiling pattern has no usable /BBox, /XStep or /YStep",
                )
                .at_operator(op_index),
            );
            return Ok(None);
        };
        let content = match decode_stream(stream) {
            Ok(bytes) => bytes,
            Err(e) => {
                out.warn(ExtractWarning::new(e.to_string()).at_operator(op_index));
                return Ok(None);
            }
        };

        let device = tiling.matrix.concat(&frame.base_ctm);
        let (sx, sy) = device.scale_factors();
        let cap = f64::from(self.options.max_tile_dimension.max(1));
        let width = (tiling.x_step * sx).ceil().clamp(1.0, cap) as u32;
        let height = (tiling.y_step * sy).ceil().clamp(1.0, cap) as u32;
        let (px, py) = (
            f64::from(width) / tiling.x_step,
            f64::from(height) / tiling.y_step,
        );
        // pattern space to pixel space, first row at the top
        let to_pixels = Ctm::new(
            px,
            0.0,
            0.0,
            -py,
            -tiling.bbox.x0 * px,
            (tiling.bbox.y0 + tiling.y_step) * py,
        );
        let Some(from_pixels) = to_pixels.invert() else {
            return Ok(None);
        };

        let mut state = InterpreterState::new(to_pixels, Default::default());
        {
            let gs = state.graphics_state_mut();
            gs.clip_to(
                Path::from_bbox(&tiling.bbox).transform(&to_pixels),
                FillRule::NonZeroWinding,
            );
            if tiling.uncolored {
                gs.fill_color = inherited;
                gs.stroke_color = inherited;
            }
        }
        let resources = dict_dict(doc, tiling.dict, b"Resources").unwrap_or(frame.resources);
        let child = Frame {
            resources,
            depth: frame.depth,
            base_ctm: to_pixels,
            uncolored: tiling.uncolored,
        };

        let mut cell = Shapes::new();
        self.pattern_depth += 1;
        let result = {
            let mut cell_out = ShapeEmitter::new(&mut cell, self.options.collect_warnings);
            self.run(&content, &child, &mut state, &mut cell_out)
        };
        self.pattern_depth -= 1;
        result?;
        for warning in cell.warnings() {
            out.warn(warning.clone());
        }

        let Some(mut canvas) = Canvas::new(width, height) else {
            return Ok(None);
        };
        canvas.replay(cell.as_slice(), &Ctm::identity());
        if device.has_shear() {
            let (w, h) = (f64::from(width), f64::from(height));
            for dx in [-1.0, 0.0, 1.0] {
                for dy in [-1.0, 0.0, 1.0] {
                    if dx != 0.0 || dy != 0.0 {
                        canvas.replay(cell.as_slice(), &Ctm::translate(dx * w, -dy * h));
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(width, height, depth = self.pattern_depth, "rasterized tiling pattern");

        Ok(Some(Paint::Tile(TilePaint {
            width,
            height,
            pixels: canvas.into_pixels(),
            bbox: tiling.bbox,
            pixel_transform: from_pixels.concat(&device),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn exponential(c0: Vec<Object>, c1: Vec<Object>) -> Object {
        Object::Dictionary(dictionary! {
            "FunctionType" => 2,
            "Domain" => vec![0.into(), 1.into()],
            "C0" => c0,
            "C1" => c1,
            "N" => 1,
        })
    }

    fn parse(doc: &Document, shading: Dictionary) -> Result<Shading, BackendError> {
        Shading::parse(
            doc,
            &Dictionary::new(),
            &Object::Dictionary(shading),
            &mut ColorSpaceCache::new(),
        )
    }

    fn assert_rgb(actual: Rgb, expected: Rgb) {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;
        assert!(
            close(actual.r, expected.r) && close(actual.g, expected.g) && close(actual.b, expected.b),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn radial_white_to_black() {
        let doc = Document::with_version("1.5");
        let shading = parse(
            &doc,
            dictionary! {
                "ShadingType" => 3,
                "ColorSpace" => "DeviceGray",
                "Coords" => vec![0.into(), 0.into(), 0.into(), 0.into(), 0.into(), 10.into()],
                "Function" => exponential(vec![1.into()], vec![0.into()]),
            },
        )
        .unwrap();
        let Some(Paint::Radial(g)) = shading.to_paint(Ctm::identity()) else {
            panic!("expected a radial gradient");
        };
        assert_eq!(g.stops.len(), 5);
        assert_rgb(g.stops[0].color, Rgb::white());
        assert_rgb(g.stops[2].color, Rgb::gray(0.5));
        assert_rgb(g.stops[4].color, Rgb::black());
        assert_eq!(g.center, Point::new(0.0, 0.0));
        assert_eq!(g.radius, 10.0);
        assert_eq!(g.extend, [false, false]);
    }

    #[test]
    fn radial_with_zero_radii_has_no_paint() {
        let doc = Document::with_version("1.5");
        let shading = parse(
            &doc,
            dictionary! {
                "ShadingType" => 3,
                "ColorSpace" => "DeviceGray",
                "Coords" => vec![0.into(), 0.into(), 0.into(), 5.into(), 5.into(), 0.into()],
                "Function" => exponential(vec![1.into()], vec![0.into()]),
            },
        )
        .unwrap();
        assert!(shading.to_paint(Ctm::identity()).is_none());
    }

    #[test]
    fn axial_rgb_ramp_keeps_component_order() {
        let doc = Document::with_version("1.5");
        let shading = parse(
            &doc,
            dictionary! {
                "ShadingType" => 2,
                "ColorSpace" => "DeviceRGB",
                "Coords" => vec![0.into(), 0.into(), 100.into(), 0.into()],
                "Domain" => vec![0.into(), 1.into()],
                "Extend" => vec![Object::Boolean(true), Object::Boolean(false)],
                "Function" => exponential(
                    vec![1.into(), 0.into(), 0.into()],
                    vec![0.into(), 0.into(), 1.into()],
                ),
            },
        )
        .unwrap();
        let transform = Ctm::translate(5.0, 5.0);
        let Some(Paint::Axial(g)) = shading.to_paint(transform) else {
            panic!("expected an axial gradient");
        };
        assert_rgb(g.stops[0].color, Rgb::new(1.0, 0.0, 0.0));
        assert_rgb(g.stops[4].color, Rgb::new(0.0, 0.0, 1.0));
        assert_eq!(g.end, Point::new(100.0, 0.0));
        assert_eq!(g.extend, [true, false]);
        assert_eq!(g.transform, transform);
    }

    #[test]
    fn failing_function_means_no_stops() {
        let mut doc = Document::with_version("1.5");
        // pops more operands than the stack holds
        let id = doc.add_object(Stream::new(
            dictionary! {
                "FunctionType" => 4,
                "Domain" => vec![0.into(), 1.into()],
                "Range" => vec![0.into(), 1.into()],
            },
            b"{ pop pop }".to_vec(),
        ));
        let shading = parse(
            &doc,
            dictionary! {
                "ShadingType" => 2,
                "ColorSpace" => "DeviceGray",
                "Coords" => vec![0.into(), 0.into(), 1.into(), 0.into()],
                "Function" => Object::Reference(id),
            },
        )
        .unwrap();
        assert!(shading.stops().is_none());
        assert!(shading.to_paint(Ctm::identity()).is_none());
    }

    #[test]
    fn unsupported_shading_types_are_errors() {
        let doc = Document::with_version("1.5");
        let err = parse(&doc, dictionary! { "ShadingType" => 4 }).unwrap_err();
        assert!(err.to_string().contains("not supported"));
        let err = parse(
            &doc,
            dictionary! { "ShadingType" => 2, "Coords" => vec![0.into()] },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Coords"));
    }

    #[test]
    fn tiling_pattern_needs_steps() {
        let doc = Document::with_version("1.5");
        let good = dictionary! {
            "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
            "XStep" => 10,
            "YStep" => -10,
            "PaintType" => 2,
        };
        let tiling = TilingPattern::parse(&doc, &good).unwrap();
        assert_eq!(tiling.y_step, 10.0);
        assert!(tiling.uncolored);
        assert!(tiling.matrix.is_identity());

        let zero = dictionary! {
            "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
            "XStep" => 0,
            "YStep" => 10,
        };
        assert!(TilingPattern::parse(&doc, &zero).is_none());
    }
}
