//! Content stream interpreter.
//!
//! Interprets content stream operators, maintaining graphics and text state,
//! and emits [`Shape`]s to a [`ContentHandler`]. Form XObjects and tiling
//! pattern cells are interpreted recursively with their own resources.

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use pdfshapes_core::{
    BBox, Clip, Ctm, DashPattern, ExtGState, ExtractWarning, ExtractWarningCode, FillRule,
    FontHandle, GlyphRun, GlyphRunBuilder, GraphicsState, ImageRef, InterpretOptions, LineCap,
    LineJoin, PaintOp, PaintedPath, Path, PathBuilder, PdfError, Shape, Shapes, TextRenderMode,
    glyph_box,
};

use crate::color_space::{ColorSpace, ColorSpaceCache};
use crate::error::BackendError;
use crate::font_metrics::{DictFontProvider, FontMetrics, FontProvider};
use crate::handler::{ContentHandler, ShapeEmitter};
use crate::image::{ImageDecoder, ImageSource, RawImageDecoder, expand_inline_key, expand_inline_name};
use crate::interpreter_state::InterpreterState;
use crate::objects::{
    as_dict, decode_stream, dict_dict, dict_matrix, dict_name, dict_number, dict_rect,
    lookup_resource, number, number_array, resolve_ref,
};
use crate::pattern::{PatternCache, Shading};
use crate::text_renderer::{
    ShownGlyph, TjElement, double_quote_show_string, quote_show_string, show_positioned,
    show_string,
};
use crate::tokenizer::{Lexer, Operand};

/// Half the side of the square painted by `sh` when nothing bounds it.
const SHADING_EXTENT: f64 = 1.0e6;

/// Collaborators supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Providers<'p> {
    pub fonts: &'p dyn FontProvider,
    pub images: &'p dyn ImageDecoder,
}

impl Default for Providers<'static> {
    fn default() -> Self {
        Self {
            fonts: &DictFontProvider,
            images: &RawImageDecoder,
        }
    }
}

/// Interpret a content stream into a [`Shapes`] list with the default font
/// provider and image decoder.
///
/// # Errors
///
/// Returns [`BackendError::Interrupted`] when the interrupt flag is raised
/// and [`BackendError::Core`] when the stream exceeds
/// [`InterpretOptions::max_stream_bytes`]. Everything else is reported as a
/// warning in the returned list.
pub fn interpret(
    doc: &Document,
    bytes: &[u8],
    resources: &Dictionary,
    initial: InterpreterState,
    options: &InterpretOptions,
) -> Result<Shapes, BackendError> {
    let mut shapes = Shapes::new();
    interpret_content_stream(
        doc,
        bytes,
        resources,
        initial,
        options,
        Providers::default(),
        &mut shapes,
    )?;
    Ok(shapes)
}

/// Interpret a content stream, streaming shapes and warnings to `handler`.
///
/// # Errors
///
/// Same as [`interpret`]. Shapes already delivered to `handler` before an
/// error are partial output.
pub fn interpret_content_stream(
    doc: &Document,
    bytes: &[u8],
    resources: &Dictionary,
    initial: InterpreterState,
    options: &InterpretOptions,
    providers: Providers<'_>,
    handler: &mut dyn ContentHandler,
) -> Result<(), BackendError> {
    let mut out = ShapeEmitter::new(handler, options.collect_warnings);
    let mut state = initial;
    let frame = Frame {
        resources,
        depth: 0,
        base_ctm: *state.ctm(),
        uncolored: false,
    };
    Interpreter::new(doc, options, providers).run(bytes, &frame, &mut state, &mut out)
}

/// Caches and collaborators shared by every stream of one interpretation.
pub(crate) struct Interpreter<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) options: &'a InterpretOptions,
    providers: Providers<'a>,
    pub(crate) color_spaces: ColorSpaceCache,
    pub(crate) patterns: PatternCache,
    fonts: HashMap<ObjectId, FontHandle>,
    default_font: FontHandle,
    /// Tiling pattern cells currently being interpreted.
    pub(crate) pattern_depth: usize,
}

/// One content stream being interpreted: the page, a form or a pattern cell.
pub(crate) struct Frame<'r> {
    pub(crate) resources: &'r Dictionary,
    /// Form nesting depth, 0 for the outermost stream.
    pub(crate) depth: usize,
    /// CTM when the stream started; pattern space is relative to it.
    pub(crate) base_ctm: Ctm,
    /// Inside an uncolored tiling pattern, where color operators are ignored.
    pub(crate) uncolored: bool,
}

/// Per-stream path and text bookkeeping.
#[derive(Default)]
struct StreamLocals {
    /// Clip rule from `W`/`W*`, applied at the next painting operator.
    pending_clip: Option<FillRule>,
    /// Glyph boxes of clipping render modes, applied at `ET`.
    text_clip: Option<Path>,
    /// Open `BX` sections.
    compat: usize,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        doc: &'a Document,
        options: &'a InterpretOptions,
        providers: Providers<'a>,
    ) -> Self {
        Self {
            doc,
            options,
            providers,
            color_spaces: ColorSpaceCache::new(),
            patterns: PatternCache::new(),
            fonts: HashMap::new(),
            default_font: FontHandle::new(Arc::new(FontMetrics::default_metrics())),
            pattern_depth: 0,
        }
    }

    /// Interpret one content stream.
    pub(crate) fn run(
        &mut self,
        bytes: &[u8],
        frame: &Frame<'_>,
        state: &mut InterpreterState,
        out: &mut ShapeEmitter<'_>,
    ) -> Result<(), BackendError> {
        let limit = self.options.max_stream_bytes;
        if bytes.len() > limit {
            if frame.depth == 0 && self.pattern_depth == 0 {
                return Err(BackendError::Core(PdfError::ResourceLimitExceeded {
                    limit_name: "max_stream_bytes".to_string(),
                    limit_value: limit,
                    actual_value: bytes.len(),
                }));
            }
            out.warn(ExtractWarning::new(format!(
                "nested content stream of {} bytes exceeds limit {limit}, skipped",
                bytes.len()
            )));
            return Ok(());
        }

        let base_stack = state.stack_depth();
        let mut path = PathBuilder::new(*state.ctm());
        let mut locals = StreamLocals::default();

        for (op_index, item) in Lexer::new(bytes).enumerate() {
            if self.options.is_interrupted() {
                return Err(BackendError::Interrupted);
            }
            let op = match item {
                Ok(op) => op,
                Err(e) => {
                    out.warn(
                        ExtractWarning::with_code(ExtractWarningCode::MalformedOperator, e.to_string())
                            .at_operator(op_index),
                    );
                    continue;
                }
            };
            let operands = op.operands.as_slice();

            match op.name.as_str() {
                // --- Graphics state operators ---
                "q" => state.save_state(),
                "Q" => {
                    if state.stack_depth() <= base_stack || !state.restore_state() {
                        out.warn(
                            ExtractWarning::with_code(
                                ExtractWarningCode::UnbalancedRestore,
                                "Q without matching q",
                            )
                            .at_operator(op_index),
                        );
                    }
                    path.set_ctm(*state.ctm());
                }
                "cm" => {
                    let Some([a, b, c, d, e, f]) = numbers::<6>(operands) else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    state.concat_matrix(&Ctm::new(a, b, c, d, e, f));
                    path.set_ctm(*state.ctm());
                }
                "w" => match get_f64(operands, 0) {
                    Some(v) => state.set_line_width(v),
                    None => malformed(out, &op.name, op_index),
                },
                "J" => match get_i64(operands, 0) {
                    Some(v) => state.set_line_cap(v),
                    None => malformed(out, &op.name, op_index),
                },
                "j" => match get_i64(operands, 0) {
                    Some(v) => state.set_line_join(v),
                    None => malformed(out, &op.name, op_index),
                },
                "M" => match get_f64(operands, 0) {
                    Some(v) => state.set_miter_limit(v),
                    None => malformed(out, &op.name, op_index),
                },
                "d" => match (operands.first(), get_f64(operands, 1)) {
                    (Some(Operand::Array(items)), Some(phase)) => {
                        let dash = items.iter().filter_map(Operand::as_f64).collect();
                        state.set_dash_pattern(dash, phase);
                    }
                    _ => malformed(out, &op.name, op_index),
                },
                "ri" => match get_name(operands, 0) {
                    Some(intent) => state.graphics_state_mut().rendering_intent = intent.to_string(),
                    None => malformed(out, &op.name, op_index),
                },
                "i" => match get_f64(operands, 0) {
                    Some(v) => state.graphics_state_mut().flatness = v,
                    None => malformed(out, &op.name, op_index),
                },
                "gs" => match get_name(operands, 0) {
                    Some(name) => self.apply_ext_gstate(name, frame, state, out, op_index),
                    None => malformed(out, &op.name, op_index),
                },

                // --- Color operators ---
                "g" | "G" | "rg" | "RG" | "k" | "K" => {
                    let (space, count) = match op.name.as_str() {
                        "g" | "G" => (ColorSpace::DeviceGray, 1),
                        "rg" | "RG" => (ColorSpace::DeviceRgb, 3),
                        _ => (ColorSpace::DeviceCmyk, 4),
                    };
                    let Some(components) = components(operands, count) else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    if frame.uncolored {
                        continue;
                    }
                    if is_stroking(&op.name) {
                        state.set_stroke_device(space, components);
                    } else {
                        state.set_fill_device(space, components);
                    }
                }
                "cs" | "CS" => {
                    let Some(name) = get_name(operands, 0) else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    if frame.uncolored {
                        continue;
                    }
                    let space = match self.color_spaces.resolve_name(self.doc, frame.resources, name) {
                        Some(space) => space,
                        None => {
                            out.warn(
                                ExtractWarning::with_code(
                                    ExtractWarningCode::ColorSpaceFallback,
                                    "color space not resolved, using DeviceGray",
                                )
                                .for_resource(name)
                                .at_operator(op_index),
                            );
                            Arc::new(ColorSpace::DeviceGray)
                        }
                    };
                    if is_stroking(&op.name) {
                        state.set_stroke_color_space(space);
                    } else {
                        state.set_fill_color_space(space);
                    }
                }
                "sc" | "scn" | "SC" | "SCN" => {
                    if frame.uncolored {
                        continue;
                    }
                    let stroking = is_stroking(&op.name);
                    let values: Vec<f32> =
                        operands.iter().filter_map(|o| o.as_f64()).map(|v| v as f32).collect();
                    let pattern = match operands.last() {
                        Some(Operand::Name(name)) if op.name.ends_with('n') || op.name.ends_with('N') => {
                            Some(name.clone())
                        }
                        _ => None,
                    };
                    if let Some(name) = pattern {
                        self.select_pattern(stroking, name, values, frame, state, out, op_index)?;
                        continue;
                    }
                    let slot = if stroking { state.stroke_slot() } else { state.fill_slot() };
                    let count = slot.space.component_count();
                    if values.len() < count {
                        malformed(out, &op.name, op_index);
                        continue;
                    }
                    let values = values[values.len() - count..].to_vec();
                    if stroking {
                        state.set_stroke_components(values);
                    } else {
                        state.set_fill_components(values);
                    }
                }

                // --- Path construction operators ---
                "m" | "l" | "c" | "v" | "y" | "re" | "h" => {
                    path.set_ctm(*state.ctm());
                    if !build_path(&mut path, &op.name, operands) {
                        malformed(out, &op.name, op_index);
                    }
                }

                // --- Path painting operators ---
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => {
                    let painted = match op.name.as_str() {
                        "S" => path.stroke(),
                        "s" => path.close_and_stroke(),
                        "f" | "F" => path.fill(),
                        "f*" => path.fill_even_odd(),
                        "B" => path.fill_and_stroke(),
                        "B*" => path.fill_even_odd_and_stroke(),
                        "b" => path.close_fill_and_stroke(),
                        "b*" => path.close_fill_even_odd_and_stroke(),
                        _ => path.end_path(),
                    };
                    paint_path(painted, &mut locals.pending_clip, state, out);
                }
                "W" => locals.pending_clip = Some(FillRule::NonZeroWinding),
                "W*" => locals.pending_clip = Some(FillRule::EvenOdd),

                // --- Text object and state operators ---
                "BT" => {
                    state.text_mut().begin_text();
                    locals.text_clip = None;
                }
                "ET" => {
                    state.text_mut().end_text();
                    if let Some(clip) = locals.text_clip.take() {
                        state
                            .graphics_state_mut()
                            .clip_to(clip, FillRule::NonZeroWinding);
                    }
                }
                "Tf" => {
                    let (Some(name), Some(size)) = (get_name(operands, 0), get_f64(operands, 1))
                    else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    let font = self.load_font(name, frame.resources, out, op_index);
                    let params = &mut state.text_mut().params;
                    params.font_name = name.to_string();
                    params.font = font;
                    params.font_size = size;
                }
                "Td" | "TD" => {
                    let Some([tx, ty]) = numbers::<2>(operands) else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    if op.name == "TD" {
                        state.text_mut().move_text_position_and_set_leading(tx, ty);
                    } else {
                        state.text_mut().move_text_position(tx, ty);
                    }
                }
                "Tm" => {
                    let Some([a, b, c, d, e, f]) = numbers::<6>(operands) else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    state.text_mut().set_text_matrix(Ctm::new(a, b, c, d, e, f));
                }
                "T*" => state.text_mut().move_to_next_line(),
                "Tc" | "Tw" | "Tz" | "TL" | "Ts" => {
                    let Some(v) = get_f64(operands, 0) else {
                        malformed(out, &op.name, op_index);
                        continue;
                    };
                    let params = &mut state.text_mut().params;
                    match op.name.as_str() {
                        "Tc" => params.char_spacing = v,
                        "Tw" => params.word_spacing = v,
                        "Tz" => params.h_scaling = v,
                        "TL" => params.leading = v,
                        _ => params.rise = v,
                    }
                }
                "Tr" => match get_i64(operands, 0).and_then(TextRenderMode::from_i64) {
                    Some(mode) => state.text_mut().params.render_mode = mode,
                    None => malformed(out, &op.name, op_index),
                },

                // --- Text showing operators ---
                "Tj" | "TJ" | "'" | "\"" => {
                    let font = self.current_font(state, out, op_index);
                    let ctm = *state.ctm();
                    let engine = font.engine();
                    let text = state.text_mut();
                    let shown = match op.name.as_str() {
                        "Tj" => get_bytes(operands, 0).map(|b| show_string(text, &ctm, engine, b)),
                        "'" => get_bytes(operands, 0).map(|b| quote_show_string(text, &ctm, engine, b)),
                        "\"" => match (get_f64(operands, 0), get_f64(operands, 1), get_bytes(operands, 2)) {
                            (Some(aw), Some(ac), Some(b)) => {
                                Some(double_quote_show_string(text, &ctm, engine, aw, ac, b))
                            }
                            _ => None,
                        },
                        _ => match operands.first() {
                            Some(Operand::Array(items)) => {
                                Some(show_positioned(text, &ctm, engine, &tj_elements(items)))
                            }
                            _ => None,
                        },
                    };
                    match shown {
                        Some(shown) => draw_glyphs(&shown, font, state, &mut locals.text_clip, out),
                        None => malformed(out, &op.name, op_index),
                    }
                }

                // --- XObjects, inline images and shadings ---
                "Do" => match get_name(operands, 0) {
                    Some(name) => self.handle_do(name, frame, state, out, op_index)?,
                    None => malformed(out, &op.name, op_index),
                },
                "BI" => match (operands.first(), operands.get(1).and_then(Operand::as_bytes)) {
                    (Some(Operand::Dictionary(entries)), Some(data)) => {
                        let dict = inline_image_dict(entries);
                        self.draw_image(None, &dict, data, frame.resources, state, out, op_index);
                    }
                    _ => malformed(out, &op.name, op_index),
                },
                "sh" => match get_name(operands, 0) {
                    Some(name) => self.paint_shading(name, frame, state, out, op_index),
                    None => malformed(out, &op.name, op_index),
                },

                // --- Accepted and ignored ---
                "BMC" | "BDC" | "EMC" | "MP" | "DP" | "d0" | "d1" => {}
                "BX" => locals.compat += 1,
                "EX" => locals.compat = locals.compat.saturating_sub(1),

                _ => {
                    if locals.compat == 0 {
                        out.warn(
                            ExtractWarning::with_code(
                                ExtractWarningCode::UnsupportedOperator,
                                format!("unknown operator '{}'", op.name),
                            )
                            .at_operator(op_index),
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// `scn`/`SCN` with a pattern name.
    #[allow(clippy::too_many_arguments)]
    fn select_pattern(
        &mut self,
        stroking: bool,
        name: String,
        values: Vec<f32>,
        frame: &Frame<'_>,
        state: &mut InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Result<(), BackendError> {
        let (slot, current) = if stroking {
            (state.stroke_slot(), state.graphics_state().stroke_color)
        } else {
            (state.fill_slot(), state.graphics_state().fill_color)
        };
        let inherited = if values.is_empty() {
            current
        } else {
            slot.space.to_rgb(&values)
        };
        let paint = self.pattern_paint(&name, frame, inherited, out, op_index)?;
        if stroking {
            state.set_stroke_pattern(name, values, paint);
        } else {
            state.set_fill_pattern(name, values, paint);
        }
        Ok(())
    }

    /// `gs`: apply an ExtGState resource.
    fn apply_ext_gstate(
        &mut self,
        name: &str,
        frame: &Frame<'_>,
        state: &mut InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) {
        let doc = self.doc;
        let Some(dict) =
            lookup_resource(doc, frame.resources, b"ExtGState", name).and_then(|(o, _)| as_dict(o))
        else {
            out.warn(
                ExtractWarning::with_code(ExtractWarningCode::MissingResource, "ExtGState not found")
                    .for_resource(name)
                    .at_operator(op_index),
            );
            return;
        };

        let mut ext = ExtGState {
            line_width: dict_number(doc, dict, b"LW"),
            line_cap: dict_number(doc, dict, b"LC").and_then(|v| LineCap::from_i64(v as i64)),
            line_join: dict_number(doc, dict, b"LJ").and_then(|v| LineJoin::from_i64(v as i64)),
            miter_limit: dict_number(doc, dict, b"ML"),
            dash_pattern: ext_dash(doc, dict),
            stroke_alpha: dict_number(doc, dict, b"CA").map(|v| v as f32),
            fill_alpha: dict_number(doc, dict, b"ca").map(|v| v as f32),
            font: None,
            rendering_intent: dict_name(doc, dict, b"RI"),
        };

        let mut font = None;
        if let Some(Object::Array(entry)) = dict.get(b"Font").ok().map(|o| resolve_ref(doc, o)) {
            if let [font_ref, size] = entry.as_slice() {
                let handle = self.font_from_object(
                    name,
                    resolve_ref(doc, font_ref),
                    font_ref.as_reference().ok(),
                    out,
                    op_index,
                );
                let size = number(doc, size).unwrap_or(0.0);
                let font_name = handle
                    .as_ref()
                    .map(|h| h.engine().name().to_string())
                    .unwrap_or_default();
                ext.font = Some((font_name, size));
                font = Some(handle);
            }
        }

        match dict.get(b"SMask").ok().map(|o| resolve_ref(doc, o)) {
            None => {}
            Some(Object::Name(n)) if n == b"None" => {}
            Some(_) => out.warn(
                ExtractWarning::new("soft masks are not supported")
                    .for_resource(name)
                    .at_operator(op_index),
            ),
        }

        state.graphics_state_mut().apply_ext_gstate(&ext);
        if let (Some(handle), Some((font_name, size))) = (font, ext.font) {
            let params = &mut state.text_mut().params;
            params.font = handle;
            params.font_name = font_name;
            params.font_size = size;
        }
    }

    /// Font engine for a `Tf` resource name, `None` (with a warning) when it
    /// cannot be loaded.
    fn load_font(
        &mut self,
        name: &str,
        resources: &Dictionary,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Option<FontHandle> {
        let Some((obj, id)) = lookup_resource(self.doc, resources, b"Font", name) else {
            out.warn(
                ExtractWarning::with_code(ExtractWarningCode::MissingFont, "font resource not found")
                    .for_resource(name)
                    .at_operator(op_index),
            );
            return None;
        };
        self.font_from_object(name, obj, id, out, op_index)
    }

    fn font_from_object(
        &mut self,
        name: &str,
        obj: &Object,
        id: Option<ObjectId>,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Option<FontHandle> {
        if let Some(handle) = id.and_then(|id| self.fonts.get(&id)) {
            return Some(handle.clone());
        }
        let loaded = as_dict(obj).and_then(|dict| self.providers.fonts.load_font(self.doc, name, dict));
        match loaded {
            Some(handle) => {
                if let Some(id) = id {
                    self.fonts.insert(id, handle.clone());
                }
                Some(handle)
            }
            None => {
                out.warn(
                    ExtractWarning::with_code(
                        ExtractWarningCode::MissingFont,
                        "font could not be loaded, using default metrics",
                    )
                    .for_resource(name)
                    .at_operator(op_index),
                );
                None
            }
        }
    }

    /// The font for text showing, falling back to default metrics.
    fn current_font(
        &self,
        state: &InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> FontHandle {
        let params = &state.text().params;
        if let Some(font) = &params.font {
            return font.clone();
        }
        if params.font_name.is_empty() {
            out.warn(
                ExtractWarning::with_code(ExtractWarningCode::MissingFont, "text shown before Tf")
                    .at_operator(op_index),
            );
        }
        self.default_font.clone()
    }

    /// `Do`
    fn handle_do(
        &mut self,
        name: &str,
        frame: &Frame<'_>,
        state: &mut InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some((obj, _)) = lookup_resource(doc, frame.resources, b"XObject", name) else {
            out.warn(
                ExtractWarning::with_code(ExtractWarningCode::MissingResource, "XObject not found")
                    .for_resource(name)
                    .at_operator(op_index),
            );
            return Ok(());
        };
        let Object::Stream(stream) = obj else {
            out.warn(
                ExtractWarning::with_code(
                    ExtractWarningCode::MissingResource,
                    "XObject is not a stream",
                )
                .for_resource(name)
                .at_operator(op_index),
            );
            return Ok(());
        };

        match dict_name(doc, &stream.dict, b"Subtype").as_deref() {
            Some("Form") => self.run_form(name, stream, frame, state, out, op_index),
            Some("Image") => {
                self.draw_image(
                    Some(name),
                    &stream.dict,
                    &stream.content,
                    frame.resources,
                    state,
                    out,
                    op_index,
                );
                Ok(())
            }
            other => {
                out.warn(
                    ExtractWarning::with_code(
                        ExtractWarningCode::UnsupportedOperator,
                        format!("XObject subtype {} is not drawn", other.unwrap_or("(none)")),
                    )
                    .for_resource(name)
                    .at_operator(op_index),
                );
                Ok(())
            }
        }
    }

    /// Interpret a Form XObject inside its own `PushState`/`PopState` group.
    fn run_form(
        &mut self,
        name: &str,
        stream: &Stream,
        frame: &Frame<'_>,
        state: &mut InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) -> Result<(), BackendError> {
        let depth = frame.depth + 1;
        if depth > self.options.max_recursion_depth {
            out.warn(
                ExtractWarning::with_code(
                    ExtractWarningCode::NestingLimit,
                    format!(
                        "form nesting exceeds limit {}",
                        self.options.max_recursion_depth
                    ),
                )
                .for_resource(name)
                .at_operator(op_index),
            );
            return Ok(());
        }
        let content = match decode_stream(stream) {
            Ok(bytes) => bytes,
            Err(e) => {
                out.warn(
                    ExtractWarning::new(e.to_string())
                        .for_resource(name)
                        .at_operator(op_index),
                );
                return Ok(());
            }
        };

        let doc = self.doc;
        let outer_stack = state.stack_depth();
        state.save_state();
        if let Some(matrix) = dict_matrix(doc, &stream.dict, b"Matrix") {
            state.concat_matrix(&matrix);
        }
        if let Some(bbox) = dict_rect(doc, &stream.dict, b"BBox") {
            let ctm = *state.ctm();
            state
                .graphics_state_mut()
                .clip_to(Path::from_bbox(&bbox).transform(&ctm), FillRule::NonZeroWinding);
        }
        let child = Frame {
            resources: dict_dict(doc, &stream.dict, b"Resources").unwrap_or(frame.resources),
            depth,
            base_ctm: *state.ctm(),
            uncolored: frame.uncolored,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(form = name, depth, "interpreting form XObject");

        out.push_state();
        let result = self.run(&content, &child, state, out);
        out.pop_state();
        while state.stack_depth() > outer_stack {
            state.restore_state();
        }
        result
    }

    /// Emit a `DrawImage` for an image XObject or inline image.
    #[allow(clippy::too_many_arguments)]
    fn draw_image(
        &mut self,
        name: Option<&str>,
        dict: &Dictionary,
        data: &[u8],
        resources: &Dictionary,
        state: &InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) {
        let doc = self.doc;
        let image_mask = dict
            .get(b"ImageMask")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_bool().ok())
            .unwrap_or(false);
        if image_mask && state.fill_unpainted() {
            return;
        }
        let space_obj = dict.get(b"ColorSpace").ok();
        let space = match space_obj {
            Some(obj) if !image_mask => Some(
                self.color_spaces
                    .resolve(doc, resources, obj)
                    .unwrap_or_else(|| {
                        let mut warning = ExtractWarning::with_code(
                            ExtractWarningCode::ColorSpaceFallback,
                            "image color space not resolved, using DeviceGray",
                        )
                        .at_operator(op_index);
                        if let Some(name) = name {
                            warning = warning.for_resource(name);
                        }
                        out.warn(warning);
                        Arc::new(ColorSpace::DeviceGray)
                    }),
            ),
            _ => None,
        };

        let decoded = self.providers.images.decode(&ImageSource {
            dict,
            data,
            color_space: space.as_deref(),
        });
        let image = ImageRef {
            name: name.map(str::to_string),
            width: dict_number(doc, dict, b"Width").map_or(0, |v| v.max(0.0) as u32),
            height: dict_number(doc, dict, b"Height").map_or(0, |v| v.max(0.0) as u32),
            bits_per_component: dict_number(doc, dict, b"BitsPerComponent").map(|v| v as u32),
            color_space: space_obj.and_then(|o| family_name(doc, o)),
            filter: last_filter(doc, dict),
            image_mask,
            decoded: decoded.map(Arc::new),
        };

        let gs = state.graphics_state();
        out.set_clip(gs.clip.clone());
        out.set_alpha(gs.fill_alpha);
        if image_mask {
            set_fill_source(gs, out);
        }
        out.set_transform(*state.ctm());
        out.draw(Shape::DrawImage(image));
    }

    /// `sh`: fill the current clip (or the shading's BBox, or a large square)
    /// with a shading.
    fn paint_shading(
        &mut self,
        name: &str,
        frame: &Frame<'_>,
        state: &InterpreterState,
        out: &mut ShapeEmitter<'_>,
        op_index: usize,
    ) {
        let doc = self.doc;
        let Some((obj, _)) = lookup_resource(doc, frame.resources, b"Shading", name) else {
            out.warn(
                ExtractWarning::with_code(ExtractWarningCode::MissingResource, "shading not found")
                    .for_resource(name)
                    .at_operator(op_index),
            );
            return;
        };
        let ctm = *state.ctm();
        let paint = Shading::parse(doc, frame.resources, obj, &mut self.color_spaces)
            .map(|shading| (shading.to_paint(ctm), shading.bbox));
        let (paint, bbox) = match paint {
            Ok((Some(paint), bbox)) => (paint, bbox),
            Ok((None, _)) => {
                out.warn(
                    ExtractWarning::with_code(
                        ExtractWarningCode::UnsupportedShading,
                        "shading has no paintable gradient",
                    )
                    .for_resource(name)
                    .at_operator(op_index),
                );
                return;
            }
            Err(e) => {
                out.warn(
                    ExtractWarning::with_code(ExtractWarningCode::UnsupportedShading, e.to_string())
                        .for_resource(name)
                        .at_operator(op_index),
                );
                return;
            }
        };

        let gs = state.graphics_state();
        let Some(area) = shading_area(gs.clip.as_ref(), bbox.map(|b| b.transform(&ctm))) else {
            return;
        };
        out.set_clip(gs.clip.clone());
        out.set_alpha(gs.fill_alpha);
        out.set_paint(Arc::new(paint));
        out.draw(Shape::FillPath {
            path: Path::from_bbox(&area),
            rule: FillRule::NonZeroWinding,
        });
    }
}

fn malformed(out: &mut ShapeEmitter<'_>, op: &str, op_index: usize) {
    out.warn(
        ExtractWarning::with_code(
            ExtractWarningCode::MalformedOperator,
            format!("bad operands for '{op}'"),
        )
        .at_operator(op_index),
    );
}

/// Draw a finished path, then apply any pending `W`/`W*` clip.
fn paint_path(
    painted: PaintedPath,
    pending_clip: &mut Option<FillRule>,
    state: &mut InterpreterState,
    out: &mut ShapeEmitter<'_>,
) {
    if !painted.path.is_empty() {
        match painted.op {
            PaintOp::Fill(rule) => fill(&painted.path, rule, state, out),
            PaintOp::Stroke => stroke(&painted.path, state, out),
            PaintOp::FillAndStroke(rule) => {
                fill(&painted.path, rule, state, out);
                stroke(&painted.path, state, out);
            }
            PaintOp::None => {}
        }
    }
    if let Some(rule) = pending_clip.take() {
        state.graphics_state_mut().clip_to(painted.path, rule);
    }
}

fn fill(path: &Path, rule: FillRule, state: &InterpreterState, out: &mut ShapeEmitter<'_>) {
    if state.fill_unpainted() {
        return;
    }
    let gs = state.graphics_state();
    out.set_clip(gs.clip.clone());
    set_fill_source(gs, out);
    out.set_alpha(gs.fill_alpha);
    out.draw(Shape::FillPath {
        path: path.clone(),
        rule,
    });
}

fn stroke(path: &Path, state: &InterpreterState, out: &mut ShapeEmitter<'_>) {
    if state.stroke_unpainted() {
        return;
    }
    let gs = state.graphics_state();
    out.set_clip(gs.clip.clone());
    set_stroke_source(gs, out);
    out.set_alpha(gs.stroke_alpha);
    out.set_stroke(gs.stroke.to_device(state.ctm()));
    out.draw(Shape::StrokePath(path.clone()));
}

fn set_fill_source(gs: &GraphicsState, out: &mut ShapeEmitter<'_>) {
    match &gs.fill_paint {
        Some(paint) => out.set_paint(Arc::clone(paint)),
        None => out.set_color(gs.fill_color),
    }
}

fn set_stroke_source(gs: &GraphicsState, out: &mut ShapeEmitter<'_>) {
    match &gs.stroke_paint {
        Some(paint) => out.set_paint(Arc::clone(paint)),
        None => out.set_color(gs.stroke_color),
    }
}

/// Emit the glyphs of one text-showing operator as glyph runs and collect
/// their boxes for clipping render modes.
fn draw_glyphs(
    shown: &[ShownGlyph],
    font: FontHandle,
    state: &InterpreterState,
    text_clip: &mut Option<Path>,
    out: &mut ShapeEmitter<'_>,
) {
    if shown.is_empty() {
        return;
    }
    let ctm = *state.ctm();
    let params = &state.text().params;
    let mode = params.render_mode;
    let glyph_matrix = state.text().glyph_matrix(&ctm);

    if mode.clips() {
        let clip = text_clip.get_or_insert_with(Path::default);
        for g in shown {
            let placed = glyph_box(font.engine(), g.width)
                .transform(&glyph_matrix)
                .transform(&Ctm::translate(g.glyph.origin.x, g.glyph.origin.y));
            clip.extend(&Path::from_bbox(&placed));
        }
    }
    let fills = mode.fills() && !state.fill_unpainted();
    let strokes = mode.strokes() && !state.stroke_unpainted();
    if !fills && !strokes {
        return;
    }

    let mut builder = GlyphRunBuilder::new(font, params.font_size, mode, glyph_matrix);
    for g in shown {
        builder.push(g.glyph, g.width);
    }
    let Some(run) = builder.finish() else {
        return;
    };
    let gs = state.graphics_state();

    if fills {
        out.set_clip(gs.clip.clone());
        set_fill_source(gs, out);
        out.set_alpha(gs.fill_alpha);
        let fill_mode = match mode {
            TextRenderMode::FillStroke => TextRenderMode::Fill,
            TextRenderMode::FillStrokeClip => TextRenderMode::FillClip,
            other => other,
        };
        out.draw(Shape::DrawGlyphRun(GlyphRun {
            render_mode: fill_mode,
            ..run.clone()
        }));
    }
    if strokes {
        out.set_clip(gs.clip.clone());
        set_stroke_source(gs, out);
        out.set_alpha(gs.stroke_alpha);
        out.set_stroke(gs.stroke.to_device(&ctm));
        let stroke_mode = match mode {
            TextRenderMode::FillStroke => TextRenderMode::Stroke,
            TextRenderMode::FillStrokeClip => TextRenderMode::StrokeClip,
            other => other,
        };
        out.draw(Shape::DrawGlyphRun(GlyphRun {
            render_mode: stroke_mode,
            ..run
        }));
    }
}

/// Device-space rectangle painted by `sh`, `None` when the clip leaves
/// nothing visible.
fn shading_area(clip: Option<&Clip>, bbox: Option<BBox>) -> Option<BBox> {
    let mut area = bbox.unwrap_or_else(|| {
        BBox::new(-SHADING_EXTENT, -SHADING_EXTENT, SHADING_EXTENT, SHADING_EXTENT)
    });
    for clip_path in clip.map(|c| c.paths.as_slice()).unwrap_or_default() {
        if let Some(bounds) = clip_path.path.bounds() {
            area = area.intersect(&bounds)?;
        }
    }
    Some(area)
}

/// Apply a path construction operator. `false` when operands are missing.
fn build_path(path: &mut PathBuilder, name: &str, operands: &[Operand]) -> bool {
    match name {
        "m" => numbers::<2>(operands).map(|[x, y]| path.move_to(x, y)).is_some(),
        "l" => numbers::<2>(operands).map(|[x, y]| path.line_to(x, y)).is_some(),
        "c" => numbers::<6>(operands)
            .map(|[x1, y1, x2, y2, x3, y3]| path.curve_to(x1, y1, x2, y2, x3, y3))
            .is_some(),
        "v" => numbers::<4>(operands)
            .map(|[x2, y2, x3, y3]| path.curve_to_v(x2, y2, x3, y3))
            .is_some(),
        "y" => numbers::<4>(operands)
            .map(|[x1, y1, x3, y3]| path.curve_to_y(x1, y1, x3, y3))
            .is_some(),
        "re" => numbers::<4>(operands)
            .map(|[x, y, w, h]| path.rectangle(x, y, w, h))
            .is_some(),
        _ => {
            path.close_path();
            true
        }
    }
}

fn is_stroking(op: &str) -> bool {
    op.starts_with(|c: char| c.is_ascii_uppercase())
}

/// The ExtGState `/D` entry: `[[dash array] phase]`.
fn ext_dash(doc: &Document, dict: &Dictionary) -> Option<DashPattern> {
    let entry = resolve_ref(doc, dict.get(b"D").ok()?).as_array().ok()?;
    match entry.as_slice() {
        [array, phase] => Some(DashPattern::new(
            number_array(doc, array)?,
            number(doc, phase).unwrap_or(0.0),
        )),
        _ => None,
    }
}

/// Color space family name for an [`ImageRef`]: the name itself or the
/// first element of an array.
fn family_name(doc: &Document, obj: &Object) -> Option<String> {
    match resolve_ref(doc, obj) {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        Object::Array(items) => items
            .first()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

fn last_filter(doc: &Document, dict: &Dictionary) -> Option<String> {
    let name = match resolve_ref(doc, dict.get(b"Filter").ok()?) {
        Object::Name(n) => n.as_slice(),
        Object::Array(items) => items.last()?.as_name().ok()?,
        _ => return None,
    };
    Some(String::from_utf8_lossy(name).into_owned())
}

/// Build an image dictionary from inline image entries, expanding
/// abbreviated keys and the color space and filter names.
fn inline_image_dict(entries: &[(String, Operand)]) -> Dictionary {
    let mut dict = Dictionary::new();
    for (key, value) in entries {
        let key = expand_inline_key(key);
        let expand_names = matches!(key, "ColorSpace" | "Filter");
        dict.set(key, inline_object(value, expand_names));
    }
    dict
}

fn inline_object(operand: &Operand, expand_names: bool) -> Object {
    match operand {
        Operand::Integer(i) => Object::Integer(*i),
        Operand::Real(f) => Object::Real(*f as f32),
        Operand::Name(n) if expand_names => Object::Name(expand_inline_name(n).as_bytes().to_vec()),
        Operand::Name(n) => Object::Name(n.as_bytes().to_vec()),
        Operand::LiteralString(s) => Object::String(s.clone(), StringFormat::Literal),
        Operand::HexString(s) => Object::String(s.clone(), StringFormat::Hexadecimal),
        Operand::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| inline_object(item, expand_names))
                .collect(),
        ),
        Operand::Boolean(b) => Object::Boolean(*b),
        Operand::Null => Object::Null,
        Operand::Dictionary(entries) => {
            let mut dict = Dictionary::new();
            for (key, value) in entries {
                dict.set(expand_inline_key(key), inline_object(value, false));
            }
            Object::Dictionary(dict)
        }
    }
}

fn tj_elements(items: &[Operand]) -> Vec<TjElement> {
    items
        .iter()
        .filter_map(|item| match item {
            Operand::LiteralString(s) | Operand::HexString(s) => Some(TjElement::String(s.clone())),
            other => other.as_f64().map(TjElement::Adjustment),
        })
        .collect()
}

fn get_f64(operands: &[Operand], index: usize) -> Option<f64> {
    operands.get(index)?.as_f64()
}

fn get_i64(operands: &[Operand], index: usize) -> Option<i64> {
    get_f64(operands, index).map(|v| v as i64)
}

fn get_name(operands: &[Operand], index: usize) -> Option<&str> {
    operands.get(index)?.as_name()
}

fn get_bytes(operands: &[Operand], index: usize) -> Option<&[u8]> {
    operands.get(index)?.as_bytes()
}

/// The first `N` operands as numbers.
fn numbers<const N: usize>(operands: &[Operand]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = operand.as_f64()?;
    }
    Some(out)
}

/// The last `count` operands as color components.
fn components(operands: &[Operand], count: usize) -> Option<Vec<f32>> {
    let start = operands.len().checked_sub(count)?;
    operands[start..]
        .iter()
        .map(|o| o.as_f64().map(|v| v as f32))
        .collect()
}
