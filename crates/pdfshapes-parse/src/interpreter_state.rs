//! Graphics state stack for the content stream interpreter.
//!
//! Implements the PDF graphics state model: a stack of states managed by
//! `q` (save) and `Q` (restore), CTM management via `cm`, and color setting
//! through the current stroking and non-stroking color spaces.

use std::sync::Arc;

use pdfshapes_core::{Ctm, DashPattern, GraphicsState, LineCap, LineJoin, Paint};

use crate::color_space::ColorSpace;
use crate::text_state::{TextParams, TextState};

/// Color space, components and pattern for one painting side.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSlot {
    pub space: Arc<ColorSpace>,
    /// Components in natural order.
    pub components: Vec<f32>,
    /// Pattern resource name selected by `scn`/`SCN`.
    pub pattern: Option<String>,
}

impl Default for ColorSlot {
    fn default() -> Self {
        Self {
            space: Arc::new(ColorSpace::DeviceGray),
            components: vec![0.0],
            pattern: None,
        }
    }
}

/// Full interpreter state: CTM, device-independent graphics state, color
/// spaces and text state.
///
/// `q` pushes a copy of everything except the text and line matrices; `Q`
/// restores it.
#[derive(Debug, Clone)]
pub struct InterpreterState {
    ctm: Ctm,
    graphics_state: GraphicsState,
    stroke: ColorSlot,
    fill: ColorSlot,
    text: TextState,
    stack: Vec<SavedState>,
}

impl PartialEq for InterpreterState {
    fn eq(&self, other: &Self) -> bool {
        self.ctm == other.ctm
            && self.graphics_state == other.graphics_state
            && self.stroke == other.stroke
            && self.fill == other.fill
            && self.text.params == other.text.params
    }
}

/// A snapshot saved by the `q` operator.
#[derive(Debug, Clone)]
struct SavedState {
    ctm: Ctm,
    graphics_state: GraphicsState,
    stroke: ColorSlot,
    fill: ColorSlot,
    text: TextParams,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self::new(Ctm::identity(), GraphicsState::default())
    }
}

impl InterpreterState {
    /// Start from an initial CTM and graphics state.
    pub fn new(ctm: Ctm, graphics_state: GraphicsState) -> Self {
        Self {
            ctm,
            graphics_state,
            stroke: ColorSlot::default(),
            fill: ColorSlot::default(),
            text: TextState::new(),
            stack: Vec::new(),
        }
    }

    pub fn ctm(&self) -> &Ctm {
        &self.ctm
    }

    pub fn graphics_state(&self) -> &GraphicsState {
        &self.graphics_state
    }

    pub fn graphics_state_mut(&mut self) -> &mut GraphicsState {
        &mut self.graphics_state
    }

    pub fn text(&self) -> &TextState {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut TextState {
        &mut self.text
    }

    pub fn stroke_slot(&self) -> &ColorSlot {
        &self.stroke
    }

    pub fn fill_slot(&self) -> &ColorSlot {
        &self.fill
    }

    /// A pattern is selected for fills but produced no paint; fills draw
    /// nothing until the color changes.
    pub fn fill_unpainted(&self) -> bool {
        self.fill.pattern.is_some() && self.graphics_state.fill_paint.is_none()
    }

    /// Stroking counterpart of [`fill_unpainted`](Self::fill_unpainted).
    pub fn stroke_unpainted(&self) -> bool {
        self.stroke.pattern.is_some() && self.graphics_state.stroke_paint.is_none()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`
    pub fn save_state(&mut self) {
        self.stack.push(SavedState {
            ctm: self.ctm,
            graphics_state: self.graphics_state.clone(),
            stroke: self.stroke.clone(),
            fill: self.fill.clone(),
            text: self.text.params.clone(),
        });
    }

    /// `Q`. Returns `false` if the stack is empty (unbalanced Q).
    pub fn restore_state(&mut self) -> bool {
        let Some(saved) = self.stack.pop() else {
            return false;
        };
        self.ctm = saved.ctm;
        self.graphics_state = saved.graphics_state;
        self.stroke = saved.stroke;
        self.fill = saved.fill;
        self.text.params = saved.text;
        true
    }

    /// `cm`: CTM' = M × CTM.
    pub fn concat_matrix(&mut self, m: &Ctm) {
        self.ctm = m.concat(&self.ctm);
    }

    /// `w`
    pub fn set_line_width(&mut self, width: f64) {
        self.graphics_state.stroke.width = width;
    }

    /// `J`; out-of-range values are ignored.
    pub fn set_line_cap(&mut self, cap: i64) {
        if let Some(cap) = LineCap::from_i64(cap) {
            self.graphics_state.stroke.cap = cap;
        }
    }

    /// `j`; out-of-range values are ignored.
    pub fn set_line_join(&mut self, join: i64) {
        if let Some(join) = LineJoin::from_i64(join) {
            self.graphics_state.stroke.join = join;
        }
    }

    /// `M`
    pub fn set_miter_limit(&mut self, limit: f64) {
        self.graphics_state.stroke.miter_limit = limit;
    }

    /// `d`
    pub fn set_dash_pattern(&mut self, dash_array: Vec<f64>, dash_phase: f64) {
        self.graphics_state.stroke.dash = DashPattern::new(dash_array, dash_phase);
    }

    /// `CS`: install a stroking space and its initial color.
    pub fn set_stroke_color_space(&mut self, space: Arc<ColorSpace>) {
        let components = space.initial_components();
        self.stroke = ColorSlot {
            space,
            components,
            pattern: None,
        };
        self.graphics_state.stroke_paint = None;
        self.graphics_state.stroke_color = self.stroke.space.to_rgb(&self.stroke.components);
    }

    /// `cs`: install a non-stroking space and its initial color.
    pub fn set_fill_color_space(&mut self, space: Arc<ColorSpace>) {
        let components = space.initial_components();
        self.fill = ColorSlot {
            space,
            components,
            pattern: None,
        };
        self.graphics_state.fill_paint = None;
        self.graphics_state.fill_color = self.fill.space.to_rgb(&self.fill.components);
    }

    /// `SC`/`SCN` with components only.
    pub fn set_stroke_components(&mut self, components: Vec<f32>) {
        self.graphics_state.stroke_color = self.stroke.space.to_rgb(&components);
        self.graphics_state.stroke_paint = None;
        self.stroke.components = components;
        self.stroke.pattern = None;
    }

    /// `sc`/`scn` with components only.
    pub fn set_fill_components(&mut self, components: Vec<f32>) {
        self.graphics_state.fill_color = self.fill.space.to_rgb(&components);
        self.graphics_state.fill_paint = None;
        self.fill.components = components;
        self.fill.pattern = None;
    }

    /// `SCN` naming a pattern. `components` color an uncolored tiling
    /// pattern through the Pattern space's underlying space.
    pub fn set_stroke_pattern(
        &mut self,
        name: String,
        components: Vec<f32>,
        paint: Option<Arc<Paint>>,
    ) {
        if !components.is_empty() {
            self.graphics_state.stroke_color = self.stroke.space.to_rgb(&components);
        }
        self.graphics_state.stroke_paint = paint;
        self.stroke.components = components;
        self.stroke.pattern = Some(name);
    }

    /// `scn` naming a pattern.
    pub fn set_fill_pattern(
        &mut self,
        name: String,
        components: Vec<f32>,
        paint: Option<Arc<Paint>>,
    ) {
        if !components.is_empty() {
            self.graphics_state.fill_color = self.fill.space.to_rgb(&components);
        }
        self.graphics_state.fill_paint = paint;
        self.fill.components = components;
        self.fill.pattern = Some(name);
    }

    /// `G`/`RG`/`K`: device space plus components in one step.
    pub fn set_stroke_device(&mut self, space: ColorSpace, components: Vec<f32>) {
        self.stroke.space = Arc::new(space);
        self.set_stroke_components(components);
    }

    /// `g`/`rg`/`k`
    pub fn set_fill_device(&mut self, space: ColorSpace, components: Vec<f32>) {
        self.fill.space = Arc::new(space);
        self.set_fill_components(components);
    }
}
