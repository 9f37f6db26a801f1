//! Software painter for tiling-pattern cells.
//!
//! Replays a [`Shape`] list with `tiny-skia` into a premultiplied RGBA8
//! raster. Only what pattern cells need is painted: paths with solid colors,
//! gradients and nested tiles, glyph outlines when the font engine has them,
//! and decoded images.

use std::sync::Arc;

use pdfshapes_core::{
    Clip, Ctm, DecodedImage, FillRule, GlyphRun, LineCap, LineJoin, Paint, Path, PathSegment,
    Rgb, Shape, StrokeStyle,
};
use tiny_skia::{
    Color, FilterQuality, GradientStop, LinearGradient, Mask, Pattern, Pixmap, PixmapPaint,
    RadialGradient, Shader, SpreadMode, Stroke, StrokeDash, Transform,
};

#[derive(Debug, Clone)]
enum Source {
    Color(Rgb),
    Paint(Arc<Paint>),
}

#[derive(Clone)]
struct CanvasState {
    source: Source,
    stroke: StrokeStyle,
    transform: Ctm,
    alpha: f32,
    clip: Option<Mask>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            source: Source::Color(Rgb::black()),
            stroke: StrokeStyle::default(),
            transform: Ctm::identity(),
            alpha: 1.0,
            clip: None,
        }
    }
}

/// A raster surface that shapes are replayed onto.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// A transparent canvas, `None` for a zero-sized one.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Replay `shapes` from a fresh surface state, moving every device
    /// coordinate by `offset` first.
    pub fn replay(&mut self, shapes: &[Shape], offset: &Ctm) {
        let mut state = CanvasState::default();
        let mut saved: Vec<CanvasState> = Vec::new();

        for shape in shapes {
            match shape {
                Shape::SetColor(color) => state.source = Source::Color(*color),
                Shape::SetPaint(paint) => state.source = Source::Paint(Arc::clone(paint)),
                Shape::SetStroke(style) => state.stroke = style.clone(),
                Shape::SetTransform(m) => state.transform = *m,
                Shape::SetAlpha(a) => state.alpha = *a,
                Shape::SetClip(clip) => {
                    state.clip = clip.as_ref().and_then(|c| self.clip_mask(c, offset));
                }
                Shape::FillPath { path, rule } => {
                    self.fill(&state, path, *rule, offset);
                }
                Shape::StrokePath(path) => self.stroke(&state, path, offset),
                Shape::DrawGlyphRun(run) => self.draw_glyphs(&state, run, offset),
                Shape::DrawImage(image) => {
                    if let Some(decoded) = &image.decoded {
                        self.draw_image(&state, decoded, offset);
                    }
                }
                Shape::PushState => saved.push(state.clone()),
                Shape::PopState => {
                    if let Some(prev) = saved.pop() {
                        state = prev;
                    }
                }
            }
        }
    }

    /// Premultiplied RGBA8 pixels, first row at the top.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixmap.take()
    }

    fn clip_mask(&self, clip: &Clip, offset: &Ctm) -> Option<Mask> {
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
        let transform = to_transform(offset);
        for (i, clip_path) in clip.paths.iter().enumerate() {
            let Some(path) = to_skia_path(&clip_path.path) else {
                // an empty clip path hides everything
                return Some(Mask::new(self.pixmap.width(), self.pixmap.height())?);
            };
            let rule = to_fill_rule(clip_path.rule);
            if i == 0 {
                mask.fill_path(&path, rule, true, transform);
            } else {
                mask.intersect_path(&path, rule, true, transform);
            }
        }
        Some(mask)
    }

    fn fill(&mut self, state: &CanvasState, path: &Path, rule: FillRule, offset: &Ctm) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let tile = tile_pixmap(&state.source);
        let Some(paint) = skia_paint(&state.source, tile.as_ref(), state.alpha, offset) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint,
            to_fill_rule(rule),
            to_transform(offset),
            state.clip.as_ref(),
        );
    }

    fn stroke(&mut self, state: &CanvasState, path: &Path, offset: &Ctm) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let tile = tile_pixmap(&state.source);
        let Some(paint) = skia_paint(&state.source, tile.as_ref(), state.alpha, offset) else {
            return;
        };
        self.pixmap.stroke_path(
            &path,
            &paint,
            &to_stroke(&state.stroke),
            to_transform(offset),
            state.clip.as_ref(),
        );
    }

    fn draw_glyphs(&mut self, state: &CanvasState, run: &GlyphRun, offset: &Ctm) {
        let engine = run.font.engine();
        let glyph_scale = Ctm::scale(0.001, 0.001).concat(&run.glyph_matrix);
        let mut outline = Path::default();
        for glyph in &run.glyphs {
            let Some(glyph_path) = engine.glyph_outline(glyph.code) else {
                continue;
            };
            let placed = glyph_scale
                .concat(&Ctm::translate(glyph.origin.x, glyph.origin.y));
            outline.extend(&glyph_path.transform(&placed));
        }
        if outline.is_empty() {
            return;
        }
        if run.render_mode.strokes() && !run.render_mode.fills() {
            self.stroke(state, &outline, offset);
        } else {
            self.fill(state, &outline, FillRule::NonZeroWinding, offset);
        }
    }

    fn draw_image(&mut self, state: &CanvasState, image: &DecodedImage, offset: &Ctm) {
        let Some(pixmap) = premultiplied_pixmap(image) else {
            return;
        };
        // image pixels to the unit square, first row at the top
        let unit = Ctm::new(
            1.0 / f64::from(image.width),
            0.0,
            0.0,
            -1.0 / f64::from(image.height),
            0.0,
            1.0,
        );
        let transform = unit.concat(&state.transform).concat(offset);
        let paint = PixmapPaint {
            opacity: state.alpha,
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            pixmap.as_ref(),
            &paint,
            to_transform(&transform),
            state.clip.as_ref(),
        );
    }
}

/// Pixmap backing a tile paint, built before the paint borrows it.
fn tile_pixmap(source: &Source) -> Option<Pixmap> {
    let Source::Paint(paint) = source else {
        return None;
    };
    let Paint::Tile(tile) = paint.as_ref() else {
        return None;
    };
    let size = tiny_skia::IntSize::from_wh(tile.width, tile.height)?;
    Pixmap::from_vec(tile.pixels.clone(), size)
}

fn skia_paint<'a>(
    source: &Source,
    tile: Option<&'a Pixmap>,
    alpha: f32,
    offset: &Ctm,
) -> Option<tiny_skia::Paint<'a>> {
    let shader = match source {
        Source::Color(color) => Shader::SolidColor(to_color(color, alpha)),
        Source::Paint(paint) => match paint.as_ref() {
            Paint::Axial(g) => LinearGradient::new(
                to_point(g.start.x, g.start.y),
                to_point(g.end.x, g.end.y),
                to_stops(&g.stops, alpha),
                SpreadMode::Pad,
                to_transform(&g.transform.concat(offset)),
            )?,
            Paint::Radial(g) => RadialGradient::new(
                to_point(g.focus.x, g.focus.y),
                to_point(g.center.x, g.center.y),
                g.radius as f32,
                to_stops(&g.stops, alpha),
                SpreadMode::Pad,
                to_transform(&g.transform.concat(offset)),
            )?,
            Paint::Tile(t) => Pattern::new(
                tile?.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Nearest,
                alpha,
                to_transform(&t.pixel_transform.concat(offset)),
            ),
        },
    };
    let mut paint = tiny_skia::Paint::default();
    paint.shader = shader;
    paint.anti_alias = true;
    Some(paint)
}

fn premultiplied_pixmap(image: &DecodedImage) -> Option<Pixmap> {
    let size = tiny_skia::IntSize::from_wh(image.width, image.height)?;
    let data = image
        .rgba
        .chunks_exact(4)
        .flat_map(|p| {
            let a = u16::from(p[3]);
            let pm = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
            [pm(p[0]), pm(p[1]), pm(p[2]), p[3]]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

fn to_transform(m: &Ctm) -> Transform {
    Transform::from_row(
        m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
    )
}

fn to_point(x: f64, y: f64) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(x as f32, y as f32)
}

fn to_color(color: &Rgb, alpha: f32) -> Color {
    let [r, g, b] = color.to_rgb8();
    Color::from_rgba8(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn to_stops(stops: &[pdfshapes_core::GradientStop], alpha: f32) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|s| GradientStop::new(s.offset, to_color(&s.color, alpha)))
        .collect()
}

fn to_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZeroWinding => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

fn to_stroke(style: &StrokeStyle) -> Stroke {
    let dash = if style.dash.is_solid() {
        None
    } else {
        StrokeDash::new(
            style.dash.dash_array.iter().map(|v| *v as f32).collect(),
            style.dash.dash_phase as f32,
        )
    };
    Stroke {
        width: style.width as f32,
        miter_limit: style.miter_limit as f32,
        line_cap: match style.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::ProjectingSquare => tiny_skia::LineCap::Square,
        },
        line_join: match style.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        dash,
    }
}

fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for seg in &path.segments {
        match seg {
            PathSegment::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathSegment::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathSegment::CurveTo { cp1, cp2, end } => pb.cubic_to(
                cp1.x as f32,
                cp1.y as f32,
                cp2.x as f32,
                cp2.y as f32,
                end.x as f32,
                end.y as f32,
            ),
            PathSegment::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfshapes_core::{AxialGradient, BBox, Point};

    fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        Path::from_bbox(&BBox::new(x0, y0, x1, y1))
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        assert!(Canvas::new(0, 4).is_none());
    }

    #[test]
    fn solid_fill_covers_path() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.replay(
            &[
                Shape::SetColor(Rgb::new(1.0, 0.0, 0.0)),
                Shape::FillPath {
                    path: rect(0.0, 0.0, 2.0, 4.0),
                    rule: FillRule::NonZeroWinding,
                },
            ],
            &Ctm::identity(),
        );
        let pixels = canvas.into_pixels();
        assert_eq!(pixel(&pixels, 4, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&pixels, 4, 3, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn offset_moves_drawing() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.replay(
            &[Shape::FillPath {
                path: rect(0.0, 0.0, 1.0, 1.0),
                rule: FillRule::NonZeroWinding,
            }],
            &Ctm::translate(3.0, 3.0),
        );
        let pixels = canvas.into_pixels();
        assert_eq!(pixel(&pixels, 4, 3, 3), [0, 0, 0, 255]);
        assert_eq!(pixel(&pixels, 4, 0, 0)[3], 0);
    }

    #[test]
    fn clip_limits_fill_and_pop_restores_it() {
        let mut clip = Clip::default();
        clip.intersect(rect(0.0, 0.0, 2.0, 2.0), FillRule::NonZeroWinding);
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.replay(
            &[
                Shape::PushState,
                Shape::SetClip(Some(clip)),
                Shape::FillPath {
                    path: rect(0.0, 0.0, 4.0, 4.0),
                    rule: FillRule::NonZeroWinding,
                },
                Shape::PopState,
                Shape::SetColor(Rgb::white()),
                Shape::FillPath {
                    path: rect(3.0, 3.0, 4.0, 4.0),
                    rule: FillRule::NonZeroWinding,
                },
            ],
            &Ctm::identity(),
        );
        let pixels = canvas.into_pixels();
        assert_eq!(pixel(&pixels, 4, 1, 1), [0, 0, 0, 255]);
        assert_eq!(pixel(&pixels, 4, 2, 1)[3], 0);
        assert_eq!(pixel(&pixels, 4, 3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn alpha_is_premultiplied() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.replay(
            &[
                Shape::SetColor(Rgb::white()),
                Shape::SetAlpha(0.5),
                Shape::FillPath {
                    path: rect(0.0, 0.0, 1.0, 1.0),
                    rule: FillRule::NonZeroWinding,
                },
            ],
            &Ctm::identity(),
        );
        let [r, _, _, a] = pixel(&canvas.into_pixels(), 1, 0, 0);
        assert!((127..=129).contains(&a), "alpha {a}");
        assert_eq!(r, a);
    }

    #[test]
    fn axial_gradient_runs_between_stops() {
        let gradient = Paint::Axial(AxialGradient {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            stops: vec![
                pdfshapes_core::GradientStop {
                    offset: 0.0,
                    color: Rgb::black(),
                },
                pdfshapes_core::GradientStop {
                    offset: 1.0,
                    color: Rgb::white(),
                },
            ],
            extend: [true, true],
            transform: Ctm::identity(),
        });
        let mut canvas = Canvas::new(10, 1).unwrap();
        canvas.replay(
            &[
                Shape::SetPaint(Arc::new(gradient)),
                Shape::FillPath {
                    path: rect(0.0, 0.0, 10.0, 1.0),
                    rule: FillRule::NonZeroWinding,
                },
            ],
            &Ctm::identity(),
        );
        let pixels = canvas.into_pixels();
        let left = pixel(&pixels, 10, 0, 0)[0];
        let right = pixel(&pixels, 10, 9, 0)[0];
        assert!(left < 40, "left {left}");
        assert!(right > 215, "right {right}");
    }

    #[test]
    fn decoded_image_fills_unit_square() {
        let image = pdfshapes_core::ImageRef {
            name: Some("Im1".to_string()),
            width: 1,
            height: 1,
            bits_per_component: Some(8),
            color_space: Some("DeviceRGB".to_string()),
            filter: None,
            image_mask: false,
            decoded: Some(Arc::new(DecodedImage {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 255, 255],
            })),
        };
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.replay(
            &[
                Shape::SetTransform(Ctm::scale(2.0, 2.0)),
                Shape::DrawImage(image),
            ],
            &Ctm::identity(),
        );
        let pixels = canvas.into_pixels();
        assert_eq!(pixel(&pixels, 2, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&pixels, 2, 1, 1), [0, 0, 255, 255]);
    }
}
