//! Path construction (`m l c v y h re`) in device space.

use crate::geometry::{BBox, Ctm, Point};

/// A segment of a PDF path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathSegment {
    /// Move to a new point (starts a new subpath).
    MoveTo(Point),
    /// Straight line from current point to target.
    LineTo(Point),
    /// Cubic Bezier curve with two control points and an endpoint.
    CurveTo { cp1: Point, cp2: Point, end: Point },
    /// Close the current subpath.
    ClosePath,
}

/// A complete path consisting of segments.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// A closed rectangle covering `bbox`.
    pub fn from_bbox(bbox: &BBox) -> Self {
        let [p0, p1, p2, p3] = bbox.corners();
        Self {
            segments: vec![
                PathSegment::MoveTo(p0),
                PathSegment::LineTo(p1),
                PathSegment::LineTo(p2),
                PathSegment::LineTo(p3),
                PathSegment::ClosePath,
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every point the path references, control points included.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.segments.iter().flat_map(|seg| {
            let (pts, len) = match seg {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => ([*p; 3], 1),
                PathSegment::CurveTo { cp1, cp2, end } => ([*cp1, *cp2, *end], 3),
                PathSegment::ClosePath => ([Point::default(); 3], 0),
            };
            pts.into_iter().take(len)
        })
    }

    /// Bounding box of the control polygon, `None` for an empty path.
    ///
    /// Curves are bounded by their control points, which always contain
    /// the curve itself.
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(self.points())
    }

    /// Return a copy of this path with every point transformed by `m`.
    pub fn transform(&self, m: &Ctm) -> Path {
        let segments = self
            .segments
            .iter()
            .map(|seg| match seg {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(m.transform_point(*p)),
                PathSegment::LineTo(p) => PathSegment::LineTo(m.transform_point(*p)),
                PathSegment::CurveTo { cp1, cp2, end } => PathSegment::CurveTo {
                    cp1: m.transform_point(*cp1),
                    cp2: m.transform_point(*cp2),
                    end: m.transform_point(*end),
                },
                PathSegment::ClosePath => PathSegment::ClosePath,
            })
            .collect();
        Path { segments }
    }

    /// Append another path's segments.
    pub fn extend(&mut self, other: &Path) {
        self.segments.extend(other.segments.iter().cloned());
    }
}

/// Builder for constructing paths from PDF path operators.
///
/// Coordinates are transformed through the CTM before storage, so the
/// resulting [`Path`] is in device space.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
    current_point: Option<Point>,
    subpath_start: Option<Point>,
    ctm: Ctm,
}

impl PathBuilder {
    pub fn new(ctm: Ctm) -> Self {
        Self {
            segments: Vec::new(),
            current_point: None,
            subpath_start: None,
            ctm,
        }
    }

    /// Update the CTM used for subsequent points.
    pub fn set_ctm(&mut self, ctm: Ctm) {
        self.ctm = ctm;
    }

    pub fn ctm(&self) -> &Ctm {
        &self.ctm
    }

    /// `m` operator.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::MoveTo(p));
        self.current_point = Some(p);
        self.subpath_start = Some(p);
    }

    /// `l` operator. Without a current point this starts a new subpath.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.current_point.is_none() {
            self.move_to(x, y);
            return;
        }
        let p = self.ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::LineTo(p));
        self.current_point = Some(p);
    }

    /// `c` operator.
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        let cp1 = self.ctm.transform_point(Point::new(x1, y1));
        let cp2 = self.ctm.transform_point(Point::new(x2, y2));
        let end = self.ctm.transform_point(Point::new(x3, y3));
        self.segments.push(PathSegment::CurveTo { cp1, cp2, end });
        self.current_point = Some(end);
    }

    /// `v` operator: the first control point is the current point.
    pub fn curve_to_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        let Some(cp1) = self.current_point else {
            return;
        };
        let cp2 = self.ctm.transform_point(Point::new(x2, y2));
        let end = self.ctm.transform_point(Point::new(x3, y3));
        self.segments.push(PathSegment::CurveTo { cp1, cp2, end });
        self.current_point = Some(end);
    }

    /// `y` operator: the second control point is the endpoint.
    pub fn curve_to_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        let cp1 = self.ctm.transform_point(Point::new(x1, y1));
        let end = self.ctm.transform_point(Point::new(x3, y3));
        self.segments
            .push(PathSegment::CurveTo { cp1, cp2: end, end });
        self.current_point = Some(end);
    }

    /// `h` operator.
    pub fn close_path(&mut self) {
        if self.segments.is_empty() {
            return;
        }
        self.segments.push(PathSegment::ClosePath);
        if let Some(start) = self.subpath_start {
            self.current_point = Some(start);
        }
    }

    /// `re` operator: moveto + 3 lineto + closepath.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// Current point in device space.
    pub fn current_point(&self) -> Option<Point> {
        self.current_point
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Take the accumulated segments as a `Path` and reset the builder.
    pub fn take_and_reset(&mut self) -> Path {
        let segments = std::mem::take(&mut self.segments);
        self.current_point = None;
        self.subpath_start = None;
        Path { segments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_approx(p: Point, x: f64, y: f64) {
        assert!((p.x - x).abs() < 1e-10, "x: expected {x}, got {}", p.x);
        assert!((p.y - y).abs() < 1e-10, "y: expected {y}, got {}", p.y);
    }

    #[test]
    fn new_builder_is_empty() {
        let builder = PathBuilder::new(Ctm::identity());
        assert!(builder.is_empty());
        assert!(builder.current_point().is_none());
    }

    #[test]
    fn rectangle_produces_closed_subpath() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.rectangle(10.0, 20.0, 100.0, 50.0);
        let path = builder.take_and_reset();
        assert_eq!(path.segments.len(), 5);
        assert_eq!(path.segments[0], PathSegment::MoveTo(Point::new(10.0, 20.0)));
        assert_eq!(path.segments[2], PathSegment::LineTo(Point::new(110.0, 70.0)));
        assert_eq!(path.segments[4], PathSegment::ClosePath);
        assert!(builder.is_empty());
    }

    #[test]
    fn close_path_returns_to_subpath_start() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.move_to(10.0, 20.0);
        builder.line_to(30.0, 40.0);
        builder.close_path();
        assert_point_approx(builder.current_point().unwrap(), 10.0, 20.0);
    }

    #[test]
    fn close_on_empty_builder_is_ignored() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.close_path();
        assert!(builder.is_empty());
    }

    #[test]
    fn line_to_without_current_point_starts_subpath() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.line_to(5.0, 5.0);
        let path = builder.take_and_reset();
        assert_eq!(path.segments, vec![PathSegment::MoveTo(Point::new(5.0, 5.0))]);
    }

    #[test]
    fn curve_to_v_without_current_point_is_noop() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.curve_to_v(1.0, 1.0, 2.0, 2.0);
        assert!(builder.is_empty());
    }

    #[test]
    fn curve_to_y_duplicates_endpoint() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.move_to(0.0, 0.0);
        builder.curve_to_y(10.0, 20.0, 30.0, 40.0);
        let path = builder.take_and_reset();
        assert_eq!(
            path.segments[1],
            PathSegment::CurveTo {
                cp1: Point::new(10.0, 20.0),
                cp2: Point::new(30.0, 40.0),
                end: Point::new(30.0, 40.0),
            }
        );
    }

    #[test]
    fn ctm_scaling_applies_to_points() {
        let mut builder = PathBuilder::new(Ctm::scale(2.0, 3.0));
        builder.move_to(1.0, 1.0);
        builder.line_to(4.0, 2.0);
        let path = builder.take_and_reset();
        assert_eq!(path.segments[1], PathSegment::LineTo(Point::new(8.0, 6.0)));
    }

    #[test]
    fn set_ctm_affects_only_later_points() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.move_to(1.0, 1.0);
        builder.set_ctm(Ctm::translate(10.0, 0.0));
        builder.line_to(1.0, 1.0);
        let path = builder.take_and_reset();
        assert_eq!(path.segments[0], PathSegment::MoveTo(Point::new(1.0, 1.0)));
        assert_eq!(path.segments[1], PathSegment::LineTo(Point::new(11.0, 1.0)));
    }

    #[test]
    fn bounds_include_curve_control_points() {
        let mut builder = PathBuilder::new(Ctm::identity());
        builder.move_to(0.0, 0.0);
        builder.curve_to(0.0, 50.0, 10.0, -20.0, 10.0, 0.0);
        let bounds = builder.take_and_reset().bounds().unwrap();
        assert_eq!(bounds, BBox::new(0.0, -20.0, 10.0, 50.0));
    }

    #[test]
    fn bounds_of_empty_path_is_none() {
        assert!(Path::default().bounds().is_none());
    }

    #[test]
    fn from_bbox_and_transform() {
        let path = Path::from_bbox(&BBox::new(0.0, 0.0, 1.0, 1.0));
        let moved = path.transform(&Ctm::translate(5.0, 5.0));
        assert_eq!(moved.bounds(), Some(BBox::new(5.0, 5.0, 6.0, 6.0)));
    }
}
