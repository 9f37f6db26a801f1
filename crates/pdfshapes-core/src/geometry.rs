//! Points, affine matrices and bounding boxes.
//!
//! All coordinates use the PDF convention: origin at the bottom-left,
//! y increasing upwards.

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An affine transformation matrix `[a b c d e f]`.
///
/// Maps `(x, y)` to `(a·x + c·y + e, b·x + d·y + f)`, matching the
/// operand order of the `cm` and `Tm` operators.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Ctm {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// A pure translation.
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A pure scale.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Build a matrix from a 6-element array.
    pub fn from_array(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// The matrix as `[a, b, c, d, e, f]`.
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Concatenate: returns `self × other` (apply `self` first, then `other`).
    pub fn concat(&self, other: &Ctm) -> Ctm {
        Ctm {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point.
    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Transform a vector (ignores translation).
    pub fn transform_vector(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y,
            y: self.b * p.x + self.d * p.y,
        }
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse matrix, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Ctm> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Ctm {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }

    /// Length of the transformed unit x and y vectors.
    pub fn scale_factors(&self) -> (f64, f64) {
        (self.a.hypot(self.b), self.c.hypot(self.d))
    }

    /// Geometric mean scale, used to map user-space lengths (line widths,
    /// dash lengths) to device space.
    pub fn mean_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Whether the linear part has a shear or rotation component.
    pub fn has_shear(&self) -> bool {
        self.b.abs() > 1e-9 || self.c.abs() > 1e-9
    }

    pub fn is_identity(&self) -> bool {
        *self == Ctm::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    /// Left edge.
    pub x0: f64,
    /// Bottom edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Normalize two corners into a box regardless of their order.
    pub fn from_corners(p: Point, q: Point) -> Self {
        Self {
            x0: p.x.min(q.x),
            y0: p.y.min(q.y),
            x1: p.x.max(q.x),
            y1: p.y.max(q.y),
        }
    }

    /// Smallest box covering all points, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BBox::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bbox.x0 = bbox.x0.min(p.x);
            bbox.y0 = bbox.y0.min(p.y);
            bbox.x1 = bbox.x1.max(p.x);
            bbox.y1 = bbox.y1.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Intersection of two boxes, `None` if they do not overlap.
    pub fn intersect(&self, other: &BBox) -> Option<BBox> {
        let b = BBox {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (b.x0 <= b.x1 && b.y0 <= b.y1).then_some(b)
    }

    /// The four corners, counter-clockwise from the bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x1, self.y1),
            Point::new(self.x0, self.y1),
        ]
    }

    /// Bounding box of this box after transformation by `m`.
    pub fn transform(&self, m: &Ctm) -> BBox {
        let corners = self.corners().map(|p| m.transform_point(p));
        // from_points never sees an empty iterator here
        BBox::from_points(corners).unwrap_or(*self)
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
    fn identity_transform_is_noop() {
        let p = Ctm::identity().transform_point(Point::new(3.0, 4.0));
        assert_eq!(p, Point::new(3.0, 4.0));
    }

    #[test]
    fn concat_applies_self_first() {
        // scale by 2 then translate by (10, 0)
        let m = Ctm::scale(2.0, 2.0).concat(&Ctm::translate(10.0, 0.0));
        let p = m.transform_point(Point::new(1.0, 1.0));
        assert_approx(p.x, 12.0);
        assert_approx(p.y, 2.0);
    }

    #[test]
    fn invert_round_trips_point() {
        let m = Ctm::new(2.0, 0.5, -0.3, 1.5, 7.0, -2.0);
        let inv = m.invert().unwrap();
        let p = inv.transform_point(m.transform_point(Point::new(5.0, 9.0)));
        assert_approx(p.x, 5.0);
        assert_approx(p.y, 9.0);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Ctm::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).invert().is_none());
    }

    #[test]
    fn shear_detection() {
        assert!(!Ctm::scale(3.0, 2.0).has_shear());
        assert!(Ctm::new(1.0, 0.0, 0.5, 1.0, 0.0, 0.0).has_shear());
    }

    #[test]
    fn mean_scale_of_uniform_scale() {
        assert_approx(Ctm::scale(3.0, 3.0).mean_scale(), 3.0);
    }

    #[test]
    fn bbox_from_points() {
        let b = BBox::from_points([
            Point::new(5.0, 1.0),
            Point::new(-2.0, 8.0),
            Point::new(3.0, 3.0),
        ])
        .unwrap();
        assert_eq!(b, BBox::new(-2.0, 1.0, 5.0, 8.0));
        assert!(BBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn bbox_union_and_intersect() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 20.0, 20.0);
        assert_eq!(a.union(&b), BBox::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(a.intersect(&b), Some(BBox::new(5.0, 5.0, 10.0, 10.0)));
        assert!(a.intersect(&BBox::new(11.0, 11.0, 12.0, 12.0)).is_none());
    }

    #[test]
    fn bbox_transform_with_rotation() {
        // 90 degree rotation
        let m = Ctm::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let b = BBox::new(0.0, 0.0, 10.0, 5.0).transform(&m);
        assert_approx(b.x0, -5.0);
        assert_approx(b.y0, 0.0);
        assert_approx(b.x1, 0.0);
        assert_approx(b.y1, 10.0);
    }
}
