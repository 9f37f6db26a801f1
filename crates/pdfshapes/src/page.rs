//! Page type holding the shapes interpreted from one PDF page.

use pdfshapes_core::{BBox, ExtractWarning, Shape, Shapes};

/// A single interpreted page.
///
/// Holds the page's media box and the ordered [`Shapes`] list produced by
/// running its content stream. Constructed by [`Pdf::page`](crate::Pdf::page).
#[derive(Debug, Clone)]
pub struct Page {
    /// Page index (0-based).
    page_number: usize,
    /// The page's `/MediaBox` in user space.
    media_box: BBox,
    shapes: Shapes,
}

impl Page {
    /// Create a page from its interpreted shapes.
    pub fn new(page_number: usize, media_box: BBox, shapes: Shapes) -> Self {
        Self {
            page_number,
            media_box,
            shapes,
        }
    }

    /// Returns the page index (0-based).
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Returns the page width in points.
    pub fn width(&self) -> f64 {
        self.media_box.width()
    }

    /// Returns the page height in points.
    pub fn height(&self) -> f64 {
        self.media_box.height()
    }

    pub fn media_box(&self) -> BBox {
        self.media_box
    }

    /// Returns the shapes in drawing order.
    pub fn shapes(&self) -> &Shapes {
        &self.shapes
    }

    /// Non-fatal problems met while interpreting the page.
    pub fn warnings(&self) -> &[ExtractWarning] {
        self.shapes.warnings()
    }

    /// Iterate the shapes in drawing order.
    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// Consume the page, returning its shapes.
    pub fn into_shapes(self) -> Shapes {
        self.shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfshapes_core::{ExtractWarningCode, Rgb};

    #[test]
    fn page_dimensions_follow_media_box() {
        let page = Page::new(2, BBox::new(0.0, 0.0, 595.0, 842.0), Shapes::new());
        assert_eq!(page.page_number(), 2);
        assert_eq!(page.width(), 595.0);
        assert_eq!(page.height(), 842.0);
    }

    #[test]
    fn page_exposes_shapes_and_warnings() {
        let mut shapes = Shapes::new();
        shapes.push(Shape::SetColor(Rgb::black()));
        shapes.push_warning(ExtractWarning::with_code(
            ExtractWarningCode::MissingFont,
            "font F9 not found",
        ));
        let page = Page::new(0, BBox::new(0.0, 0.0, 10.0, 10.0), shapes);
        assert_eq!(page.iter().count(), 1);
        assert_eq!(page.warnings().len(), 1);
        assert_eq!(page.into_shapes().len(), 1);
    }
}
