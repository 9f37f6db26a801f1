//! Top-level PDF document type for opening documents and interpreting pages.

use lopdf::{Dictionary, Object, ObjectId};
use pdfshapes_core::{BBox, Ctm, InterpretOptions, PdfError, Point, Shapes};
use pdfshapes_parse::objects::{number_array, page_content_bytes, resolve_inherited, resolve_ref};
use pdfshapes_parse::{ContentHandler, InterpreterState, Providers, interpret_content_stream};

use crate::Page;

/// US Letter, used when a page has no usable `/MediaBox`.
const DEFAULT_MEDIA_BOX: BBox = BBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Iterator over the pages of a document, interpreting each on demand.
///
/// Created by [`Pdf::pages_iter()`].
pub struct PagesIter<'a> {
    pdf: &'a Pdf,
    current: usize,
    count: usize,
}

impl Iterator for PagesIter<'_> {
    type Item = Result<Page, PdfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let result = self.pdf.page(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PagesIter<'_> {}

/// A PDF document opened for interpretation.
///
/// # Example
///
/// ```ignore
/// let pdf = Pdf::open(&bytes, None)?;
/// let page = pdf.page(0)?;
/// for shape in page.shapes() {
///     println!("{shape:?}");
/// }
/// ```
pub struct Pdf {
    doc: lopdf::Document,
    options: InterpretOptions,
    /// Page object ids in document order.
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for Pdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pdf")
            .field("pages", &self.page_ids.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Pdf {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::IoError`] if the file cannot be read, otherwise
    /// the same errors as [`Pdf::open`].
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<InterpretOptions>,
    ) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes, options)
    }

    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::ParseError`] if the bytes are not a valid PDF
    /// document or the document is encrypted.
    pub fn open(bytes: &[u8], options: Option<InterpretOptions>) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| PdfError::ParseError(format!("failed to parse PDF: {e}")))?;
        if doc.is_encrypted() {
            return Err(PdfError::ParseError(
                "encrypted documents are not supported".to_string(),
            ));
        }
        Ok(Self::from_document(doc, options))
    }

    /// Wrap an already loaded lopdf document.
    pub fn from_document(doc: lopdf::Document, options: Option<InterpretOptions>) -> Self {
        let page_ids = doc.get_pages().into_values().collect();
        Self {
            doc,
            options: options.unwrap_or_default(),
            page_ids,
        }
    }

    /// The underlying lopdf document.
    pub fn document(&self) -> &lopdf::Document {
        &self.doc
    }

    pub fn options(&self) -> &InterpretOptions {
        &self.options
    }

    /// Return the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Iterate over all pages, interpreting each one as it is reached.
    pub fn pages_iter(&self) -> PagesIter<'_> {
        PagesIter {
            pdf: self,
            current: 0,
            count: self.page_count(),
        }
    }

    /// Interpret a page by 0-based index in PDF user space.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the index is out of range, the page content
    /// cannot be read, the content exceeds
    /// [`InterpretOptions::max_stream_bytes`] or interpretation is
    /// interrupted.
    pub fn page(&self, index: usize) -> Result<Page, PdfError> {
        self.page_with_ctm(index, Ctm::identity())
    }

    /// Interpret a page with an initial CTM mapping user space to the
    /// caller's device space.
    ///
    /// # Errors
    ///
    /// Same as [`Pdf::page`].
    pub fn page_with_ctm(&self, index: usize, ctm: Ctm) -> Result<Page, PdfError> {
        let mut shapes = Shapes::new();
        let media_box = self.interpret_page(
            index,
            InterpreterState::new(ctm, Default::default()),
            Providers::default(),
            &mut shapes,
        )?;
        Ok(Page::new(index, media_box, shapes))
    }

    /// Interpret a page, streaming shapes to `handler` with custom font and
    /// image collaborators. Returns the page's media box.
    ///
    /// # Errors
    ///
    /// Same as [`Pdf::page`].
    pub fn interpret_page(
        &self,
        index: usize,
        initial: InterpreterState,
        providers: Providers<'_>,
        handler: &mut dyn ContentHandler,
    ) -> Result<BBox, PdfError> {
        let page_id = *self.page_ids.get(index).ok_or_else(|| {
            PdfError::Other(format!(
                "page index {index} out of range (document has {} pages)",
                self.page_ids.len()
            ))
        })?;
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| PdfError::ParseError(format!("failed to get page dictionary: {e}")))?;

        let media_box = self.media_box(page_id)?;
        let content = page_content_bytes(&self.doc, page_dict).map_err(PdfError::from)?;
        let empty = Dictionary::new();
        let resources = match resolve_inherited(&self.doc, page_id, b"Resources")
            .map_err(PdfError::from)?
            .map(|obj| resolve_ref(&self.doc, obj))
        {
            Some(Object::Dictionary(dict)) => dict,
            _ => &empty,
        };

        interpret_content_stream(
            &self.doc,
            &content,
            resources,
            initial,
            &self.options,
            providers,
            handler,
        )
        .map_err(PdfError::from)?;
        Ok(media_box)
    }

    /// The page's `/MediaBox`, inherited through the page tree.
    fn media_box(&self, page_id: ObjectId) -> Result<BBox, PdfError> {
        let rect = resolve_inherited(&self.doc, page_id, b"MediaBox")
            .map_err(PdfError::from)?
            .and_then(|obj| number_array(&self.doc, obj))
            .filter(|v| v.len() == 4);
        Ok(match rect {
            Some(v) => BBox::from_corners(Point::new(v[0], v[1]), Point::new(v[2], v[3])),
            None => DEFAULT_MEDIA_BOX,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bytes_are_a_parse_error() {
        let err = Pdf::open(b"not a pdf", None).unwrap_err();
        assert!(matches!(err, PdfError::ParseError(_)));
    }

    #[test]
    fn default_media_box_is_letter() {
        assert_eq!(DEFAULT_MEDIA_BOX.width(), 612.0);
        assert_eq!(DEFAULT_MEDIA_BOX.height(), 792.0);
    }
}
