//! Shared helpers for building small PDFs in memory.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Builds a document page by page, then serializes it.
pub struct TestPdf {
    pub doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    inherited: Option<Dictionary>,
}

impl TestPdf {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            inherited: None,
        }
    }

    pub fn add_object(&mut self, obj: impl Into<Object>) -> ObjectId {
        self.doc.add_object(obj)
    }

    pub fn add_stream(&mut self, dict: Dictionary, content: &[u8]) -> ObjectId {
        self.doc.add_object(Stream::new(dict, content.to_vec()))
    }

    /// Resources placed on the `/Pages` node and inherited by pages that
    /// carry none.
    pub fn inherited_resources(&mut self, resources: Dictionary) -> &mut Self {
        self.inherited = Some(resources);
        self
    }

    /// Add a page with one content stream.
    pub fn page(&mut self, content: &[u8], resources: Option<Dictionary>) -> ObjectId {
        let content_id = self.add_stream(Dictionary::new(), content);
        self.page_with_contents(Object::Reference(content_id), resources)
    }

    /// Add a page whose `/Contents` is an array of streams.
    pub fn page_with_streams(&mut self, parts: &[&[u8]], resources: Option<Dictionary>) -> ObjectId {
        let refs = parts
            .iter()
            .map(|part| Object::Reference(self.add_stream(Dictionary::new(), part)))
            .collect::<Vec<_>>();
        self.page_with_contents(Object::Array(refs), resources)
    }

    fn page_with_contents(&mut self, contents: Object, resources: Option<Dictionary>) -> ObjectId {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
            "Contents" => contents,
        };
        if let Some(resources) = resources {
            page.set("Resources", resources);
        }
        let page_id = self.doc.add_object(page);
        self.kids.push(Object::Reference(page_id));
        page_id
    }

    pub fn build(mut self) -> Vec<u8> {
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(self.kids.len() as i64),
            "Kids" => std::mem::take(&mut self.kids),
        };
        if let Some(resources) = self.inherited.take() {
            pages.set("Resources", resources);
        }
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).unwrap();
        buf
    }
}

/// A single-page PDF with the given content and resources.
pub fn pdf_with_content(content: &[u8], resources: Dictionary) -> Vec<u8> {
    let mut pdf = TestPdf::new();
    pdf.page(content, Some(resources));
    pdf.build()
}

/// Font resources with Helvetica as `/F1`.
pub fn helvetica_resources() -> Dictionary {
    dictionary! {
        "Font" => dictionary! {
            "F1" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        },
    }
}
