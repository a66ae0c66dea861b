//! Positional text extraction for PDF documents.
//!
//! [`Document`] loads a PDF with lopdf and lays out each page as a list of
//! positioned [`Glyph`]s. Callers crop pages with a [`Region`] and read the
//! text that falls inside it, which is how two-column layouts are read one
//! column at a time.

use std::path::Path;

use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};

pub mod cleanup;
pub mod font;
pub mod parser;
pub mod region;

pub use parser::backend::PageBox;
pub use parser::layout::{Glyph, PageLayout};
pub use region::{ColumnSide, Region, COLUMN_GUTTER_EPSILON};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page {0} does not exist")]
    PageNotFound(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded PDF whose pages are laid out on demand.
pub struct Document {
    backend: LopdfBackend,
}

impl Document {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(Self {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    /// Read and parse a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// 1-based page numbers in ascending order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.backend.pages().into_keys().collect()
    }

    /// Lay out a single page.
    pub fn page(&self, number: u32) -> Result<PageLayout, PdfError> {
        let page_id: PageId = *self
            .backend
            .pages()
            .get(&number)
            .ok_or(PdfError::PageNotFound(number))?;
        parser::layout::extract_page_layout(&self.backend, number, page_id)
    }

    /// Lay out every page, in page order.
    pub fn pages(&self) -> impl Iterator<Item = Result<PageLayout, PdfError>> + '_ {
        self.backend
            .pages()
            .into_iter()
            .map(|(number, id)| parser::layout::extract_page_layout(&self.backend, number, id))
    }
}

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    //! Small in-memory PDFs built with lopdf.

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream, StringFormat};

    /// One line of text: `(x, y, text)` in PDF user space.
    pub type Line<'a> = (f32, f32, &'a str);

    /// Build a PDF whose pages show the given lines in a 10pt font. Strings
    /// are written as UTF-8 bytes, which the fallback decoder reads back.
    pub fn build_pdf(pages: &[Vec<Line<'_>>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids = Vec::new();
        for lines in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]),
            ];
            for (x, y, text) in lines {
                operations.push(Operation::new(
                    "Tm",
                    vec![
                        Object::Integer(1),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(1),
                        Object::Real(*x),
                        Object::Real(*y),
                    ],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(
                        text.as_bytes().to_vec(),
                        StringFormat::Hexadecimal,
                    )],
                ));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(count),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(600),
                    Object::Integer(800),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::build_pdf;
    use super::*;

    #[test]
    fn test_open_missing_file_is_io_error() {
        let result = Document::open("/definitely/not/here.pdf");
        assert!(matches!(result, Err(PdfError::Io(_))));
    }

    #[test]
    fn test_from_bytes_rejects_empty_input() {
        assert!(Document::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_two_column_page_round_trip() {
        let bytes = build_pdf(&[vec![
            (40.0, 750.0, "1. 왼쪽 문제"),
            (40.0, 735.0, "① 가 ② 나"),
            (320.0, 750.0, "2. 오른쪽 문제"),
        ]]);
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_numbers(), vec![1]);

        let page = doc.page(1).unwrap();
        assert_eq!(page.width, 600.0);
        assert_eq!(page.height, 800.0);

        let [(_, left), (_, right)] = page.columns();
        assert_eq!(page.region_text(&left), "1. 왼쪽 문제\n① 가 ② 나");
        assert_eq!(page.region_text(&right), "2. 오른쪽 문제");
    }

    #[test]
    fn test_separately_placed_korean_words_keep_their_space() {
        let bytes = build_pdf(&[vec![(40.0, 750.0, "7. 산업"), (80.0, 750.0, "위생")]]);
        let page = Document::from_bytes(&bytes).unwrap().page(1).unwrap();
        let [(_, left), _] = page.columns();
        assert_eq!(page.region_text(&left), "7. 산업 위생");
    }

    #[test]
    fn test_pages_in_order_and_missing_page() {
        let bytes = build_pdf(&[
            vec![(40.0, 750.0, "first")],
            vec![(40.0, 750.0, "second")],
        ]);
        let doc = Document::from_bytes(&bytes).unwrap();
        let numbers: Vec<u32> = doc.pages().map(|p| p.unwrap().number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(matches!(doc.page(3), Err(PdfError::PageNotFound(3))));
    }
}
