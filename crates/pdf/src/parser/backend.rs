use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::font::{FontInfo, GlyphWidths, ToUnicodeMap, WidthEntry};
use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Page geometry from the MediaBox, in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageBox {
    /// US Letter, used when a page carries no usable MediaBox.
    pub const LETTER: Self = PageBox {
        x: 0.0,
        y: 0.0,
        width: 612.0,
        height: 792.0,
    };
}

/// A simplified, lopdf-independent representation of a PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.to_string(),
            operands,
        }
    }

    /// Numeric operand at `idx`, if present and numeric.
    pub fn number(&self, idx: usize) -> Option<f32> {
        self.operands.get(idx).and_then(get_number_from_value)
    }
}

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`]. Stream bodies are dropped.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => PdfValue::Dict(
            dict.iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect(),
        ),
        lopdf::Object::Stream(stream) => PdfValue::Dict(
            stream
                .dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect(),
        ),
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

/// Best-effort decoding of raw PDF string bytes when the font gives no
/// better information: UTF-16BE with BOM, then UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, payload @ ..] = bytes {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// The document operations the layout code needs. Implemented by
/// [`LopdfBackend`]; tests implement it over in-memory operations.
pub trait PdfBackend {
    /// 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// MediaBox of the page.
    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError>;

    /// Decoding information for every font in the page's resources.
    fn page_fonts(&self, page: PageId) -> Result<Vec<FontInfo>, PdfError>;

    /// Decoded content-stream operations of the page.
    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// [`PdfBackend`] backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Follow references until a direct object is reached.
    fn resolve<'a>(&'a self, mut obj: &'a lopdf::Object) -> Option<&'a lopdf::Object> {
        // Bounded to survive reference cycles in damaged files.
        for _ in 0..16 {
            match obj {
                lopdf::Object::Reference(id) => obj = self.doc.get_object(*id).ok()?,
                other => return Some(other),
            }
        }
        None
    }

    fn resolve_dict<'a>(&'a self, obj: &'a lopdf::Object) -> Option<&'a lopdf::Dictionary> {
        match self.resolve(obj)? {
            lopdf::Object::Dictionary(d) => Some(d),
            lopdf::Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    fn resolve_number(&self, obj: &lopdf::Object) -> Option<f32> {
        match self.resolve(obj)? {
            lopdf::Object::Integer(i) => Some(*i as f32),
            lopdf::Object::Real(f) => Some(*f),
            _ => None,
        }
    }

    fn resolve_numbers(&self, obj: &lopdf::Object) -> Option<Vec<f32>> {
        match self.resolve(obj)? {
            lopdf::Object::Array(arr) => arr.iter().map(|o| self.resolve_number(o)).collect(),
            _ => None,
        }
    }

    fn name_of(&self, dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
        match self.resolve(dict.get(key).ok()?)? {
            lopdf::Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
            _ => None,
        }
    }

    /// Walk up the page tree to find the MediaBox array.
    fn find_media_box(&self, dict: &lopdf::Dictionary) -> Option<Vec<f32>> {
        if let Some(nums) = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| self.resolve_numbers(obj))
        {
            return Some(nums);
        }

        let parent = self.resolve_dict(dict.get(b"Parent").ok()?)?;
        self.find_media_box(parent)
    }

    fn load_font(&self, key: &[u8], dict: &lopdf::Dictionary) -> FontInfo {
        let subtype = self.name_of(dict, b"Subtype");
        let mut info = FontInfo {
            name: key.to_vec(),
            base_font: self.name_of(dict, b"BaseFont"),
            encoding: self.name_of(dict, b"Encoding"),
            to_unicode: self.load_to_unicode(dict),
            widths: GlyphWidths::default(),
            subtype,
        };

        if info.is_composite() {
            if let Some(descendant) = self.descendant_font(dict) {
                info.widths.default_width = descendant
                    .get(b"DW")
                    .ok()
                    .and_then(|o| self.resolve_number(o));
                if let Some(entries) = descendant.get(b"W").ok().and_then(|o| self.width_entries(o))
                {
                    info.widths.load_cid_array(&entries);
                }
            }
        } else {
            info.widths.first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| self.resolve_number(o))
                .unwrap_or(0.0) as u32;
            info.widths.widths = dict
                .get(b"Widths")
                .ok()
                .and_then(|o| self.resolve_numbers(o))
                .unwrap_or_default();
        }

        info
    }

    fn descendant_font<'a>(
        &'a self,
        dict: &'a lopdf::Dictionary,
    ) -> Option<&'a lopdf::Dictionary> {
        match self.resolve(dict.get(b"DescendantFonts").ok()?)? {
            lopdf::Object::Array(arr) => self.resolve_dict(arr.first()?),
            _ => None,
        }
    }

    fn width_entries(&self, obj: &lopdf::Object) -> Option<Vec<WidthEntry>> {
        let lopdf::Object::Array(arr) = self.resolve(obj)? else {
            return None;
        };
        arr.iter()
            .map(|item| match self.resolve(item)? {
                lopdf::Object::Array(_) => self.resolve_numbers(item).map(WidthEntry::List),
                other => self.resolve_number(other).map(WidthEntry::Number),
            })
            .collect()
    }

    fn load_to_unicode(&self, dict: &lopdf::Dictionary) -> Option<ToUnicodeMap> {
        let lopdf::Object::Stream(stream) = self.resolve(dict.get(b"ToUnicode").ok()?)? else {
            return None;
        };
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let cmap = ToUnicodeMap::parse(&data);
        (!cmap.is_empty()).then_some(cmap)
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| PdfError::Parse(format!("cannot get page dictionary: {}", e)))?;

        match self.find_media_box(page_dict).as_deref() {
            Some([llx, lly, urx, ury, ..]) => Ok(PageBox {
                x: llx.min(*urx),
                y: lly.min(*ury),
                width: (urx - llx).abs(),
                height: (ury - lly).abs(),
            }),
            Some(other) => Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                other.len()
            ))),
            None => Ok(PageBox::LETTER),
        }
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontInfo>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        Ok(fonts
            .iter()
            .map(|(key, dict)| self.load_font(key, dict))
            .collect())
    }

    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
        let data = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;

        let content = Content::decode(&data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("① 산업위생".as_bytes()), "① 산업위생");
    }

    #[test]
    fn test_decode_text_simple_latin1_fallback() {
        assert_eq!(decode_text_simple(&[0x63, 0x61, 0x66, 0xE9]), "caf\u{00E9}");
    }

    #[test]
    fn test_decode_text_simple_utf16be_with_bom() {
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0xAC, 0x00, 0x24, 0x60]), "가①");
        // Trailing odd byte is ignored.
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41, 0x00]), "A");
    }

    #[test]
    fn test_number_operands() {
        let op = ContentOp::new(
            "Td",
            vec![PdfValue::Integer(72), PdfValue::Real(-14.5), PdfValue::Null],
        );
        assert_eq!(op.number(0), Some(72.0));
        assert_eq!(op.number(1), Some(-14.5));
        assert_eq!(op.number(2), None);
        assert_eq!(op.number(3), None);
    }

    #[test]
    fn test_convert_nested_objects() {
        let mut dict = lopdf::Dictionary::new();
        dict.set(
            "MediaBox",
            lopdf::Object::Array(vec![
                lopdf::Object::Integer(0),
                lopdf::Object::Integer(0),
                lopdf::Object::Real(595.0),
                lopdf::Object::Real(842.0),
            ]),
        );
        dict.set("Parent", lopdf::Object::Reference((3, 0)));

        match convert_object(&lopdf::Object::Dictionary(dict)) {
            PdfValue::Dict(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(entries.iter().any(|(k, v)| k == b"MediaBox"
                    && *v
                        == PdfValue::Array(vec![
                            PdfValue::Integer(0),
                            PdfValue::Integer(0),
                            PdfValue::Real(595.0),
                            PdfValue::Real(842.0),
                        ])));
                assert!(entries
                    .iter()
                    .any(|(k, v)| k == b"Parent" && *v == PdfValue::Reference((3, 0))));
            }
            other => panic!("expected Dict, got {:?}", other),
        }
    }

    #[test]
    fn test_composite_font_reads_descendant_widths() {
        use lopdf::{dictionary, Object};

        let mut doc = lopdf::Document::with_version("1.5");
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => Object::Integer(900),
            "W" => vec![
                Object::Integer(3),
                Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            ],
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "NanumGothic",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
        };
        let backend = LopdfBackend { doc };

        let info = backend.load_font(b"F1", &font);
        assert!(info.is_composite());
        assert_eq!(info.widths.cid(3), 500.0);
        assert_eq!(info.widths.cid(4), 600.0);
        assert_eq!(info.widths.cid(5), 900.0);
    }

    #[test]
    fn test_load_bytes_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
