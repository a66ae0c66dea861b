//! Font-aware decoding of the byte strings passed to text-showing operators.
//!
//! A PDF string is a sequence of character codes, not characters. How codes
//! are delimited and what they mean depends on the font: composite (Type0)
//! fonts usually use 2-byte codes, simple fonts use single bytes, and the
//! optional `/ToUnicode` CMap maps codes to Unicode text. Everything here is
//! pure data; the lopdf lookups that fill [`FontInfo`] live in the backend.

use std::collections::HashMap;

use crate::parser::backend::decode_text_simple;

/// Approximate advance of a narrow glyph as a fraction of the font size.
pub const NARROW_GLYPH_EM: f32 = 0.5;

/// Approximate advance of a wide (CJK, fullwidth, enclosed) glyph.
pub const WIDE_GLYPH_EM: f32 = 1.0;

/// Default width for CID fonts without a `/DW` entry (PDF 32000-1, 9.7.4.3).
const CID_DEFAULT_WIDTH: f32 = 1000.0;

/// Longest run of codes a single `/W` or `bfrange` entry may cover.
pub const MAX_CID_RUN: u32 = 0x10000;

/// Everything needed to turn a string operand into glyphs.
#[derive(Debug, Clone, Default)]
pub struct FontInfo {
    /// Resource key as it appears in the page's font dictionary (e.g. `b"F1"`).
    pub name: Vec<u8>,
    pub base_font: Option<String>,
    pub subtype: Option<String>,
    pub encoding: Option<String>,
    pub to_unicode: Option<ToUnicodeMap>,
    pub widths: GlyphWidths,
}

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    pub code: u32,
    pub text: String,
    /// Advance in glyph space (thousandths of an em), when the font says.
    pub width: Option<f32>,
    /// Single-byte code 32: the only code word spacing (`Tw`) applies to.
    pub is_word_space: bool,
}

impl FontInfo {
    /// Composite fonts address glyphs through CIDs and multi-byte codes.
    pub fn is_composite(&self) -> bool {
        self.subtype.as_deref() == Some("Type0")
    }

    fn is_identity_encoded(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|enc| enc.contains("Identity"))
    }

    /// Decode a string operand into one [`DecodedGlyph`] per character code.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        if let Some(cmap) = &self.to_unicode {
            let default_len = if self.is_composite() { 2 } else { 1 };
            return cmap
                .split_codes(bytes, default_len)
                .into_iter()
                .map(|(code, len)| {
                    let text = cmap
                        .lookup(code)
                        .map(str::to_string)
                        .unwrap_or_else(|| unmapped_code(code, len));
                    self.glyph(code, len, text)
                })
                .collect();
        }

        if self.is_composite() && self.is_identity_encoded() && bytes.len() % 2 == 0 {
            let glyphs: Vec<DecodedGlyph> = bytes
                .chunks(2)
                .map(|pair| {
                    let code = u16::from_be_bytes([pair[0], pair[1]]);
                    let text = String::from_utf16_lossy(&[code]);
                    self.glyph(code as u32, 2, text)
                })
                .collect();
            let readable = glyphs
                .iter()
                .any(|g| g.text != "\u{FFFD}" && g.text != "\0");
            if readable {
                return glyphs;
            }
        }

        decode_text_simple(bytes)
            .chars()
            .map(|c| {
                let code = c as u32;
                let width = if code < 256 { self.widths.simple(code) } else { None };
                DecodedGlyph {
                    code,
                    text: c.to_string(),
                    width,
                    is_word_space: c == ' ',
                }
            })
            .collect()
    }

    fn glyph(&self, code: u32, len: usize, text: String) -> DecodedGlyph {
        let width = if self.is_composite() {
            Some(self.widths.cid(code))
        } else {
            self.widths.simple(code)
        };
        DecodedGlyph {
            code,
            text,
            width,
            is_word_space: len == 1 && code == 32,
        }
    }
}

/// Text for a code the CMap does not cover.
fn unmapped_code(code: u32, len: usize) -> String {
    match char::from_u32(code) {
        Some(c) if len == 1 && (c.is_ascii_graphic() || c == ' ') => c.to_string(),
        _ => "\u{FFFD}".to_string(),
    }
}

/// Estimated advance, in ems, for glyphs whose font gives no widths.
pub fn estimated_em(text: &str) -> f32 {
    match text.chars().next() {
        Some(c) if is_wide_char(c) => WIDE_GLYPH_EM,
        _ => NARROW_GLYPH_EM,
    }
}

/// Characters typically set on a full em: spaceless scripts, Hangul and the
/// enclosed alphanumerics block (①, ②, ...).
pub fn is_wide_char(c: char) -> bool {
    crate::parser::layout::is_spaceless_script_char(c)
        || matches!(
            c as u32,
            0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F | 0x2460..=0x24FF
        )
}

// ---------------------------------------------------------------------------
// Glyph widths
// ---------------------------------------------------------------------------

/// Glyph advances from `/FirstChar` + `/Widths` (simple fonts) or `/W` +
/// `/DW` (CID fonts).
#[derive(Debug, Clone, Default)]
pub struct GlyphWidths {
    pub first_char: u32,
    pub widths: Vec<f32>,
    pub cid_widths: HashMap<u32, f32>,
    pub default_width: Option<f32>,
}

impl GlyphWidths {
    pub fn simple(&self, code: u32) -> Option<f32> {
        code.checked_sub(self.first_char)
            .and_then(|idx| self.widths.get(idx as usize))
            .copied()
            .filter(|w| *w > 0.0)
    }

    pub fn cid(&self, code: u32) -> f32 {
        self.cid_widths
            .get(&code)
            .copied()
            .or(self.default_width)
            .unwrap_or(CID_DEFAULT_WIDTH)
    }

    /// Fill `cid_widths` from a flattened `/W` array, where each entry is
    /// either `c [w1 w2 ...]` or `c_first c_last w`. Runs are capped at
    /// [`MAX_CID_RUN`] codes and never wrap past `u32::MAX`.
    pub fn load_cid_array(&mut self, entries: &[WidthEntry]) {
        let mut i = 0;
        while i < entries.len() {
            match (entries.get(i), entries.get(i + 1), entries.get(i + 2)) {
                (Some(WidthEntry::Number(start)), Some(WidthEntry::List(list)), _) => {
                    let start = *start as u32;
                    for (offset, w) in list.iter().take(MAX_CID_RUN as usize).enumerate() {
                        let Some(cid) = start.checked_add(offset as u32) else {
                            break;
                        };
                        self.cid_widths.insert(cid, *w);
                    }
                    i += 2;
                }
                (
                    Some(WidthEntry::Number(first)),
                    Some(WidthEntry::Number(last)),
                    Some(WidthEntry::Number(w)),
                ) => {
                    let first = *first as u32;
                    let last = (*last as u32).min(first.saturating_add(MAX_CID_RUN - 1));
                    for cid in first..=last {
                        self.cid_widths.insert(cid, *w);
                    }
                    i += 3;
                }
                _ => break,
            }
        }
    }
}

/// An element of a CID font `/W` array.
#[derive(Debug, Clone, PartialEq)]
pub enum WidthEntry {
    Number(f32),
    List(Vec<f32>),
}

// ---------------------------------------------------------------------------
// ToUnicode CMaps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodespaceRange {
    len: usize,
    low: u32,
    high: u32,
}

/// Parsed `/ToUnicode` CMap: codespace ranges plus the code → text table.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    codespace: Vec<CodespaceRange>,
    map: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

impl ToUnicodeMap {
    /// Parse the (decompressed) bytes of a ToUnicode CMap stream.
    ///
    /// Only the operators that matter for text extraction are interpreted:
    /// `begincodespacerange`, `beginbfchar` and `beginbfrange`. Anything
    /// else is skipped.
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = ToUnicodeMap::default();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.codespace.push(CodespaceRange {
                            len: lo.len().max(1),
                            low: be_code(lo),
                            high: be_code(hi),
                        });
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.map.insert(be_code(src), utf16be(dst));
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    loop {
                        let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                            (tokens.get(i), tokens.get(i + 1))
                        else {
                            break;
                        };
                        let (lo, hi) = (be_code(lo), be_code(hi));
                        match tokens.get(i + 2) {
                            Some(Token::Hex(dst)) => {
                                cmap.insert_incrementing(lo, hi, dst);
                                i += 3;
                            }
                            Some(Token::Open) => {
                                let mut j = i + 3;
                                let mut code = lo;
                                while let Some(Token::Hex(dst)) = tokens.get(j) {
                                    if code <= hi {
                                        cmap.map.insert(code, utf16be(dst));
                                    }
                                    code = code.saturating_add(1);
                                    j += 1;
                                }
                                // Skip the closing bracket.
                                i = j + 1;
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        cmap
    }

    /// A `bfrange` with a single destination string: the last UTF-16 code
    /// unit is incremented for each successive source code.
    fn insert_incrementing(&mut self, lo: u32, hi: u32, dst: &[u8]) {
        let mut units: Vec<u16> = dst
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        if units.is_empty() || hi < lo {
            return;
        }
        let last = units.len() - 1;
        // Guard against absurd ranges in malformed CMaps.
        for code in lo..=hi.min(lo.saturating_add(MAX_CID_RUN - 1)) {
            self.map.insert(code, String::from_utf16_lossy(&units));
            units[last] = units[last].wrapping_add(1);
        }
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Split a byte string into `(code, byte_len)` pairs using the
    /// codespace ranges, falling back to `default_len`-byte codes.
    pub fn split_codes(&self, bytes: &[u8], default_len: usize) -> Vec<(u32, usize)> {
        let mut lengths: Vec<usize> = self.codespace.iter().map(|r| r.len).collect();
        lengths.sort_unstable();
        lengths.dedup();

        let mut codes = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let matched = lengths.iter().find_map(|&len| {
                let slice = bytes.get(pos..pos + len)?;
                let code = be_code(slice);
                self.codespace
                    .iter()
                    .any(|r| r.len == len && r.low <= code && code <= r.high)
                    .then_some((code, len))
            });
            let (code, len) = matched.unwrap_or_else(|| {
                let len = default_len.min(bytes.len() - pos).max(1);
                (be_code(&bytes[pos..pos + len]), len)
            });
            codes.push((code, len));
            pos += len;
        }
        codes
    }
}

fn be_code(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        match b {
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map(|p| i + 1 + p)
                    .unwrap_or(data.len());
                tokens.push(Token::Hex(decode_hex(&data[i + 1..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b']' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'(' => {
                // Literal strings only appear in CMap metadata; skip them.
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'(' | b'/' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    // A lone '/' starts a name; keep it with the word.
                    i += 1;
                    while i < data.len()
                        && !data[i].is_ascii_whitespace()
                        && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'(' | b'/' | b'%')
                    {
                        i += 1;
                    }
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }
    tokens
}

fn decode_hex(raw: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = raw
        .iter()
        .filter_map(|c| (*c as char).to_digit(16).map(|d| d as u8))
        .collect();
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (hi << 4) | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANGUL_CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<0003> <0020>
<0010> <AC00>
<0011> <2460>
endbfchar
2 beginbfrange
<0020> <0022> <0031>
<0030> <0031> [<D55C> <AE00>]
endbfrange
endcmap";

    fn composite_font(cmap: Option<ToUnicodeMap>) -> FontInfo {
        FontInfo {
            name: b"F1".to_vec(),
            base_font: Some("HYGothic-Medium".to_string()),
            subtype: Some("Type0".to_string()),
            encoding: Some("Identity-H".to_string()),
            to_unicode: cmap,
            widths: GlyphWidths::default(),
        }
    }

    #[test]
    fn test_cmap_bfchar_and_bfrange() {
        let cmap = ToUnicodeMap::parse(HANGUL_CMAP);
        assert_eq!(cmap.lookup(0x0003), Some(" "));
        assert_eq!(cmap.lookup(0x0010), Some("가"));
        assert_eq!(cmap.lookup(0x0011), Some("①"));
        assert_eq!(cmap.lookup(0x0020), Some("1"));
        assert_eq!(cmap.lookup(0x0022), Some("3"));
        assert_eq!(cmap.lookup(0x0030), Some("한"));
        assert_eq!(cmap.lookup(0x0031), Some("글"));
        assert_eq!(cmap.len(), 8);
    }

    #[test]
    fn test_cmap_split_codes_uses_codespace() {
        let cmap = ToUnicodeMap::parse(HANGUL_CMAP);
        let codes = cmap.split_codes(&[0x00, 0x10, 0x00, 0x11], 1);
        assert_eq!(codes, vec![(0x0010, 2), (0x0011, 2)]);
    }

    #[test]
    fn test_decode_with_cmap() {
        let font = composite_font(Some(ToUnicodeMap::parse(HANGUL_CMAP)));
        let glyphs = font.decode(&[0x00, 0x30, 0x00, 0x31, 0x00, 0x03, 0x00, 0x11]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "한글 ①");
        // Two-byte code 3 is a space glyph but not a word space.
        assert!(!glyphs[2].is_word_space);
    }

    #[test]
    fn test_decode_unmapped_code_is_replacement() {
        let font = composite_font(Some(ToUnicodeMap::parse(HANGUL_CMAP)));
        let glyphs = font.decode(&[0x01, 0x99]);
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].text, "\u{FFFD}");
    }

    #[test]
    fn test_decode_identity_without_cmap_as_utf16() {
        let font = composite_font(None);
        let glyphs = font.decode(&[0xAC, 0x00, 0x24, 0x60]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "가①");
    }

    #[test]
    fn test_decode_simple_font_with_widths() {
        let font = FontInfo {
            subtype: Some("Type1".to_string()),
            widths: GlyphWidths {
                first_char: 32,
                widths: vec![250.0, 333.0],
                ..GlyphWidths::default()
            },
            ..FontInfo::default()
        };
        let glyphs = font.decode(b" !a");
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs[0].is_word_space);
        assert_eq!(glyphs[0].width, Some(250.0));
        assert_eq!(glyphs[1].width, Some(333.0));
        assert_eq!(glyphs[2].width, None);
    }

    #[test]
    fn test_decode_simple_font_utf8_fallback() {
        let font = FontInfo::default();
        let text: String = font
            .decode("7. 온도 ①".as_bytes())
            .iter()
            .map(|g| g.text.as_str())
            .collect();
        assert_eq!(text, "7. 온도 ①");
    }

    #[test]
    fn test_cid_widths_both_forms() {
        let mut widths = GlyphWidths {
            default_width: Some(500.0),
            ..GlyphWidths::default()
        };
        widths.load_cid_array(&[
            WidthEntry::Number(10.0),
            WidthEntry::List(vec![600.0, 700.0]),
            WidthEntry::Number(20.0),
            WidthEntry::Number(22.0),
            WidthEntry::Number(900.0),
        ]);
        assert_eq!(widths.cid(10), 600.0);
        assert_eq!(widths.cid(11), 700.0);
        assert_eq!(widths.cid(21), 900.0);
        assert_eq!(widths.cid(99), 500.0);
    }

    #[test]
    fn test_cid_list_at_top_of_code_space_stops() {
        let mut widths = GlyphWidths::default();
        widths.load_cid_array(&[
            WidthEntry::Number(4294967295.0),
            WidthEntry::List(vec![600.0, 700.0]),
        ]);
        assert_eq!(widths.cid_widths.len(), 1);
        assert_eq!(widths.cid(u32::MAX), 600.0);
    }

    #[test]
    fn test_cid_range_is_capped() {
        let mut widths = GlyphWidths::default();
        widths.load_cid_array(&[
            WidthEntry::Number(0.0),
            WidthEntry::Number(4e9),
            WidthEntry::Number(500.0),
        ]);
        assert_eq!(widths.cid_widths.len(), MAX_CID_RUN as usize);
        assert_eq!(widths.cid(MAX_CID_RUN - 1), 500.0);
        assert_eq!(widths.cid(MAX_CID_RUN), CID_DEFAULT_WIDTH);
    }

    #[test]
    fn test_cid_range_near_u32_max_does_not_wrap() {
        let mut widths = GlyphWidths::default();
        widths.load_cid_array(&[
            WidthEntry::Number(4294967040.0),
            WidthEntry::Number(4294967295.0),
            WidthEntry::Number(500.0),
        ]);
        assert_eq!(widths.cid_widths.len(), 256);
        assert_eq!(widths.cid(u32::MAX), 500.0);
    }

    #[test]
    fn test_estimated_em() {
        assert_eq!(estimated_em("a"), NARROW_GLYPH_EM);
        assert_eq!(estimated_em("가"), WIDE_GLYPH_EM);
        assert_eq!(estimated_em("③"), WIDE_GLYPH_EM);
    }
}
