//! Glyph extraction and line assembly.
//!
//! ```text
//! content ops  ->  Glyph[] (page space)  ->  lines  ->  text
//!   (per page)      extract_page_layout       assemble_text
//! ```
//!
//! Glyph positions are reported in top-left page coordinates so regions can
//! be expressed the way crop boxes usually are: `(x0, top, x1, bottom)`.

use super::backend::{ContentOp, PageBox, PageId, PdfBackend, PdfValue};
use crate::font::{estimated_em, DecodedGlyph, FontInfo};
use crate::PdfError;

/// Glyphs whose tops differ by at most this many points share a line.
pub const Y_TOLERANCE: f32 = 3.0;

/// Horizontal gap (points) above which a space is inserted between glyphs.
pub const X_TOLERANCE: f32 = 3.0;

/// A single decoded glyph placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
    pub size: f32,
}

impl Glyph {
    pub fn mid_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn mid_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// All glyphs of one page plus its dimensions.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub glyphs: Vec<Glyph>,
}

/// Returns `true` if `c` belongs to a script that does not use inter-word
/// spaces (CJK Unified Ideographs, Hiragana, Katakana, Thai, etc.). Hangul
/// is not one of them: Korean separates words with spaces.
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2A6DF
        | 0xF900..=0xFAFF
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x31F0..=0x31FF
        | 0x3000..=0x303F
        | 0xFF00..=0xFFEF
        | 0x0E00..=0x0E7F
        | 0x0E80..=0x0EFF
        | 0x1000..=0x109F
        | 0x1780..=0x17FF
        | 0x0F00..=0x0FFF
    )
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 × m2` in PDF row-vector convention.
fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn matrix_operands(op: &ContentOp) -> Option<Matrix> {
    let mut m = [0.0; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = op.number(i)?;
    }
    Some(m)
}

// ---------------------------------------------------------------------------
// Text state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font: Option<usize>,
    font_size: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Multiply the line matrix by a translation (Td, TD, T*).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.text_matrix);
    }
}

struct Walker<'a> {
    fonts: &'a [FontInfo],
    page_box: PageBox,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    state: TextState,
    glyphs: Vec<Glyph>,
}

impl<'a> Walker<'a> {
    fn new(fonts: &'a [FontInfo], page_box: PageBox) -> Self {
        Self {
            fonts,
            page_box,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            state: TextState::default(),
            glyphs: Vec::new(),
        }
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(op) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "BT" => {
                self.state.text_matrix = IDENTITY;
                self.state.line_matrix = IDENTITY;
            }
            "Tf" => {
                let key = match op.operands.first() {
                    Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.as_slice(),
                    _ => return,
                };
                self.state.font = self.fonts.iter().position(|f| f.name == key);
                self.state.font_size = op.number(1).unwrap_or(0.0);
            }
            "Tm" => {
                if let Some(m) = matrix_operands(op) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.translate_line(0.0, -self.state.leading),
            "TL" => set_if_number(op, &mut self.state.leading),
            "Tc" => set_if_number(op, &mut self.state.char_spacing),
            "Tw" => set_if_number(op, &mut self.state.word_spacing),
            "Ts" => set_if_number(op, &mut self.state.rise),
            "Tz" => {
                if let Some(v) = op.number(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => self.show(bytes),
                            other => {
                                if let Some(adj) = super::backend::get_number_from_value(other) {
                                    let tx = -adj / 1000.0
                                        * self.state.font_size
                                        * self.state.horiz_scale;
                                    self.state.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            "'" => {
                self.state.translate_line(0.0, -self.state.leading);
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (op.number(0), op.number(1)) {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                }
                self.state.translate_line(0.0, -self.state.leading);
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show(bytes);
                }
            }
            _ => {}
        }
    }

    /// Place every glyph of a string operand and advance the text matrix.
    fn show(&mut self, bytes: &[u8]) {
        let decoded: Vec<DecodedGlyph> = match self.state.font.and_then(|i| self.fonts.get(i)) {
            Some(font) => font.decode(bytes),
            None => FontInfo::default().decode(bytes),
        };

        for glyph in decoded {
            let em = glyph
                .width
                .map(|w| w / 1000.0)
                .unwrap_or_else(|| estimated_em(&glyph.text));
            let glyph_advance = em * self.state.font_size * self.state.horiz_scale;

            if !glyph.text.is_empty() {
                self.place(glyph.text, glyph_advance);
            }

            let mut tx = glyph_advance + self.state.char_spacing * self.state.horiz_scale;
            if glyph.is_word_space {
                tx += self.state.word_spacing * self.state.horiz_scale;
            }
            self.state.advance(tx);
        }
    }

    fn place(&mut self, text: String, glyph_advance: f32) {
        let rendering = multiply(&self.state.text_matrix, &self.ctm);
        let (ux, uy) = transform(&rendering, 0.0, self.state.rise);
        let scale_x = rendering[0].hypot(rendering[1]);
        let size = (self.state.font_size * rendering[2].hypot(rendering[3])).abs();
        let width = (glyph_advance * scale_x).abs();

        let x0 = ux - self.page_box.x;
        let baseline = self.page_box.y + self.page_box.height - uy;
        self.glyphs.push(Glyph {
            text,
            x0,
            x1: x0 + width,
            top: baseline - size,
            bottom: baseline,
            size,
        });
    }
}

fn set_if_number(op: &ContentOp, slot: &mut f32) {
    if let Some(v) = op.number(0) {
        *slot = v;
    }
}

/// Place glyphs for a sequence of operations against known fonts and page
/// geometry.
pub fn layout_operations(ops: &[ContentOp], fonts: &[FontInfo], page_box: PageBox) -> Vec<Glyph> {
    let mut walker = Walker::new(fonts, page_box);
    for op in ops {
        walker.apply(op);
    }
    walker.glyphs
}

/// Walk one page's content stream and collect its glyphs.
pub fn extract_page_layout(
    backend: &dyn PdfBackend,
    number: u32,
    page_id: PageId,
) -> Result<PageLayout, PdfError> {
    let page_box = backend.page_box(page_id)?;
    let ops = backend.page_operations(page_id)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|err| {
        log::debug!("page {number}: no font resources ({err}), using fallback decoding");
        Vec::new()
    });

    let glyphs = layout_operations(&ops, &fonts, page_box);
    log::debug!(
        "page {number}: {} ops, {} fonts, {} glyphs",
        ops.len(),
        fonts.len(),
        glyphs.len()
    );

    Ok(PageLayout {
        number,
        width: page_box.width,
        height: page_box.height,
        glyphs,
    })
}

// ---------------------------------------------------------------------------
// Line assembly
// ---------------------------------------------------------------------------

/// Assemble glyphs into plain text: lines top-to-bottom, glyphs
/// left-to-right, lines joined with `\n`.
pub fn assemble_text<'g>(glyphs: impl IntoIterator<Item = &'g Glyph>) -> String {
    let mut glyphs: Vec<&Glyph> = glyphs.into_iter().collect();
    glyphs.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    let mut line_top = f32::NEG_INFINITY;
    for glyph in glyphs {
        match lines.last_mut() {
            Some(line) if (glyph.top - line_top).abs() <= Y_TOLERANCE => line.push(glyph),
            _ => {
                line_top = glyph.top;
                lines.push(vec![glyph]);
            }
        }
    }

    lines
        .into_iter()
        .map(assemble_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn assemble_line(mut line: Vec<&Glyph>) -> String {
    line.sort_by(|a, b| a.x0.total_cmp(&b.x0));

    let mut text = String::new();
    let mut prev: Option<&Glyph> = None;
    for glyph in line {
        if let Some(p) = prev {
            if glyph.x0 - p.x1 > X_TOLERANCE && needs_space(&text, &glyph.text) {
                text.push(' ');
            }
        }
        text.push_str(&glyph.text);
        prev = Some(glyph);
    }
    text.trim_end().to_string()
}

fn needs_space(before: &str, next: &str) -> bool {
    match (before.chars().next_back(), next.chars().next()) {
        (Some(l), Some(f)) => {
            !l.is_whitespace()
                && !f.is_whitespace()
                && !(is_spaceless_script_char(l) && is_spaceless_script_char(f))
        }
        _ => false,
    }
}
