//! Splitting region text into numbered question chunks.
//!
//! A region's text is cut at every *boundary*: a line that opens with a
//! question number such as `"12. "`. How a boundary is recognised is a
//! [`BoundaryStrategy`]; [`NumberedLinePattern`] covers the regex-based
//! variants.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Digits, a period and a mandatory whitespace character at a line start.
pub const STRICT_PATTERN: &str = r"(?m)^\s*(\d{1,3})\.\s";

/// Like [`STRICT_PATTERN`] but also accepts `"1.Text"` with no space after
/// the period.
pub const LENIENT_PATTERN: &str = r"(?m)^\s*(\d{1,3})\.\s?";

#[derive(Debug, Error)]
pub enum BoundaryPatternError {
    #[error("invalid boundary pattern: {0}")]
    Invalid(#[from] regex::Error),

    #[error("boundary pattern `{0}` needs a capture group for the question number")]
    MissingNumberGroup(String),
}

/// One recognised question boundary inside a region's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Byte offset where the boundary marker starts.
    pub start: usize,
    /// Byte offset just past the marker, where the question body begins.
    pub end: usize,
    /// The captured question number, unparsed.
    pub number: String,
}

/// Locates question boundaries in a block of text.
pub trait BoundaryStrategy {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// All boundaries in `text`, ordered and non-overlapping.
    fn boundaries(&self, text: &str) -> Vec<Boundary>;
}

/// A regex strategy whose first capture group is the question number.
#[derive(Debug, Clone)]
pub struct NumberedLinePattern {
    name: String,
    regex: Regex,
}

impl NumberedLinePattern {
    /// `^\s*(\d{1,3})\.\s` in multi-line mode.
    pub fn strict() -> Self {
        static STRICT: OnceLock<Regex> = OnceLock::new();
        Self {
            name: "strict".to_string(),
            regex: STRICT
                .get_or_init(|| Regex::new(STRICT_PATTERN).unwrap())
                .clone(),
        }
    }

    /// `^\s*(\d{1,3})\.\s?` in multi-line mode.
    pub fn lenient() -> Self {
        static LENIENT: OnceLock<Regex> = OnceLock::new();
        Self {
            name: "lenient".to_string(),
            regex: LENIENT
                .get_or_init(|| Regex::new(LENIENT_PATTERN).unwrap())
                .clone(),
        }
    }

    /// A user-supplied pattern. Group 1 must capture the number.
    pub fn custom(pattern: &str) -> Result<Self, BoundaryPatternError> {
        let regex = Regex::new(pattern)?;
        if regex.captures_len() < 2 {
            return Err(BoundaryPatternError::MissingNumberGroup(pattern.to_string()));
        }
        Ok(Self {
            name: format!("custom({pattern})"),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for NumberedLinePattern {
    fn default() -> Self {
        Self::strict()
    }
}

impl BoundaryStrategy for NumberedLinePattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn boundaries(&self, text: &str) -> Vec<Boundary> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(Boundary {
                    start: whole.start(),
                    end: whole.end(),
                    number: caps
                        .get(1)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// One occurrence of a question found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub question_no: u32,
    pub raw_text: String,
}

impl RawChunk {
    pub fn new(question_no: u32, raw_text: impl Into<String>) -> Self {
        Self {
            question_no,
            raw_text: raw_text.into(),
        }
    }
}

/// The result of segmenting one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Chunks in text order.
    pub chunks: Vec<RawChunk>,
    /// How many boundaries the strategy reported.
    pub boundaries: usize,
    /// Numbers of the boundaries that were dropped because they did not
    /// parse as an integer.
    pub unparseable: Vec<String>,
}

/// First code point of every run of ten Unicode decimal digits (`Nd`).
/// Each run holds the values 0 to 9 in order.
const DECIMAL_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x10D40, 0x11066, 0x110F0, 0x11136,
    0x111D0, 0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x116D0, 0x116DA, 0x11730, 0x118E0,
    0x11950, 0x11BF0, 0x11C50, 0x11D50, 0x11DA0, 0x11F50, 0x16130, 0x16A60, 0x16AC0, 0x16B50,
    0x16D70, 0x1CCF0, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140, 0x1E2F0, 0x1E4F0,
    0x1E5F1, 0x1E950, 0x1FBF0,
];

/// Value of a Unicode decimal digit in any script.
pub fn decimal_digit_value(c: char) -> Option<u32> {
    let cp = c as u32;
    let run = DECIMAL_ZEROS.partition_point(|&zero| zero <= cp).checked_sub(1)?;
    let value = cp - DECIMAL_ZEROS[run];
    (value < 10).then_some(value)
}

/// Parse a captured question number. Decimal digits of any script are
/// accepted, and may be mixed; anything else fails.
pub fn parse_question_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.chars().try_fold(0u32, |acc, c| {
        acc.checked_mul(10)?.checked_add(decimal_digit_value(c)?)
    })
}

/// Split one region's text into chunks.
///
/// Text before the first boundary (page headers and the like) is dropped.
/// Each chunk runs from the end of its boundary marker to the start of the
/// next one, or the end of the text, and is trimmed.
pub fn segment_region(text: &str, strategy: &dyn BoundaryStrategy) -> Segmentation {
    let boundaries = strategy.boundaries(text);
    let mut segmentation = Segmentation {
        boundaries: boundaries.len(),
        ..Segmentation::default()
    };

    for (idx, boundary) in boundaries.iter().enumerate() {
        let body_end = boundaries
            .get(idx + 1)
            .map(|next| next.start)
            .unwrap_or(text.len());
        let body = text.get(boundary.end..body_end).unwrap_or_default();

        match parse_question_number(&boundary.number) {
            Some(question_no) => segmentation
                .chunks
                .push(RawChunk::new(question_no, body.trim())),
            None => segmentation.unparseable.push(boundary.number.clone()),
        }
    }

    segmentation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(seg: &Segmentation) -> Vec<u32> {
        seg.chunks.iter().map(|c| c.question_no).collect()
    }

    #[test]
    fn test_strict_segments_numbered_lines() {
        let text = "2024년 산업위생관리기사\n7. 온도 25℃에서\n① 가 ② 나\n③ 다 ④ 라\n8. 산업위생전문가의 책임\n① a ② b ③ c ④ d";
        let seg = segment_region(text, &NumberedLinePattern::strict());
        assert_eq!(numbers(&seg), vec![7, 8]);
        assert_eq!(seg.chunks[0].raw_text, "온도 25℃에서\n① 가 ② 나\n③ 다 ④ 라");
        assert_eq!(seg.chunks[1].raw_text, "산업위생전문가의 책임\n① a ② b ③ c ④ d");
        assert_eq!(seg.boundaries, 2);
    }

    #[test]
    fn test_header_before_first_boundary_is_dropped() {
        let seg = segment_region("HEADER\n1. body", &NumberedLinePattern::strict());
        assert_eq!(seg.chunks, vec![RawChunk::new(1, "body")]);
    }

    #[test]
    fn test_boundary_at_string_start_and_indented() {
        let seg = segment_region("1. a\n   2. b", &NumberedLinePattern::strict());
        assert_eq!(numbers(&seg), vec![1, 2]);
        assert_eq!(seg.chunks[0].raw_text, "a");
    }

    #[test]
    fn test_number_mid_line_is_not_a_boundary() {
        let seg = segment_region("1. 정답은 2. 입니다", &NumberedLinePattern::strict());
        assert_eq!(seg.chunks, vec![RawChunk::new(1, "정답은 2. 입니다")]);
    }

    #[test]
    fn test_strict_absorbs_number_without_space() {
        let seg = segment_region("1. first\n2.중량물 취급", &NumberedLinePattern::strict());
        assert_eq!(seg.chunks, vec![RawChunk::new(1, "first\n2.중량물 취급")]);
    }

    #[test]
    fn test_lenient_splits_number_without_space() {
        let seg = segment_region("1. first\n2.중량물 취급", &NumberedLinePattern::lenient());
        assert_eq!(numbers(&seg), vec![1, 2]);
        assert_eq!(seg.chunks[1].raw_text, "중량물 취급");
    }

    #[test]
    fn test_four_digit_number_is_not_a_boundary() {
        let seg = segment_region("1. a\n2024. b", &NumberedLinePattern::strict());
        assert_eq!(seg.chunks, vec![RawChunk::new(1, "a\n2024. b")]);
    }

    #[test]
    fn test_no_boundary() {
        let seg = segment_region("just a header", &NumberedLinePattern::strict());
        assert!(seg.chunks.is_empty());
        assert_eq!(seg.boundaries, 0);
    }

    #[test]
    fn test_empty_body_kept() {
        let seg = segment_region("5. \n6. x", &NumberedLinePattern::strict());
        assert_eq!(seg.chunks, vec![RawChunk::new(5, ""), RawChunk::new(6, "x")]);
    }

    #[test]
    fn test_non_ascii_digits_are_question_numbers() {
        // Arabic-Indic one and Devanagari two both match `\d`.
        let seg = segment_region("\u{0661}. a\n\u{0968}. b\n3. c", &NumberedLinePattern::strict());
        assert_eq!(
            seg.chunks,
            vec![RawChunk::new(1, "a"), RawChunk::new(2, "b"), RawChunk::new(3, "c")]
        );
        assert!(seg.unparseable.is_empty());
    }

    #[test]
    fn test_unparseable_number_is_dropped() {
        let pattern = NumberedLinePattern::custom(r"(?m)^\s*([0-9A-Z]{1,3})\.\s").unwrap();
        let seg = segment_region("A. a\n2. b", &pattern);
        assert_eq!(seg.chunks, vec![RawChunk::new(2, "b")]);
        assert_eq!(seg.unparseable, vec!["A".to_string()]);
        assert_eq!(seg.boundaries, 2);
    }

    #[test]
    fn test_parse_question_number() {
        assert_eq!(parse_question_number("１２"), Some(12));
        assert_eq!(parse_question_number("007"), Some(7));
        assert_eq!(parse_question_number("\u{0661}\u{0660}"), Some(10));
        assert_eq!(parse_question_number(""), None);
        assert_eq!(parse_question_number("1a"), None);
    }

    #[test]
    fn test_decimal_digit_value() {
        assert_eq!(decimal_digit_value('0'), Some(0));
        assert_eq!(decimal_digit_value('9'), Some(9));
        assert_eq!(decimal_digit_value('\u{06F5}'), Some(5));
        assert_eq!(decimal_digit_value('\u{1D7D9}'), Some(1));
        assert_eq!(decimal_digit_value('/'), None);
        assert_eq!(decimal_digit_value(':'), None);
        assert_eq!(decimal_digit_value('①'), None);
        assert_eq!(decimal_digit_value('\u{0670}'), None);
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = NumberedLinePattern::custom(r"(?m)^\s*Q(\d+)\)\s").unwrap();
        let seg = segment_region("Q1) a\nQ2) b", &pattern);
        assert_eq!(numbers(&seg), vec![1, 2]);
        assert!(pattern.name().starts_with("custom("));
    }

    #[test]
    fn test_custom_pattern_requires_group() {
        assert!(matches!(
            NumberedLinePattern::custom(r"^\d+\."),
            Err(BoundaryPatternError::MissingNumberGroup(_))
        ));
        assert!(matches!(
            NumberedLinePattern::custom(r"(\d+"),
            Err(BoundaryPatternError::Invalid(_))
        ));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(NumberedLinePattern::strict().name(), "strict");
        assert_eq!(NumberedLinePattern::lenient().name(), "lenient");
        assert_eq!(NumberedLinePattern::default().as_str(), STRICT_PATTERN);
    }
}
