//! Final question records, the question-number range and the last-wins
//! deduplication that feeds them.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::answer_key::AnswerKey;
use crate::chunk::parse_chunk;
use crate::segment::RawChunk;

pub const DEFAULT_FIRST_QUESTION: u32 = 1;
pub const DEFAULT_LAST_QUESTION: u32 = 100;

/// Diagnostic attached to a record whose text could not be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Note {
    /// Fewer than four option markers, or the question never appeared.
    ImageBased,
    /// Markers were found but slicing the chunk failed.
    OptionParseError,
}

impl Note {
    pub fn as_str(&self) -> &'static str {
        match self {
            Note::ImageBased => "image-based, text not extractable",
            Note::OptionParseError => "option text parse error",
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question_no: u32,
    pub question_text: String,
    pub options: [String; 4],
    pub correct_answer: Option<i64>,
    pub note: Option<Note>,
}

impl QuestionRecord {
    /// A record with every text field empty and no note.
    pub fn empty(question_no: u32) -> Self {
        Self {
            question_no,
            question_text: String::new(),
            options: Default::default(),
            correct_answer: None,
            note: None,
        }
    }

    /// The row for a question that never appeared in the document.
    pub fn not_extracted(question_no: u32) -> Self {
        Self {
            note: Some(Note::ImageBased),
            ..Self::empty(question_no)
        }
    }

    /// Field values in output column order.
    pub fn to_row(&self) -> [String; 8] {
        let [o1, o2, o3, o4] = &self.options;
        [
            self.question_no.to_string(),
            self.question_text.clone(),
            o1.clone(),
            o2.clone(),
            o3.clone(),
            o4.clone(),
            self.correct_answer
                .map(|a| a.to_string())
                .unwrap_or_default(),
            self.note.map(|n| n.as_str().to_string()).unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("first question ({first}) is after last question ({last})")]
    Inverted { first: u32, last: u32 },
}

/// The closed range of question numbers that gets one row each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionRange {
    first: u32,
    last: u32,
}

impl QuestionRange {
    pub fn new(first: u32, last: u32) -> Result<Self, RangeError> {
        if first > last {
            return Err(RangeError::Inverted { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn contains(&self, question_no: u32) -> bool {
        (self.first..=self.last).contains(&question_no)
    }

    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// Never true: a valid range holds at least one question.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }
}

impl Default for QuestionRange {
    fn default() -> Self {
        Self {
            first: DEFAULT_FIRST_QUESTION,
            last: DEFAULT_LAST_QUESTION,
        }
    }
}

impl fmt::Display for QuestionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}

/// A chunk that replaced an earlier chunk with the same number. Indices
/// point into the slice given to [`deduplicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overwrite {
    pub question_no: u32,
    pub discarded: usize,
    pub kept: usize,
}

/// Question number → text of the last chunk seen for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkIndex {
    pub texts: BTreeMap<u32, String>,
    pub overwrites: Vec<Overwrite>,
}

impl ChunkIndex {
    pub fn get(&self, question_no: u32) -> Option<&str> {
        self.texts.get(&question_no).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Indexed question numbers that fall outside `range`.
    pub fn outside(&self, range: QuestionRange) -> Vec<u32> {
        self.texts
            .keys()
            .copied()
            .filter(|q| !range.contains(*q))
            .collect()
    }
}

/// Collapse chunks by question number. A later chunk replaces an earlier
/// one outright; each replacement is recorded.
pub fn deduplicate(chunks: &[RawChunk]) -> ChunkIndex {
    let mut index = ChunkIndex::default();
    let mut positions: BTreeMap<u32, usize> = BTreeMap::new();

    for (idx, chunk) in chunks.iter().enumerate() {
        if let Some(previous) = positions.insert(chunk.question_no, idx) {
            index.overwrites.push(Overwrite {
                question_no: chunk.question_no,
                discarded: previous,
                kept: idx,
            });
        }
        index
            .texts
            .insert(chunk.question_no, chunk.raw_text.clone());
    }

    index
}

/// One record per question in `range`, ascending.
///
/// Questions with a chunk are parsed and get their key answer, even when
/// parsing failed. Questions without a chunk get the not-extracted row and
/// the key is not consulted for them.
pub fn build_records(
    index: &ChunkIndex,
    key: &AnswerKey,
    range: QuestionRange,
) -> Vec<QuestionRecord> {
    range
        .iter()
        .map(|question_no| match index.get(question_no) {
            Some(raw) => QuestionRecord {
                correct_answer: key.get(question_no),
                ..parse_chunk(question_no, raw)
            },
            None => QuestionRecord::not_extracted(question_no),
        })
        .collect()
}
