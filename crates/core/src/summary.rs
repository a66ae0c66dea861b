//! Run statistics derived from the records and the extracted chunks, for
//! the shell to print after a conversion.

use crate::record::{ChunkIndex, Note, QuestionRange, QuestionRecord};

/// Counts describing one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Chunks found in the document, duplicates included.
    pub raw_chunks: usize,
    /// Rows with a stem and four options.
    pub extracted: usize,
    /// Rows whose chunk was found but had fewer than four markers.
    pub image_based: usize,
    pub option_parse_errors: usize,
    /// Rows whose question number never appeared in the document.
    pub missing: usize,
    pub with_answer: usize,
    pub overwrites: usize,
    /// Distinct question numbers found outside the configured range.
    pub outside_range: usize,
}

impl Summary {
    pub fn new(
        raw_chunks: usize,
        index: &ChunkIndex,
        range: QuestionRange,
        records: &[QuestionRecord],
    ) -> Self {
        let mut summary = Summary {
            raw_chunks,
            overwrites: index.overwrites.len(),
            outside_range: index.outside(range).len(),
            ..Summary::default()
        };

        for record in records {
            if record.correct_answer.is_some() {
                summary.with_answer += 1;
            }
            match (index.get(record.question_no).is_some(), record.note) {
                (false, _) => summary.missing += 1,
                (true, None) => summary.extracted += 1,
                (true, Some(Note::ImageBased)) => summary.image_based += 1,
                (true, Some(Note::OptionParseError)) => summary.option_parse_errors += 1,
            }
        }

        summary
    }

    /// `(label, count)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, usize); 8] {
        [
            ("raw chunks", self.raw_chunks),
            ("extracted", self.extracted),
            ("image-based", self.image_based),
            ("option parse errors", self.option_parse_errors),
            ("missing from document", self.missing),
            ("with key answer", self.with_answer),
            ("duplicate overwrites", self.overwrites),
            ("outside range", self.outside_range),
        ]
    }
}
