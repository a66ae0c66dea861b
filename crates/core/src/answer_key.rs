//! Parsing of the externally supplied answer key.
//!
//! The key is a CSV table with (at least) the columns `question_no` and
//! `correct_answer`, both integers. Parsing is all-or-nothing: a single row
//! that does not coerce fails the whole table, and the caller decides how
//! to degrade. Rows whose question number is an integer but cannot be a
//! question (negative or beyond `u32`) are skipped.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

pub const QUESTION_NO_COLUMN: &str = "question_no";
pub const CORRECT_ANSWER_COLUMN: &str = "correct_answer";

#[derive(Debug, Error)]
pub enum AnswerKeyError {
    #[error("cannot read answer key header: {0}")]
    Header(#[source] csv::Error),

    #[error("answer key is missing the `{0}` column")]
    MissingColumn(&'static str),

    #[error("answer key row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Deserialize)]
struct KeyRow {
    question_no: i64,
    correct_answer: i64,
}

/// Question number → correct option index.
///
/// Values are not range-checked; whatever the table says passes through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey(BTreeMap<u32, i64>);

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same question overwrite earlier ones.
    pub fn insert(&mut self, question_no: u32, correct_answer: i64) {
        self.0.insert(question_no, correct_answer);
    }

    pub fn get(&self, question_no: u32) -> Option<i64> {
        self.0.get(&question_no).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i64)> + '_ {
        self.0.iter().map(|(q, a)| (*q, *a))
    }
}

impl FromIterator<(u32, i64)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (u32, i64)>>(iter: I) -> Self {
        let mut key = AnswerKey::new();
        for (question_no, correct_answer) in iter {
            key.insert(question_no, correct_answer);
        }
        key
    }
}

/// Parse the text of an answer-key CSV.
///
/// A leading byte-order marker and whitespace around fields are tolerated.
/// Columns other than the two required ones are ignored.
pub fn parse_answer_key(text: &str) -> Result<AnswerKey, AnswerKeyError> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(AnswerKeyError::Header)?;
    for column in [QUESTION_NO_COLUMN, CORRECT_ANSWER_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(AnswerKeyError::MissingColumn(column));
        }
    }

    let mut key = AnswerKey::new();
    for (idx, row) in reader.deserialize::<KeyRow>().enumerate() {
        let row = row.map_err(|source| AnswerKeyError::Row {
            row: idx + 1,
            source,
        })?;
        let Ok(question_no) = u32::try_from(row.question_no) else {
            continue;
        };
        key.insert(question_no, row.correct_answer);
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_key() {
        let key = parse_answer_key("question_no,correct_answer\n7,2\n8,4\n").unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key.get(7), Some(2));
        assert_eq!(key.get(8), Some(4));
        assert_eq!(key.get(9), None);
    }

    #[test]
    fn test_duplicate_rows_last_wins() {
        let key = parse_answer_key("question_no,correct_answer\n3,1\n3,4\n").unwrap();
        assert_eq!(key.len(), 1);
        assert_eq!(key.get(3), Some(4));
    }

    #[test]
    fn test_out_of_range_answer_passes_through() {
        let key = parse_answer_key("question_no,correct_answer\n1,9\n2,-1\n").unwrap();
        assert_eq!(key.get(1), Some(9));
        assert_eq!(key.get(2), Some(-1));
    }

    #[test]
    fn test_bom_whitespace_and_extra_columns() {
        let text = "\u{FEFF}subject, question_no , correct_answer\n안전, 12 , 3 \n";
        let key = parse_answer_key(text).unwrap();
        assert_eq!(key.get(12), Some(3));
    }

    #[test]
    fn test_reordered_columns() {
        let key = parse_answer_key("correct_answer,question_no\n2,40\n").unwrap();
        assert_eq!(key.get(40), Some(2));
    }

    #[test]
    fn test_header_only_is_empty_key() {
        let key = parse_answer_key("question_no,correct_answer\n").unwrap();
        assert!(key.is_empty());
    }

    #[test]
    fn test_missing_column_is_error() {
        let err = parse_answer_key("question_no,answer\n1,2\n").unwrap_err();
        assert!(matches!(
            err,
            AnswerKeyError::MissingColumn(CORRECT_ANSWER_COLUMN)
        ));
    }

    #[test]
    fn test_empty_text_is_error() {
        assert!(matches!(
            parse_answer_key(""),
            Err(AnswerKeyError::MissingColumn(QUESTION_NO_COLUMN))
        ));
    }

    #[test]
    fn test_one_bad_row_fails_everything() {
        let err = parse_answer_key("question_no,correct_answer\n1,2\n2,two\n3,4\n").unwrap_err();
        match err {
            AnswerKeyError::Row { row, .. } => assert_eq!(row, 2),
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn test_question_numbers_outside_u32_are_skipped() {
        let text = "question_no,correct_answer\n-1,2\n4294967296,3\n5,1\n";
        let key = parse_answer_key(text).unwrap();
        assert_eq!(key.iter().collect::<Vec<_>>(), vec![(5, 1)]);
    }

    #[test]
    fn test_blank_cell_is_error() {
        assert!(parse_answer_key("question_no,correct_answer\n5,\n").is_err());
    }

    #[test]
    fn test_from_iterator() {
        let key: AnswerKey = [(1, 3), (2, 1), (1, 4)].into_iter().collect();
        assert_eq!(key.iter().collect::<Vec<_>>(), vec![(1, 4), (2, 1)]);
    }
}
