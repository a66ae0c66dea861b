//! Splitting a question chunk into its stem and four options.

use crate::record::{Note, QuestionRecord};

/// Circled digits one to four, U+2460..=U+2463.
pub const OPTION_MARKERS: [char; 4] = ['①', '②', '③', '④'];

pub fn is_option_marker(c: char) -> bool {
    OPTION_MARKERS.contains(&c)
}

/// Join the chunk's lines with spaces and trim the ends.
pub fn normalize_chunk(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

/// Byte offsets of every option marker, in scan order.
pub fn marker_positions(text: &str) -> Vec<usize> {
    text.char_indices()
        .filter(|(_, c)| is_option_marker(*c))
        .map(|(idx, _)| idx)
        .collect()
}

/// Parse one chunk into a record. `correct_answer` is left unset.
///
/// Any four markers in scan order delimit options one to four, whichever
/// digits they actually show. Markers after the fourth are part of option
/// four's text.
pub fn parse_chunk(question_no: u32, raw: &str) -> QuestionRecord {
    let mut record = QuestionRecord::empty(question_no);
    let text = normalize_chunk(raw);

    let positions = marker_positions(&text);
    if positions.len() < OPTION_MARKERS.len() {
        record.note = Some(Note::ImageBased);
        return record;
    }

    let Some(stem) = text.get(..positions[0]) else {
        record.note = Some(Note::OptionParseError);
        return record;
    };
    record.question_text = stem.trim().to_string();

    match split_options(&text, &positions[..4]) {
        Some(options) => record.options = options,
        None => record.note = Some(Note::OptionParseError),
    }

    record
}

fn split_options(text: &str, markers: &[usize]) -> Option<[String; 4]> {
    let mut options: [String; 4] = Default::default();
    for (k, option) in options.iter_mut().enumerate() {
        let marker = *markers.get(k)?;
        let start = marker + text.get(marker..)?.chars().next()?.len_utf8();
        let end = markers.get(k + 1).copied().unwrap_or(text.len());
        *option = text.get(start..end)?.trim().to_string();
    }
    Some(options)
}
