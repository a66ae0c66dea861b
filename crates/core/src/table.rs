//! CSV rendering of the final records.

use std::io::Write;

use crate::record::QuestionRecord;

/// Output columns, in order.
pub const COLUMNS: [&str; 8] = [
    "question_no",
    "question_text",
    "option_1",
    "option_2",
    "option_3",
    "option_4",
    "correct_answer",
    "note",
];

/// Byte-order marker written before the header so spreadsheet tools pick
/// UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write the BOM, the header and one line per record. Lines end in `\n`
/// and fields are quoted only when they need to be.
pub fn write_table<W: Write>(mut out: W, records: &[QuestionRecord]) -> Result<(), csv::Error> {
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);

    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

/// [`write_table`] into a byte buffer.
pub fn render_table(records: &[QuestionRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut buffer = Vec::new();
    write_table(&mut buffer, records)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Note;

    fn sample() -> Vec<QuestionRecord> {
        vec![
            QuestionRecord {
                question_no: 1,
                question_text: "소음, 진동 중 옳은 것은?".into(),
                options: ["가", "나 \"인용\"", "다", "라"].map(String::from),
                correct_answer: Some(3),
                note: None,
            },
            QuestionRecord::not_extracted(2),
        ]
    }

    #[test]
    fn test_starts_with_bom_and_header() {
        let bytes = render_table(&[]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(
            text,
            "question_no,question_text,option_1,option_2,option_3,option_4,correct_answer,note\n"
        );
    }

    #[test]
    fn test_quoting_only_when_needed() {
        let bytes = render_table(&sample()).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,\"소음, 진동 중 옳은 것은?\",가,\"나 \"\"인용\"\"\",다,라,3,");
        assert_eq!(lines[2], "2,,,,,,,\"image-based, text not extractable\"");
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(render_table(&sample()).unwrap(), render_table(&sample()).unwrap());
    }

    #[test]
    fn test_parse_error_note_is_rendered() {
        let record = QuestionRecord {
            note: Some(Note::OptionParseError),
            ..QuestionRecord::empty(3)
        };
        let bytes = render_table(&[record]).unwrap();
        assert!(bytes.ends_with(b"3,,,,,,,option text parse error\n"));
    }
}
