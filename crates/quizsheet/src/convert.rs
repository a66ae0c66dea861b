use std::path::PathBuf;

use colored::Colorize;
use pdf::Document;
use quizsheet_core::record::{build_records, deduplicate, QuestionRange};
use quizsheet_core::segment::{NumberedLinePattern, RawChunk};
use quizsheet_core::summary::Summary;
use quizsheet_core::table::render_table;

use crate::columns::{extract_chunks, page_progress};
use crate::key::load_answer_key;
use crate::prelude::{println, *};

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct Options {
    pub pdf: PathBuf,
    pub key: PathBuf,
    pub output: PathBuf,
    pub range: QuestionRange,
    pub boundary: NumberedLinePattern,
    pub summary: bool,
}

/// Convert the PDF to the question sheet.
///
/// The PDF must exist; that is checked before anything else is touched.
pub fn run(options: &Options) -> Result<Summary> {
    if !options.pdf.exists() {
        return Err(Error::PdfNotFound(options.pdf.clone()).into());
    }

    let key = load_answer_key(&options.key);

    let doc = Document::open(&options.pdf).map_err(|source| Error::PdfUnreadable {
        path: options.pdf.clone(),
        source,
    })?;
    let progress = page_progress(doc.page_count())?;
    let located = extract_chunks(&doc, &options.boundary, &progress)?;
    println!(
        "Extracted {} raw chunks",
        located.len().to_string().bold()
    );

    let chunks: Vec<RawChunk> = located.iter().map(|l| l.chunk.clone()).collect();
    let index = deduplicate(&chunks);
    for overwrite in &index.overwrites {
        log::warn!(
            "question {} from {} overwrites the one from {}",
            overwrite.question_no,
            located[overwrite.kept].location(),
            located[overwrite.discarded].location()
        );
    }
    for question_no in index.outside(options.range) {
        log::debug!("question {question_no} is outside {}", options.range);
    }

    let records = build_records(&index, &key, options.range);
    let bytes = render_table(&records)?;
    std::fs::write(&options.output, bytes)
        .with_context(|| f!("failed to write '{}'", options.output.display()))?;

    println!(
        "{} wrote '{}' with {} rows",
        "Done:".green().bold(),
        options.output.display(),
        records.len()
    );

    let summary = Summary::new(chunks.len(), &index, options.range, &records);
    if options.summary {
        crate::summary::print_summary(&summary);
    }

    Ok(summary)
}
