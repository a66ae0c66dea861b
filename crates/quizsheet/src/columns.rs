use indicatif::{ProgressBar, ProgressStyle};
use pdf::{ColumnSide, Document};
use quizsheet_core::segment::{segment_region, BoundaryStrategy, RawChunk, Segmentation};

use crate::prelude::*;

/// A chunk together with where in the document it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedChunk {
    pub chunk: RawChunk,
    pub page: u32,
    pub side: ColumnSide,
}

impl LocatedChunk {
    pub fn location(&self) -> String {
        f!("page {} {} column", self.page, self.side)
    }
}

/// A page progress bar on stderr. Hidden when stderr is not a terminal.
pub fn page_progress(pages: usize) -> Result<ProgressBar> {
    let progress = ProgressBar::new(pages as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] page {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(progress)
}

/// Problems worth reporting for one non-empty column region.
fn region_warnings(
    page: u32,
    side: ColumnSide,
    segmentation: &Segmentation,
    pattern: &str,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if segmentation.boundaries == 0 {
        warnings.push(f!(
            "page {page} {side} column has text but no question boundary matched the {pattern} pattern"
        ));
    }
    for number in &segmentation.unparseable {
        warnings.push(f!(
            "page {page} {side} column: dropped boundary with unparseable number {number:?}"
        ));
    }
    warnings
}

/// Extract every question chunk from `doc`.
///
/// Pages are read in ascending order and, within a page, the left column
/// before the right one. Columns with no text are skipped.
pub fn extract_chunks(
    doc: &Document,
    strategy: &dyn BoundaryStrategy,
    progress: &ProgressBar,
) -> Result<Vec<LocatedChunk>> {
    let mut located = Vec::new();

    for page in doc.pages() {
        let page = page?;
        progress.set_message(f!("{} chunks", located.len()));

        for (side, region) in page.columns() {
            let text = page.region_text(&region);
            log::debug!(
                "page {} {side} column: {} characters",
                page.number,
                text.chars().count()
            );
            if text.trim().is_empty() {
                continue;
            }

            let segmentation = segment_region(&text, strategy);
            log::debug!(
                "page {} {side} column: {} boundaries ({})",
                page.number,
                segmentation.boundaries,
                strategy.name()
            );
            for warning in region_warnings(page.number, side, &segmentation, strategy.name()) {
                log::warn!("{warning}");
            }

            located.extend(segmentation.chunks.into_iter().map(|chunk| LocatedChunk {
                chunk,
                page: page.number,
                side,
            }));
        }

        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(located)
}
