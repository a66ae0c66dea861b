use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("PDF file not found at '{}'. Check the path.", .0.display())]
    PdfNotFound(PathBuf),

    #[error("Cannot read PDF '{}': {source}", path.display())]
    PdfUnreadable {
        path: PathBuf,
        #[source]
        source: pdf::PdfError,
    },
}
