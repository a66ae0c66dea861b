use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use quizsheet_core::record::QuestionRange;
use quizsheet_core::segment::NumberedLinePattern;

use crate::prelude::{println, *};

mod columns;
mod convert;
mod error;
mod key;
mod prelude;
mod summary;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract numbered multiple-choice questions from a two-column exam PDF, merge them \
                  with an answer key and write one CSV row per question"
)]
pub struct App {
    /// Exam PDF to read
    #[clap(long, env = "QUIZSHEET_PDF", default_value = "test.pdf")]
    pdf: PathBuf,

    /// Answer key CSV with `question_no` and `correct_answer` columns
    #[clap(long, env = "QUIZSHEET_KEY", default_value = "answer_key.csv")]
    key: PathBuf,

    /// Output CSV
    #[clap(
        short,
        long,
        env = "QUIZSHEET_OUTPUT",
        default_value = "final_questions_with_key.csv"
    )]
    output: PathBuf,

    /// First question number to emit
    #[clap(long, env = "QUIZSHEET_FIRST", default_value_t = 1)]
    first: u32,

    /// Last question number to emit
    #[clap(long, env = "QUIZSHEET_LAST", default_value_t = 100)]
    last: u32,

    /// How question boundaries are recognised
    #[clap(long, env = "QUIZSHEET_BOUNDARY", value_enum, default_value_t = Boundary::Strict)]
    boundary: Boundary,

    /// Custom boundary regex; group 1 must capture the question number. Overrides --boundary
    #[clap(long, env = "QUIZSHEET_BOUNDARY_PATTERN")]
    boundary_pattern: Option<String>,

    /// Print a per-status table after the run
    #[clap(long, env = "QUIZSHEET_SUMMARY", default_value = "false")]
    summary: bool,

    /// Whether to display additional information.
    #[clap(long, env = "QUIZSHEET_VERBOSE", default_value = "false")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Boundary {
    /// `12. ` with whitespace after the period
    Strict,
    /// Also `12.Text` with no whitespace
    Lenient,
}

impl App {
    fn options(&self) -> Result<convert::Options> {
        let range = match QuestionRange::new(self.first, self.last) {
            Ok(range) => range,
            Err(err) => App::command()
                .error(clap::error::ErrorKind::ArgumentConflict, err)
                .exit(),
        };

        let boundary = match (&self.boundary_pattern, self.boundary) {
            (Some(pattern), _) => NumberedLinePattern::custom(pattern)?,
            (None, Boundary::Strict) => NumberedLinePattern::strict(),
            (None, Boundary::Lenient) => NumberedLinePattern::lenient(),
        };

        Ok(convert::Options {
            pdf: self.pdf.clone(),
            key: self.key.clone(),
            output: self.output.clone(),
            range,
            boundary,
            summary: self.summary,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();
    let options = app.options()?;

    if app.verbose {
        println!("pdf:      {}", options.pdf.display());
        println!("key:      {}", options.key.display());
        println!("output:   {}", options.output.display());
        println!("range:    {}", options.range);
        println!("boundary: {}", options.boundary.as_str());
    }

    match convert::run(&options) {
        Err(err) if matches!(err.downcast_ref::<Error>(), Some(Error::PdfNotFound(_))) => {
            println!("[ERROR] {err}");
            std::process::exit(1);
        }
        result => result.map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let app = App::try_parse_from(["quizsheet"]).unwrap();
        let options = app.options().unwrap();
        assert_eq!(options.pdf, PathBuf::from("test.pdf"));
        assert_eq!(options.key, PathBuf::from("answer_key.csv"));
        assert_eq!(options.output, PathBuf::from("final_questions_with_key.csv"));
        assert_eq!(options.range, QuestionRange::default());
        assert_eq!(options.boundary.as_str(), quizsheet_core::segment::STRICT_PATTERN);
        assert!(!options.summary);
    }

    #[test]
    fn test_lenient_and_custom_boundary() {
        let app = App::try_parse_from(["quizsheet", "--boundary", "lenient"]).unwrap();
        assert_eq!(
            app.options().unwrap().boundary.as_str(),
            quizsheet_core::segment::LENIENT_PATTERN
        );

        let app = App::try_parse_from([
            "quizsheet",
            "--boundary",
            "lenient",
            "--boundary-pattern",
            r"(?m)^Q(\d+)\)",
        ])
        .unwrap();
        assert_eq!(app.options().unwrap().boundary.as_str(), r"(?m)^Q(\d+)\)");
    }

    #[test]
    fn test_invalid_custom_boundary_is_error() {
        let app = App::try_parse_from(["quizsheet", "--boundary-pattern", r"^\d+\."]).unwrap();
        assert!(app.options().is_err());
    }

    #[test]
    fn test_range_flags() {
        let app = App::try_parse_from(["quizsheet", "--first", "11", "--last", "20", "-o", "out.csv"])
            .unwrap();
        let options = app.options().unwrap();
        assert_eq!(options.range.len(), 10);
        assert_eq!(options.output, PathBuf::from("out.csv"));
    }

    #[test]
    fn test_cli_definition() {
        App::command().debug_assert();
    }
}
