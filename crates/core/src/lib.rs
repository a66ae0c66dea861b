//! Core library for quizsheet
//!
//! This crate is the **Functional Core** of quizsheet: every step between
//! "text came out of the PDF" and "bytes go into the output file" lives
//! here as a pure function. Reading the PDF, reading and writing files,
//! logging and console output belong to the `quizsheet` binary.
//!
//! # Pipeline
//!
//! ```text
//! answer key text ──► answer_key::parse_answer_key ──────────────┐
//!                                                                ▼
//! region text ──► segment::segment_region ──► record::deduplicate ──► record::build_records ──► table::render_table
//!                                                                ▲
//!                                             chunk::parse_chunk ┘
//! ```
//!
//! # Modules
//!
//! - [`answer_key`]: question number → correct option mapping
//! - [`segment`]: boundary strategies and region segmentation
//! - [`chunk`]: stem and option splitting on circled-digit markers
//! - [`record`]: output records, question range, last-wins deduplication
//! - [`table`]: CSV rendering with a UTF-8 byte-order marker
//! - [`summary`]: per-run counts
//!
//! # Example
//!
//! ```rust
//! use quizsheet_core::answer_key::parse_answer_key;
//! use quizsheet_core::record::{build_records, deduplicate, QuestionRange};
//! use quizsheet_core::segment::{segment_region, NumberedLinePattern};
//!
//! let key = parse_answer_key("question_no,correct_answer\n1,3\n").unwrap();
//! let seg = segment_region("1. 질문 ① 가 ② 나 ③ 다 ④ 라", &NumberedLinePattern::strict());
//! let records = build_records(&deduplicate(&seg.chunks), &key, QuestionRange::default());
//!
//! assert_eq!(records.len(), 100);
//! assert_eq!(records[0].options[2], "다");
//! assert_eq!(records[0].correct_answer, Some(3));
//! ```

pub mod answer_key;
pub mod chunk;
pub mod record;
pub mod segment;
pub mod summary;
pub mod table;
