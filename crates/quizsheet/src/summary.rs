use colored::Colorize;
use prettytable::row;
use quizsheet_core::summary::Summary;

use crate::prelude::{println, *};

pub fn summary_table(summary: &Summary) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(row!["Status".bold().cyan(), "Count".bold().cyan()]);

    for (label, count) in summary.rows() {
        let count = if count == 0 {
            count.to_string().dimmed()
        } else {
            count.to_string().bright_yellow()
        };
        table.add_row(row![label, count]);
    }

    table
}

pub fn print_summary(summary: &Summary) {
    println!();
    summary_table(summary).printstd();
}
