//! Final run summary

use std::io::{self, Write};
use console::style;

use crate::parallel::BatchOutcome;

pub const NO_IMAGES_MESSAGE: &str = "No images found.";

/// How a summary line is highlighted on a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Notice,
    Count,
    Failure,
}

fn summary_lines(outcome: &BatchOutcome) -> Vec<(Tone, String)> {
    if outcome.completed == 0 {
        return vec![(Tone::Notice, NO_IMAGES_MESSAGE.to_string())];
    }

    let error_tone = if outcome.errors.is_empty() { Tone::Count } else { Tone::Failure };
    let mut lines = vec![
        (Tone::Count, format!("Processed: {}", outcome.completed)),
        (error_tone, format!("Errors: {}", outcome.errors.len())),
    ];

    lines.extend(outcome.errors.iter().map(|error| {
        let message = error.error.as_deref().unwrap_or("unknown error");
        (Tone::Failure, format!("  {}: {}", error.file.display(), message))
    }));
    lines
}

/// Write the plain-text summary
pub fn report<W: Write>(outcome: &BatchOutcome, out: &mut W) -> io::Result<()> {
    for (_, line) in summary_lines(outcome) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Print the summary to stdout, coloured when stdout is a terminal
pub fn print_summary(outcome: &BatchOutcome) {
    for (tone, line) in summary_lines(outcome) {
        let styled = match tone {
            Tone::Notice => style(line).yellow(),
            Tone::Count => style(line).green(),
            Tone::Failure => style(line).red(),
        };
        println!("{}", styled);
    }
}
