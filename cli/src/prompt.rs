use std::io::{BufRead, Write};

use winsweep_core::error::CliError;

pub const CONFIRM_RUN: &str = "The selected operations will modify files, caches, and/or the registry. Changes cannot be undone. Continue?";

/// Ask a yes/no question on the terminal. `assume_yes` answers without
/// asking; a non-interactive stdin without it is refused.
pub fn confirm(question: &str, assume_yes: bool) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::Prompt(
            "stdin is not a terminal; pass --yes to run unattended".to_string(),
        ));
    }
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    ask(&mut stdin.lock(), &mut stdout, question).map_err(|e| CliError::Prompt(e.to_string()))
}

/// Write `question [y/N]` and read one answer. Anything but y/yes is no.
pub fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> std::io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Question shown when watched applications are running.
pub fn close_apps_question(names: &[String]) -> String {
    format!(
        "These apps are running and may lock files: {}. Close them now?",
        names.join(", ")
    )
}
