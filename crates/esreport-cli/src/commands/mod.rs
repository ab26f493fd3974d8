pub mod configure;
pub mod tidy;

use anyhow::Result;
use std::io::{BufRead, Write};

/// Ask a `[y/N]` question on stdout, reading the answer from stdin
pub fn confirm(question: &str) -> Result<bool> {
    confirm_with(question, &mut std::io::stdin().lock(), &mut std::io::stdout())
}

fn confirm_with<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
