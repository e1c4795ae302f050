//! Operator confirmation capability.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Answers yes without asking (`--yes`).
pub struct AlwaysYes;

impl Confirm for AlwaysYes {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Answers no without asking.
pub struct AlwaysNo;

impl Confirm for AlwaysNo {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Prompts on stderr and reads one line from stdin. Defaults to no.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        let stdin = std::io::stdin();
        let mut stderr = std::io::stderr();
        ask(question, &mut stdin.lock(), &mut stderr)
    }
}

fn ask<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{question} [y/N]: ").context("write prompt")?;
    output.flush().context("flush prompt")?;
    let mut line = String::new();
    input.read_line(&mut line).context("read answer")?;
    Ok(parse_answer(&line))
}

fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
