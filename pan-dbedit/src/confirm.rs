use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};

/// Ask a yes/no question before the run touches the device. A terminal gets
/// a `dialoguer` prompt; piped input is read line by line until it holds a
/// yes or no. End of input counts as no.
pub fn confirm(prompt: &str) -> Result<bool> {
    if io::stdin().is_terminal() && io::stderr().is_terminal() {
        return dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("failed to read confirmation");
    }

    let mut stderr = io::stderr();
    write!(stderr, "{prompt} <yes/no> ")?;
    stderr.flush()?;
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read confirmation")?;
        if let Some(answer) = parse_answer(&line) {
            return Ok(answer);
        }
        write!(stderr, "Continue? <yes/no> ")?;
        stderr.flush()?;
    }
    Ok(false)
}

fn parse_answer(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_are_case_insensitive() {
        assert_eq!(parse_answer("Y"), Some(true));
        assert_eq!(parse_answer(" yes\r"), Some(true));
        assert_eq!(parse_answer("NO"), Some(false));
        assert_eq!(parse_answer("n"), Some(false));
    }

    #[test]
    fn anything_else_asks_again() {
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("maybe"), None);
    }
}
