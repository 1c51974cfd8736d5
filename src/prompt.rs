// src/prompt.rs

//! Yes/no questions asked during the migration

use crate::error::{Error, Result};
#[cfg(any(test, feature = "testing"))]
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

/// Source of answers to yes/no questions
pub trait Prompter {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;
}

/// Interpret a typed answer; empty input takes the default
pub fn parse_answer(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Asks on the controlling terminal
///
/// Without a terminal on stdin every question takes its default.
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    /// Interactive when stdin is a terminal
    pub fn detect() -> Self {
        Self::new(io::stdin().is_terminal())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let mut stdout = io::stdout();

        if !self.interactive {
            println!("{} {} (non-interactive, using default)", question, hint);
            return Ok(default);
        }

        loop {
            write!(stdout, "{} {}: ", question, hint).map_err(Error::Terminal)?;
            stdout.flush().map_err(Error::Terminal)?;

            let mut input = String::new();
            let read = io::stdin().lock().read_line(&mut input).map_err(Error::Terminal)?;
            // EOF
            if read == 0 {
                return Ok(default);
            }
            match parse_answer(&input, default) {
                Some(answer) => return Ok(answer),
                None => println!("Please answer 'y' or 'n'."),
            }
        }
    }
}

#[cfg(any(test, feature = "testing"))]
/// Replays prepared answers, then falls back to each question's default
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<bool>,
    asked: Vec<String>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

#[cfg(any(test, feature = "testing"))]
impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or(default))
    }
}
