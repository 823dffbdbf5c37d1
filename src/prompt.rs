// src/prompt.rs
//
// =============================================================================
// RANKLOG: INTERACTIVE PROMPTS (v 0.1 )
// =============================================================================
//
// Asking a human a question mid-run.
//
// Only possible in a single-process run with somebody at the keyboard (or in
// front of a dialog). The responder is picked by run mode at the boundary;
// the logger only sees the `Responder` trait.

use crate::error::{LogError, Result};
use crate::logger::RankLogger;
use crate::severity::Severity;
use std::io::{self, BufRead};

// ============================================================================
// 1. CHOICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Cancel,
    Ok,
}

impl Choice {
    pub fn token(self) -> &'static str {
        match self {
            Choice::Yes => "YES",
            Choice::No => "NO",
            Choice::Cancel => "CANCEL",
            Choice::Ok => "OK",
        }
    }

    pub fn is_affirmative(self) -> bool {
        matches!(self, Choice::Yes | Choice::Ok)
    }
}

/// Expands option tokens into ordered choices. `YES_NO` becomes `YES`, `NO`;
/// unknown tokens are ignored.
pub fn parse_choices(options: &[&str]) -> Result<Vec<Choice>> {
    let mut choices = Vec::new();
    for opt in options {
        match *opt {
            "YES_NO" => choices.extend([Choice::Yes, Choice::No]),
            "YES" => choices.push(Choice::Yes),
            "NO" => choices.push(Choice::No),
            "CANCEL" => choices.push(Choice::Cancel),
            "OK" => choices.push(Choice::Ok),
            _ => {}
        }
    }

    if choices.is_empty() {
        return Err(LogError::NoPromptChoices(
            options.iter().map(|s| s.to_string()).collect(),
        ));
    }
    Ok(choices)
}

// ============================================================================
// 2. RESPONDERS
// ============================================================================

pub trait Responder {
    /// Presents the question and returns the choice the user made.
    fn ask(
        &mut self,
        logger: &RankLogger,
        statement: &str,
        question: &str,
        choices: &[Choice],
    ) -> Result<Choice>;
}

/// Reads newline-terminated answers from a line source (stdin by default).
pub struct ConsoleResponder<R> {
    input: R,
}

impl ConsoleResponder<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> ConsoleResponder<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Responder for ConsoleResponder<R> {
    fn ask(
        &mut self,
        logger: &RankLogger,
        statement: &str,
        question: &str,
        choices: &[Choice],
    ) -> Result<Choice> {
        let mut tokens: Vec<&str> = choices.iter().map(|c| c.token()).collect();
        // Shorthand answers
        if choices.contains(&Choice::Yes) {
            tokens.push("Y");
        }
        if choices.contains(&Choice::No) {
            tokens.push("N");
        }

        loop {
            logger.emit(Severity::Prompt, statement, false, None)?;
            logger.emit(
                Severity::Prompt,
                &format!("{} ({}): ", question, tokens.join(", ")),
                false,
                None,
            )?;
            logger.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(LogError::PromptUnresolvable(
                    "input closed before a valid answer".into(),
                ));
            }

            let response = line.trim().to_uppercase();
            let picked = match response.as_str() {
                "Y" => choices.iter().find(|c| **c == Choice::Yes),
                "N" => choices.iter().find(|c| **c == Choice::No),
                other => choices.iter().find(|c| c.token() == other),
            };
            if let Some(choice) = picked {
                return Ok(*choice);
            }
        }
    }
}

/// Hands the question to an external dialog. The callback returns `None`
/// when the dialog is dismissed, which counts as a cancel.
pub struct DialogResponder {
    show: Box<dyn FnMut(&str, &[Choice]) -> Option<Choice> + Send>,
}

impl DialogResponder {
    pub fn new(show: impl FnMut(&str, &[Choice]) -> Option<Choice> + Send + 'static) -> Self {
        Self {
            show: Box::new(show),
        }
    }
}

impl Responder for DialogResponder {
    fn ask(
        &mut self,
        _logger: &RankLogger,
        statement: &str,
        question: &str,
        choices: &[Choice],
    ) -> Result<Choice> {
        let msg = format!("{}\n\n\n{}", statement, question);
        Ok((self.show)(&msg, choices).unwrap_or(Choice::Cancel))
    }
}

// ============================================================================
// 3. RUN MODE (boundary selection)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Nobody is watching; prompts are unresolvable.
    Batch,
    Interactive,
    Gui,
}

impl RunMode {
    /// Picks the responder for this mode. GUI runs must supply their dialog.
    pub fn responder(self, dialog: Option<DialogResponder>) -> Option<Box<dyn Responder>> {
        match self {
            RunMode::Batch => None,
            RunMode::Interactive => Some(Box::new(ConsoleResponder::stdin()) as Box<dyn Responder>),
            RunMode::Gui => dialog.map(|d| Box::new(d) as Box<dyn Responder>),
        }
    }
}

// ============================================================================
// 4. LOGGER ENTRY POINT
// ============================================================================

impl RankLogger {
    /// Asks the user a question. Returns true for `YES`/`Y`/`OK`, false for
    /// `NO`/`N`, and `PromptCancelled` for `CANCEL`.
    pub fn prompt(
        &self,
        responder: Option<&mut dyn Responder>,
        statement: &str,
        question: &str,
        options: &[&str],
    ) -> Result<bool> {
        let id = self.identity();
        if id.is_distributed() {
            return Err(LogError::PromptUnresolvable(format!(
                "rank {} of a {}-process run has no one to answer",
                id.rank, id.group_size
            )));
        }
        let Some(responder) = responder else {
            return Err(LogError::PromptUnresolvable(
                "no interactive responder in batch mode".into(),
            ));
        };

        let choices = parse_choices(options)?;
        match responder.ask(self, statement, question, &choices)? {
            Choice::Cancel => Err(LogError::PromptCancelled(format!(
                "manual cancellation of prompt: {}",
                question
            ))),
            choice => Ok(choice.is_affirmative()),
        }
    }
}
