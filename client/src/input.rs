//! Guess and prompt input from the terminal

use shared::LetterMask;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("please enter a single letter")]
    NotALetter,
    #[error("you already guessed '{0}'")]
    AlreadyGuessed(char),
}

/// Validates one line as a guess: exactly one ASCII letter that has not been
/// guessed yet. Returns the letter upper-cased.
pub fn parse_guess(line: &str, guessed: &LetterMask) -> Result<char, InputError> {
    let mut chars = line.trim().chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => letter.to_ascii_uppercase(),
        _ => return Err(InputError::NotALetter),
    };

    if guessed.contains(letter) {
        return Err(InputError::AlreadyGuessed(letter));
    }
    Ok(letter)
}

/// Parses a yes/no answer. `None` means the line was neither.
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Line reader that prompts until it gets a valid answer.
pub struct InputManager<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> InputManager<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Reads lines until one is a valid guess. `None` once input is closed.
    pub async fn read_guess<W: io::Write>(
        &mut self,
        guessed: &LetterMask,
        out: &mut W,
    ) -> io::Result<Option<char>> {
        loop {
            write!(out, "Your guess: ")?;
            out.flush()?;

            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            match parse_guess(&line, guessed) {
                Ok(letter) => return Ok(Some(letter)),
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
    }

    /// Asks a yes/no question until answered. `None` once input is closed.
    pub async fn read_answer<W: io::Write>(
        &mut self,
        question: &str,
        out: &mut W,
    ) -> io::Result<Option<bool>> {
        loop {
            write!(out, "{} [y/n] ", question)?;
            out.flush()?;

            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            match parse_answer(&line) {
                Some(answer) => return Ok(Some(answer)),
                None => writeln!(out, "please answer y or n")?,
            }
        }
    }
}
