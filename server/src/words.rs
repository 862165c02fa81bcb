//! Candidate words served to sessions.
//!
//! Words are read one per line. Characters other than ASCII letters and
//! spaces are dropped and the remainder is upper-cased, so every stored word
//! can be revealed letter by letter.

use log::{debug, warn};
use rand::seq::SliceRandom;
use shared::WORD_LENGTH;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WordSourceError {
    #[error("failed to read word list: {0}")]
    Io(#[from] io::Error),
    #[error("word list contains no usable words")]
    Empty,
    #[error("invalid word {0:?}")]
    InvalidWord(String),
}

/// Ordered, non-empty list of upper-case words.
#[derive(Debug, Clone)]
pub struct WordSource {
    words: Vec<String>,
}

impl WordSource {
    /// Wraps words that are already filtered. Fails on an empty list or on
    /// any word that `sanitize_word` would change.
    pub fn new(words: Vec<String>) -> Result<Self, WordSourceError> {
        if words.is_empty() {
            return Err(WordSourceError::Empty);
        }
        if let Some(bad) = words
            .iter()
            .find(|word| sanitize_word(word).as_deref() != Some(word.as_str()))
        {
            return Err(WordSourceError::InvalidWord(bad.clone()));
        }
        Ok(Self { words })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn shuffle(&mut self) {
        self.words.shuffle(&mut rand::thread_rng());
    }
}

/// Filters one input line down to a storable word.
///
/// Returns `None` when nothing but spaces is left or when the word would not
/// fit the slot's word buffer.
pub fn sanitize_word(line: &str) -> Option<String> {
    let filtered: String = line
        .chars()
        .filter(|ch| ch.is_ascii_alphabetic() || *ch == ' ')
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    let word = filtered.trim();

    if word.is_empty() || word.len() >= WORD_LENGTH {
        return None;
    }
    Some(word.to_string())
}

/// Reads a word list, one word per line.
pub fn load_words<R: BufRead>(reader: R) -> Result<WordSource, WordSourceError> {
    let mut words = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        match sanitize_word(&line) {
            Some(word) => words.push(word),
            None if line.trim().is_empty() => {}
            None => warn!("Skipping line {}: {:?} is not a usable word", number + 1, line),
        }
    }

    debug!("Read {} words", words.len());
    WordSource::new(words)
}

pub fn load_words_from_path(path: impl AsRef<Path>) -> Result<WordSource, WordSourceError> {
    let file = File::open(path)?;
    load_words(BufReader::new(file))
}
