//! Per-client game sessions and the table that tracks them
//!
//! This module handles the server-side state of every connected client:
//! - Session lifecycle (created on connect, removed on disconnect or exhaustion)
//! - Word assignment bookkeeping and the guess/mistake rules of a single game
//! - Win/loss tallies that survive across games of the same session
//!
//! Sessions are only ever touched by the dispatch loop, one transaction at a
//! time, so nothing here is synchronized.

use log::info;
use shared::{is_revealed, reveal, LetterMask, Outcome, Response, WordBuffer, MAX_MISTAKES};
use std::collections::HashMap;

/// Game state of one connected client
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier assigned during the connect handshake
    pub id: u32,
    /// Wrong guesses in the current game, 0..=9
    pub mistakes: u32,
    /// Number of words this session has already been given
    pub used_words: usize,
    pub wins: u32,
    pub losses: u32,
    /// Secret word of the current game, if one has been started
    pub current_word: Option<String>,
    pub guessed: LetterMask,
    pub outcome: Outcome,
}

impl Session {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            mistakes: 0,
            used_words: 0,
            wins: 0,
            losses: 0,
            current_word: None,
            guessed: LetterMask::new(),
            outcome: Outcome::InProgress,
        }
    }

    /// Starts a new game on `word`, keeping the win/loss tally.
    pub fn start_game(&mut self, word: &str) {
        self.mistakes = 0;
        self.guessed.clear();
        self.current_word = Some(word.to_string());
        self.outcome = Outcome::InProgress;
        self.used_words += 1;
    }

    /// True while a started game still accepts guesses.
    pub fn in_game(&self) -> bool {
        self.current_word.is_some() && self.outcome == Outcome::InProgress
    }

    /// Applies one guess and returns the resulting outcome.
    ///
    /// A letter that was already guessed changes nothing. A new wrong letter
    /// costs one mistake and the ninth mistake loses the game. Returns `None`
    /// when no game is in progress.
    pub fn guess(&mut self, letter: char) -> Option<Outcome> {
        if !self.in_game() {
            return None;
        }
        let word = self.current_word.as_deref()?;
        let letter = letter.to_ascii_uppercase();

        if !self.guessed.insert(letter) {
            return Some(self.outcome);
        }

        if word.contains(letter) {
            if is_revealed(word, &self.guessed) {
                self.outcome = Outcome::Won;
                self.wins += 1;
            }
        } else {
            self.mistakes += 1;
            if self.mistakes >= MAX_MISTAKES {
                self.outcome = Outcome::Lost;
                self.losses += 1;
            }
        }

        Some(self.outcome)
    }

    /// Display form of the current word. A lost game shows the full word.
    pub fn revealed(&self) -> String {
        match self.current_word.as_deref() {
            Some(word) if self.outcome == Outcome::Lost => word.to_string(),
            Some(word) => reveal(word, &self.guessed),
            None => String::new(),
        }
    }

    /// Snapshot of this session in response form.
    pub fn response(&self) -> Response {
        Response {
            client_id: self.id,
            mistake_count: self.mistakes,
            wins: self.wins,
            losses: self.losses,
            guessed: self.guessed,
            revealed: WordBuffer::from_text(&self.revealed()),
            outcome: self.outcome,
        }
    }
}

/// Tracks every connected session by id
///
/// Ids start at 1 and are never reused while the server runs.
pub struct SessionTable {
    sessions: HashMap<u32, Session>,
    next_session_id: u32,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
        }
    }

    /// Creates a session with the next unused id and returns that id.
    pub fn add_session(&mut self) -> u32 {
        let session_id = self.next_session_id;
        self.next_session_id += 1;

        info!("Client {} connected", session_id);
        self.sessions.insert(session_id, Session::new(session_id));

        session_id
    }

    /// Removes a session. Returns false if it was already gone.
    pub fn remove_session(&mut self, session_id: &u32) -> bool {
        if let Some(session) = self.sessions.remove(session_id) {
            info!(
                "Client {} disconnected ({} wins, {} losses)",
                session.id, session.wins, session.losses
            );
            true
        } else {
            false
        }
    }

    pub fn get(&self, session_id: &u32) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn get_mut(&mut self, session_id: &u32) -> Option<&mut Session> {
        self.sessions.get_mut(session_id)
    }

    pub fn contains(&self, session_id: &u32) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Drops every session, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
