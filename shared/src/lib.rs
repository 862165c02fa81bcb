//! Types shared by the hangman server and its clients.
//!
//! Every request and every response travels through one fixed-size
//! [`TransactionSlot`]. The [`handoff`] module owns the slot together with the
//! three semaphores that serialize access to it, and [`wire`] moves slots
//! between processes as constant-size frames.

pub mod handoff;
pub mod wire;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Size of the revealed-word buffer, terminator included.
pub const WORD_LENGTH: usize = 64;
/// Wrong guesses that end a game.
pub const MAX_MISTAKES: u32 = 9;
/// Shown in place of letters that have not been guessed yet.
pub const PLACEHOLDER: char = '_';
pub const ALPHABET_LEN: usize = 26;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestKind {
    /// No request written. A slot carrying this kind is malformed.
    #[default]
    Idle,
    Connect,
    Disconnect,
    NewGame,
    Play,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    InProgress,
    Won,
    Lost,
    NoMoreWords,
    /// The request referenced an unknown session or could not be interpreted.
    ProtocolViolation,
}

impl Outcome {
    /// True once the current game can no longer accept guesses.
    pub fn is_final(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

fn letter_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}

/// Set of guessed letters, one flag per letter of the alphabet.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct LetterMask([bool; ALPHABET_LEN]);

impl LetterMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `letter` as guessed. Returns false if it was already marked or
    /// is not an ASCII letter.
    pub fn insert(&mut self, letter: char) -> bool {
        match letter_index(letter) {
            Some(index) if !self.0[index] => {
                self.0[index] = true;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, letter: char) -> bool {
        letter_index(letter).is_some_and(|index| self.0[index])
    }

    pub fn clear(&mut self) {
        self.0 = [false; ALPHABET_LEN];
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|flag| **flag).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Guessed letters in alphabetical order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(index, _)| (b'A' + index as u8) as char)
    }
}

/// Fixed-length, NUL-padded ASCII buffer for the revealed word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WordBuffer([u8; WORD_LENGTH]);

impl WordBuffer {
    /// Copies `text` into the buffer, truncating to `WORD_LENGTH - 1` bytes
    /// so a terminator always remains. Non-ASCII characters become `?`.
    pub fn from_text(text: &str) -> Self {
        let mut bytes = [0u8; WORD_LENGTH];
        for (slot, ch) in bytes.iter_mut().take(WORD_LENGTH - 1).zip(text.chars()) {
            *slot = if ch.is_ascii() { ch as u8 } else { b'?' };
        }
        Self(bytes)
    }

    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(WORD_LENGTH);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl Default for WordBuffer {
    fn default() -> Self {
        Self([0u8; WORD_LENGTH])
    }
}

impl fmt::Debug for WordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WordBuffer({:?})", self.as_str())
    }
}

// serde only derives arrays up to 32 elements, so the buffer is written as a
// tuple by hand. bincode encodes tuples without a length prefix.
impl Serialize for WordBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(WORD_LENGTH)?;
        for byte in &self.0 {
            tuple.serialize_element(byte)?;
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for WordBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WordBufferVisitor;

        impl<'de> Visitor<'de> for WordBufferVisitor {
            type Value = WordBuffer;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} bytes", WORD_LENGTH)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WordBuffer, A::Error> {
                let mut bytes = [0u8; WORD_LENGTH];
                for (index, byte) in bytes.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(index, &self))?;
                }
                Ok(WordBuffer(bytes))
            }
        }

        deserializer.deserialize_tuple(WORD_LENGTH, WordBufferVisitor)
    }
}

/// The single record carrying one request/response pair at a time.
///
/// No field has a variable length, so every encoding of a slot has the same
/// size and independent processes agree on its layout.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionSlot {
    pub request_kind: RequestKind,
    /// Written only by the server, read by clients after every wait.
    pub terminate: bool,
    pub client_id: u32,
    /// ASCII guess for `Play`.
    pub guess: u8,
    pub mistake_count: u32,
    pub wins: u32,
    pub losses: u32,
    pub guessed: LetterMask,
    pub revealed: WordBuffer,
    pub outcome: Outcome,
}

impl TransactionSlot {
    /// A slot that tells the reader the server is going away.
    pub fn terminating() -> Self {
        Self {
            terminate: true,
            ..Self::default()
        }
    }
}

/// Typed view of the request half of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Connect,
    Disconnect { client_id: u32 },
    NewGame { client_id: u32 },
    Play { client_id: u32, guess: char },
    /// Idle kind, or a `Play` whose guess is not a letter.
    Malformed { client_id: u32 },
}

impl Request {
    pub fn from_slot(slot: &TransactionSlot) -> Self {
        let client_id = slot.client_id;
        match slot.request_kind {
            RequestKind::Connect => Request::Connect,
            RequestKind::Disconnect => Request::Disconnect { client_id },
            RequestKind::NewGame => Request::NewGame { client_id },
            RequestKind::Play if slot.guess.is_ascii_alphabetic() => Request::Play {
                client_id,
                guess: (slot.guess as char).to_ascii_uppercase(),
            },
            RequestKind::Play | RequestKind::Idle => Request::Malformed { client_id },
        }
    }

    /// Overwrites the request fields of `slot` and clears the previous response.
    pub fn write_to(&self, slot: &mut TransactionSlot) {
        let terminate = slot.terminate;
        *slot = TransactionSlot {
            terminate,
            ..TransactionSlot::default()
        };
        match *self {
            Request::Connect => slot.request_kind = RequestKind::Connect,
            Request::Disconnect { client_id } => {
                slot.request_kind = RequestKind::Disconnect;
                slot.client_id = client_id;
            }
            Request::NewGame { client_id } => {
                slot.request_kind = RequestKind::NewGame;
                slot.client_id = client_id;
            }
            Request::Play { client_id, guess } => {
                slot.request_kind = RequestKind::Play;
                slot.client_id = client_id;
                slot.guess = if guess.is_ascii() { guess as u8 } else { 0 };
            }
            Request::Malformed { client_id } => {
                slot.request_kind = RequestKind::Idle;
                slot.client_id = client_id;
            }
        }
    }

    pub fn to_slot(&self) -> TransactionSlot {
        let mut slot = TransactionSlot::default();
        self.write_to(&mut slot);
        slot
    }

    pub fn client_id(&self) -> Option<u32> {
        match *self {
            Request::Connect => None,
            Request::Disconnect { client_id }
            | Request::NewGame { client_id }
            | Request::Play { client_id, .. }
            | Request::Malformed { client_id } => Some(client_id),
        }
    }
}

/// Typed view of the response half of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    pub client_id: u32,
    pub mistake_count: u32,
    pub wins: u32,
    pub losses: u32,
    pub guessed: LetterMask,
    pub revealed: WordBuffer,
    pub outcome: Outcome,
}

impl Response {
    /// First-phase answer to `Connect`: only the assigned id is meaningful.
    pub fn connected(client_id: u32) -> Self {
        Self {
            client_id,
            ..Self::default()
        }
    }

    pub fn rejected(client_id: u32) -> Self {
        Self {
            client_id,
            outcome: Outcome::ProtocolViolation,
            ..Self::default()
        }
    }

    pub fn from_slot(slot: &TransactionSlot) -> Self {
        Self {
            client_id: slot.client_id,
            mistake_count: slot.mistake_count,
            wins: slot.wins,
            losses: slot.losses,
            guessed: slot.guessed,
            revealed: slot.revealed,
            outcome: slot.outcome,
        }
    }

    /// Writes the response fields, leaving the request fields and the
    /// terminate flag untouched.
    pub fn write_to(&self, slot: &mut TransactionSlot) {
        slot.client_id = self.client_id;
        slot.mistake_count = self.mistake_count;
        slot.wins = self.wins;
        slot.losses = self.losses;
        slot.guessed = self.guessed;
        slot.revealed = self.revealed;
        slot.outcome = self.outcome;
    }

    pub fn to_slot(&self) -> TransactionSlot {
        let mut slot = TransactionSlot::default();
        self.write_to(&mut slot);
        slot
    }

    pub fn revealed_word(&self) -> &str {
        self.revealed.as_str()
    }
}

/// Masked display form of `word`: spaces and guessed letters are shown,
/// everything else becomes [`PLACEHOLDER`].
pub fn reveal(word: &str, guessed: &LetterMask) -> String {
    word.chars()
        .map(|ch| {
            if ch == ' ' || guessed.contains(ch) {
                ch
            } else {
                PLACEHOLDER
            }
        })
        .collect()
}

/// True when every non-space character of `word` has been guessed.
pub fn is_revealed(word: &str, guessed: &LetterMask) -> bool {
    word.chars().all(|ch| ch == ' ' || guessed.contains(ch))
}
