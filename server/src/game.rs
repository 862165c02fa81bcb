//! Hangman rules applied to the session table, one request at a time

use crate::session::SessionTable;
use crate::words::WordSource;
use log::{info, warn};
use shared::{Outcome, Request, Response};

/// Authoritative game state: every session plus the shared word list.
///
/// Each request is applied atomically; the caller guarantees only one is
/// processed at a time.
pub struct GameState {
    pub sessions: SessionTable,
    words: WordSource,
}

impl GameState {
    pub fn new(words: WordSource) -> Self {
        Self {
            sessions: SessionTable::new(),
            words,
        }
    }

    pub fn words(&self) -> &WordSource {
        &self.words
    }

    /// Applies one request. `Disconnect` has no response.
    pub fn handle(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::Connect => Some(self.connect()),
            Request::Disconnect { client_id } => {
                self.disconnect(client_id);
                None
            }
            Request::NewGame { client_id } => Some(self.new_game(client_id)),
            Request::Play { client_id, guess } => Some(self.play(client_id, guess)),
            Request::Malformed { client_id } => {
                warn!("Malformed request from client {}", client_id);
                Some(Response::rejected(client_id))
            }
        }
    }

    pub fn connect(&mut self) -> Response {
        Response::connected(self.sessions.add_session())
    }

    pub fn disconnect(&mut self, client_id: u32) {
        if !self.sessions.remove_session(&client_id) {
            warn!("Disconnect for unknown client {}", client_id);
        }
    }

    /// Gives the session its next word, or ends it when none are left.
    pub fn new_game(&mut self, client_id: u32) -> Response {
        let Some(session) = self.sessions.get_mut(&client_id) else {
            warn!("NewGame for unknown client {}", client_id);
            return Response::rejected(client_id);
        };

        let Some(word) = self.words.get(session.used_words) else {
            let response = Response {
                outcome: Outcome::NoMoreWords,
                ..session.response()
            };
            info!(
                "Client {} used all {} words",
                client_id,
                self.words.len()
            );
            self.sessions.remove_session(&client_id);
            return response;
        };

        session.start_game(word);
        info!(
            "Client {} started game {} of {}",
            client_id,
            session.used_words,
            self.words.len()
        );
        session.response()
    }

    pub fn play(&mut self, client_id: u32, guess: char) -> Response {
        let Some(session) = self.sessions.get_mut(&client_id) else {
            warn!("Play for unknown client {}", client_id);
            return Response::rejected(client_id);
        };

        match session.guess(guess) {
            Some(outcome) => {
                if outcome.is_final() {
                    info!(
                        "Client {} {:?} (wins {}, losses {})",
                        client_id, outcome, session.wins, session.losses
                    );
                }
                session.response()
            }
            None => {
                warn!("Client {} played without a game in progress", client_id);
                Response {
                    outcome: Outcome::ProtocolViolation,
                    ..session.response()
                }
            }
        }
    }
}
