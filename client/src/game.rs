//! Client session loop: connect, play games until the player stops or the
//! server runs out of words, then disconnect.

use crate::input::InputManager;
use crate::network::{ClientError, Connection};
use crate::rendering::{outcome_banner, render_response};
use log::{info, warn};
use shared::{Outcome, Request, Response};
use std::io::Write;
use tokio::io::AsyncBufRead;

/// Why a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The player chose not to play again.
    Quit,
    /// Every word has been played; the server removed the session.
    NoMoreWords,
    /// The server raised its terminate flag.
    ServerShutdown,
    /// The server answered with a protocol violation.
    Rejected,
    /// Standard input was closed mid-game.
    InputClosed,
}

/// Totals shown when the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub end: Option<SessionEnd>,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
}

pub struct ClientSession<'a, R, W> {
    connection: &'a mut Connection,
    input: InputManager<R>,
    out: W,
    summary: SessionSummary,
}

impl<'a, R, W> ClientSession<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(connection: &'a mut Connection, input: R, out: W) -> Self {
        Self {
            connection,
            input: InputManager::new(input),
            out,
            summary: SessionSummary::default(),
        }
    }

    /// Plays until the session ends. A server shutdown is a normal end, not
    /// an error.
    pub async fn run(mut self) -> Result<SessionSummary, ClientError> {
        let end = match self.play_session().await {
            Ok(end) => end,
            Err(ClientError::Shutdown) => {
                writeln!(self.out, "The server is shutting down.")?;
                SessionEnd::ServerShutdown
            }
            Err(e) => return Err(e),
        };

        info!("Session ended: {:?}", end);
        self.summary.end = Some(end);
        Ok(self.summary)
    }

    async fn play_session(&mut self) -> Result<SessionEnd, ClientError> {
        let client_id = self.connection.connect().await?;
        writeln!(self.out, "Connected as client {}.", client_id)?;

        loop {
            let response = self
                .connection
                .request(Request::NewGame { client_id })
                .await?;
            self.record(&response);

            match response.outcome {
                Outcome::NoMoreWords => {
                    self.show_banner(&response)?;
                    return Ok(SessionEnd::NoMoreWords);
                }
                Outcome::ProtocolViolation => {
                    self.show_banner(&response)?;
                    return Ok(SessionEnd::Rejected);
                }
                _ => {}
            }

            self.summary.games += 1;
            let finished = match self.play_game(client_id, response).await? {
                Some(finished) => finished,
                None => return self.leave(client_id, SessionEnd::InputClosed).await,
            };
            if finished.outcome == Outcome::ProtocolViolation {
                return Ok(SessionEnd::Rejected);
            }

            match self.input.read_answer("Play again?", &mut self.out).await? {
                Some(true) => continue,
                _ => return self.leave(client_id, SessionEnd::Quit).await,
            }
        }
    }

    /// Guesses until the game is decided. `None` if input ran out first.
    async fn play_game(
        &mut self,
        client_id: u32,
        mut response: Response,
    ) -> Result<Option<Response>, ClientError> {
        write!(self.out, "\n{}", render_response(&response))?;

        while response.outcome == Outcome::InProgress {
            let Some(guess) = self.input.read_guess(&response.guessed, &mut self.out).await? else {
                return Ok(None);
            };

            response = self
                .connection
                .request(Request::Play { client_id, guess })
                .await?;
            self.record(&response);
            write!(self.out, "\n{}", render_response(&response))?;

            if response.outcome == Outcome::ProtocolViolation {
                warn!("Server rejected guess {:?}", guess);
            }
        }

        Ok(Some(response))
    }

    async fn leave(&mut self, client_id: u32, end: SessionEnd) -> Result<SessionEnd, ClientError> {
        self.connection.disconnect(client_id).await?;
        writeln!(
            self.out,
            "Goodbye! {} wins, {} losses.",
            self.summary.wins, self.summary.losses
        )?;
        Ok(end)
    }

    fn record(&mut self, response: &Response) {
        self.summary.wins = response.wins;
        self.summary.losses = response.losses;
    }

    fn show_banner(&mut self, response: &Response) -> Result<(), ClientError> {
        if let Some(banner) = outcome_banner(response) {
            writeln!(self.out, "{}", banner)?;
        }
        Ok(())
    }
}
