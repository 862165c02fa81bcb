//! Server dispatch loop driving the handoff protocol

use crate::game::GameState;
use crate::words::WordSource;
use log::{debug, error, info};
use shared::handoff::{HandoffError, HandoffServer};
use shared::Request;
use tokio::sync::watch;

/// Single-threaded dispatcher: takes one request off the slot, applies it to
/// the game state, answers, and releases the slot to the next client.
pub struct Server {
    handoff: HandoffServer,
    game_state: GameState,
    transactions: u64,
}

impl Server {
    pub fn new(handoff: HandoffServer, words: WordSource) -> Self {
        Self {
            handoff,
            game_state: GameState::new(words),
            transactions: 0,
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Number of transactions completed so far.
    pub fn transactions(&self) -> u64 {
        self.transactions
    }

    /// Serves one transaction end to end, including the slot release.
    async fn serve(&mut self, request: Request) -> Result<(), HandoffError> {
        debug!("Serving {:?}", request);

        if let Some(response) = self.game_state.handle(request) {
            self.handoff.respond(&response).await;
        }
        if request == Request::Connect {
            self.handoff.await_connect_ack().await?;
        }

        self.handoff.release();
        self.transactions += 1;
        Ok(())
    }

    /// Main loop. Returns once `shutdown` flips to true (or its sender is
    /// dropped), after closing the handoff and dropping every session.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Server started with {} words",
            self.game_state.words().len()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let request = tokio::select! {
                request = self.handoff.next_request() => request,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let result = match request {
                Ok(request) => self.serve(request).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {}
                Err(HandoffError::Shutdown) => break,
                Err(e) => error!("Transaction failed: {}", e),
            }
        }

        info!("Server shutting down");
        self.handoff.shutdown().await;

        let dropped = self.game_state.sessions.clear();
        info!(
            "Dropped {} sessions after {} transactions",
            dropped, self.transactions
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::handoff::Handoff;
    use shared::Outcome;
    use std::time::Duration;
    use tokio::time::timeout;

    fn words(list: &[&str]) -> WordSource {
        WordSource::new(list.iter().map(|w| w.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_server_answers_full_game() {
        let handoff = Handoff::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut server = Server::new(handoff.server(), words(&["HI"]));
        let running = tokio::spawn(async move {
            server.run(shutdown_rx).await;
            server
        });

        let client = handoff.client();
        let id = client.connect().await.unwrap();
        let response = client.transact(Request::NewGame { client_id: id }).await.unwrap();
        assert_eq!(response.revealed_word(), "__");

        client
            .transact(Request::Play {
                client_id: id,
                guess: 'H',
            })
            .await
            .unwrap();
        let response = client
            .transact(Request::Play {
                client_id: id,
                guess: 'I',
            })
            .await
            .unwrap();
        assert_eq!(response.outcome, Outcome::Won);

        client.disconnect(id).await.unwrap();
        // Served only after the disconnect released the slot.
        let next = client.connect().await.unwrap();
        assert_ne!(next, id);

        shutdown_tx.send(true).unwrap();
        let server = timeout(Duration::from_secs(1), running).await.unwrap().unwrap();
        assert_eq!(server.transactions(), 6);
        assert!(server.game_state().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_unblocks_idle_server() {
        let handoff = Handoff::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut server = Server::new(handoff.server(), words(&["CAT"]));
        let running = tokio::spawn(async move { server.run(shutdown_rx).await });

        tokio::task::yield_now().await;
        shutdown_tx.send(true).unwrap();

        timeout(Duration::from_secs(1), running).await.unwrap().unwrap();
        assert_eq!(
            handoff.client().connect().await,
            Err(HandoffError::Shutdown)
        );
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_stops_server() {
        let handoff = Handoff::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut server = Server::new(handoff.server(), words(&["CAT"]));
        let running = tokio::spawn(async move { server.run(shutdown_rx).await });

        drop(shutdown_tx);
        timeout(Duration::from_secs(1), running).await.unwrap().unwrap();
    }
}
