//! # Hangman Server Library
//!
//! Authoritative server for single-host hangman. One server process serves any
//! number of client processes through a single shared transaction slot; see
//! `shared::handoff` for the semaphore protocol that serializes access to it.
//!
//! ## Core Responsibilities
//!
//! ### Session Management
//! Every client that completes the connect handshake gets a session holding
//! its current word, guessed letters, mistakes and win/loss tally. Sessions
//! are removed on disconnect, when the word list is exhausted, or when the
//! server shuts down.
//!
//! ### Game Rules
//! Sessions walk the word list in order, one word per game. A wrong letter
//! costs a mistake and the ninth mistake loses the game. Guessing the last
//! hidden letter wins it.
//!
//! ### Request Dispatch
//! The dispatch loop takes one request at a time off the slot, applies it,
//! writes the response and only then lets the next client in. Requests that
//! reference an unknown session, or that cannot be interpreted, are answered
//! with `Outcome::ProtocolViolation` instead of stopping the server.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Per-client state and the session table.
//!
//! ### Words Module (`words`)
//! Word list loading, character filtering and the ordered word source.
//!
//! ### Game Module (`game`)
//! The state machine applying `Connect`, `NewGame`, `Play` and `Disconnect`.
//!
//! ### Dispatch Module (`dispatch`)
//! The server side of the handoff protocol and the shutdown sequence.
//!
//! ### IPC Module (`ipc`)
//! Unix socket endpoint that proxies client processes onto the handoff.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::dispatch::Server;
//! use server::ipc::IpcListener;
//! use server::words::WordSource;
//! use shared::handoff::Handoff;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let words = WordSource::new(vec!["CAT".to_string(), "DOG".to_string()])?;
//!     let handoff = Handoff::new();
//!     let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let listener = IpcListener::bind("/tmp/hangman.sock")?;
//!     tokio::spawn(listener.serve(handoff.client(), shutdown_rx.clone()));
//!
//!     let mut server = Server::new(handoff.server(), words);
//!     tokio::spawn(async move { server.run(shutdown_rx).await });
//!
//!     tokio::signal::ctrl_c().await?;
//!     shutdown_tx.send(true)?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod game;
pub mod ipc;
pub mod session;
pub mod words;
