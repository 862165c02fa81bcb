//! # Hangman Client Library
//!
//! Terminal client for the hangman server. It connects to the server's local
//! socket, runs the connect handshake, and then plays one game after another:
//! read a guess, send it, render the answer.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Socket connection to the server. Every request and response is one
//! fixed-size transaction slot frame. A frame with the terminate flag set
//! means the server is shutting down.
//!
//! ### Input Module (`input`)
//! Reads and validates guesses (one unused letter) and yes/no answers.
//!
//! ### Rendering Module (`rendering`)
//! Draws the gallows figure for the current mistake count, the revealed
//! word, guessed letters and the win/loss tally.
//!
//! ### Game Module (`game`)
//! The client session loop tying the other modules together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientSession;
//! use client::network::Connection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = Connection::open("/tmp/hangman.sock").await?;
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!
//!     let summary = ClientSession::new(&mut connection, stdin, std::io::stdout())
//!         .run()
//!         .await?;
//!     println!("{} wins, {} losses", summary.wins, summary.losses);
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
