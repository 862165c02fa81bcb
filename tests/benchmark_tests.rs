//! Performance benchmarks for the transaction path

use server::dispatch::Server;
use server::game::GameState;
use server::words::WordSource;
use shared::handoff::Handoff;
use shared::wire::{decode_slot, encode_slot};
use shared::{reveal, LetterMask, Outcome, Request, TransactionSlot};
use std::time::{Duration, Instant};
use tokio::sync::watch;

fn word_source(words: &[&str]) -> WordSource {
    WordSource::new(words.iter().map(|w| w.to_string()).collect()).unwrap()
}

/// Benchmarks rebuilding the revealed word
#[test]
fn benchmark_reveal() {
    let word = "THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG";
    let mut guessed = LetterMask::new();
    for letter in "AEIOUTHRS".chars() {
        guessed.insert(letter);
    }

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = reveal(word, &guessed);
    }

    let duration = start.elapsed();
    println!(
        "Reveal: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second for 100k iterations
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks slot frame encoding and decoding
#[test]
fn benchmark_slot_codec() {
    let slot = Request::Play {
        client_id: 7,
        guess: 'Q',
    }
    .to_slot();

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = encode_slot(&slot).unwrap();
        let _: TransactionSlot = decode_slot(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Slot codec: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks game state updates without the handoff
#[test]
fn benchmark_game_state_updates() {
    let mut state = GameState::new(word_source(&["HANGMAN"]));

    let rounds = 100;
    let sessions = 100;
    let start = Instant::now();

    for _ in 0..rounds {
        let ids: Vec<u32> = (0..sessions).map(|_| state.connect().client_id).collect();
        for &id in &ids {
            state.handle(Request::NewGame { client_id: id });
            for guess in "ZHANGM".chars() {
                state.handle(Request::Play {
                    client_id: id,
                    guess,
                });
            }
            state.handle(Request::Disconnect { client_id: id });
        }
    }

    let duration = start.elapsed();
    let updates = rounds * sessions * 9;
    println!(
        "Game state: {} updates in {:?} ({:.2} μs/update)",
        updates,
        duration,
        duration.as_micros() as f64 / updates as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks full transactions through the semaphore handoff with several
/// clients competing for the slot
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn benchmark_handoff_throughput() {
    let handoff = Handoff::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server = Server::new(handoff.server(), word_source(&["HANGMAN"]));
    let running = tokio::spawn(async move {
        server.run(shutdown_rx).await;
        server
    });

    let clients = 8;
    let games = 50;
    let start = Instant::now();

    let mut players = Vec::new();
    for _ in 0..clients {
        let client = handoff.client();
        players.push(tokio::spawn(async move {
            for _ in 0..games {
                let id = client.connect().await.unwrap();
                client
                    .transact(Request::NewGame { client_id: id })
                    .await
                    .unwrap();
                for guess in "HANGM".chars() {
                    client
                        .transact(Request::Play {
                            client_id: id,
                            guess,
                        })
                        .await
                        .unwrap();
                }
                // One word only, so this ends the session.
                let response = client
                    .transact(Request::NewGame { client_id: id })
                    .await
                    .unwrap();
                assert_eq!(response.outcome, Outcome::NoMoreWords);
            }
        }));
    }
    for player in players {
        player.await.unwrap();
    }

    // Short sessions on a single client.
    let client = handoff.client();
    let iterations = 1000;
    for _ in 0..iterations {
        let id = client.connect().await.unwrap();
        client
            .transact(Request::NewGame { client_id: id })
            .await
            .unwrap();
        client.disconnect(id).await.unwrap();
    }

    let duration = start.elapsed();
    shutdown_tx.send(true).unwrap();
    let server = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .unwrap()
        .unwrap();

    let transactions = server.transactions();
    println!(
        "Handoff: {} transactions in {:?} ({:.2} μs/transaction)",
        transactions,
        duration,
        duration.as_micros() as f64 / transactions as f64
    );

    assert!(transactions >= (clients * games * 8 + iterations * 3) as u64 - 1);
    assert!(duration.as_secs() < 10);
}
