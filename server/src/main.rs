use clap::Parser;
use log::{error, info};
use server::dispatch::Server;
use server::ipc::{IpcListener, DEFAULT_SOCKET_PATH};
use server::words::{load_words, load_words_from_path};
use shared::handoff::Handoff;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the Unix socket clients connect to
    #[arg(short = 's', long, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Word list, one word per line (read from stdin when omitted)
    #[arg(short = 'w', long)]
    words: Option<PathBuf>,

    /// Serve the words in random order
    #[arg(long)]
    shuffle: bool,
}

/// Loads the words, opens the socket, then runs the dispatch loop until
/// Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut words = match &args.words {
        Some(path) => load_words_from_path(path)?,
        None => {
            info!("Reading words from stdin");
            load_words(std::io::stdin().lock())?
        }
    };
    if args.shuffle {
        words.shuffle();
    }
    info!("Loaded {} words", words.len());

    let handoff = Handoff::new();
    let listener = IpcListener::bind(&args.socket)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ipc_handle = tokio::spawn(listener.serve(handoff.client(), shutdown_rx.clone()));

    let mut server = Server::new(handoff.server(), words);
    let mut server_handle = tokio::spawn(async move { server.run(shutdown_rx).await });

    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        result = &mut server_handle => {
            if let Err(e) = result {
                error!("Dispatch loop panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    // Both tasks may already be gone; a failed send is fine.
    let _ = shutdown_tx.send(true);

    if !server_handle.is_finished() {
        if let Err(e) = server_handle.await {
            error!("Dispatch loop panicked: {}", e);
        }
    }
    if let Err(e) = ipc_handle.await {
        error!("Socket listener panicked: {}", e);
    }

    Ok(())
}
