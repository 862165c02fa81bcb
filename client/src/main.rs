use clap::Parser;
use client::game::ClientSession;
use client::network::{ClientError, Connection};
use log::info;
use shared::wire::DEFAULT_SOCKET_PATH;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the server's Unix socket
    #[arg(short = 's', long, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    info!("Connecting to: {}", args.socket.display());
    let mut connection = match Connection::open(&args.socket).await {
        Ok(connection) => connection,
        Err(ClientError::Unreachable { path, source }) => {
            eprintln!("server not reachable at {} ({})", path.display(), source);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    match ClientSession::new(&mut connection, stdin, std::io::stdout())
        .run()
        .await
    {
        Ok(summary) => {
            info!(
                "Played {} games: {} wins, {} losses",
                summary.games, summary.wins, summary.losses
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
