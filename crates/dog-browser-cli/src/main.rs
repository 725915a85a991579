// SPDX-License-Identifier: AGPL-3.0
// Dog Browser CLI - Terminal frontend
//
// Runs a single command from the arguments, or an interactive session
// that keeps the last browse result around and reports favorite changes.

mod commands;
mod state;

use dog_browser_core::FavoriteDogs;
use state::AppState;
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVES: &str = "dog_browser=warn,dog_browser_core=warn";

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    tracing::info!("Starting Dog Browser v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = if args.is_empty() {
        None
    } else {
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match commands::parse(&words) {
            Ok(command) => Some(command),
            Err(e) => {
                eprintln!("{}\n\n{}", e, commands::USAGE);
                return ExitCode::from(2);
            }
        }
    };

    let mut state = match AppState::new().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Some(command) => match commands::run(&mut state, command).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        None => match interactive(&mut state).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// `RUST_LOG` when set, otherwise warnings from our own crates
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(DEFAULT_LOG_DIRECTIVES),
    }
}

/// Read commands from stdin until EOF or `quit`
async fn interactive(state: &mut AppState) -> std::io::Result<()> {
    let mut favorite_updates = Box::pin(FavoriteDogs::new(state.favorites.clone()).dogs());
    let watcher = tokio::spawn(async move {
        while let Some(dogs) = favorite_updates.next().await {
            println!("[{} favorite(s)]", dogs.len());
        }
    });

    println!("Dog Browser v{}. Type `help` for commands.", env!("CARGO_PKG_VERSION"));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match commands::parse(&words) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        if command == commands::Command::Quit {
            break;
        }

        if let Err(e) = commands::run(state, command).await {
            println!("{}", e);
        }
    }

    watcher.abort();
    Ok(())
}
