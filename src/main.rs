//! Memory Match - Unified CLI
//!
//! Runs the stats server or a terminal game session.

#![warn(missing_docs)]

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use memory_match::server::{self, AppState, LedgerRelay};
use memory_match::{
    AppConfig, Difficulty, InMemoryGateway, LedgerGateway, PlayerId, RevealOutcome,
    SessionController, StatsApiGateway, StatsGateway, format_clock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Serve {
            port,
            host,
            in_memory,
        } => run_server(config, host, port, in_memory).await,
        Command::Play {
            difficulty,
            server_url,
            in_memory,
            identity_file,
        } => run_play(config, difficulty, server_url, in_memory, identity_file).await,
    }
}

/// Run the stats HTTP server
#[instrument(skip(config))]
async fn run_server(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    in_memory: bool,
) -> Result<()> {
    config.set_listen(host, port);
    let endpoint = config.ledger().graphql_endpoint().clone();

    let gateway: Arc<dyn StatsGateway> = if in_memory {
        info!("Serving stats from process memory");
        Arc::new(InMemoryGateway::new())
    } else {
        let ledger = LedgerGateway::new(config.ledger());
        if let Err(err) = ledger.ping().await {
            warn!(endpoint = ledger.endpoint(), error = %err, "Ledger not reachable yet, serving anyway");
        }
        Arc::new(ledger)
    };

    let state = AppState::new(gateway, Some(LedgerRelay::new(endpoint)));
    server::serve(config.server().host(), *config.server().port(), state)
        .await
        .context("Stats server failed")
}

/// Run a terminal game session
#[instrument(skip(config))]
async fn run_play(
    config: AppConfig,
    difficulty: Option<Difficulty>,
    server_url: Option<String>,
    in_memory: bool,
    identity_file: PathBuf,
) -> Result<()> {
    let player = PlayerId::load_or_create(&identity_file)
        .with_context(|| format!("Failed to load identity from {}", identity_file.display()))?;

    let gateway: Arc<dyn StatsGateway> = match server_url {
        Some(url) => Arc::new(StatsApiGateway::new(url)),
        None if in_memory => Arc::new(InMemoryGateway::new()),
        None => Arc::new(LedgerGateway::new(config.ledger())),
    };

    let difficulty = difficulty.unwrap_or(*config.game().difficulty());
    let mut controller = SessionController::new(gateway, player)
        .with_unflip_delay(config.game().unflip_delay());

    controller.refresh_stats();
    controller.start_new_session(difficulty)?;

    println!("Memory Match ({difficulty}). Enter a card number, 'n' for a new game, 'q' to quit.");
    print_board(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                match input {
                    "q" | "quit" => break,
                    "n" | "new" => {
                        controller.start_new_session(difficulty)?;
                        print_board(&controller);
                    }
                    _ => match input.parse::<usize>() {
                        Ok(card_id) => {
                            let outcome = controller.on_reveal(card_id);
                            if let RevealOutcome::Ignored(reason) = outcome {
                                println!("Ignored: {reason}");
                            }
                            print_board(&controller);
                        }
                        Err(_) => println!("Enter a card number, 'n', or 'q'."),
                    },
                }
            }
            Some(event) = controller.next_event() => {
                if controller.handle_event(event) {
                    print_board(&controller);
                }
            }
        }
    }

    info!("Leaving game");
    Ok(())
}

fn print_board(controller: &SessionController) {
    let view = controller.view();
    let session = controller.session();

    println!();
    println!("{}", session.display(view.difficulty.grid_side()));
    println!(
        "Moves: {}  Time: {}  Pairs: {}/{}",
        view.moves,
        format_clock(view.elapsed_seconds),
        view.matched_pairs,
        view.total_pairs
    );
    println!(
        "High score: {}  Played: {}  Won: {}  Lost: {}  Win rate: {:.0}%",
        view.stats.high_score,
        view.stats.games_played,
        view.stats.games_won,
        view.stats.games_lost,
        view.stats.win_rate()
    );

    if view.status.is_terminal()
        && let Some(outcome) = view.outcome
    {
        println!(
            "Congratulations! You won in {} moves, {} - score {}. Press 'n' to play again.",
            outcome.moves(),
            outcome.clock(),
            outcome.score()
        );
    }
    if let Some(error) = view.last_error {
        println!("Stats unavailable: {error}");
    }
}
