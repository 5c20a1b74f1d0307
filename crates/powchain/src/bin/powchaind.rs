//! powchaind: proof-of-work ledger node.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use powchain::config::{DEFAULT_DIFFICULTY, DEFAULT_LISTEN_ADDR};
use powchain::protocol::limits;
use powchain::{Difficulty, Ledger, NodeConfig, PayloadPolicy, Server};

#[derive(Parser)]
#[command(name = "powchaind")]
#[command(about = "Proof-of-work ledger node")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a node and serve the line protocol over TCP
    Serve {
        /// Address to listen on
        #[arg(long, env = "POWCHAIN_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
        listen: SocketAddr,

        /// Leading zero hex characters required of each block hash
        #[arg(long, env = "POWCHAIN_DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u32,

        /// How ADD treats arguments that are not valid JSON (lenient or strict)
        #[arg(long, env = "POWCHAIN_PAYLOAD_POLICY", default_value_t = PayloadPolicy::Lenient)]
        payload_policy: PayloadPolicy,

        /// Longest accepted command line in bytes
        #[arg(long, default_value_t = limits::MAX_LINE_BYTES)]
        max_line_bytes: usize,
    },

    /// Send one command to a running node and print the reply
    Send {
        /// Node address
        #[arg(long, env = "POWCHAIN_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
        addr: SocketAddr,

        /// The command, e.g. `MINE` or `ADD {"from":"Alice"}`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Build a small chain locally and print it
    Demo {
        /// Difficulty to mine at
        #[arg(long, default_value_t = 2)]
        difficulty: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Serve {
            listen,
            difficulty,
            payload_policy,
            max_line_bytes,
        } => {
            let config = NodeConfig {
                listen_addr: listen,
                difficulty: Difficulty::new(difficulty)?,
                payload_policy,
                max_line_bytes,
                ..NodeConfig::default()
            };
            serve(config).await
        }
        Commands::Send { addr, command } => send(addr, &command.join(" ")).await,
        Commands::Demo { difficulty } => demo(Difficulty::new(difficulty)?),
    }
}

async fn serve(config: NodeConfig) -> Result<()> {
    let server = Server::start(config)
        .await
        .context("failed to start node")?;

    server
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler; run until killed.
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("node stopped");
    Ok(())
}

async fn send(addr: SocketAddr, line: &str) -> Result<()> {
    let reply = powchain::request(addr, line)
        .await
        .with_context(|| format!("request to {addr} failed"))?;

    println!("{reply}");
    Ok(())
}

fn demo(difficulty: Difficulty) -> Result<()> {
    println!("Creating ledger (difficulty {difficulty})...");
    let mut ledger = Ledger::new(difficulty);

    println!("\nStaging payloads...");
    ledger.stage(json!({"from": "Alice", "to": "Bob", "amount": 50}));
    ledger.stage(json!({"from": "Bob", "to": "Charlie", "amount": 25}));

    println!("Mining block 1...");
    ledger.mine_pending();

    ledger.stage(json!({"from": "Charlie", "to": "Alice", "amount": 10}));

    println!("Mining block 2...");
    ledger.mine_pending();

    println!("\nChain:");
    println!("{ledger}");

    println!("\nChain valid: {}", ledger.validate());
    println!("Chain length: {}", ledger.len());
    Ok(())
}
