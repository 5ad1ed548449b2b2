mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use loregraph::config::LoreConfig;

#[derive(Parser)]
#[command(name = "loregraph", version, about = "Lore catalog retrieval tools over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config)
    Serve {
        /// Override the configured transport ("stdio" or "http")
        #[arg(long)]
        transport: Option<String>,
    },
    /// Rank entries against a free-text query
    Search {
        query: String,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// List entries linked from an entry
    Neighbors {
        uid: i64,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        depth: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show one entry with a content excerpt
    Inspect {
        uid: i64,
        #[arg(long)]
        scope: Option<String>,
        /// Maximum content characters (120-5000)
        #[arg(long)]
        chars: Option<i64>,
    },
    /// Assemble a context document from `scope#uid` keys
    Context {
        #[arg(required = true)]
        keys: Vec<String>,
        /// Token budget for the document
        #[arg(long)]
        budget: Option<usize>,
        #[arg(long)]
        max_entries: Option<usize>,
    },
    /// Show per-scope entry and link counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let mut config = LoreConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            if let Some(transport) = transport {
                config.server.transport = transport;
            }
            loregraph::server::serve(config).await?;
        }
        Command::Search { query, scope, limit } => {
            cli::search::search(&config, &query, scope, limit)?;
        }
        Command::Neighbors {
            uid,
            scope,
            depth,
            limit,
        } => {
            cli::neighbors::neighbors(&config, uid, scope, depth, limit)?;
        }
        Command::Inspect { uid, scope, chars } => {
            cli::inspect::inspect(&config, uid, scope, chars)?;
        }
        Command::Context {
            keys,
            budget,
            max_entries,
        } => {
            cli::context::context(&config, &keys, budget, max_entries)?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
    }

    Ok(())
}
