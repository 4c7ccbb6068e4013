//! # firekit
//!
//! Drive the firekit push sender and document store helpers from the shell.
//!
//! ## Commands
//!
//! - `push`: Send one push message
//! - `get`: Fetch a document by path
//! - `find`: Query a collection
//! - `add`: Insert a document with a generated id
//! - `update`: Overwrite a document's fields
//! - `delete`: Delete a document
//!
//! ## Example
//!
//! ```bash
//! # Send a notification to a topic
//! firekit push --topic news --title "Hello" --body "World"
//!
//! # Find adult users in Oslo, oldest first
//! firekit find users --where "city == Oslo" --order age:desc
//!
//! # Try everything offline
//! firekit --mock add users '{"name": "alice"}'
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{find, push, store, Backend};

/// Command-line driver for firekit.
#[derive(Parser, Debug)]
#[command(name = "firekit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: firekit.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use in-memory messaging and store instead of the platform (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    /// Log requests at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one push message
    Push(push::PushArgs),

    /// Fetch a document by path
    Get {
        /// Document path, e.g. users/alice
        path: String,
    },

    /// Query a collection
    Find(find::FindArgs),

    /// Insert a document with a generated id
    Add {
        /// Collection path
        collection: String,
        /// Document fields as a JSON object
        json: String,
    },

    /// Overwrite a document's fields
    Update {
        /// Document path
        path: String,
        /// New fields as a JSON object
        json: String,
    },

    /// Delete a document
    Delete {
        /// Document path
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let backend = if cli.mock {
        Backend::Mock
    } else {
        let config = config::load(cli.config.as_deref())?;
        Backend::Platform(config::initialize(config)?)
    };

    match cli.command {
        Commands::Push(args) => push::run(&backend, &args).await?,
        Commands::Get { path } => store::get(&backend, &path).await?,
        Commands::Find(args) => find::run(&backend, &args).await?,
        Commands::Add { collection, json } => store::add(&backend, &collection, &json).await?,
        Commands::Update { path, json } => store::update(&backend, &path, &json).await?,
        Commands::Delete { path } => store::delete(&backend, &path).await?,
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
