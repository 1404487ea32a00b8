//! Blobstore CLI
//!
//! Command-line access to file and Datastore blob stores.
//!
//! # Commands
//!
//! - `put` - Store a document built from `--field name=value` pairs
//! - `get` - Print one document
//! - `list` - Print every document of a store
//! - `delete` - Remove one document

mod commands;
mod document;

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Blobstore command-line tools.
#[derive(Parser)]
#[command(name = "blobstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON configuration file (defaults to a file store in ./data)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a document
    Put {
        /// Store name
        name: String,

        /// Record key
        key: String,

        /// Field to set, as name=value (repeatable)
        #[arg(short, long = "field", value_parser = document::parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Print the document stored under a key
    Get {
        /// Store name
        name: String,

        /// Record key
        key: String,
    },

    /// Print every document of a store
    List {
        /// Store name
        name: String,
    },

    /// Remove the document stored under a key
    Delete {
        /// Store name
        name: String,

        /// Record key
        key: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = cli.config.as_deref();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Put { name, key, fields } => {
            let store = commands::open_documents(&name, config)?;
            commands::put::run(store.as_ref(), &key, fields, &mut out)?;
        }
        Commands::Get { name, key } => {
            let store = commands::open_documents(&name, config)?;
            commands::get::run(store.as_ref(), &key, &mut out)?;
        }
        Commands::List { name } => {
            let store = commands::open_documents(&name, config)?;
            commands::list::run(store.as_ref(), &mut out)?;
        }
        Commands::Delete { name, key } => {
            let store = commands::open_documents(&name, config)?;
            commands::delete::run(store.as_ref(), &key, &mut out)?;
        }
        Commands::Version => {
            println!("Blobstore CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
