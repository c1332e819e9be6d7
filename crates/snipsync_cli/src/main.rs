//! Snipsync CLI
//!
//! Command-line sync tools for the snipsync snippet store.
//!
//! # Commands
//!
//! - `sync` - Run one push-then-pull sync cycle
//! - `full` - Replace local synced data with a full server snapshot
//! - `ping` - Check server reachability
//! - `register` / `login` - Account management
//! - `config` - Show or change sync settings
//! - `status` - Show sync state and pending work

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Snipsync command-line sync tools.
#[derive(Parser)]
#[command(name = "snipsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the snippet database file
    #[arg(global = true, short, long)]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one push-then-pull sync cycle
    Sync,

    /// Replace local synced data with a full server snapshot
    Full {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check server reachability
    Ping,

    /// Register a new account and store the returned credential
    Register {
        /// Server base URL
        #[arg(short, long)]
        server: String,

        /// Account email
        email: String,
    },

    /// Validate a credential against the server
    Login {
        /// Server base URL (defaults to the stored one)
        #[arg(short, long)]
        server: Option<String>,

        /// API key (defaults to the stored one)
        #[arg(short, long)]
        api_key: Option<String>,

        /// Account email
        email: String,
    },

    /// Show or change sync settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show sync state and pending work
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current sync settings
    Show,

    /// Change one setting (server-url, api-key, auto-sync,
    /// sync-on-startup, debounce-delay-ms, idle-interval-ms)
    Set {
        /// Setting name
        key: String,

        /// New value
        value: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = cli.db.ok_or("Database path required (--db)")?;

    match cli.command {
        Commands::Sync => commands::sync::run(&db)?,
        Commands::Full { yes } => commands::full::run(&db, yes)?,
        Commands::Ping => commands::ping::run(&db)?,
        Commands::Register { server, email } => commands::auth::register(&db, &server, &email)?,
        Commands::Login {
            server,
            api_key,
            email,
        } => commands::auth::login(&db, server.as_deref(), api_key.as_deref(), &email)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&db)?,
            ConfigAction::Set { key, value } => commands::config::set(&db, &key, &value)?,
        },
        Commands::Status => commands::status::run(&db)?,
    }

    Ok(())
}
