//! authstash - keep a signed-in user and their tokens across restarts.
//!
//! A thin command-line front-end over `authstash_core::SessionStore`. The
//! tokens themselves come from whatever authentication flow the caller ran;
//! this tool only records, shows, and clears them.

mod config;
mod format;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use authstash_core::{FileStore, KeyValueStore, KeyringStore, SessionStore};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{Backend, Config};
use format::format_token;

type Store = SessionStore<Box<dyn KeyValueStore>>;

#[derive(Parser, Debug)]
#[command(name = "authstash", version, about = "Persisted login session store")]
struct Cli {
    /// Storage backend for the session mirror
    #[arg(long, value_enum, env = "AUTHSTASH_BACKEND")]
    backend: Option<Backend>,

    /// Directory for the file backend
    #[arg(long, env = "AUTHSTASH_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a user and token pair
    Login {
        /// User as JSON, e.g. '{"id": 1}'
        #[arg(long)]
        user: String,

        /// Access token (prompted for when omitted)
        #[arg(long)]
        access: Option<String>,

        /// Refresh token (prompted for when omitted)
        #[arg(long)]
        refresh: Option<String>,
    },
    /// Forget the current session
    Logout,
    /// Print whether a session is stored
    Status,
    /// Print the stored user and tokens
    Show {
        /// Print tokens in full instead of masked
        #[arg(long)]
        reveal: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing();

    let config = Config::load()?;
    let storage = open_storage(&cli, &config)?;

    let stdout = io::stdout();
    run(cli.command, storage, &mut stdout.lock())
}

/// Build the mirror selected by flags, env, then config file
fn open_storage(cli: &Cli, config: &Config) -> Result<Box<dyn KeyValueStore>> {
    let backend = cli.backend.or(config.backend).unwrap_or_default();
    debug!(?backend, "Opening session storage");

    match backend {
        Backend::File => {
            let store = match cli.dir.as_deref().or(config.data_dir()) {
                Some(dir) => FileStore::new(dir),
                None => FileStore::in_data_dir().context("Failed to locate session directory")?,
            };
            debug!(path = %store.path().display(), "Using file storage");
            Ok(Box::new(store))
        }
        Backend::Keyring => Ok(Box::new(KeyringStore::new(config.keyring_service()))),
    }
}

fn run(command: Command, storage: Box<dyn KeyValueStore>, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Login {
            user,
            access,
            refresh,
        } => {
            let user: Value =
                serde_json::from_str(&user).context("--user must be valid JSON")?;
            let access = match access {
                Some(token) => require_token(token, "access")?,
                None => prompt_token("Access token: ")?,
            };
            let refresh = match refresh {
                Some(token) => require_token(token, "refresh")?,
                None => prompt_token("Refresh token: ")?,
            };

            let mut store: Store = SessionStore::open_or_reset(storage)?;
            store
                .login(user, access, refresh)
                .context("Failed to save session")?;
            writeln!(out, "logged in")?;
        }
        Command::Logout => {
            let mut store: Store = SessionStore::open_or_reset(storage)?;
            store.logout().context("Failed to clear session")?;
            writeln!(out, "logged out")?;
        }
        Command::Status => {
            let store = open_existing(storage)?;
            if store.is_logged_in() {
                writeln!(out, "logged in")?;
            } else {
                writeln!(out, "logged out")?;
            }
        }
        Command::Show { reveal } => {
            let store = open_existing(storage)?;
            match store.user() {
                Some(user) => {
                    writeln!(out, "user:          {}", serde_json::to_string_pretty(user)?)?;
                    writeln!(
                        out,
                        "access_token:  {}",
                        format_token(store.access_token(), reveal)
                    )?;
                    writeln!(
                        out,
                        "refresh_token: {}",
                        format_token(store.refresh_token(), reveal)
                    )?;
                }
                None => writeln!(out, "logged out")?,
            }
        }
    }
    Ok(())
}

fn open_existing(storage: Box<dyn KeyValueStore>) -> Result<Store> {
    SessionStore::open(storage)
        .context("Stored session is unreadable; run `authstash logout` to clear it")
}

fn prompt_token(prompt: &str) -> Result<String> {
    let token = rpassword::prompt_password(prompt).context("Failed to read token")?;
    let token = require_token(token, "prompted")?;
    info!("Token read from terminal");
    Ok(token)
}

/// Trim a token and reject it if nothing is left
fn require_token(token: String, which: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("The {which} token must not be empty");
    }
    Ok(token.to_string())
}

// ============================================================================
// Tests
// ============================================================================
