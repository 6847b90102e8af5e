mod chat;
mod output;
mod seed;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use owo_colors::OwoColorize;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::info;

use commons_core::config::{self, CommonsConfig};
use commons_core::db::{DatabaseConfig, client};
use commons_core::error::CoreError;
use commons_core::profile::Profile;
use commons_core::session::{ConfigAuth, current_identity};

#[derive(Parser)]
#[command(name = "commons-cli")]
#[command(about = "Commons community messaging CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Act as this identity (overrides the configured email)
    #[arg(long = "as", value_name = "EMAIL")]
    as_email: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Conversations and messaging
    Chat {
        #[command(subcommand)]
        cmd: ChatCommands,
    },
    /// Database inspection and seeding
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ChatCommands {
    /// List your conversations, most recently active first
    List,
    /// Open (or start) a conversation and chat interactively
    Open {
        /// Contact address of the other person
        #[arg(long)]
        with: String,
    },
    /// Send a single message without opening the conversation
    Send {
        /// Contact address of the other person
        #[arg(long)]
        to: String,

        /// Message body
        #[arg(long, short = 'm')]
        message: String,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Insert the demo profiles
    Seed,
    /// Show row counts per table
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.debug {
        EnvFilter::new("commons_core=debug,commons_cli=debug,warn")
    } else {
        EnvFilter::new("commons_core=info,commons_cli=info,warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let (mut config, config_path) = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        (
            config::load_config(config_path).await?,
            Some(config_path.clone()),
        )
    } else {
        config::load_config_from_standard_locations().await?
    };

    // Apply CLI overrides
    if let Some(db_path) = &cli.db_path {
        config.database = DatabaseConfig::Embedded {
            path: db_path.to_string_lossy().to_string(),
        };
    }
    if let Some(email) = &cli.as_email {
        config.user.email = Some(email.clone());
    }

    match &cli.command {
        Commands::Chat { cmd } => {
            let db = client::connect(&config.database).await?;
            match cmd {
                ChatCommands::List => {
                    let me = require_identity(&db, &config).await?;
                    chat::list(&db, &me).await?;
                }
                ChatCommands::Open { with } => {
                    let me = require_identity(&db, &config).await?;
                    chat::open(&db, me, with).await?;
                }
                ChatCommands::Send { to, message } => {
                    let me = require_identity(&db, &config).await?;
                    chat::send_once(&db, &me, to, message).await?;
                }
            }
        }
        Commands::Db { cmd } => {
            let db = client::connect(&config.database).await?;
            match cmd {
                DbCommands::Seed => seed::run(&db).await?,
                DbCommands::Stats => seed::stats(&db).await?,
            }
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => show_config(&config, config_path.as_deref()),
        },
    }

    Ok(())
}

/// Resolve the acting identity or fail with sign-in guidance
async fn require_identity(db: &Surreal<Any>, config: &CommonsConfig) -> Result<Profile> {
    let auth = ConfigAuth::new(db.clone(), config.user.email.clone());
    let identity = current_identity(&auth).await?;
    Ok(identity.ok_or(CoreError::AuthRequired)?)
}

fn show_config(config: &CommonsConfig, path: Option<&std::path::Path>) {
    match path {
        Some(path) => println!("{} {:?}", "Config file:".bold(), path),
        None => println!("{}", "Config file: none (using defaults)".bold()),
    }
    match &config.user.email {
        Some(email) => println!("Identity: {}", email.bright_cyan()),
        None => println!("Identity: {}", "not set".yellow()),
    }
    match &config.database {
        DatabaseConfig::Embedded { path } => println!("Database: embedded at {}", path),
        DatabaseConfig::Remote { url, namespace, database, .. } => {
            println!("Database: remote {} ({}/{})", url, namespace, database)
        }
    }
}
