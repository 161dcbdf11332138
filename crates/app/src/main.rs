//! Memorizer auth client - Main Entry Point
//!
//! Signs in, signs up, signs out and reports the stored session against a
//! Memorizer account service.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use memorizer_infrastructure::{ClientConfig, ConfigOverrides};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Memorizer account command-line client.
#[derive(Parser)]
#[command(name = "memorizer-auth")]
#[command(about = "Manage a Memorizer account session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Token file location
    #[arg(long, global = true)]
    storage: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to an existing account
    Signin {
        /// Login address
        #[arg(long)]
        login: String,
        /// Password
        #[arg(long, env = "MEMORIZER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        /// Login address
        #[arg(long)]
        login: String,
        /// Password
        #[arg(long, env = "MEMORIZER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password again
        #[arg(long)]
        confirm_password: String,
    },
    /// Sign out and forget the stored tokens
    Signout,
    /// Restore the stored session and print it
    Status,
    /// Exchange the stored refresh token for a new pair
    Refresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let overrides = ConfigOverrides {
        base_url: cli.base_url,
        storage_path: cli.storage,
    };
    let config = ClientConfig::load(cli.config.as_deref(), &overrides)?;
    let manager = commands::build_manager(&config)?;

    tracing::debug!(base_url = %config.base_url, "memorizer-auth v{}", env!("CARGO_PKG_VERSION"));

    let report = match cli.command {
        Commands::Signin { login, password } => {
            commands::sign_in(&manager, login, password).await?
        }
        Commands::Signup {
            login,
            password,
            confirm_password,
        } => commands::sign_up(&manager, login, password, &confirm_password).await?,
        Commands::Signout => commands::sign_out(&manager).await?,
        Commands::Status => commands::status(&manager).await,
        Commands::Refresh => commands::refresh(&manager).await?,
    };

    println!("{report}");
    Ok(())
}
