//! Coco's Glass CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cg-cli migrate
//!
//! # Create an admin account
//! cg-cli admin create -e coco@stainedglass.com -p 'a long password' -f Coco -l Glass
//!
//! # Seed default categories
//! cg-cli seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin accounts
//! - `seed` - Seed the default gallery categories

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sqlx::PgPool;

mod commands;

#[derive(Parser)]
#[command(name = "cg-cli")]
#[command(author, version, about = "Coco's Glass CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the default gallery categories (idempotent)
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Initial password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// First name
        #[arg(short, long, default_value = "Coco")]
        first_name: String,

        /// Last name
        #[arg(short, long, default_value = "Glass")]
        last_name: String,
    },
}

/// Errors shared by every command that needs the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if the variable is unset or the connection fails.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(cocos_glass_web::db::create_pool(&database_url).await?)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                first_name,
                last_name,
            } => {
                commands::admin::create_user(&email, &password, &first_name, &last_name).await?;
            }
        },
        Commands::Seed => commands::seed::categories().await?,
    }
    Ok(())
}
