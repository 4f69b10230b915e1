//! TutorHub CLI - exercise the client SDK flows from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and persist the session
//! tutorhub login -e parent@example.com -p secret
//!
//! # Show the restored session and the access gate's decision
//! tutorhub status
//!
//! # List packages, submit a payment slip, watch for approval
//! tutorhub packages
//! tutorhub subscribe --package 3 --slip ./slip.jpg
//! tutorhub watch
//!
//! # Tear the session down
//! tutorhub logout
//! ```
//!
//! # Environment Variables
//!
//! - `TUTORHUB_API_BASE_URL` - Base URL of the platform API
//! - `TUTORHUB_STORAGE_PATH` - Path of the durable session store file

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tutorhub")]
#[command(author, version, about = "TutorHub client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Show the restored session and the access gate's decision
    Status,
    /// Tear down the session (best-effort remote logout)
    Logout,
    /// List subscription packages available for purchase
    Packages,
    /// Submit a payment slip for a package
    Subscribe {
        /// Package ID to subscribe to
        #[arg(long)]
        package: i64,

        /// Path of the payment slip image or PDF
        #[arg(long)]
        slip: std::path::PathBuf,
    },
    /// Poll the pending payment until it is approved
    Watch,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
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
        Commands::Login { email, password } => commands::auth::login(&email, &password).await?,
        Commands::Status => commands::auth::status().await?,
        Commands::Logout => commands::auth::logout().await?,
        Commands::Packages => commands::subscription::packages().await?,
        Commands::Subscribe { package, slip } => {
            commands::subscription::subscribe(package, &slip).await?;
        }
        Commands::Watch => commands::subscription::watch().await?,
    }
    Ok(())
}
