//! Fairfund CLI - FAIR Data Fund application backend
//!
//! # Commands
//!
//! ```bash
//! fairfund serve                     # Start HTTP server (port 8080)
//! fairfund applications create       # Start an empty application
//! fairfund applications list         # List stored applications
//! fairfund applications show <id>    # Print one application as JSON
//! ```
//!
//! Configuration comes from flags, the environment or a `.env` file.

use clap::{Parser, Subcommand};
use fairfund::{ApplicationStore, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fairfund")]
#[command(about = "Backend for the FAIR Data Fund application forms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve(ServerConfig),

    /// Inspect stored applications
    Applications {
        /// Storage directory
        #[arg(long, env = "FAIRFUND_STORAGE", default_value = fairfund::store::DEFAULT_STORAGE_DIR)]
        storage: PathBuf,

        #[command(subcommand)]
        action: ApplicationAction,
    },
}

#[derive(Subcommand)]
enum ApplicationAction {
    /// Create an empty application and print its UUID
    Create,

    /// List all stored applications
    List,

    /// Show details of an application
    Show {
        /// Application UUID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(config) => fairfund::server::start_server(config).await,
        Commands::Applications { storage, action } => cmd_applications(storage, action),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn cmd_applications(storage: PathBuf, action: ApplicationAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ApplicationStore::open(&storage)?;

    match action {
        ApplicationAction::Create => {
            let uuid = store.create()?;
            println!("{}", uuid);
            eprintln!("Form: /application-form/{}", uuid);
        }

        ApplicationAction::List => {
            let applications = store.list();
            if applications.is_empty() {
                eprintln!("No applications stored in {}.", store.root().display());
                return Ok(());
            }

            eprintln!("Stored applications ({}):\n", applications.len());
            for form in applications {
                println!("  {} {}", form.uuid, form.fields.name.as_deref().unwrap_or("(no name)"));
                println!("     Created: {}", form.created_at.to_rfc3339());
                println!("     Submitted: {}", if form.submitted { "yes" } else { "no" });
                if let Some(ref budget) = form.budget_filename {
                    println!("     Budget: {}", budget);
                }
                if let Some(review) = store.review(&form.uuid) {
                    println!("     Reviewed: {}", review.submitted_at.to_rfc3339());
                }
                println!();
            }
        }

        ApplicationAction::Show { id } => {
            let uuid = Uuid::parse_str(&id).map_err(|_| format!("Not a UUID: {}", id))?;
            match store.get(&uuid) {
                Some(form) => {
                    println!("{}", serde_json::to_string_pretty(form)?);
                    if let Some(review) = store.review(&uuid) {
                        println!("\nReview:");
                        println!("{}", serde_json::to_string_pretty(review)?);
                    }
                }
                None => {
                    return Err(format!("Application not found: {}", id).into());
                }
            }
        }
    }

    Ok(())
}
