//! EVM Keyring CLI
//!
//! An operator tool over the keyring engine: manage custodied accounts
//! and walk signing requests through the approval queue, against a local
//! JSON state file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bth-evm-keyring")]
#[command(about = "EVM keyring - custody accounts and approve signing requests")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom state file path
    #[arg(short, long, global = true)]
    state_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    CreateAccount {
        /// Import an existing private key (hex) instead of generating one
        #[arg(long)]
        private_key: Option<String>,

        /// Display name for the new account
        #[arg(long)]
        name: Option<String>,
    },

    /// List all accounts
    ListAccounts,

    /// Show one account
    GetAccount {
        /// Account id
        id: String,
    },

    /// Change an account's display name
    RenameAccount {
        /// Account id
        id: String,

        /// New display name
        name: String,
    },

    /// Delete an account and its key material
    DeleteAccount {
        /// Account id
        id: String,
    },

    /// Print an account's private key
    ExportAccount {
        /// Account id
        id: String,
    },

    /// List pending signing requests
    ListRequests,

    /// Submit a signing request
    SubmitRequest {
        /// Request id
        #[arg(long)]
        id: String,

        /// Signing method, e.g. personal_sign
        #[arg(long)]
        method: String,

        /// Method parameters as a JSON array
        #[arg(long)]
        params: String,

        /// Requesting origin
        #[arg(long)]
        origin: Option<String>,
    },

    /// Approve a pending request and print the signing result
    ApproveRequest {
        /// Request id
        id: String,
    },

    /// Reject a pending request
    RejectRequest {
        /// Request id
        id: String,
    },

    /// Flip between synchronous and asynchronous approvals
    ToggleSync,

    /// Dump the full engine state
    State,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Determine state file path
    let state_path = cli.state_file.map(PathBuf::from).unwrap_or_else(|| {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".bth-evm-keyring")
            .join("state.json")
    });

    match cli.command {
        Commands::CreateAccount { private_key, name } => {
            commands::accounts::create(&state_path, private_key, name)
        }
        Commands::ListAccounts => commands::accounts::list(&state_path),
        Commands::GetAccount { id } => commands::accounts::get(&state_path, &id),
        Commands::RenameAccount { id, name } => commands::accounts::rename(&state_path, &id, name),
        Commands::DeleteAccount { id } => commands::accounts::delete(&state_path, &id),
        Commands::ExportAccount { id } => commands::accounts::export(&state_path, &id),
        Commands::ListRequests => commands::requests::list(&state_path),
        Commands::SubmitRequest {
            id,
            method,
            params,
            origin,
        } => commands::requests::submit(&state_path, id, method, &params, origin),
        Commands::ApproveRequest { id } => commands::requests::approve(&state_path, &id),
        Commands::RejectRequest { id } => commands::requests::reject(&state_path, &id),
        Commands::ToggleSync => commands::state::toggle_sync(&state_path),
        Commands::State => commands::state::show(&state_path),
    }
}
