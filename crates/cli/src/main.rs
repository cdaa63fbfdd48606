//! ZapRelay CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  : Initialize config & data directory
//! - `gateway`  : Start the webhook server
//! - `contacts` : Manage the reply allow-list
//! - `policy`   : Show or flip the reply toggles
//! - `history`  : Print the context window for a contact
//! - `doctor`   : Diagnose system health

use clap::{Parser, Subcommand};

mod commands;

use commands::policy::{Switch, Toggle};

#[derive(Parser)]
#[command(
    name = "zaprelay",
    about = "ZapRelay: WhatsApp webhook relay to a tool-calling agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// Start the webhook server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage the contacts allowed to receive replies
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },

    /// Show or change the reply toggles
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Print the conversation context kept for a contact
    History {
        /// Bare contact id, e.g. 5511999999999
        contact: String,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List all contacts
    List,
    /// Add an enabled contact
    Add {
        id: String,
        /// Display name (defaults to the id)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove a contact
    Remove { id: String },
    /// Allow replies to a contact
    Enable { id: String },
    /// Stop replies to a contact without removing it
    Disable { id: String },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Print the current toggles
    Show,
    /// Turn a toggle on or off
    Set {
        #[arg(value_enum)]
        toggle: Toggle,
        #[arg(value_enum)]
        value: Switch,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Contacts { action } => match action {
            ContactsAction::List => commands::contacts::list().await?,
            ContactsAction::Add { id, name } => commands::contacts::add(&id, name.as_deref()).await?,
            ContactsAction::Remove { id } => commands::contacts::remove(&id).await?,
            ContactsAction::Enable { id } => commands::contacts::set_enabled(&id, true).await?,
            ContactsAction::Disable { id } => commands::contacts::set_enabled(&id, false).await?,
        },
        Commands::Policy { action } => match action {
            PolicyAction::Show => commands::policy::show().await?,
            PolicyAction::Set { toggle, value } => commands::policy::set(toggle, value).await?,
        },
        Commands::History { contact } => commands::history::run(&contact).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
