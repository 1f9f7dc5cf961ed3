//! CLI command definitions for the `clubhub` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Conversational assistant for the clubs platform.
#[derive(Parser)]
#[command(name = "clubhub", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "CLUBHUB_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long, env = "CLUBHUB_PORT")]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long, env = "CLUBHUB_HOST")]
        host: Option<String>,
    },

    /// Chat with the assistant in the terminal.
    Chat {
        /// User id the messages are sent as.
        #[arg(long)]
        user: String,

        /// Resume a previous session by ID.
        #[arg(long)]
        session: Option<String>,
    },

    /// Inspect or delete sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Print the message history of a session.
    History {
        /// Session ID.
        id: String,

        /// Number of most recent messages to show.
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Delete a session with its messages and wizard state.
    #[command(alias = "rm")]
    Delete {
        /// Session ID to delete.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}
