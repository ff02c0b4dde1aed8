//! `ActionBot` - email triage from the terminal
//!
//! Lists the inbox, has the triage backend classify every message, and
//! drafts and sends replies with it.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod commands;
mod display;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "actionbot")]
#[command(version, about = "AI-assisted email triage", long_about = None)]
struct Cli {
    /// Backend base URL (overrides settings and `ACTIONBOT_BACKEND_URL`)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the login page in the browser
    Login,

    /// Finish logging in with the user id (or full redirect URL) from the login redirect
    Callback {
        /// `userId` value, or the URL the browser was redirected to
        user_id: String,
    },

    /// Forget the logged-in user
    Logout,

    /// Show the logged-in user's profile
    Whoami,

    /// List and classify the inbox
    Inbox {
        /// Only show messages of this category (e.g. "invoice", "leave-request")
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one message with its classification
    Show {
        /// Message id
        message_id: String,
    },

    /// Draft a reply to a message, and optionally send it
    Reply {
        /// Message id
        message_id: String,

        /// Replace the generated draft with this text
        #[arg(long)]
        text: Option<String>,

        /// Send the reply
        #[arg(long)]
        send: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "actionbot=info,actionbot_core=info,actionbot_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!("Starting ActionBot");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(
                e.downcast_ref::<actionbot_core::Error>(),
                Some(actionbot_core::Error::AccessRevoked)
            ) {
                eprintln!("Access revoked, please log in again");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = commands::Context::load(cli.backend_url).await?;

    match cli.command {
        Command::Login => commands::login(&ctx).await,
        Command::Callback { user_id } => commands::callback(&ctx, &user_id),
        Command::Logout => commands::logout(&ctx),
        Command::Whoami => commands::whoami(&ctx).await,
        Command::Inbox { category } => commands::inbox(&ctx, category.as_deref()).await,
        Command::Show { message_id } => commands::show(&ctx, &message_id).await,
        Command::Reply {
            message_id,
            text,
            send,
        } => commands::reply(&ctx, &message_id, text, send).await,
    }
}
