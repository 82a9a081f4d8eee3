//! # quill CLI
//!
//! Command-line client for a quill document backend. Every command drives
//! the same sync engine an editor would: documents are opened through the
//! workspace initializer and edits go through the debounced autosave.

mod commands;
mod envelope;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quill_types::TransformAction;

use crate::settings::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file [default: quill.yml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, env = "QUILL_API_URL", global = true)]
    api_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, env = "QUILL_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Autosave quiet period in milliseconds
    #[arg(long, env = "QUILL_QUIET_MS", global = true)]
    quiet_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents in the library
    List {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create a new draft and print its id
    New {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Open a document and print it
    Show {
        /// Document id
        id: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replace a document's content with a file and wait for the save
    Push {
        /// Document id
        id: String,

        /// Editor state (JSON) to upload
        file: PathBuf,
    },

    /// Autosave a file into a document whenever it changes
    Watch {
        /// Document id
        id: String,

        /// Editor state (JSON) to follow
        file: PathBuf,
    },

    /// Publish a document
    Publish {
        /// Document id
        id: String,

        /// Upload this editor state before publishing
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Rename a document
    Rename {
        /// Document id
        id: String,

        /// New title
        title: String,
    },

    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },

    /// Summarize, continue, title or grammar-fix text
    Transform {
        #[arg(long, value_enum)]
        action: ActionArg,

        /// Input file (defaults to stdin)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print resolved settings
    Config {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum ActionArg {
    Summarize,
    Continue,
    Title,
    FixGrammar,
}

impl From<ActionArg> for TransformAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Summarize => TransformAction::Summarize,
            ActionArg::Continue => TransformAction::Continue,
            ActionArg::Title => TransformAction::Title,
            ActionArg::FixGrammar => TransformAction::FixGrammar,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = Settings::resolve(
        cli.config.as_deref(),
        Overrides {
            api_url: cli.api_url,
            token: cli.token,
            quiet_ms: cli.quiet_ms,
        },
    )?;

    match cli.command {
        Commands::List { json } => commands::list_documents(&settings, json).await,
        Commands::New { json } => commands::create_document(&settings, json).await,
        Commands::Show { id, json } => commands::show_document(&settings, &id, json).await,
        Commands::Push { id, file } => commands::push_file(&settings, &id, &file).await,
        Commands::Watch { id, file } => commands::watch_file(&settings, &id, &file).await,
        Commands::Publish { id, file } => {
            commands::publish_document(&settings, &id, file.as_deref()).await
        }
        Commands::Rename { id, title } => commands::rename_document(&settings, &id, &title).await,
        Commands::Delete { id } => commands::delete_document(&settings, &id).await,
        Commands::Transform { action, file } => {
            commands::transform_text(&settings, action.into(), file.as_deref()).await
        }
        Commands::Config { json } => commands::show_config(&settings, json),
    }
}
