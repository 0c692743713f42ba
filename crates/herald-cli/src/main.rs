use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;
mod session;

use commands::run::execute as run_execute;
use commands::session::execute as session_execute;
use commands::version::execute as version_execute;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of documents the representative answers from
    #[arg(long, global = true, value_name = "DIR")]
    knowledge_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive conversation (the default)
    #[command(about = "Start an interactive conversation with the representative")]
    Session,

    /// Ask a single question and exit
    #[command(about = "Ask a single question and print the answer")]
    Run {
        /// The question to ask
        #[arg(short, long, value_name = "TEXT")]
        text: String,
    },

    /// Print the version
    #[command(about = "Print the version")]
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Version) => version_execute().await,
        Some(Command::Run { text }) => run_execute(cli.knowledge_dir, text).await,
        Some(Command::Session) | None => session_execute(cli.knowledge_dir).await,
    }
}
