use anyhow::Result;
use chatprobe_common::observability::init_logging;
use chatprobe_config::{ChatprobeConfig, ChatprobeConfigLoader};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
mod commands;

/// Ask a web chat assistant questions through a real browser.
#[derive(Parser)]
#[command(name = "chatprobe", version)]
struct Cli {
    /// Configuration file (YAML); must exist when given.
    #[arg(short, long, global = true, env = "CHATPROBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and print the answer
    Ask {
        question: String,
        /// Also click the Nth suggested follow-up question (0-based)
        #[arg(long)]
        follow_up: Option<usize>,
        /// Do not write screenshots and text files
        #[arg(long)]
        no_artifacts: bool,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report which answer selectors match, optionally after asking a question
    Probe { question: Option<String> },
    /// Serve POST /ask over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<ChatprobeConfig> {
    let mut loader = ChatprobeConfigLoader::new()
        .with_user_file()
        .with_optional_file("chatprobe.yaml");
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    Ok(loader.load()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    if let Command::Config = cli.command {
        print!("{}", cfg.to_yaml()?);
        return Ok(());
    }

    let logging = init_logging(&cfg.logging)?;
    tracing::debug!(log = %logging.path().display(), "logging initialised");

    match cli.command {
        Command::Ask {
            question,
            follow_up,
            no_artifacts,
            json,
        } => commands::ask(&cfg, question, follow_up, !no_artifacts, json).await,
        Command::Probe { question } => commands::probe(&cfg, question.as_deref()).await,
        Command::Serve { host, port } => commands::serve(cfg, host, port).await,
        Command::Config => Ok(()),
    }
}
