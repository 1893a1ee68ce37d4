use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use interviewer::config::InterviewerConfig;
use interviewer::logging::{self, LogFormat, LogOptions};
use interviewer::phase::Phase;

mod cmd;

#[derive(Parser)]
#[command(name = "interviewer")]
#[command(version, about = "Phased brand interview driven by an AI assistant")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Directory holding interview documents. Overrides interviewer.toml and INTERVIEWER_STORE_DIR.
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new interview and chat
    Start {
        /// Brand the interview is about
        #[arg(short, long)]
        brand: String,
    },
    /// Resume an interview
    Chat { id: String },
    /// Show progress and reports of an interview
    Status { id: String },
    /// Write accepted reports as markdown files
    Export {
        id: String,
        /// Only this phase (phase1, phase2, phase3, terminal)
        #[arg(short, long)]
        phase: Option<Phase>,
        /// Output directory (defaults to the project directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List stored interviews
    List,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default interviewer.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    // A missing .env is fine; keys may come from the environment.
    let _ = dotenvy::from_path(project_dir.join(".env"));

    let config = InterviewerConfig::with_cli_args(project_dir, cli.store_dir.clone())?;
    let log_dir = config.log_dir();
    let _log_guard = logging::init(LogOptions {
        verbose: cli.verbose,
        format: if cli.log_json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        },
        dir: log_dir.as_deref(),
    })?;

    match &cli.command {
        Commands::Start { brand } => cmd::cmd_start(&config, brand).await?,
        Commands::Chat { id } => cmd::cmd_chat(&config, id).await?,
        Commands::Status { id } => cmd::cmd_status(&config, id).await?,
        Commands::Export { id, phase, out } => {
            cmd::cmd_export(&config, id, *phase, out.clone()).await?
        }
        Commands::List => cmd::cmd_list(&config).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
