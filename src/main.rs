use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use clipforge::config::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(version, about = "Short-form video pipeline coordinator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (item store, assets, and output live under it).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn pending ideas into planned items (outline, clips, narration)
    Plan,
    /// Render planned items and send them for approval
    Render,
    /// Upload rendered items awaiting approval, bypassing the gate
    Publish {
        /// Publish a single item instead of every rendered one
        #[arg(long)]
        id: Option<String>,
    },
    /// Mark an item rejected without going through the gate
    Reject {
        #[arg(long)]
        id: String,
    },
    /// Show item counts per lifecycle state
    Status,
    /// Clear the active collection (archive is kept)
    ResetState,
    /// Listen for operator approvals and commands
    Serve,
    /// Run the interactive host authorization flow
    Auth,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let root_dir = match cli.root.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = Config::new(root_dir, cli.verbose)?;

    match &cli.command {
        Commands::Plan => cmd::cmd_plan(&config).await?,
        Commands::Render => cmd::cmd_render(&config).await?,
        Commands::Publish { id } => cmd::cmd_publish(&config, id.as_deref()).await?,
        Commands::Reject { id } => cmd::cmd_reject(&config, id)?,
        Commands::Status => cmd::cmd_status(&config)?,
        Commands::ResetState => cmd::cmd_reset_state(&config)?,
        Commands::Serve => cmd::cmd_serve(config).await?,
        Commands::Auth => cmd::cmd_auth(&config).await?,
    }

    Ok(())
}
