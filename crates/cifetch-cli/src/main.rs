//! cifetch CLI
//!
//! Runs a task on a hosted code interpreter and downloads the files it produces.

mod api;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cifetch")]
#[command(author, version, about = "cifetch - Download files produced by a hosted code interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a response with the code interpreter and download the files it produced
    Run {
        /// Task sent as the user input
        #[arg(short, long)]
        prompt: Option<String>,

        /// System instructions
        #[arg(short, long)]
        instructions: Option<String>,

        /// Model deployment name
        #[arg(short, long)]
        model: Option<String>,

        /// Directory the files are written to
        #[arg(short, long)]
        download_dir: Option<PathBuf>,

        /// Print the full response output
        #[arg(long)]
        show_output: bool,
    },

    /// List file references in a saved response document
    Scan {
        /// Response JSON file, or - for stdin
        path: PathBuf,

        /// Print references as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a single container file
    Fetch {
        /// Container id
        #[arg(long)]
        container: String,

        /// File id
        #[arg(long)]
        file: String,

        /// Local file name
        #[arg(short, long)]
        name: Option<String>,

        /// Directory the file is written to
        #[arg(short, long)]
        download_dir: Option<PathBuf>,
    },

    /// List the files stored in a container
    Files {
        /// Container id
        container: String,
    },

    /// Show what is in the download directory
    Verify {
        /// Directory to inspect
        #[arg(short, long)]
        download_dir: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration
    Show,
    /// Write a default cifetch.config.yaml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "cifetch_cli=debug,cifetch_core=debug"
        } else {
            "cifetch_cli=info,cifetch_core=warn"
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    info!("Starting cifetch");

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run {
            prompt,
            instructions,
            model,
            download_dir,
            show_output,
        } => {
            commands::run::execute(
                config_path,
                commands::run::RunOptions {
                    prompt,
                    instructions,
                    model,
                    download_dir,
                    show_output,
                },
            )
            .await
        }
        Commands::Scan { path, json } => commands::scan::execute(&path, json).await,
        Commands::Fetch {
            container,
            file,
            name,
            download_dir,
        } => {
            commands::fetch::execute(
                config_path,
                commands::fetch::FetchOptions {
                    container_id: container,
                    file_id: file,
                    name,
                    download_dir,
                },
            )
            .await
        }
        Commands::Files { container } => commands::files::execute(config_path, &container).await,
        Commands::Verify { download_dir } => {
            commands::verify::execute(config_path, download_dir).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(config_path).await,
            ConfigAction::Init { force } => commands::config::init(force).await,
        },
    };

    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}
