use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use weditor::config::{EditorConfig, Overrides};

mod cmd;

#[derive(Parser)]
#[command(name = "weditor")]
#[command(version, about = "Browser-based editor for generated documentation sites")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to $SETTINGS_FILE, then ./weditor.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Content root; overrides doc_root from the settings file
    #[arg(long, global = true)]
    pub doc_root: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the viewer and editor
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Open a browser once the server is listening
        #[arg(long)]
        open: bool,
    },
    /// Revert, pull and regenerate the content root once
    Update {
        /// Regenerate only this module
        #[arg(short, long)]
        module: Option<String>,

        /// Regenerate the PDF output instead of HTML
        #[arg(long)]
        pdf: bool,
    },
    /// Print the editable source behind a generated page
    Locate {
        /// Page path relative to the content root
        doc_path: String,

        /// Print a JSON object instead of a bare path
        #[arg(long)]
        json: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default weditor.toml file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let mut overrides = Overrides {
        doc_root: cli.doc_root.clone(),
        ..Overrides::default()
    };

    match &cli.command {
        Commands::Serve { port, host, open } => {
            overrides.port = *port;
            overrides.host = host.clone();
            let config = EditorConfig::load(cli.config.as_deref(), &overrides)?;
            cmd::cmd_serve(config, *open).await?;
        }
        Commands::Update { module, pdf } => {
            let config = EditorConfig::load(cli.config.as_deref(), &overrides)?;
            cmd::cmd_update(config, module.as_deref(), *pdf).await?;
        }
        Commands::Locate { doc_path, json } => {
            let config = EditorConfig::load(cli.config.as_deref(), &overrides)?;
            cmd::cmd_locate(config, doc_path, *json)?;
        }
        Commands::Config { command } => {
            cmd::cmd_config(cli.config.as_deref(), &overrides, command.clone())?;
        }
    }

    Ok(())
}
