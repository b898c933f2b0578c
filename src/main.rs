mod app;
mod cache;
mod commands;
mod config;
mod event;
mod logging;
mod platform;
mod session;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coherent")]
#[command(about = "A guided coherent-breathing timer for the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/coherent/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Run the breathing timer (default)
  Run {
    /// Time limit in minutes; 0 means no limit
    #[arg(short, long)]
    limit: Option<u32>,

    /// Start with the audio cue enabled
    #[arg(short, long)]
    sound: bool,
  },

  /// Manage the offline asset cache
  Cache {
    /// Cache version to operate on (default: from config)
    #[arg(long)]
    cache_version: Option<String>,

    #[command(subcommand)]
    action: commands::CacheAction,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  match args.command {
    None => run_timer(config).await,
    Some(Commands::Run { limit, sound }) => {
      // Override session defaults if specified on command line
      if let Some(limit) = limit {
        config.session.time_limit = Some(limit);
      }
      if sound {
        config.session.sound = true;
      }
      run_timer(config).await
    }
    Some(Commands::Cache {
      cache_version,
      action,
    }) => commands::run_cache(&config, cache_version, action).await,
  }
}

async fn run_timer(config: config::Config) -> Result<()> {
  let mut app = app::App::new(&config)?;
  app.run().await
}
