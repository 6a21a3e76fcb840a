use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lazyload_core::{AppConfig, ConfigPatch};

mod commands;
mod scene;

#[derive(Parser)]
#[command(name = "lazyload")]
#[command(author, version, about = "Visibility-gated image loading simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of ~/.config/lazyload/config.toml
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll through a scene file and report which images load when
    Simulate {
        /// Scene file (TOML) describing the container and its images
        #[arg(short = 's', long)]
        scene: PathBuf,
        /// Pixels scrolled per simulated scroll event
        #[arg(long, default_value_t = 50.0)]
        step: f64,
        /// Override the pre-load margin (px)
        #[arg(long)]
        margin: Option<f64>,
        /// Override the scroll throttle delay (ms)
        #[arg(long = "throttle-ms")]
        throttle_ms: Option<u64>,
        /// Override the delay between successive loads (ms)
        #[arg(long = "interval-ms")]
        interval_ms: Option<u64>,
        /// Override the minimum load transition time (ms)
        #[arg(long = "min-animation-ms")]
        min_animation_ms: Option<u64>,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short = 'f', long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Simulate {
            scene,
            step,
            margin,
            throttle_ms,
            interval_ms,
            min_animation_ms,
        } => {
            let overrides = ConfigPatch {
                pre_load_margin: margin,
                throttle_delay_ms: throttle_ms,
                inter_item_delay_ms: interval_ms,
                min_animation_duration_ms: min_animation_ms,
                ..Default::default()
            };
            let options = commands::simulate::SimulateOptions { step, overrides };
            commands::simulate::run(&config, &scene, options).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config),
            ConfigAction::Init { force } => commands::config::init(force),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
