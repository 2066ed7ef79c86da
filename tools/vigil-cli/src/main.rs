//! Vigil CLI: webcam motion alarm.
//!
//! Usage:
//!   vigil watch [OPTIONS]    Watch the camera and raise alarms
//!   vigil check              Check credentials, config, sound and camera

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use vigil_common::config::{config_file_path, AppConfig, PolicyKind};
use vigil_common::error::VigilError;

mod commands;

#[derive(Parser)]
#[command(
    name = "vigil",
    about = "Webcam motion alarm with Telegram notifications",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/vigil/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the camera until `q` is pressed
    Watch {
        /// Camera device index
        #[arg(short, long)]
        device: Option<i32>,

        /// Alarm policy: edge|counter
        #[arg(long)]
        policy: Option<PolicyKind>,

        /// Alarm sound file
        #[arg(long)]
        sound: Option<PathBuf>,

        /// Run without a preview window
        #[arg(long)]
        headless: bool,
    },

    /// Check credentials, configuration, sound file and camera
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    vigil_common::logging::init_logging(&config.logging);
    if let Some(e) = config_error {
        tracing::warn!(
            path = %config_file_path().display(),
            error = %e,
            "Ignoring unreadable config, using defaults"
        );
    }

    match cli.command {
        Commands::Watch {
            device,
            policy,
            sound,
            headless,
        } => {
            if let Some(device) = device {
                config.camera.device_index = device;
            }
            if let Some(policy) = policy {
                config.alarm.policy = policy;
            }
            if let Some(sound) = sound {
                config.notify.sound_file = sound;
            }
            config.display.headless |= headless;
            commands::watch::run(config)
        }
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
    }
}

/// An explicit `--config` must load; the default location may be absent or
/// broken, in which case defaults are used.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(AppConfig, Option<VigilError>)> {
    match explicit {
        Some(path) => Ok((AppConfig::load_from(path)?, None)),
        None => Ok(AppConfig::load()),
    }
}
