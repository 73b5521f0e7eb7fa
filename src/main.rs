//! Voiceprint CLI - WAV denoising utility
//!
//! Cleans background noise from a speaker recording prior to feature
//! extraction. Errors propagate out of `main` and terminate the process
//! with a nonzero status.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use voiceprint::cli::{commands, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("Voiceprint v{}", env!("CARGO_PKG_VERSION"));

    commands::denoise(&cli.input, &cli.output_dir)
        .with_context(|| format!("failed to denoise {}", cli.input.display()))
}
