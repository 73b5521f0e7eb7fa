//! CLI Module
//!
//! Command-line interface for the denoise utility.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

/// Voiceprint denoiser - clean background noise from a WAV recording
#[derive(Parser, Debug)]
#[command(name = "voiceprint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input WAV recording
    pub input: PathBuf,

    /// Folder that receives `<input>_cleaned.wav`
    pub output_dir: PathBuf,
}
