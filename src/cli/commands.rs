//! CLI Command Implementations

use std::path::Path;

use log::info;

use crate::audio;
use crate::denoise::{cleaned_output_path, denoise_file, RnnNoiseReducer};
use crate::error::Result;

/// Denoise `input` and write `<stem>_cleaned.wav` into `output_dir`.
pub fn denoise(input: &Path, output_dir: &Path) -> Result<()> {
    info!("Denoising: {}", input.display());

    let mut reducer = RnnNoiseReducer::new();
    let (cleaned, sample_rate) = denoise_file(&mut reducer, input)?;

    let output = cleaned_output_path(input, output_dir);
    audio::write_wav(&cleaned, sample_rate, &output)?;

    println!("Cleaned audio written: {}", output.display());

    Ok(())
}
