//! Noise reduction for speaker recordings
//!
//! The signal processing itself is delegated to RNNoise via the
//! `nnnoiseless` crate. This module adapts normalized sample buffers in
//! and out of the library and exposes a trait seam so the pipeline can
//! run against a stub in tests.

use std::path::{Path, PathBuf};

use log::info;
use nnnoiseless::DenoiseState;

use crate::audio;
use crate::error::Result;

/// Which part of the signal to treat as the noise profile.
///
/// The pipeline default profiles the entire recording, since enrollment
/// clips carry no marked noise-only segment. Reducers that estimate the
/// noise floor adaptively accept the profile and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseProfile {
    /// Profile noise over the whole signal.
    #[default]
    EntireSignal,
    /// Profile noise over the sample range `[start, end)`.
    Segment { start: usize, end: usize },
}

/// A noise-reduction backend.
///
/// Implementations must return a buffer of the same length as the input.
/// The sample rate is never changed by reduction.
pub trait NoiseReduce {
    fn reduce(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        profile: NoiseProfile,
    ) -> Result<Vec<f32>>;
}

/// RNNoise-backed noise reducer.
///
/// RNNoise processes 480-sample frames of f32 audio scaled to the i16
/// range and estimates the noise floor adaptively, so the caller-supplied
/// profile is ignored. The model is tuned for 48kHz speech but degrades
/// gracefully at other rates.
pub struct RnnNoiseReducer {
    state: Box<DenoiseState<'static>>,
}

impl RnnNoiseReducer {
    pub fn new() -> Self {
        Self {
            state: DenoiseState::new(),
        }
    }
}

impl Default for RnnNoiseReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseReduce for RnnNoiseReducer {
    fn reduce(
        &mut self,
        samples: &[f32],
        _sample_rate: u32,
        _profile: NoiseProfile,
    ) -> Result<Vec<f32>> {
        let frame_size = DenoiseState::FRAME_SIZE;

        // RNNoise expects i16-range floats; pad the tail to a whole frame.
        let mut padded: Vec<f32> = samples.iter().map(|&s| s * 32768.0).collect();
        let remainder = padded.len() % frame_size;
        if remainder != 0 {
            padded.resize(padded.len() + frame_size - remainder, 0.0);
        }

        let mut cleaned = Vec::with_capacity(padded.len());
        let mut output = vec![0.0f32; frame_size];
        for frame in padded.chunks_exact(frame_size) {
            self.state.process_frame(&mut output, frame);
            cleaned.extend(output.iter().map(|&s| s / 32768.0));
        }

        cleaned.truncate(samples.len());
        Ok(cleaned)
    }
}

/// Denoise a WAV file and return the cleaned buffer with its sample rate.
pub fn denoise_file<R: NoiseReduce>(reducer: &mut R, input: &Path) -> Result<(Vec<f32>, u32)> {
    let (samples, sample_rate) = audio::read_wav(input)?;
    info!(
        "read {} samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        input.display()
    );

    let cleaned = reducer.reduce(&samples, sample_rate, NoiseProfile::EntireSignal)?;
    Ok((cleaned, sample_rate))
}

/// Output path for a cleaned recording: `<stem>_cleaned.wav` inside `out_dir`.
pub fn cleaned_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{}_cleaned.wav", stem))
}
