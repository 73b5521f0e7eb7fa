//! Voiceprint - Speaker Verification Utilities
//!
//! Two independent components invoked by a speaker-verification pipeline:
//! 1. Denoiser - cleans background noise from a WAV recording before
//!    feature extraction. Signal processing is delegated to RNNoise.
//! 2. FeatureStore - persists per-speaker acoustic feature matrices in a
//!    single-file SQLite database, keyed by a 9-digit speaker id.
//!
//! The components do not exchange data; a pipeline script denoises audio,
//! extracts features elsewhere, and persists the result separately.

pub mod audio;
pub mod cli;
pub mod denoise;
pub mod error;
pub mod store;

pub use error::{Result, VoiceprintError};
