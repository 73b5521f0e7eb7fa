//! Denoise Pipeline Tests
//!
//! Exercises the file-level denoise path with a stub reducer and checks
//! the 16-bit clamping contract of the WAV writer.

use std::path::Path;

use approx::assert_relative_eq;
use tempfile::tempdir;

use voiceprint::audio::{read_wav, write_wav};
use voiceprint::denoise::{cleaned_output_path, denoise_file, NoiseProfile, NoiseReduce};
use voiceprint::{Result, VoiceprintError};

/// Stub reducer: attenuates by half instead of running the real model
struct HalfGainReducer;

impl NoiseReduce for HalfGainReducer {
    fn reduce(
        &mut self,
        samples: &[f32],
        _sample_rate: u32,
        _profile: NoiseProfile,
    ) -> Result<Vec<f32>> {
        Ok(samples.iter().map(|&s| s * 0.5).collect())
    }
}

/// Helper to create a test sine wave buffer
fn sine(frequency: f32, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    let angular = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    (0..num_samples)
        .map(|i| (angular * i as f32).sin() * 0.5)
        .collect()
}

#[test]
fn test_denoise_file_preserves_length_and_rate() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("enroll.wav");

    let samples = sine(440.0, 16000, 4000);
    write_wav(&samples, 16000, &input).unwrap();

    let mut reducer = HalfGainReducer;
    let (cleaned, rate) = denoise_file(&mut reducer, &input).unwrap();

    assert_eq!(cleaned.len(), samples.len());
    assert_eq!(rate, 16000);
}

#[test]
fn test_denoise_file_missing_input() {
    let mut reducer = HalfGainReducer;
    let result = denoise_file(&mut reducer, Path::new("/nonexistent/enroll.wav"));
    assert!(matches!(result, Err(VoiceprintError::FileNotFound { .. })));
}

#[test]
fn test_full_denoise_pipeline_writes_cleaned_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("take1.wav");
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let samples = sine(220.0, 8000, 2000);
    write_wav(&samples, 8000, &input).unwrap();

    let mut reducer = HalfGainReducer;
    let (cleaned, rate) = denoise_file(&mut reducer, &input).unwrap();

    let output = cleaned_output_path(&input, &out_dir);
    write_wav(&cleaned, rate, &output).unwrap();

    assert_eq!(output, out_dir.join("take1_cleaned.wav"));

    let (reread, reread_rate) = read_wav(&output).unwrap();
    assert_eq!(reread_rate, 8000);
    assert_eq!(reread.len(), samples.len());

    // the stub halves every sample; quantization allows small drift
    for (orig, got) in samples.iter().zip(reread.iter()) {
        assert_relative_eq!(orig * 0.5, *got, epsilon = 0.001);
    }
}

#[test]
fn test_write_wav_clamps_to_16bit_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hot.wav");

    // values beyond full scale are lossily clamped by the codec
    write_wav(&[3.0, -3.0, 0.25], 8000, &path).unwrap();

    let (samples, _) = read_wav(&path).unwrap();
    assert_relative_eq!(samples[0], 32767.0 / 32768.0, epsilon = 1e-4);
    assert_relative_eq!(samples[1], -1.0, epsilon = 1e-4);
    assert_relative_eq!(samples[2], 0.25, epsilon = 0.001);
}
