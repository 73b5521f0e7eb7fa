//! WAV file I/O
//!
//! Handles reading speaker recordings and writing cleaned audio.
//! Integer samples are normalized to f32 on read; writes quantize to
//! 16-bit signed integers, clamping anything beyond full scale.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{Result, VoiceprintError};

/// Read a WAV file into a mono f32 buffer plus its sample rate.
///
/// Integer samples are normalized to the [-1.0, 1.0) range. Multi-channel
/// input is downmixed to mono by averaging the channels, which is what the
/// feature-extraction stage expects for speech.
///
/// # Errors
/// * `FileNotFound` - if the file does not exist
/// * `InvalidAudio` - if the file is not a valid WAV file
/// * `UnsupportedFormat` - if the bit depth is not supported
/// * `EmptyAudio` - if the file contains no samples
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    if !path.exists() {
        return Err(VoiceprintError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| VoiceprintError::InvalidAudio {
        reason: format!("failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(VoiceprintError::EmptyAudio);
    }

    let samples = if channels > 1 {
        downmix(&interleaved, channels)
    } else {
        interleaved
    };

    Ok((samples, sample_rate))
}

/// Write a mono f32 buffer as a 16-bit PCM WAV file.
///
/// Samples are scaled to the i16 range, rounded, and clamped. Values
/// outside [-1.0, 1.0] are lossily truncated to full scale.
pub fn write_wav(samples: &[f32], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| {
        VoiceprintError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;

    for &sample in samples {
        let scaled = (sample * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(scaled).map_err(|e| {
            VoiceprintError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            ))
        })?;
    }

    writer.finalize().map_err(|e| {
        VoiceprintError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;

    Ok(())
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| VoiceprintError::InvalidAudio {
                reason: format!("failed to read float samples: {}", e),
                source: Some(Box::new(e)),
            }),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| VoiceprintError::InvalidAudio {
                    reason: format!("failed to read 8-bit samples: {}", e),
                    source: Some(Box::new(e)),
                }),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| VoiceprintError::InvalidAudio {
                    reason: format!("failed to read 16-bit samples: {}", e),
                    source: Some(Box::new(e)),
                }),
            24 => {
                // 24-bit stored as i32 in hound
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / 8388608.0))
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|e| VoiceprintError::InvalidAudio {
                        reason: format!("failed to read 24-bit samples: {}", e),
                        source: Some(Box::new(e)),
                    })
            }
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| VoiceprintError::InvalidAudio {
                    reason: format!("failed to read 32-bit int samples: {}", e),
                    source: Some(Box::new(e)),
                }),
            _ => Err(VoiceprintError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

/// Downmix interleaved frames to mono by averaging channels
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
