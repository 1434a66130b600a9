//! Decoding of synthesized speech into playable sample planes.

use assistant_types::{AssistantError, Result};

/// Decoded audio: one `f32` plane per channel, samples in [-1.0, 1.0)
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PcmClip {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode interleaved signed 16-bit little-endian PCM.
///
/// A trailing partial frame is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<PcmClip> {
    if channels == 0 {
        return Err(AssistantError::Audio("channel count must be at least 1".to_string()));
    }
    if bytes.len() % 2 != 0 {
        return Err(AssistantError::Audio(format!(
            "odd PCM byte count: {}",
            bytes.len()
        )));
    }

    let channel_count = channels as usize;
    let frames = bytes.len() / 2 / channel_count;
    if frames == 0 {
        return Err(AssistantError::Audio("empty audio clip".to_string()));
    }

    let mut planes = vec![Vec::with_capacity(frames); channel_count];
    for (index, pair) in bytes.chunks_exact(2).take(frames * channel_count).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        planes[index % channel_count].push(sample as f32 / 32768.0);
    }

    Ok(PcmClip {
        sample_rate,
        channels: planes,
    })
}
