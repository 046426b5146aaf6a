//! Fixed-duration framing of 16-bit mono PCM
//!
//! Slices an in-memory PCM buffer into consecutive, non-overlapping frames
//! suitable for per-frame speech classification. A trailing partial frame is
//! dropped.

use serde::{Deserialize, Serialize};

/// Bytes per sample for 16-bit PCM
pub const BYTES_PER_SAMPLE: usize = 2;

/// Frame duration for VAD processing
///
/// WebRTC VAD accepts 10ms, 20ms, or 30ms frames.
/// At 16kHz sample rate:
/// - 10ms = 160 samples
/// - 20ms = 320 samples
/// - 30ms = 480 samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrameDuration {
    /// 10ms frame
    Ms10 = 10,
    /// 20ms frame
    Ms20 = 20,
    /// 30ms frame
    #[default]
    Ms30 = 30,
}

impl FrameDuration {
    /// Frame length in milliseconds
    pub const fn as_millis(&self) -> u32 {
        *self as u32
    }

    /// Frame length in seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.as_millis() as f64 / 1000.0
    }

    /// Number of samples in one frame at the given sample rate
    pub const fn samples_at(&self, sample_rate: u32) -> usize {
        (sample_rate as usize * self.as_millis() as usize) / 1000
    }

    /// Number of bytes in one frame of 16-bit PCM at the given sample rate
    pub const fn bytes_at(&self, sample_rate: u32) -> usize {
        self.samples_at(sample_rate) * BYTES_PER_SAMPLE
    }
}

/// A single frame of audio with its position in the stream
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame<'a> {
    /// Position of the frame in the stream
    pub index: usize,
    /// Raw little-endian 16-bit samples
    pub bytes: &'a [u8],
    /// Start of the frame in seconds from the beginning of the buffer
    pub timestamp: f64,
    /// Length of the frame in seconds
    pub duration: f64,
}

impl AudioFrame<'_> {
    /// End of the frame in seconds
    ///
    /// Equal to the timestamp of the following frame.
    pub fn end(&self) -> f64 {
        (self.index + 1) as f64 * self.duration
    }
}

/// Lazy iterator over the frames of a PCM buffer
///
/// Created by [`frames`]. Iterating again requires calling [`frames`] again
/// with the same buffer.
#[derive(Debug, Clone)]
pub struct FrameSource<'a> {
    audio: &'a [u8],
    frame_bytes: usize,
    duration: f64,
    index: usize,
}

impl<'a> FrameSource<'a> {
    /// Size of each frame in bytes
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// Total number of full frames this source yields
    pub fn frame_count(&self) -> usize {
        if self.frame_bytes == 0 {
            return 0;
        }
        self.audio.len() / self.frame_bytes
    }
}

impl<'a> Iterator for FrameSource<'a> {
    type Item = AudioFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame_bytes == 0 {
            return None;
        }

        let offset = self.index * self.frame_bytes;
        let end = offset + self.frame_bytes;
        if end > self.audio.len() {
            return None;
        }

        // Timestamps come from the index so they never drift
        let frame = AudioFrame {
            index: self.index,
            bytes: &self.audio[offset..end],
            timestamp: self.index as f64 * self.duration,
            duration: self.duration,
        };
        self.index += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frame_count().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameSource<'_> {}

/// Slice `audio` into frames of `frame_duration` at `sample_rate`.
///
/// `audio` must be mono 16-bit little-endian PCM. Leftover bytes that do not
/// fill a whole frame are ignored.
pub fn frames(frame_duration: FrameDuration, audio: &[u8], sample_rate: u32) -> FrameSource<'_> {
    let frame_bytes = frame_duration.bytes_at(sample_rate);
    let duration = frame_bytes as f64 / (BYTES_PER_SAMPLE as f64 * sample_rate.max(1) as f64);

    FrameSource {
        audio,
        frame_bytes,
        duration,
        index: 0,
    }
}

/// Decode little-endian 16-bit PCM bytes into samples
pub fn pcm_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Encode samples as little-endian 16-bit PCM bytes
pub fn i16_to_pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
