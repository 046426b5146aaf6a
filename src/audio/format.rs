//! Sample format conversion using the rubato resampler
//!
//! Downmixes interleaved multi-channel audio to mono and resamples it to the
//! rate the segmentation engine and downstream models expect.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Streaming converter from interleaved N-channel f32 to mono f32 at a target rate
pub struct AudioConverter {
    resampler: SincFixedIn<f32>,
    source_channels: usize,
    chunk_size: usize,
    ratio: f64,
    /// Real (unpadded) source frames fed so far
    frames_in: usize,
}

impl AudioConverter {
    /// Create a new audio converter
    ///
    /// # Arguments
    /// * `source_rate` - Source sample rate (e.g., 44100)
    /// * `target_rate` - Target sample rate (typically 16000)
    /// * `source_channels` - Number of interleaved source channels
    /// * `chunk_size` - Size of input chunks in frames (e.g., 1024)
    pub fn new(
        source_rate: u32,
        target_rate: u32,
        source_channels: usize,
        chunk_size: usize,
    ) -> Result<Self, rubato::ResamplerConstructionError> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let ratio = target_rate as f64 / source_rate as f64;
        let resampler = SincFixedIn::new(
            ratio,
            2.0,
            params,
            chunk_size,
            1, // mono output
        )?;

        Ok(Self {
            resampler,
            source_channels: source_channels.max(1),
            chunk_size,
            ratio,
            frames_in: 0,
        })
    }

    /// Number of interleaved samples one call to [`process`](Self::process) expects
    pub fn interleaved_chunk_len(&self) -> usize {
        self.chunk_size * self.source_channels
    }

    /// Downmix and resample one chunk of interleaved samples
    ///
    /// `input` must hold exactly [`interleaved_chunk_len`](Self::interleaved_chunk_len)
    /// samples. Output still carries the resampler delay; [`finish_to_i16`](Self::finish_to_i16)
    /// removes it.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, rubato::ResampleError> {
        self.frames_in += input.len() / self.source_channels;
        self.resample(input)
    }

    /// Process and convert to 16-bit samples
    pub fn process_to_i16(&mut self, input: &[f32]) -> Result<Vec<i16>, rubato::ResampleError> {
        Ok(f32_to_i16(&self.process(input)?))
    }

    /// Number of output frames the input fed so far should produce
    pub fn expected_output_len(&self) -> usize {
        (self.frames_in as f64 * self.ratio).round() as usize
    }

    /// Process the final short chunk and return the complete, aligned output
    ///
    /// `output` is everything collected from [`process_to_i16`](Self::process_to_i16).
    /// The resampler delay is flushed with silence and dropped from the front,
    /// and the result is trimmed to [`expected_output_len`](Self::expected_output_len)
    /// so chunk padding never shows up as trailing silence.
    pub fn finish_to_i16(
        &mut self,
        pending: &[f32],
        mut output: Vec<i16>,
    ) -> Result<Vec<i16>, rubato::ResampleError> {
        let chunk_len = self.interleaved_chunk_len();

        if !pending.is_empty() {
            self.frames_in += pending.len() / self.source_channels;
            let mut padded = pending.to_vec();
            padded.resize(chunk_len, 0.0);
            output.extend(f32_to_i16(&self.resample(&padded)?));
        }

        let delay = self.resampler.output_delay();
        let expected = self.expected_output_len();
        let silence = vec![0.0; chunk_len];
        while output.len() < delay + expected {
            let flushed = self.resample(&silence)?;
            if flushed.is_empty() {
                break;
            }
            output.extend(f32_to_i16(&flushed));
        }

        output.drain(..delay.min(output.len()));
        output.truncate(expected);
        Ok(output)
    }

    fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>, rubato::ResampleError> {
        let mono = downmix(input, self.source_channels);
        let waves_out = self.resampler.process(&[mono], None)?;
        Ok(waves_out.into_iter().next().unwrap_or_default())
    }
}

/// Average interleaved channels into a single mono channel
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Convert f32 samples to i16 with proper scaling
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
        .collect()
}

/// Convert i16 samples to f32 with proper scaling
pub fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}
