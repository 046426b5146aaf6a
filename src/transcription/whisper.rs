//! Whisper transcription using whisper.cpp
//!
//! English, greedy decoding, per-segment timestamps. Falls back to CPU when
//! GPU initialisation fails.

use super::{TranscriptSegment, Transcriber};
use crate::audio::decode::PcmAudio;
use anyhow::{anyhow, Result};
use std::path::Path;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Sample rate whisper models expect
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Transcriber backed by a ggml whisper model
pub struct WhisperTranscriber {
    ctx: WhisperContext,
    model_name: String,
    language: String,
}

impl WhisperTranscriber {
    /// Load a ggml whisper model file (e.g. ggml-tiny.en.bin)
    pub fn new(model_path: &Path, language: &str) -> Result<Self> {
        if !model_path.exists() {
            return Err(anyhow!("Whisper model not found: {}", model_path.display()));
        }

        tracing::info!("Loading Whisper model from {}", model_path.display());

        let model_str = model_path.to_str().ok_or_else(|| {
            anyhow!(
                "Model path contains invalid UTF-8: {}",
                model_path.display()
            )
        })?;

        let ctx = Self::load(model_str, true).or_else(|e| {
            tracing::warn!("GPU initialization failed: {:?}, trying CPU fallback", e);
            Self::load(model_str, false)
        })?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "whisper".to_string());

        Ok(Self {
            ctx,
            model_name,
            language: language.to_string(),
        })
    }

    fn load(model_str: &str, use_gpu: bool) -> Result<WhisperContext> {
        let mut params = WhisperContextParameters::default();
        params.use_gpu(use_gpu);

        let ctx = WhisperContext::new_with_params(model_str, params)
            .map_err(|e| anyhow!("Failed to load Whisper model: {:?}", e))?;

        tracing::info!("Whisper model loaded (gpu requested: {})", use_gpu);
        Ok(ctx)
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&mut self, audio: &PcmAudio) -> Result<Vec<TranscriptSegment>> {
        let start = std::time::Instant::now();

        let samples = resample_linear(&audio.to_f32(), audio.sample_rate, WHISPER_SAMPLE_RATE);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create whisper state: {:?}", e))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(&self.language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| anyhow!("Transcription failed: {:?}", e))?;

        // whisper timestamps are in centiseconds
        let mut segments = Vec::new();
        for segment in state.as_iter() {
            if let Ok(text) = segment.to_str() {
                segments.push(TranscriptSegment {
                    start: segment.start_timestamp() as f64 / 100.0,
                    end: segment.end_timestamp() as f64 / 100.0,
                    text: text.trim().to_string(),
                });
            }
        }

        let audio_duration = samples.len() as f32 / WHISPER_SAMPLE_RATE as f32;
        tracing::info!(
            "Transcribed {:.2}s audio in {:.2}s ({} segments)",
            audio_duration,
            start.elapsed().as_secs_f32(),
            segments.len()
        );

        Ok(segments)
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}

/// Simple linear resampling for rates other than 16kHz
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;

    (0..new_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx = src as usize;
            let frac = (src - idx as f64) as f32;
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
                (Some(a), None) => *a,
                _ => 0.0,
            }
        })
        .collect()
}
