//! Synthetic-voice (spoof) scoring interface
//!
//! The anti-spoofing model is external. The crate ships no [`SpoofScorer`]
//! implementation: applications embedding the analyzer supply one through
//! [`CallAnalyzer::with_spoof_scorer`](crate::analysis::CallAnalyzer::with_spoof_scorer).
//! Implementations receive the decoded call audio; [`prepare_model_input`]
//! produces the fixed-length mono 16kHz window such models are trained on.

use crate::audio::decode::PcmAudio;
use serde::{Deserialize, Serialize};

/// Sample rate the spoof model expects
pub const MODEL_SAMPLE_RATE: u32 = 16_000;

/// Number of samples in one model input (~4 seconds at 16kHz)
pub const MODEL_INPUT_SAMPLES: usize = 64_600;

/// Class probabilities from the spoof model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpoofScore {
    /// Probability the voice is genuine
    pub bonafide_prob: f64,
    /// Probability the voice is synthetic or replayed
    pub spoof_prob: f64,
}

impl SpoofScore {
    /// Build from two-class logits via softmax (bonafide first)
    pub fn from_logits(bonafide: f64, spoof: f64) -> Self {
        let max = bonafide.max(spoof);
        let b = (bonafide - max).exp();
        let s = (spoof - max).exp();
        let total = b + s;
        Self {
            bonafide_prob: b / total,
            spoof_prob: s / total,
        }
    }

    /// Build from a single raw spoof score, clamped to [0, 1]
    pub fn from_raw(spoof: f64) -> Self {
        let spoof_prob = spoof.clamp(0.0, 1.0);
        Self {
            bonafide_prob: 1.0 - spoof_prob,
            spoof_prob,
        }
    }
}

/// Anti-spoofing model
pub trait SpoofScorer {
    fn score(&mut self, audio: &PcmAudio) -> anyhow::Result<SpoofScore>;

    /// Human-readable model name for reports
    fn model_name(&self) -> String;
}

impl<T: SpoofScorer + ?Sized> SpoofScorer for Box<T> {
    fn score(&mut self, audio: &PcmAudio) -> anyhow::Result<SpoofScore> {
        (**self).score(audio)
    }

    fn model_name(&self) -> String {
        (**self).model_name()
    }
}

/// Pad with silence or truncate to exactly [`MODEL_INPUT_SAMPLES`] samples
///
/// `audio` must already be at [`MODEL_SAMPLE_RATE`].
pub fn prepare_model_input(audio: &PcmAudio) -> anyhow::Result<Vec<f32>> {
    if audio.sample_rate != MODEL_SAMPLE_RATE {
        anyhow::bail!(
            "Spoof model input must be {}Hz, got {}Hz",
            MODEL_SAMPLE_RATE,
            audio.sample_rate
        );
    }

    let mut samples = audio.to_f32();
    samples.resize(MODEL_INPUT_SAMPLES, 0.0);
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_logits_is_softmax() {
        let score = SpoofScore::from_logits(2.0, 0.0);
        assert!((score.bonafide_prob + score.spoof_prob - 1.0).abs() < 1e-12);
        assert!((score.bonafide_prob - 0.880797).abs() < 1e-5);

        let equal = SpoofScore::from_logits(3.5, 3.5);
        assert!((equal.spoof_prob - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_logits_large_values() {
        let score = SpoofScore::from_logits(1000.0, -1000.0);
        assert!(score.bonafide_prob.is_finite());
        assert!((score.bonafide_prob - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_raw_clamps() {
        assert_eq!(SpoofScore::from_raw(1.7).spoof_prob, 1.0);
        assert_eq!(SpoofScore::from_raw(-0.2).bonafide_prob, 1.0);
        assert!((SpoofScore::from_raw(0.25).bonafide_prob - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_pads_short_audio() {
        let audio = PcmAudio::from_samples(&vec![16384i16; 1000], MODEL_SAMPLE_RATE);
        let input = prepare_model_input(&audio).unwrap();
        assert_eq!(input.len(), MODEL_INPUT_SAMPLES);
        assert!((input[999] - 0.5).abs() < 1e-4);
        assert_eq!(input[1000], 0.0);
    }

    #[test]
    fn test_prepare_truncates_long_audio() {
        let audio = PcmAudio::from_samples(&vec![1i16; 100_000], MODEL_SAMPLE_RATE);
        assert_eq!(prepare_model_input(&audio).unwrap().len(), MODEL_INPUT_SAMPLES);
    }

    #[test]
    fn test_prepare_rejects_wrong_rate() {
        let audio = PcmAudio::from_samples(&[0i16; 10], 8_000);
        assert!(prepare_model_input(&audio).is_err());
    }
}
