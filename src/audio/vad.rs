//! Per-frame speech classification
//!
//! Defines the [`SpeechClassifier`] seam consumed by the segment collector and
//! its webrtc-vad implementation. The classifier is an explicitly constructed
//! handle; nothing here is process-global.

use crate::audio::frame::{pcm_to_i16, FrameDuration, BYTES_PER_SAMPLE};
use serde::{Deserialize, Serialize};
use webrtc_vad::{SampleRate, Vad, VadMode};

/// VAD operating mode determining aggressiveness of speech detection
///
/// Higher modes are more aggressive (stricter about what counts as speech),
/// which reduces false positives but may increase missed detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VadAggressiveness {
    /// Least aggressive; best for clean audio environments
    Quality = 0,
    /// Low bitrate optimised
    #[default]
    LowBitrate = 1,
    /// More aggressive; good for moderate background noise
    Aggressive = 2,
    /// Most aggressive; best for noisy environments
    VeryAggressive = 3,
}

impl From<VadAggressiveness> for VadMode {
    fn from(mode: VadAggressiveness) -> Self {
        match mode {
            VadAggressiveness::Quality => VadMode::Quality,
            VadAggressiveness::LowBitrate => VadMode::LowBitrate,
            VadAggressiveness::Aggressive => VadMode::Aggressive,
            VadAggressiveness::VeryAggressive => VadMode::VeryAggressive,
        }
    }
}

impl TryFrom<u8> for VadAggressiveness {
    type Error = VadError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Quality),
            1 => Ok(Self::LowBitrate),
            2 => Ok(Self::Aggressive),
            3 => Ok(Self::VeryAggressive),
            other => Err(VadError::InvalidAggressiveness(other)),
        }
    }
}

/// Sample rates accepted by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportedSampleRate {
    Hz8000,
    Hz16000,
    Hz32000,
    Hz48000,
}

impl SupportedSampleRate {
    /// All supported rates in ascending order
    pub const ALL: [SupportedSampleRate; 4] = [
        SupportedSampleRate::Hz8000,
        SupportedSampleRate::Hz16000,
        SupportedSampleRate::Hz32000,
        SupportedSampleRate::Hz48000,
    ];

    /// Validate a raw sample rate
    pub fn from_hz(hz: u32) -> Result<Self, VadError> {
        match hz {
            8_000 => Ok(Self::Hz8000),
            16_000 => Ok(Self::Hz16000),
            32_000 => Ok(Self::Hz32000),
            48_000 => Ok(Self::Hz48000),
            other => Err(VadError::UnsupportedSampleRate(other)),
        }
    }

    /// Rate in Hz
    pub const fn hz(&self) -> u32 {
        match self {
            Self::Hz8000 => 8_000,
            Self::Hz16000 => 16_000,
            Self::Hz32000 => 32_000,
            Self::Hz48000 => 48_000,
        }
    }
}

impl From<SupportedSampleRate> for SampleRate {
    fn from(rate: SupportedSampleRate) -> Self {
        match rate {
            SupportedSampleRate::Hz8000 => SampleRate::Rate8kHz,
            SupportedSampleRate::Hz16000 => SampleRate::Rate16kHz,
            SupportedSampleRate::Hz32000 => SampleRate::Rate32kHz,
            SupportedSampleRate::Hz48000 => SampleRate::Rate48kHz,
        }
    }
}

/// Binary speech/non-speech verdict for a single frame
///
/// Implementations receive raw little-endian 16-bit mono frame bytes. They
/// must be deterministic for a given frame and rate within one run; any
/// internal adaptivity is invisible to callers.
pub trait SpeechClassifier {
    fn classify(&mut self, frame: &[u8], sample_rate: u32) -> Result<bool, VadError>;
}

impl<C: SpeechClassifier + ?Sized> SpeechClassifier for &mut C {
    fn classify(&mut self, frame: &[u8], sample_rate: u32) -> Result<bool, VadError> {
        (**self).classify(frame, sample_rate)
    }
}

/// Speech classifier backed by webrtc-vad
///
/// Note: the underlying `Vad` type is `!Send` and `!Sync`, so each
/// segmentation run constructs and owns its own classifier.
pub struct WebRtcClassifier {
    vad: Vad,
    sample_rate: SupportedSampleRate,
    aggressiveness: VadAggressiveness,
}

impl WebRtcClassifier {
    /// Creates a classifier for audio at `sample_rate`
    ///
    /// # Errors
    ///
    /// Returns [`VadError::UnsupportedSampleRate`] if the rate is not one of
    /// 8000, 16000, 32000 or 48000 Hz.
    pub fn new(sample_rate: u32, aggressiveness: VadAggressiveness) -> Result<Self, VadError> {
        let rate = SupportedSampleRate::from_hz(sample_rate)?;
        let vad = Vad::new_with_rate_and_mode(rate.into(), aggressiveness.into());

        Ok(Self {
            vad,
            sample_rate: rate,
            aggressiveness,
        })
    }

    /// Returns the configured aggressiveness
    pub fn aggressiveness(&self) -> VadAggressiveness {
        self.aggressiveness
    }

    /// Returns the sample rate this classifier was built for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.hz()
    }
}

impl SpeechClassifier for WebRtcClassifier {
    fn classify(&mut self, frame: &[u8], sample_rate: u32) -> Result<bool, VadError> {
        if sample_rate != self.sample_rate.hz() {
            return Err(VadError::UnsupportedSampleRate(sample_rate));
        }

        let valid_lengths = [FrameDuration::Ms10, FrameDuration::Ms20, FrameDuration::Ms30]
            .map(|d| d.bytes_at(sample_rate));
        if !valid_lengths.contains(&frame.len()) {
            return Err(VadError::InvalidFrameLength {
                expected: FrameDuration::Ms30.samples_at(sample_rate),
                actual: frame.len() / BYTES_PER_SAMPLE,
            });
        }

        let samples = pcm_to_i16(frame);
        self.vad
            .is_voice_segment(&samples)
            .map_err(|()| VadError::ClassifierFailure)
    }
}

/// Errors that can occur during speech segmentation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VadError {
    /// Sample rate outside the supported set
    #[error("Unsupported sample rate {0} Hz (supported: 8000, 16000, 32000, 48000)")]
    UnsupportedSampleRate(u32),

    /// Buffer is not valid mono 16-bit PCM
    #[error("Malformed audio input: {0}")]
    MalformedAudioInput(String),

    /// Frame handed to the classifier has the wrong size
    #[error("Invalid frame length: expected {expected} samples, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },

    /// Aggressiveness level outside 0-3
    #[error("Invalid VAD aggressiveness {0} (expected 0-3)")]
    InvalidAggressiveness(u8),

    /// The classifier could not process a frame
    #[error("Speech classifier failed")]
    ClassifierFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sample_rates() {
        for rate in SupportedSampleRate::ALL {
            assert_eq!(SupportedSampleRate::from_hz(rate.hz()), Ok(rate));
        }
        assert_eq!(
            SupportedSampleRate::from_hz(44_100),
            Err(VadError::UnsupportedSampleRate(44_100))
        );
        assert_eq!(
            SupportedSampleRate::from_hz(22_050),
            Err(VadError::UnsupportedSampleRate(22_050))
        );
    }

    #[test]
    fn test_classifier_rejects_unsupported_rate() {
        let result = WebRtcClassifier::new(44_100, VadAggressiveness::default());
        assert!(matches!(result, Err(VadError::UnsupportedSampleRate(44_100))));
    }

    #[test]
    fn test_classifier_silence_is_not_speech() {
        let mut classifier = WebRtcClassifier::new(16_000, VadAggressiveness::Aggressive).unwrap();
        let silence = vec![0u8; 960];
        for _ in 0..10 {
            assert!(!classifier.classify(&silence, 16_000).unwrap());
        }
    }

    #[test]
    fn test_classifier_accepts_all_frame_durations() {
        for rate in SupportedSampleRate::ALL {
            let mut classifier =
                WebRtcClassifier::new(rate.hz(), VadAggressiveness::Quality).unwrap();
            for duration in [FrameDuration::Ms10, FrameDuration::Ms20, FrameDuration::Ms30] {
                let frame = vec![0u8; duration.bytes_at(rate.hz())];
                assert!(classifier.classify(&frame, rate.hz()).is_ok());
            }
        }
    }

    #[test]
    fn test_classifier_invalid_frame_length() {
        let mut classifier = WebRtcClassifier::new(16_000, VadAggressiveness::default()).unwrap();
        let result = classifier.classify(&[0u8; 200], 16_000);
        assert_eq!(
            result,
            Err(VadError::InvalidFrameLength {
                expected: 480,
                actual: 100
            })
        );
    }

    #[test]
    fn test_classifier_rate_mismatch() {
        let mut classifier = WebRtcClassifier::new(16_000, VadAggressiveness::default()).unwrap();
        let frame = vec![0u8; FrameDuration::Ms30.bytes_at(8_000)];
        assert_eq!(
            classifier.classify(&frame, 8_000),
            Err(VadError::UnsupportedSampleRate(8_000))
        );
    }

    #[test]
    fn test_aggressiveness_levels() {
        assert_eq!(VadAggressiveness::Quality as u8, 0);
        assert_eq!(VadAggressiveness::LowBitrate as u8, 1);
        assert_eq!(VadAggressiveness::Aggressive as u8, 2);
        assert_eq!(VadAggressiveness::VeryAggressive as u8, 3);
        assert_eq!(VadAggressiveness::default(), VadAggressiveness::LowBitrate);

        assert_eq!(
            VadAggressiveness::try_from(3),
            Ok(VadAggressiveness::VeryAggressive)
        );
        assert_eq!(
            VadAggressiveness::try_from(4),
            Err(VadError::InvalidAggressiveness(4))
        );
    }

    #[test]
    fn test_aggressiveness_passed_through() {
        let classifier = WebRtcClassifier::new(8_000, VadAggressiveness::VeryAggressive).unwrap();
        assert_eq!(classifier.aggressiveness(), VadAggressiveness::VeryAggressive);
        assert_eq!(classifier.sample_rate(), 8_000);
    }
}
