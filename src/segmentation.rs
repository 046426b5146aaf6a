//! Speech segmentation pipeline
//!
//! Wires the frame source, the per-frame classifier and the segment collector
//! together:
//! 1. Validate the sample rate (fails before any frame is produced)
//! 2. Slice the PCM buffer into 30ms frames
//! 3. Classify each frame
//! 4. Collect speech segments with a 300ms hysteresis window
//!
//! Errors are returned to the caller unchanged; deciding whether a failure
//! should degrade to "no segments" is the caller's job.

use crate::audio::collector::{collect_segments, Segment};
use crate::audio::decode::PcmAudio;
use crate::audio::frame::{frames, FrameDuration, BYTES_PER_SAMPLE};
use crate::audio::vad::{
    SpeechClassifier, SupportedSampleRate, VadAggressiveness, VadError, WebRtcClassifier,
};

/// Frame length used by the engine
pub const FRAME_DURATION: FrameDuration = FrameDuration::Ms30;

/// Hangover/lead-in window used by the engine (10 frames of 30ms)
pub const PADDING_MS: u32 = 300;

/// Segmentation engine owning its classifier handle
pub struct SpeechSegmenter<C> {
    classifier: C,
    sample_rate: SupportedSampleRate,
}

impl SpeechSegmenter<WebRtcClassifier> {
    /// Creates a segmenter backed by webrtc-vad
    pub fn new(sample_rate: u32, aggressiveness: VadAggressiveness) -> Result<Self, VadError> {
        let classifier = WebRtcClassifier::new(sample_rate, aggressiveness)?;
        Self::with_classifier(classifier, sample_rate)
    }
}

impl<C: SpeechClassifier> SpeechSegmenter<C> {
    /// Creates a segmenter around an existing classifier
    pub fn with_classifier(classifier: C, sample_rate: u32) -> Result<Self, VadError> {
        let sample_rate = SupportedSampleRate::from_hz(sample_rate)?;
        Ok(Self {
            classifier,
            sample_rate,
        })
    }

    /// Sample rate this segmenter accepts
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.hz()
    }

    /// Detect speech segments in a mono 16-bit PCM buffer
    ///
    /// # Errors
    ///
    /// Returns [`VadError::MalformedAudioInput`] if the buffer is not a whole
    /// number of 16-bit samples, or any error raised by the classifier.
    pub fn segment(&mut self, pcm: &[u8]) -> Result<Vec<Segment>, VadError> {
        if pcm.len() % BYTES_PER_SAMPLE != 0 {
            return Err(VadError::MalformedAudioInput(format!(
                "buffer length {} is not a multiple of the {}-byte sample width",
                pcm.len(),
                BYTES_PER_SAMPLE
            )));
        }

        let rate = self.sample_rate.hz();
        let source = frames(FRAME_DURATION, pcm, rate);
        let frame_count = source.frame_count();

        let segments = collect_segments(
            source,
            &mut self.classifier,
            rate,
            FRAME_DURATION.as_millis(),
            PADDING_MS,
        )?;

        tracing::info!(
            "VAD: {} frames at {}Hz -> {} speech segments",
            frame_count,
            rate,
            segments.len()
        );
        Ok(segments)
    }

    /// Consume the segmenter, returning its classifier
    pub fn into_classifier(self) -> C {
        self.classifier
    }
}

/// Detect speech segments in raw PCM with a fresh webrtc-vad classifier
///
/// The sample rate is validated before any frame is produced.
pub fn detect_segments(
    pcm: &[u8],
    sample_rate: u32,
    aggressiveness: VadAggressiveness,
) -> Result<Vec<Segment>, VadError> {
    SpeechSegmenter::new(sample_rate, aggressiveness)?.segment(pcm)
}

/// Detect speech segments in decoded audio
pub fn detect_audio_segments(
    audio: &PcmAudio,
    aggressiveness: VadAggressiveness,
) -> Result<Vec<Segment>, VadError> {
    detect_segments(&audio.bytes, audio.sample_rate, aggressiveness)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingClassifier {
        calls: usize,
        speech: bool,
    }

    impl SpeechClassifier for CountingClassifier {
        fn classify(&mut self, _frame: &[u8], _sample_rate: u32) -> Result<bool, VadError> {
            self.calls += 1;
            Ok(self.speech)
        }
    }

    fn counting(speech: bool) -> CountingClassifier {
        CountingClassifier { calls: 0, speech }
    }

    #[test]
    fn test_unsupported_rate_rejected_up_front() {
        let result = SpeechSegmenter::with_classifier(counting(true), 44_100);
        assert!(matches!(result, Err(VadError::UnsupportedSampleRate(44_100))));

        let result = detect_segments(&[0u8; 4410], 44_100, VadAggressiveness::default());
        assert_eq!(result, Err(VadError::UnsupportedSampleRate(44_100)));
    }

    #[test]
    fn test_odd_length_buffer_is_malformed() {
        let mut segmenter = SpeechSegmenter::with_classifier(counting(true), 16_000).unwrap();
        let result = segmenter.segment(&[0u8; 961]);
        assert!(matches!(result, Err(VadError::MalformedAudioInput(_))));
        assert_eq!(segmenter.into_classifier().calls, 0);
    }

    #[test]
    fn test_every_full_frame_is_classified() {
        let mut segmenter = SpeechSegmenter::with_classifier(counting(false), 8_000).unwrap();
        // 30ms at 8kHz is 240 samples; 7 frames plus a partial one
        let pcm = vec![0u8; (240 * 7 + 100) * 2];
        let segments = segmenter.segment(&pcm).unwrap();
        assert!(segments.is_empty());
        assert_eq!(segmenter.into_classifier().calls, 7);
    }

    #[test]
    fn test_all_speech_spans_whole_buffer() {
        let mut segmenter = SpeechSegmenter::with_classifier(counting(true), 48_000).unwrap();
        // 2 seconds at 48kHz
        let pcm = vec![0u8; 96_000 * 2];
        let segments = segmenter.segment(&pcm).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].start.abs() < 1e-9);
        assert!((segments[0].end - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_digital_silence_has_no_segments() {
        let audio = PcmAudio::from_samples(&vec![0i16; 16_000 * 3], 16_000);
        let segments = detect_audio_segments(&audio, VadAggressiveness::Aggressive).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn test_empty_buffer() {
        let segments = detect_segments(&[], 32_000, VadAggressiveness::Quality).unwrap();
        assert!(segments.is_empty());
    }
}
