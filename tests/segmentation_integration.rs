//! End-to-end segmentation tests for callshield.
//!
//! Synthesises WAV files with hound in temporary directories and runs them
//! through ingest, segmentation and analysis.

use callshield::analysis::CallAnalyzer;
use callshield::audio::decode::{load_audio, read_wav, DecodeError, DEFAULT_MAX_FILE_SIZE};
use callshield::audio::vad::{SpeechClassifier, VadAggressiveness, VadError};
use callshield::config::Config;
use callshield::scam::RiskLabel;
use callshield::segmentation::{detect_audio_segments, detect_segments, SpeechSegmenter};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Classifier that reports speech for frames with any non-zero sample
struct NonZeroClassifier;

impl SpeechClassifier for NonZeroClassifier {
    fn classify(&mut self, frame: &[u8], _sample_rate: u32) -> Result<bool, VadError> {
        Ok(frame.iter().any(|&b| b != 0))
    }
}

#[test]
fn test_silent_wav_has_no_segments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav(&path, 16_000, 1, &vec![0i16; 16_000 * 2]);

    let audio = read_wav(&path).unwrap();
    let segments = detect_audio_segments(&audio, VadAggressiveness::default()).unwrap();
    assert!(segments.is_empty());
}

#[test]
fn test_unsupported_rate_wav_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cd.wav");
    write_wav(&path, 44_100, 1, &vec![0i16; 44_100]);

    let audio = read_wav(&path).unwrap();
    assert_eq!(
        detect_audio_segments(&audio, VadAggressiveness::default()),
        Err(VadError::UnsupportedSampleRate(44_100))
    );
}

#[test]
fn test_stereo_wav_requires_conversion() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    write_wav(&path, 48_000, 2, &vec![0i16; 48_000 * 2]);

    assert!(matches!(read_wav(&path), Err(DecodeError::Malformed(_))));

    let cancel = AtomicBool::new(false);
    let audio = load_audio(&path, 16_000, DEFAULT_MAX_FILE_SIZE, &cancel).unwrap();
    assert_eq!(audio.sample_rate, 16_000);
    // Exactly one second: no chunk padding or resampler delay left over
    assert_eq!(audio.sample_count(), 16_000);

    let segments = detect_audio_segments(&audio, VadAggressiveness::default()).unwrap();
    assert!(segments.is_empty());
}

#[test]
fn test_odd_byte_buffer_is_malformed() {
    let result = detect_segments(&[0u8; 481], 16_000, VadAggressiveness::Quality);
    assert!(matches!(result, Err(VadError::MalformedAudioInput(_))));
}

#[test]
fn test_burst_in_wav_becomes_one_segment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("burst.wav");

    // 0.6s silence, 0.9s "speech", 0.6s silence at 8kHz
    let mut samples = vec![0i16; 4_800];
    samples.extend(std::iter::repeat(1_000i16).take(7_200));
    samples.extend(std::iter::repeat(0i16).take(4_800));
    write_wav(&path, 8_000, 1, &samples);

    let audio = read_wav(&path).unwrap();
    let mut segmenter = SpeechSegmenter::with_classifier(NonZeroClassifier, 8_000).unwrap();
    let segments = segmenter.segment(&audio.bytes).unwrap();

    // Starts at the first speech frame once ten of them fill the window, ends
    // after ten silent frames of hangover
    assert_eq!(segments.len(), 1);
    let segment = segments[0];
    assert!((segment.start - 0.6).abs() < 1e-9);
    assert!((segment.end - 1.8).abs() < 1e-9);
}

#[test]
fn test_analyze_silent_call_is_safe() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("call.wav");
    write_wav(&path, 16_000, 1, &vec![0i16; 16_000 * 3]);

    let config = Config::default();
    let audio = read_wav(&path).unwrap();
    let assessment = CallAnalyzer::from_config(&config).analyze(&audio);

    assert!(assessment.vad_segments.is_empty());
    assert!(assessment.warnings.is_empty());
    assert_eq!(assessment.risk_label, RiskLabel::Safe);
    assert!((assessment.duration_seconds - 3.0).abs() < 1e-9);
}
