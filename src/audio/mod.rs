//! Audio subsystem for callshield
//!
//! Handles file ingest, framing, per-frame speech classification and speech
//! segment collection.

pub mod collector;
pub mod decode;
pub mod format;
pub mod frame;
pub mod ring_buffer;
pub mod vad;

pub use collector::{collect_segments, CollectorPhase, Segment, SegmentCollector};
pub use decode::{
    decode_audio, decode_audio_to_wav, load_audio, read_wav, write_wav, DecodeError, PcmAudio,
};
pub use format::AudioConverter;
pub use frame::{frames, AudioFrame, FrameDuration, FrameSource};
pub use ring_buffer::SlidingWindow;
pub use vad::{SpeechClassifier, SupportedSampleRate, VadAggressiveness, VadError, WebRtcClassifier};
