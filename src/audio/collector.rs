//! Speech segment collection
//!
//! A two-state hysteresis machine over the classified frame stream. While
//! idle, the collector waits for the sliding window to fill with a
//! supermajority of speech frames; while triggered, it waits for a
//! supermajority of non-speech frames before closing the segment. A handful
//! of misclassified frames never flips the state.

use crate::audio::frame::AudioFrame;
use crate::audio::ring_buffer::SlidingWindow;
use crate::audio::vad::{SpeechClassifier, VadError};
use serde::{Deserialize, Serialize};

/// Fraction of the window that must agree before the state flips
pub const TRIGGER_RATIO: f64 = 0.9;

/// A detected speech interval `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    /// Length of the segment in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Returns true if `other` shares any time with this segment
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Observable collector state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectorPhase {
    /// Not inside a speech region
    #[default]
    Idle,
    /// Accumulating a speech region
    Triggered,
}

enum State<'a> {
    Idle,
    Triggered {
        /// Timestamp of the oldest window frame at the moment of triggering
        start: f64,
        voiced_frames: Vec<AudioFrame<'a>>,
    },
}

/// Hysteresis state machine turning (frame, verdict) pairs into segments
pub struct SegmentCollector<'a> {
    window: SlidingWindow<(AudioFrame<'a>, bool)>,
    state: State<'a>,
    segments: Vec<Segment>,
    frames_seen: u64,
}

impl<'a> SegmentCollector<'a> {
    /// Creates a collector whose window spans `padding_ms` of `frame_ms` frames
    pub fn new(frame_ms: u32, padding_ms: u32) -> Self {
        let capacity = if frame_ms == 0 {
            0
        } else {
            (padding_ms / frame_ms) as usize
        };
        Self::with_window_capacity(capacity)
    }

    /// Creates a collector with an explicit window size in frames
    pub fn with_window_capacity(capacity: usize) -> Self {
        Self {
            window: SlidingWindow::new(capacity),
            state: State::Idle,
            segments: Vec::new(),
            frames_seen: 0,
        }
    }

    /// Window capacity in frames
    pub fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Current phase of the state machine
    pub fn phase(&self) -> CollectorPhase {
        match self.state {
            State::Idle => CollectorPhase::Idle,
            State::Triggered { .. } => CollectorPhase::Triggered,
        }
    }

    /// Segments closed so far
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of frames consumed so far
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Consume one classified frame
    ///
    /// Returns the segment closed by this frame, if any.
    pub fn push(&mut self, frame: AudioFrame<'a>, is_speech: bool) -> Option<Segment> {
        self.frames_seen += 1;

        match &mut self.state {
            State::Idle => {
                self.window.push((frame, is_speech));
                let voiced = self.window.count_where(|(_, speech)| *speech);
                if self.supermajority(voiced) {
                    let voiced_frames: Vec<AudioFrame<'a>> =
                        self.window.drain().into_iter().map(|(f, _)| f).collect();
                    let start = voiced_frames.first().map(|f| f.timestamp).unwrap_or(0.0);
                    tracing::debug!("Speech triggered at {:.2}s", start);
                    self.state = State::Triggered {
                        start,
                        voiced_frames,
                    };
                }
                None
            }
            State::Triggered { voiced_frames, .. } => {
                voiced_frames.push(frame.clone());
                self.window.push((frame, is_speech));
                let unvoiced = self.window.count_where(|(_, speech)| !*speech);
                if self.supermajority(unvoiced) {
                    self.window.clear();
                    return self.close_segment();
                }
                None
            }
        }
    }

    /// Finish the stream, flushing an open segment, and return all segments
    pub fn finish(mut self) -> Vec<Segment> {
        if let Some(segment) = self.close_segment() {
            tracing::debug!(
                "Flushed open segment at end of stream: {:.2}s-{:.2}s",
                segment.start,
                segment.end
            );
        }
        self.segments
    }

    fn supermajority(&self, agreeing: usize) -> bool {
        self.window.is_full() && agreeing as f64 > TRIGGER_RATIO * self.window.capacity() as f64
    }

    /// Emit the segment for the current triggered run and return to idle
    fn close_segment(&mut self) -> Option<Segment> {
        let State::Triggered {
            start,
            voiced_frames,
        } = std::mem::replace(&mut self.state, State::Idle)
        else {
            return None;
        };

        let last = voiced_frames.last()?;
        let segment = Segment {
            start,
            end: last.end(),
        };
        debug_assert!(segment.start < segment.end);
        tracing::debug!("Speech segment {:.2}s-{:.2}s", segment.start, segment.end);
        self.segments.push(segment);
        Some(segment)
    }
}

/// Classify every frame and collect speech segments
///
/// Classifier errors are returned immediately; no partial result is kept.
pub fn collect_segments<'a, C, I>(
    frames: I,
    classifier: &mut C,
    sample_rate: u32,
    frame_ms: u32,
    padding_ms: u32,
) -> Result<Vec<Segment>, VadError>
where
    C: SpeechClassifier + ?Sized,
    I: IntoIterator<Item = AudioFrame<'a>>,
{
    let mut collector = SegmentCollector::new(frame_ms, padding_ms);
    for frame in frames {
        let is_speech = classifier.classify(frame.bytes, sample_rate)?;
        collector.push(frame, is_speech);
    }
    Ok(collector.finish())
}
