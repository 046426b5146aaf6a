//! Audio file ingest
//!
//! Reads mono 16-bit WAV files directly with hound. Anything else (MP3, M4A,
//! OGG, FLAC, stereo or odd-rate WAV) is decoded with symphonia and converted
//! to mono 16-bit PCM at the target rate with [`AudioConverter`].

use crate::audio::format::{i16_to_f32, AudioConverter};
use crate::audio::frame::{i16_to_pcm, pcm_to_i16, BYTES_PER_SAMPLE};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Default maximum input file size (500 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Chunk size for the rubato resampler (frames per call)
const RESAMPLE_CHUNK_SIZE: usize = 1024;

/// Check cancellation every N packets
const CANCEL_CHECK_INTERVAL: u32 = 50;

/// In-memory mono 16-bit little-endian PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
}

impl PcmAudio {
    /// Wrap already-encoded PCM bytes
    pub fn new(bytes: Vec<u8>, sample_rate: u32) -> Self {
        Self { bytes, sample_rate }
    }

    /// Build from 16-bit samples
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Self {
        Self::new(i16_to_pcm(samples), sample_rate)
    }

    /// Number of samples in the buffer
    pub fn sample_count(&self) -> usize {
        self.bytes.len() / BYTES_PER_SAMPLE
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }

    /// Samples as i16
    pub fn samples(&self) -> Vec<i16> {
        pcm_to_i16(&self.bytes)
    }

    /// Samples normalised to [-1.0, 1.0]
    pub fn to_f32(&self) -> Vec<f32> {
        i16_to_f32(&self.samples())
    }
}

/// Errors raised while reading or decoding audio files
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is too large ({size_mb:.0} MB). Maximum supported size is {max_mb} MB.")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("No supported audio track found in file")]
    NoAudioTrack,

    #[error("Cannot determine sample rate from audio file")]
    UnknownSampleRate,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Resampling error: {0}")]
    Resample(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Malformed audio input: {0}")]
    Malformed(String),

    #[error("Import cancelled")]
    Cancelled,
}

/// Read a mono 16-bit integer WAV file without conversion.
///
/// Rejects multi-channel or non-16-bit files; use [`decode_audio`] to convert
/// those first.
pub fn read_wav(path: &Path) -> Result<PcmAudio, DecodeError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(DecodeError::Malformed(format!(
            "WAV must be mono, found {} channels",
            spec.channels
        )));
    }
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(DecodeError::Malformed(format!(
            "WAV must be 16-bit integer PCM, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DecodeError::Malformed(format!("Truncated WAV data: {}", e)))?;

    tracing::debug!(
        "Read {} samples at {}Hz from {}",
        samples.len(),
        spec.sample_rate,
        path.display()
    );
    Ok(PcmAudio::from_samples(&samples, spec.sample_rate))
}

/// Write mono 16-bit PCM to a WAV file
pub fn write_wav(path: &Path, audio: &PcmAudio) -> Result<(), DecodeError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in audio.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Load any supported audio file as mono 16-bit PCM at `target_rate`.
///
/// Mono 16-bit WAV files already at `target_rate` are read directly; all
/// other inputs go through [`decode_audio`].
pub fn load_audio(
    path: &Path,
    target_rate: u32,
    max_file_size: u64,
    cancel: &AtomicBool,
) -> Result<PcmAudio, DecodeError> {
    check_file_size(path, max_file_size)?;

    if is_target_format_wav(path, target_rate) {
        tracing::info!("Audio file is already {}Hz mono WAV, reading directly", target_rate);
        return read_wav(path);
    }

    decode_audio(path, target_rate, cancel)
}

/// Decode an audio file to mono 16-bit PCM at `target_rate`.
///
/// Supports WAV, MP3, M4A (AAC), OGG Vorbis, and FLAC formats.
pub fn decode_audio(
    input_path: &Path,
    target_rate: u32,
    cancel: &AtomicBool,
) -> Result<PcmAudio, DecodeError> {
    let file = std::fs::File::open(input_path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the format from file extension
    let mut hint = Hint::new();
    if let Some(ext) = input_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let source_rate = codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;
    let source_channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    tracing::info!(
        "Decoding: {}Hz, {} channels -> {}Hz mono",
        source_rate,
        source_channels,
        target_rate
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut converter =
        AudioConverter::new(source_rate, target_rate, source_channels, RESAMPLE_CHUNK_SIZE)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
    let chunk_len = converter.interleaved_chunk_len();

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut pending: Vec<f32> = Vec::new();
    let mut output: Vec<i16> = Vec::new();
    let mut packet_count: u32 = 0;

    loop {
        if packet_count % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return Err(DecodeError::Cancelled);
        }
        packet_count += 1;

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        // Corrupt packets are skipped rather than failing the whole file
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.capacity();

        let sbuf =
            sample_buf.get_or_insert_with(|| SampleBuffer::<f32>::new(num_frames as u64, spec));
        if sbuf.capacity() < num_frames {
            *sbuf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        }

        sbuf.copy_interleaved_ref(decoded);
        pending.extend_from_slice(sbuf.samples());

        while pending.len() >= chunk_len {
            let chunk: Vec<f32> = pending.drain(..chunk_len).collect();
            let resampled = converter
                .process_to_i16(&chunk)
                .map_err(|e| DecodeError::Resample(e.to_string()))?;
            output.extend_from_slice(&resampled);
        }
    }

    let output = converter
        .finish_to_i16(&pending, output)
        .map_err(|e| DecodeError::Resample(e.to_string()))?;

    let audio = PcmAudio::from_samples(&output, target_rate);
    tracing::info!(
        "Decoded {:.2}s of audio from {}",
        audio.duration_secs(),
        input_path.display()
    );
    Ok(audio)
}

/// Decode an audio file and write it as a mono 16-bit WAV at `target_rate`.
///
/// Returns the audio duration in seconds. A partially written output file is
/// removed on failure.
pub fn decode_audio_to_wav(
    input_path: &Path,
    output_path: &Path,
    target_rate: u32,
    max_file_size: u64,
    cancel: &AtomicBool,
) -> Result<f64, DecodeError> {
    check_file_size(input_path, max_file_size)?;

    let audio = decode_audio(input_path, target_rate, cancel)?;
    if let Err(e) = write_wav(output_path, &audio) {
        let _ = std::fs::remove_file(output_path);
        return Err(e);
    }

    Ok(audio.duration_secs())
}

fn check_file_size(path: &Path, max_file_size: u64) -> Result<(), DecodeError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > max_file_size {
        return Err(DecodeError::FileTooLarge {
            size_mb: metadata.len() as f64 / (1024.0 * 1024.0),
            max_mb: max_file_size / (1024 * 1024),
        });
    }
    Ok(())
}

/// Check if a WAV file is already mono i16 at `target_rate` (fast path).
fn is_target_format_wav(path: &Path, target_rate: u32) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !ext.eq_ignore_ascii_case("wav") {
        return false;
    }

    match hound::WavReader::open(path) {
        Ok(reader) => {
            let spec = reader.spec();
            spec.sample_rate == target_rate
                && spec.channels == 1
                && spec.sample_format == hound::SampleFormat::Int
                && spec.bits_per_sample == 16
        }
        Err(_) => false,
    }
}
