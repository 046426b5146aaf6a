//! Transcription interface
//!
//! The acoustic model itself is external. This module defines the seam the
//! call analyzer consumes and, behind the `whisper` feature, a whisper.cpp
//! backend.

#[cfg(feature = "whisper")]
pub mod whisper;

use crate::audio::decode::PcmAudio;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A timed span of transcribed text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    pub text: String,
}

/// Speech-to-text model
pub trait Transcriber {
    /// Transcribe mono 16-bit PCM into timed segments
    fn transcribe(&mut self, audio: &PcmAudio) -> anyhow::Result<Vec<TranscriptSegment>>;

    /// Human-readable model name for reports
    fn model_name(&self) -> String;
}

impl<T: Transcriber + ?Sized> Transcriber for Box<T> {
    fn transcribe(&mut self, audio: &PcmAudio) -> anyhow::Result<Vec<TranscriptSegment>> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> String {
        (**self).model_name()
    }
}

/// Get the default model directory (~/.callshield/models)
pub fn get_model_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| {
            tracing::error!("Could not determine home directory, using /tmp");
            PathBuf::from("/tmp")
        })
        .join(".callshield")
        .join("models")
}

/// Get the path to a ggml whisper model by id (e.g. "ggml-tiny.en")
pub fn get_whisper_model_path(model_id: &str) -> PathBuf {
    get_model_directory()
        .join("whisper")
        .join(format!("{}.bin", model_id))
}

/// Resolve a `--model` value to a model file
///
/// Existing paths are used as given. A bare model id such as `tiny` or
/// `ggml-base.en` is looked up in the model directory, with the `ggml-`
/// prefix added when missing.
pub fn resolve_whisper_model(model: &Path) -> PathBuf {
    if model.exists() {
        return model.to_path_buf();
    }

    let is_bare_id = model.components().count() == 1
        && model
            .to_str()
            .is_some_and(|s| !s.is_empty() && !s.ends_with(".bin"));
    if !is_bare_id {
        return model.to_path_buf();
    }

    let id = model.to_string_lossy();
    let resolved = if id.starts_with("ggml-") {
        get_whisper_model_path(&id)
    } else {
        get_whisper_model_path(&format!("ggml-{}", id))
    };
    tracing::debug!("Resolved model id {} to {}", id, resolved.display());
    resolved
}
