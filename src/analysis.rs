//! Call analysis orchestration
//!
//! Runs a decoded call through every stage and combines the results:
//! 1. Speech segmentation (webrtc-vad)
//! 2. Transcription (optional backend)
//! 3. Keyword scan of the transcript
//! 4. Spoof scoring (optional backend)
//! 5. Risk scoring and labelling
//!
//! Stage failures never abort the analysis. Each one is replaced by an empty
//! result and recorded in [`RiskAssessment::warnings`].

use crate::audio::collector::Segment;
use crate::audio::decode::PcmAudio;
use crate::audio::vad::VadAggressiveness;
use crate::config::{Config, RiskConfig};
use crate::scam::{self, FlaggedSegment, RiskLabel};
use crate::segmentation::detect_audio_segments;
use crate::spoof::{SpoofScore, SpoofScorer};
use crate::transcription::{Transcriber, TranscriptSegment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full result of analysing one call recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub analysis_id: String,
    pub created_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub vad_segments: Vec<Segment>,
    pub transcript: Vec<TranscriptSegment>,
    pub spoof: Option<SpoofScore>,
    pub flagged_segments: Vec<FlaggedSegment>,
    /// Combined risk in [0, 1]
    pub risk_score: f64,
    pub risk_label: RiskLabel,
    /// Stages that failed and were skipped
    pub warnings: Vec<String>,
}

impl RiskAssessment {
    /// Risk on the 0-100 scale used by the label thresholds
    pub fn risk_percent(&self) -> u32 {
        to_percent(self.risk_score)
    }
}

/// Analyses call recordings with optional transcription and spoof backends
pub struct CallAnalyzer {
    aggressiveness: VadAggressiveness,
    risk: RiskConfig,
    transcriber: Option<Box<dyn Transcriber>>,
    spoof_scorer: Option<Box<dyn SpoofScorer>>,
}

impl CallAnalyzer {
    pub fn new(aggressiveness: VadAggressiveness, risk: RiskConfig) -> Self {
        Self {
            aggressiveness,
            risk,
            transcriber: None,
            spoof_scorer: None,
        }
    }

    /// Build from loaded configuration, without backends
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.vad.aggressiveness, config.risk.clone())
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_spoof_scorer(mut self, scorer: Box<dyn SpoofScorer>) -> Self {
        self.spoof_scorer = Some(scorer);
        self
    }

    /// Analyse a decoded recording
    pub fn analyze(&mut self, audio: &PcmAudio) -> RiskAssessment {
        let analysis_id = uuid::Uuid::new_v4().to_string();
        let duration_seconds = audio.duration_secs();
        let mut warnings = Vec::new();

        tracing::info!(
            "Analysis {}: {:.2}s of audio at {}Hz",
            analysis_id,
            duration_seconds,
            audio.sample_rate
        );

        let vad_segments = match detect_audio_segments(audio, self.aggressiveness) {
            Ok(segments) => segments,
            Err(e) => {
                tracing::warn!(
                    "Analysis: Segmentation failed, continuing without segments: {}",
                    e
                );
                warnings.push(format!("Speech segmentation failed: {}", e));
                Vec::new()
            }
        };

        let transcript = match self.transcriber.as_mut() {
            Some(transcriber) => match transcriber.transcribe(audio) {
                Ok(segments) => {
                    tracing::info!(
                        "Analysis: {} produced {} transcript segments",
                        transcriber.model_name(),
                        segments.len()
                    );
                    segments
                }
                Err(e) => {
                    tracing::warn!(
                        "Analysis: Transcription failed, continuing without text: {:#}",
                        e
                    );
                    warnings.push(format!("Transcription failed: {:#}", e));
                    Vec::new()
                }
            },
            None => {
                tracing::debug!("Analysis: No transcriber configured");
                Vec::new()
            }
        };

        let flagged_segments = scam::scan_transcript(&transcript);
        for flag in &flagged_segments {
            tracing::debug!(
                "Flagged {:.2}-{:.2}s risk {}: {:?}",
                flag.start,
                flag.end,
                flag.risk,
                flag.keywords
            );
        }

        let spoof = match self.spoof_scorer.as_mut() {
            Some(scorer) => match scorer.score(audio) {
                Ok(score) => Some(score),
                Err(e) => {
                    tracing::warn!("Analysis: Spoof scoring failed: {:#}", e);
                    warnings.push(format!("Spoof scoring failed: {:#}", e));
                    None
                }
            },
            None => None,
        };

        let risk_score = combine_risk(
            scam::max_risk(&flagged_segments),
            spoof.as_ref(),
            self.risk.spoof_weight,
        );
        let risk_label = self.risk.thresholds.label(to_percent(risk_score));

        tracing::info!(
            "Analysis {}: risk {:.2} ({:?}), {} flagged segments, {} warnings",
            analysis_id,
            risk_score,
            risk_label,
            flagged_segments.len(),
            warnings.len()
        );

        RiskAssessment {
            analysis_id,
            created_at: Utc::now(),
            duration_seconds,
            vad_segments,
            transcript,
            spoof,
            flagged_segments,
            risk_score,
            risk_label,
            warnings,
        }
    }
}

/// Combine the worst keyword risk (0-100) with an optional spoof score
///
/// The spoof probability is blended in with `spoof_weight` but can only raise
/// the keyword risk, never lower it.
pub fn combine_risk(keyword_risk: u32, spoof: Option<&SpoofScore>, spoof_weight: f64) -> f64 {
    let keyword = f64::from(keyword_risk.min(scam::MAX_RISK)) / f64::from(scam::MAX_RISK);
    let combined = match spoof {
        Some(score) => {
            let w = spoof_weight.clamp(0.0, 1.0);
            keyword.max(w * score.spoof_prob + (1.0 - w) * keyword)
        }
        None => keyword,
    };
    combined.clamp(0.0, 1.0)
}

fn to_percent(score: f64) -> u32 {
    (score * 100.0).round() as u32
}
