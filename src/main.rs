use anyhow::Context;
use callshield::analysis::CallAnalyzer;
use callshield::audio::decode::{decode_audio_to_wav, load_audio, read_wav, PcmAudio};
use callshield::audio::vad::VadAggressiveness;
use callshield::config::{self, Config};
use callshield::scam::{self, RiskLabel};
use callshield::segmentation::detect_audio_segments;
use callshield::transcription::resolve_whisper_model;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of ~/.callshield/config.json
    #[arg(long, global = true, env = "CALLSHIELD_CONFIG")]
    config: Option<PathBuf>,

    /// Don't write logs to ~/.callshield/logs
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the speech segments of a recording as JSON
    Segments {
        file: PathBuf,

        /// VAD aggressiveness, 0 (least) to 3 (most)
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=3))]
        aggressiveness: Option<u8>,

        /// Decode and resample the input instead of requiring mono 16-bit WAV
        #[arg(long)]
        convert: bool,
    },

    /// Analyse a recording and print the risk assessment as JSON
    Analyze {
        file: PathBuf,

        /// VAD aggressiveness, 0 (least) to 3 (most)
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=3))]
        aggressiveness: Option<u8>,

        /// Whisper ggml model file or id such as `tiny` (requires the `whisper` feature)
        #[arg(long, short)]
        model: Option<PathBuf>,
    },

    /// Convert any supported audio file to mono 16-bit WAV at the ingest rate
    Convert { input: PathBuf, output: PathBuf },

    /// Scan a line of text for scam vocabulary
    Scan { text: String },
}

#[derive(Serialize)]
struct ConvertReport {
    output: PathBuf,
    sample_rate: u32,
    duration_seconds: f64,
}

#[derive(Serialize)]
struct ScanReport {
    keywords: Vec<String>,
    risk: u32,
    label: RiskLabel,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::load_config().with_context(|| {
            format!(
                "Failed to load config from {}",
                config::get_config_path().display()
            )
        })?,
    };
    callshield::init_logging(config.logging.log_to_file && !args.no_log_file);

    match args.command {
        Command::Segments {
            file,
            aggressiveness,
            convert,
        } => {
            let aggressiveness = resolve_aggressiveness(aggressiveness, &config)?;
            let audio = if convert {
                load(&file, &config)?
            } else {
                read_wav(&file).with_context(|| format!("Failed to read {}", file.display()))?
            };
            let segments = detect_audio_segments(&audio, aggressiveness)
                .with_context(|| format!("Failed to segment {}", file.display()))?;
            print_json(&segments)?;
        }
        Command::Analyze {
            file,
            aggressiveness,
            model,
        } => {
            let aggressiveness = resolve_aggressiveness(aggressiveness, &config)?;
            let audio = load(&file, &config)?;

            let mut analyzer = CallAnalyzer::new(aggressiveness, config.risk.clone());
            let model = model.or_else(|| config.transcription.model_path.clone());
            if let Some(model) = model {
                let model = resolve_whisper_model(&model);
                analyzer = with_whisper(analyzer, &model, &config.transcription.language)?;
            }

            let assessment = analyzer.analyze(&audio);
            print_json(&assessment)?;
        }
        Command::Convert { input, output } => {
            let cancel = AtomicBool::new(false);
            let sample_rate = config.ingest.target_sample_rate;
            let duration_seconds = decode_audio_to_wav(
                &input,
                &output,
                sample_rate,
                config.ingest.max_file_size_bytes(),
                &cancel,
            )
            .with_context(|| format!("Failed to convert {}", input.display()))?;
            print_json(&ConvertReport {
                output,
                sample_rate,
                duration_seconds,
            })?;
        }
        Command::Scan { text } => {
            let keywords = scam::find_keywords(&text);
            let risk = scam::risk_from_keywords(&keywords);
            let report = ScanReport {
                keywords,
                risk,
                label: config.risk.thresholds.label(risk),
            };
            print_json(&report)?;
        }
    }

    Ok(())
}

fn resolve_aggressiveness(arg: Option<u8>, config: &Config) -> anyhow::Result<VadAggressiveness> {
    match arg {
        Some(level) => Ok(VadAggressiveness::try_from(level)?),
        None => Ok(config.vad.aggressiveness),
    }
}

fn load(path: &Path, config: &Config) -> anyhow::Result<PcmAudio> {
    // One-shot CLI runs are stopped by the process exiting, never cancelled
    let cancel = AtomicBool::new(false);
    load_audio(
        path,
        config.ingest.target_sample_rate,
        config.ingest.max_file_size_bytes(),
        &cancel,
    )
    .with_context(|| format!("Failed to load {}", path.display()))
}

#[cfg(feature = "whisper")]
fn with_whisper(
    analyzer: CallAnalyzer,
    model: &Path,
    language: &str,
) -> anyhow::Result<CallAnalyzer> {
    use callshield::transcription::whisper::WhisperTranscriber;

    let transcriber = WhisperTranscriber::new(model, language)
        .with_context(|| format!("Failed to load whisper model {}", model.display()))?;
    Ok(analyzer.with_transcriber(Box::new(transcriber)))
}

#[cfg(not(feature = "whisper"))]
fn with_whisper(
    analyzer: CallAnalyzer,
    model: &Path,
    _language: &str,
) -> anyhow::Result<CallAnalyzer> {
    tracing::warn!(
        "Ignoring model {}: built without the `whisper` feature",
        model.display()
    );
    Ok(analyzer)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
