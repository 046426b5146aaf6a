//! callshield - voice call scam detection
//!
//! Segments call recordings into speech regions, transcribes them, scans the
//! transcript for scam vocabulary and combines the result with a synthetic
//! voice score into a risk assessment.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod scam;
pub mod segmentation;
pub mod spoof;
pub mod transcription;

pub use analysis::{CallAnalyzer, RiskAssessment};
pub use audio::{Segment, VadAggressiveness, VadError};
pub use segmentation::{detect_segments, SpeechSegmenter};

/// Set up logging to stderr and, optionally, `~/.callshield/logs/callshield.log`
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init_logging(log_to_file: bool) {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTimer);

    let log_file = if log_to_file {
        let log_dir = config::get_config_dir().join("logs");
        let _ = std::fs::create_dir_all(&log_dir);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("callshield.log"))
            .ok()
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(filter()).with(stderr_layer);
    let result = if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }
}
