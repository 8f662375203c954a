use rollcall_core::DEFAULT_ACCEPT_THRESHOLD;
use std::path::PathBuf;

/// Run configuration, loaded from `ROLLCALL_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory of reference images (default: ./known_faces).
    pub gallery_dir: PathBuf,
    /// Directory that holds the `<YYYY-MM-DD>.csv` ledgers (default: .).
    pub ledger_dir: PathBuf,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Euclidean distance below which the nearest reference is accepted.
    pub accept_threshold: f32,
    /// Frames discarded after opening the camera (auto-exposure settling).
    pub warmup_frames: usize,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str, default: &str| {
            lookup(key).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            gallery_dir: path("ROLLCALL_GALLERY_DIR", "known_faces"),
            ledger_dir: path("ROLLCALL_LEDGER_DIR", "."),
            camera_device: lookup("ROLLCALL_CAMERA_DEVICE").unwrap_or_else(|| "/dev/video0".to_string()),
            model_dir: lookup("ROLLCALL_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(rollcall_core::default_model_dir),
            accept_threshold: parse_or(&lookup, "ROLLCALL_ACCEPT_THRESHOLD", DEFAULT_ACCEPT_THRESHOLD),
            warmup_frames: parse_or(&lookup, "ROLLCALL_WARMUP_FRAMES", 0),
        }
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
