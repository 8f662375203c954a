//! rollcall-core: reference gallery, nearest-neighbour matching and face encoding.
//!
//! Faces are located with SCRFD and encoded with ArcFace, both on ONNX Runtime.
//! A probe descriptor is accepted only when its globally nearest reference lies
//! under the acceptance threshold.

pub mod alignment;
pub mod detector;
pub mod encoder;
pub mod gallery;
pub mod matcher;
pub mod recognition;
pub mod recognizer;
pub mod types;

pub use detector::FaceDetector;
pub use encoder::{EncoderError, FaceEncoder, OnnxFaceEncoder};
pub use gallery::{load_gallery, Gallery, GalleryEntry, GalleryError, LoadOutcome, SkipReason};
pub use matcher::{
    cosine_for_distance, EuclideanMatcher, MatchError, MatchResult, Matcher, DEFAULT_ACCEPT_THRESHOLD,
};
pub use recognition::{recognize, Recognition};
pub use recognizer::{FaceRecognizer, ARCFACE_ACCEPT_THRESHOLD};
pub use types::{BoundingBox, Descriptor, DescriptorError};

use std::path::PathBuf;

/// Default ONNX model directory: `$XDG_DATA_HOME/rollcall/models`,
/// falling back to `~/.local/share/rollcall/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall")
        .join("models")
}
