//! Face encoding capability: locate faces in an RGB image and turn each
//! located face into a fixed-length descriptor.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{BoundingBox, Descriptor};
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

/// SCRFD detection model file name inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name inside the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("encoding failed: {0}")]
    Failed(String),
}

/// Turns images into face descriptors.
///
/// `encode_faces` returns descriptors positionally aligned with `faces`.
pub trait FaceEncoder {
    fn detect_faces(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EncoderError>;

    fn encode_faces(
        &mut self,
        image: &RgbImage,
        faces: &[BoundingBox],
    ) -> Result<Vec<Descriptor>, EncoderError>;

    /// Detect, then encode every detected face. Empty when no face is found.
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<Descriptor>, EncoderError> {
        let faces = self.detect_faces(image)?;
        if faces.is_empty() {
            return Ok(Vec::new());
        }
        self.encode_faces(image, &faces)
    }
}

/// SCRFD + ArcFace encoder running on ONNX Runtime.
pub struct OnnxFaceEncoder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceEncoder {
    /// Load both models from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, EncoderError> {
        let scrfd_path = model_dir.join(DETECTOR_MODEL_FILE);
        let arcface_path = model_dir.join(RECOGNIZER_MODEL_FILE);

        let detector = FaceDetector::load(&scrfd_path)?;
        tracing::info!(path = %scrfd_path.display(), "SCRFD detector loaded");

        let recognizer = FaceRecognizer::load(&arcface_path)?;
        tracing::info!(path = %arcface_path.display(), "ArcFace recognizer loaded");

        Ok(Self { detector, recognizer })
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn detect_faces(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EncoderError> {
        Ok(self.detector.detect(image)?)
    }

    fn encode_faces(
        &mut self,
        image: &RgbImage,
        faces: &[BoundingBox],
    ) -> Result<Vec<Descriptor>, EncoderError> {
        faces
            .iter()
            .map(|face| self.recognizer.extract(image, face).map_err(EncoderError::from))
            .collect()
    }
}
