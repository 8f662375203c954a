//! Single-frame recognition: detect, encode, then match each face in detection order.

use crate::encoder::FaceEncoder;
use crate::gallery::Gallery;
use crate::matcher::{MatchResult, Matcher};
use image::RgbImage;

/// Terminal outcome of recognising one frame.
///
/// Only `Recognized` leads to an attendance record; the other variants are
/// non-fatal "nothing recognised" endings.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Recognized { label: String, distance: f32 },
    NoFaceDetected,
    EncodingFailed(String),
    NoMatch,
}

impl Recognition {
    pub fn label(&self) -> Option<&str> {
        match self {
            Recognition::Recognized { label, .. } => Some(label),
            _ => None,
        }
    }
}

/// Resolve the faces in `frame` against `gallery`.
///
/// Stops at the first accepted face. A descriptor whose comparison fails is
/// treated as not matching and the next face is tried.
pub fn recognize<E, M>(
    encoder: &mut E,
    matcher: &M,
    gallery: &Gallery,
    frame: &RgbImage,
    threshold: f32,
) -> Recognition
where
    E: FaceEncoder + ?Sized,
    M: Matcher + ?Sized,
{
    tracing::debug!(width = frame.width(), height = frame.height(), "recognising frame");

    let faces = match encoder.detect_faces(frame) {
        Ok(faces) => faces,
        Err(e) => {
            tracing::error!(error = %e, "face detection failed");
            return Recognition::EncodingFailed(e.to_string());
        }
    };
    tracing::info!(count = faces.len(), "detected faces");

    if faces.is_empty() {
        tracing::info!("no faces detected in the frame");
        return Recognition::NoFaceDetected;
    }

    let descriptors = match encoder.encode_faces(frame, &faces) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, locations = ?faces, "error during face encoding");
            return Recognition::EncodingFailed(e.to_string());
        }
    };
    tracing::debug!(count = descriptors.len(), "generated face descriptors");

    if descriptors.is_empty() {
        return Recognition::NoFaceDetected;
    }

    for (face, descriptor) in descriptors.iter().enumerate() {
        match matcher.compare(descriptor, gallery, threshold) {
            Ok(MatchResult::Matched { label, distance }) => {
                return Recognition::Recognized { label, distance };
            }
            Ok(MatchResult::NoMatch) => {}
            Err(e) => {
                tracing::warn!(face, error = %e, "error during face comparison");
            }
        }
    }

    Recognition::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncoderError;
    use crate::gallery::GalleryEntry;
    use crate::matcher::EuclideanMatcher;
    use crate::types::{BoundingBox, Descriptor};

    /// Returns a scripted list of descriptors, one face per descriptor.
    struct ScriptedEncoder {
        detect: Result<usize, String>,
        descriptors: Result<Vec<Descriptor>, String>,
        encode_calls: usize,
    }

    impl ScriptedEncoder {
        fn faces(descriptors: Vec<Vec<f32>>) -> Self {
            Self {
                detect: Ok(descriptors.len()),
                descriptors: Ok(descriptors.into_iter().map(Descriptor::new).collect()),
                encode_calls: 0,
            }
        }
    }

    impl FaceEncoder for ScriptedEncoder {
        fn detect_faces(&mut self, _image: &RgbImage) -> Result<Vec<BoundingBox>, EncoderError> {
            let count = self.detect.clone().map_err(EncoderError::Failed)?;
            Ok(vec![
                BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 1.0,
                    height: 1.0,
                    confidence: 0.9,
                    landmarks: None,
                };
                count
            ])
        }

        fn encode_faces(
            &mut self,
            _image: &RgbImage,
            _faces: &[BoundingBox],
        ) -> Result<Vec<Descriptor>, EncoderError> {
            self.encode_calls += 1;
            self.descriptors.clone().map_err(EncoderError::Failed)
        }
    }

    fn gallery() -> Gallery {
        Gallery::from_entries(vec![
            GalleryEntry { label: "alice".into(), descriptor: Descriptor::new(vec![0.0, 0.0]) },
            GalleryEntry { label: "bob".into(), descriptor: Descriptor::new(vec![1.2, 0.0]) },
        ])
    }

    fn frame() -> RgbImage {
        RgbImage::new(8, 8)
    }

    #[test]
    fn test_no_faces_skips_encoding() {
        let mut encoder = ScriptedEncoder::faces(vec![]);
        let gallery = gallery();
        let before = gallery.clone();
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery, &frame(), 0.6);
        assert_eq!(result, Recognition::NoFaceDetected);
        assert_eq!(encoder.encode_calls, 0);
        assert_eq!(gallery, before);
    }

    #[test]
    fn test_recognizes_single_face() {
        let mut encoder = ScriptedEncoder::faces(vec![vec![0.3, 0.0]]);
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert_eq!(result.label(), Some("alice"));
    }

    #[test]
    fn test_first_accepted_face_wins() {
        let mut encoder = ScriptedEncoder::faces(vec![
            vec![0.6, 5.0], // nobody
            vec![1.1, 0.0], // bob
            vec![0.0, 0.1], // alice
        ]);
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert_eq!(result.label(), Some("bob"));
    }

    #[test]
    fn test_all_faces_rejected() {
        let mut encoder = ScriptedEncoder::faces(vec![vec![0.7, 0.0], vec![5.0, 5.0]]);
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert_eq!(result, Recognition::NoMatch);
    }

    #[test]
    fn test_comparison_error_moves_to_next_face() {
        let mut encoder = ScriptedEncoder::faces(vec![vec![0.0, 0.0, 0.0], vec![0.1, 0.0]]);
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert_eq!(result.label(), Some("alice"));
    }

    #[test]
    fn test_comparison_error_alone_is_no_match() {
        let mut encoder = ScriptedEncoder::faces(vec![vec![0.0, 0.0, 0.0]]);
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert_eq!(result, Recognition::NoMatch);
    }

    #[test]
    fn test_encoding_failure() {
        let mut encoder = ScriptedEncoder {
            detect: Ok(1),
            descriptors: Err("tensor shape".into()),
            encode_calls: 0,
        };
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert!(matches!(result, Recognition::EncodingFailed(msg) if msg.contains("tensor shape")));
    }

    #[test]
    fn test_detection_failure() {
        let mut encoder = ScriptedEncoder {
            detect: Err("session".into()),
            descriptors: Ok(vec![]),
            encode_calls: 0,
        };
        let result = recognize(&mut encoder, &EuclideanMatcher, &gallery(), &frame(), 0.6);
        assert!(matches!(result, Recognition::EncodingFailed(_)));
        assert_eq!(encoder.encode_calls, 0);
    }
}
