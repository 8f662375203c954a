//! Nearest-neighbour matching of a probe descriptor against the gallery.

use crate::gallery::Gallery;
use crate::types::{Descriptor, DescriptorError};
use thiserror::Error;

/// Default acceptance threshold on Euclidean distance.
///
/// On unit-length descriptors such as ArcFace's, `d < 0.6` is the same as
/// cosine similarity above 0.82, far stricter than what that model is
/// calibrated for. Use [`crate::recognizer::ARCFACE_ACCEPT_THRESHOLD`] there.
pub const DEFAULT_ACCEPT_THRESHOLD: f32 = 0.6;

/// Cosine similarity equivalent to Euclidean `distance` between two unit vectors.
pub fn cosine_for_distance(distance: f32) -> f32 {
    1.0 - distance * distance / 2.0
}

/// Outcome of matching one probe descriptor against a gallery.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The globally nearest reference was also under the threshold.
    Matched { label: String, distance: f32 },
    NoMatch,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("distance to gallery entry {index} ({label}) failed: {source}")]
    Distance {
        index: usize,
        label: String,
        #[source]
        source: DescriptorError,
    },
}

/// Strategy for comparing a probe descriptor against a gallery of reference faces.
pub trait Matcher {
    fn compare(
        &self,
        probe: &Descriptor,
        gallery: &Gallery,
        threshold: f32,
    ) -> Result<MatchResult, MatchError>;
}

/// Euclidean nearest-neighbour matcher.
///
/// The argmin is taken over the whole gallery first; only that single entry
/// is then tested against the threshold. Another entry under the threshold
/// never rescues a rejected nearest neighbour. Ties keep the earliest entry.
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn compare(
        &self,
        probe: &Descriptor,
        gallery: &Gallery,
        threshold: f32,
    ) -> Result<MatchResult, MatchError> {
        let distances = gallery
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                probe
                    .distance(&entry.descriptor)
                    .map_err(|source| MatchError::Distance {
                        index,
                        label: entry.label.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<f32>, MatchError>>()?;

        let candidates: Vec<bool> = distances.iter().map(|&d| d < threshold).collect();
        tracing::debug!(?candidates, "face comparison results");

        let mut best: Option<(usize, f32)> = None;
        for (i, &d) in distances.iter().enumerate() {
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }

        let Some((idx, distance)) = best else {
            tracing::info!("gallery is empty; nothing to compare");
            return Ok(MatchResult::NoMatch);
        };

        if candidates[idx] {
            let label = gallery.entries()[idx].label.clone();
            tracing::info!(label = %label, distance, "best match");
            Ok(MatchResult::Matched { label, distance })
        } else {
            tracing::info!(closest = distance, threshold, "no match found");
            Ok(MatchResult::NoMatch)
        }
    }
}
