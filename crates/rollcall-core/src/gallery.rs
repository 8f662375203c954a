//! Reference gallery: one descriptor per enrolled image, labelled by file stem.

use crate::encoder::{EncoderError, FaceEncoder};
use crate::types::Descriptor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions (compared case-insensitively) treated as reference images.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("no usable reference faces loaded from {0}")]
    EmptyGallery(PathBuf),
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single reference image was left out of the gallery.
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("no face detected")]
    NoFace,
    #[error(transparent)]
    Encoder(#[from] EncoderError),
    #[error("descriptor has {actual} components, gallery uses {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result of encoding one reference image.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Descriptor),
    Skipped(SkipReason),
}

/// One labelled reference descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryEntry {
    pub label: String,
    pub descriptor: Descriptor,
}

/// Ordered, read-only set of reference entries.
///
/// Labels are not required to be unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn from_entries(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GalleryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor dimensionality, taken from the first entry.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.descriptor.len())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
}

impl<'a> IntoIterator for &'a Gallery {
    type Item = &'a GalleryEntry;
    type IntoIter = std::slice::Iter<'a, GalleryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Whether `path` has one of the [`IMAGE_EXTENSIONS`].
pub fn is_reference_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Identity label for a reference image: the file name without its extension, verbatim.
pub fn label_for(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
}

/// Decode one reference image and keep the first descriptor the encoder returns.
pub fn encode_reference<E: FaceEncoder + ?Sized>(path: &Path, encoder: &mut E) -> LoadOutcome {
    let image = match image::open(path) {
        Ok(img) => img.to_rgb8(),
        Err(e) => return LoadOutcome::Skipped(SkipReason::Decode(e)),
    };

    match encoder.encode(&image) {
        Ok(descriptors) => match descriptors.into_iter().next() {
            Some(descriptor) => LoadOutcome::Loaded(descriptor),
            None => LoadOutcome::Skipped(SkipReason::NoFace),
        },
        Err(e) => LoadOutcome::Skipped(SkipReason::Encoder(e)),
    }
}

/// Build the gallery from every reference image in `dir`, in listing order.
///
/// Per-file failures are logged and skipped. An empty result is an error:
/// the caller must not proceed to capture without references.
pub fn load_gallery<E: FaceEncoder + ?Sized>(dir: &Path, encoder: &mut E) -> Result<Gallery, GalleryError> {
    if !dir.is_dir() {
        return Err(GalleryError::DirectoryNotFound(dir.to_path_buf()));
    }

    let listing = std::fs::read_dir(dir).map_err(|source| GalleryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries: Vec<GalleryEntry> = Vec::new();

    for dir_entry in listing {
        let path = match dir_entry {
            Ok(e) => e.path(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !path.is_file() || !is_reference_image(&path) {
            continue;
        }
        let Some(label) = label_for(&path) else {
            continue;
        };

        let outcome = match encode_reference(&path, encoder) {
            LoadOutcome::Loaded(descriptor) => match entries.first() {
                Some(first) if first.descriptor.len() != descriptor.len() => {
                    LoadOutcome::Skipped(SkipReason::DimensionMismatch {
                        expected: first.descriptor.len(),
                        actual: descriptor.len(),
                    })
                }
                _ => LoadOutcome::Loaded(descriptor),
            },
            skipped => skipped,
        };

        match outcome {
            LoadOutcome::Loaded(descriptor) => {
                tracing::info!(file = %path.display(), label = %label, "loaded reference face");
                entries.push(GalleryEntry { label, descriptor });
            }
            LoadOutcome::Skipped(reason) => {
                tracing::warn!(file = %path.display(), reason = %reason, "skipping reference image");
            }
        }
    }

    tracing::info!(count = entries.len(), dir = %dir.display(), "loaded known faces");

    if entries.is_empty() {
        return Err(GalleryError::EmptyGallery(dir.to_path_buf()));
    }

    Ok(Gallery::from_entries(entries))
}
