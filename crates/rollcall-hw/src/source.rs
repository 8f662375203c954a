//! Capture sources: something that can be opened and yields frames until released.

use crate::camera::CameraError;
use crate::frame::Frame;
use std::path::PathBuf;

/// An open capture handle. Dropping it releases the underlying resource.
pub trait FrameReader {
    fn read_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Something that can be opened into a [`FrameReader`].
pub trait CaptureSource {
    type Reader: FrameReader;

    fn open(&self) -> Result<Self::Reader, CameraError>;
}

/// Open `source`, read exactly one frame, and release the handle before returning.
///
/// The handle is dropped on both the success and the failure path.
pub fn capture_one<S: CaptureSource + ?Sized>(source: &S) -> Result<Frame, CameraError> {
    let mut reader = source.open()?;
    let frame = reader.read_frame();
    drop(reader);
    frame
}

/// A still image on disk used in place of a camera.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Decoded still image; yields its frame once.
pub struct StillImage {
    frame: Option<Frame>,
}

impl CaptureSource for ImageFileSource {
    type Reader = StillImage;

    fn open(&self) -> Result<StillImage, CameraError> {
        if !self.path.is_file() {
            return Err(CameraError::DeviceNotFound(self.path.display().to_string()));
        }
        let image = image::open(&self.path)
            .map_err(|e| CameraError::CaptureFailed(format!("{}: {e}", self.path.display())))?
            .to_rgb8();
        tracing::info!(
            path = %self.path.display(),
            width = image.width(),
            height = image.height(),
            "opened still image"
        );
        Ok(StillImage {
            frame: Some(Frame::new(image, 0)),
        })
    }
}

impl FrameReader for StillImage {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        self.frame
            .take()
            .ok_or_else(|| CameraError::CaptureFailed("still image already read".into()))
    }
}
