//! rollcall-hw: single-frame image acquisition.
//!
//! Provides V4L2 camera capture and a still-image stand-in behind one
//! `CaptureSource` interface, delivering frames in RGB channel order.

pub mod camera;
pub mod frame;
pub mod source;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat, V4lSource};
pub use frame::Frame;
pub use source::{capture_one, CaptureSource, FrameReader, ImageFileSource, StillImage};
