//! Process exit codes, one per fatal condition.

use rollcall_core::{EncoderError, GalleryError};
use rollcall_hw::CameraError;
use rollcall_ledger::LedgerError;

/// Attendance recorded, or a non check-in command completed.
pub const SUCCESS: u8 = 0;
pub const NOTHING_RECOGNIZED: u8 = 1;
pub const DIRECTORY_NOT_FOUND: u8 = 2;
pub const EMPTY_GALLERY: u8 = 3;
pub const CAPTURE_FAILED: u8 = 4;
pub const LEDGER_WRITE_FAILED: u8 = 5;
pub const ENCODER_UNAVAILABLE: u8 = 6;
pub const UNEXPECTED: u8 = 70;

/// Pick the exit code for a fatal error by its innermost typed cause.
pub fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<GalleryError>() {
            return match e {
                GalleryError::DirectoryNotFound(_) => DIRECTORY_NOT_FOUND,
                GalleryError::EmptyGallery(_) => EMPTY_GALLERY,
                // The directory exists but could not be listed.
                GalleryError::Io { .. } => UNEXPECTED,
            };
        }
        if cause.downcast_ref::<CameraError>().is_some() {
            return CAPTURE_FAILED;
        }
        if let Some(LedgerError::LedgerWriteFailed { .. }) = cause.downcast_ref::<LedgerError>() {
            return LEDGER_WRITE_FAILED;
        }
        if cause.downcast_ref::<EncoderError>().is_some() {
            return ENCODER_UNAVAILABLE;
        }
    }
    UNEXPECTED
}
