use std::time::Duration;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera '{device}' could not be opened: {message}")]
    Open { device: String, message: String },
    #[error("camera is not open")]
    NotOpened,
    #[error("frame acquisition failed: {0}")]
    Read(String),
    #[error("no frame arrived within {0:?}")]
    Timeout(Duration),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}

/// Source of live frames.
///
/// `read` blocks until a frame is available and returns `Ok(None)` once the
/// stream has ended. After `release` the camera must not be read again.
pub trait Camera: Send {
    /// Acquires the device and returns what it streams.
    fn open(&mut self, device: &str) -> Result<StreamInfo, CameraError>;

    /// Returns the next frame, or `None` at end of stream.
    fn read(&mut self) -> Result<Option<Frame>, CameraError>;

    /// Releases the device. Safe to call on a camera that never opened.
    fn release(&mut self);
}
