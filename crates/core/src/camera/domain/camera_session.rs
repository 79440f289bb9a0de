use crate::camera::domain::camera::{Camera, CameraError};
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

/// Scoped ownership of an opened camera.
///
/// The camera is released exactly once: on `release()` or when the session
/// drops, whichever comes first, including early returns. A
/// released session never touches the camera again.
pub struct CameraSession<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
    info: StreamInfo,
    released: bool,
}

impl<'a, C: Camera + ?Sized> CameraSession<'a, C> {
    /// Opens `device`. On failure the camera is released before returning.
    pub fn open(camera: &'a mut C, device: &str) -> Result<Self, CameraError> {
        match camera.open(device) {
            Ok(info) => Ok(Self {
                camera,
                info,
                released: false,
            }),
            Err(e) => {
                camera.release();
                Err(e)
            }
        }
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Reads the next frame; a released session reports end of stream.
    pub fn read(&mut self) -> Result<Option<Frame>, CameraError> {
        if self.released {
            return Ok(None);
        }
        self.camera.read()
    }

    /// Lazy frame sequence that stops at end of stream or after the first
    /// error.
    pub fn frames(&mut self) -> Frames<'_, 'a, C> {
        Frames {
            session: self,
            finished: false,
        }
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.camera.release();
        }
    }
}

impl<C: Camera + ?Sized> Drop for CameraSession<'_, C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Iterator over the frames of a [`CameraSession`].
pub struct Frames<'s, 'a, C: Camera + ?Sized> {
    session: &'s mut CameraSession<'a, C>,
    finished: bool,
}

impl<C: Camera + ?Sized> Iterator for Frames<'_, '_, C> {
    type Item = Result<Frame, CameraError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.session.read() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
