use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::camera::domain::camera::{Camera, CameraError};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

/// Replays the still images of a directory, in file-name order, as a finite
/// frame stream.
///
/// The device id is the directory path. Useful for calibrating thresholds
/// against captured snapshots without a webcam attached.
pub struct ImageDirCamera {
    pending: VecDeque<PathBuf>,
    frame_index: usize,
    opened: bool,
}

impl ImageDirCamera {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            frame_index: 0,
            opened: false,
        }
    }
}

impl Default for ImageDirCamera {
    fn default() -> Self {
        Self::new()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    Ok(images)
}

impl Camera for ImageDirCamera {
    fn open(&mut self, device: &str) -> Result<StreamInfo, CameraError> {
        let open_error = |message: String| CameraError::Open {
            device: device.to_string(),
            message,
        };

        let dir = Path::new(device);
        if !dir.is_dir() {
            return Err(open_error("not a directory".to_string()));
        }
        let images = list_images(dir).map_err(|e| open_error(e.to_string()))?;
        let first = images
            .first()
            .ok_or_else(|| open_error("no images found".to_string()))?;
        let (width, height) = image::image_dimensions(first).map_err(|e| open_error(e.to_string()))?;

        log::info!("Replaying {} images from {}", images.len(), dir.display());
        self.pending = images.into();
        self.frame_index = 0;
        self.opened = true;

        Ok(StreamInfo {
            width,
            height,
            fps: 0.0,
            source: device.to_string(),
        })
    }

    fn read(&mut self) -> Result<Option<Frame>, CameraError> {
        if !self.opened {
            return Err(CameraError::NotOpened);
        }
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let rgb = image::open(&path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.pending.clear();
        self.opened = false;
    }
}
