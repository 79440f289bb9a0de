use ndarray::{s, ArrayView3, ArrayViewMut3};
use thiserror::Error;

use crate::shared::region::Rect;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error(
        "region {x},{y} {width}x{height} does not fit inside {frame_width}x{frame_height} frame"
    )]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}x{channels}")]
    BufferSize {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        channels: u8,
    },
}

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at the camera boundary only; detection and
/// orchestration work on this type.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Checked constructor for buffers that come from outside the crate.
    pub fn try_new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
    ) -> Result<Self, FrameError> {
        let frame = Self {
            data,
            width,
            height,
            channels,
            index,
        };
        frame.check_buffer()?;
        Ok(frame)
    }

    /// Builds a frame without the length check, for exercising the
    /// malformed-buffer paths.
    #[cfg(test)]
    pub(crate) fn new_unchecked(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Fails when the pixel buffer does not hold `width * height * channels`
    /// bytes. `new` only checks this in debug builds.
    pub fn check_buffer(&self) -> Result<(), FrameError> {
        let expected =
            (self.width as usize) * (self.height as usize) * (self.channels as usize);
        if self.data.len() != expected {
            return Err(FrameError::BufferSize {
                actual: self.data.len(),
                expected,
                width: self.width,
                height: self.height,
                channels: self.channels,
            });
        }
        Ok(())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `rect` into a new frame with the same index.
    ///
    /// The rectangle must lie entirely inside the frame; a zero-area
    /// rectangle yields an empty frame.
    pub fn crop(&self, rect: &Rect) -> Result<Frame, FrameError> {
        self.check_buffer()?;
        if !rect.fits_within(self.width, self.height) {
            return Err(FrameError::RegionOutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                frame_width: self.width,
                frame_height: self.height,
            });
        }
        let (x, y) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        let data: Vec<u8> = self
            .as_ndarray()
            .slice(s![y..y + h, x..x + w, ..])
            .iter()
            .copied()
            .collect();
        Ok(Frame::new(
            data,
            rect.width,
            rect.height,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x3 RGB frame where each pixel's red channel encodes `row * 10 + col`.
    fn coded_frame() -> Frame {
        let (w, h) = (4u32, 3u32);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for row in 0..h {
            for col in 0..w {
                data.extend_from_slice(&[(row * 10 + col) as u8, 0, 0]);
            }
        }
        Frame::new(data, w, h, 3, 7)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_try_new_rejects_wrong_length() {
        let err = Frame::try_new(vec![0u8; 10], 2, 2, 3, 0).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferSize {
                actual: 10,
                expected: 12,
                ..
            }
        ));
    }

    #[test]
    fn test_check_buffer() {
        assert!(Frame::new(vec![0u8; 12], 2, 2, 3, 0).check_buffer().is_ok());
        let short = Frame::new_unchecked(vec![0u8; 12], 10, 10, 3, 0);
        assert!(matches!(
            short.check_buffer(),
            Err(FrameError::BufferSize {
                actual: 12,
                expected: 300,
                ..
            })
        ));
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::new(vec![0u8; 24], 4, 2, 3, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        frame.as_ndarray_mut()[[0, 1, 2]] = 128;
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }

    // ── Cropping ─────────────────────────────────────────────────────

    #[test]
    fn test_crop_copies_subregion() {
        let frame = coded_frame();
        let roi = frame.crop(&Rect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(roi.width(), 2);
        assert_eq!(roi.height(), 2);
        assert_eq!(roi.index(), 7);
        let reds: Vec<u8> = roi.data().chunks(3).map(|px| px[0]).collect();
        assert_eq!(reds, vec![11, 12, 21, 22]);
    }

    #[test]
    fn test_crop_full_frame_is_identity() {
        let frame = coded_frame();
        let roi = frame.crop(&Rect::new(0, 0, 4, 3)).unwrap();
        assert_eq!(roi.data(), frame.data());
    }

    #[test]
    fn test_crop_zero_area_is_empty() {
        let frame = coded_frame();
        let roi = frame.crop(&Rect::new(2, 1, 0, 2)).unwrap();
        assert!(roi.is_empty());
        assert!(roi.data().is_empty());
    }

    #[test]
    fn test_crop_of_short_buffer_fails() {
        let frame = Frame::new_unchecked(vec![0u8; 12], 10, 10, 3, 0);
        let err = frame.crop(&Rect::new(0, 0, 2, 2)).unwrap_err();
        assert!(matches!(err, FrameError::BufferSize { .. }));
    }

    #[test]
    fn test_crop_out_of_bounds_fails() {
        let frame = coded_frame();
        let err = frame.crop(&Rect::new(3, 0, 2, 1)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::RegionOutOfBounds {
                frame_width: 4,
                frame_height: 3,
                ..
            }
        ));
    }
}
