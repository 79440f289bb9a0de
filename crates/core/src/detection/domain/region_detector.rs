use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::shared::frame::{Frame, FrameError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("invalid region: {0}")]
    InvalidArgument(String),
    #[error("invalid detector parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Domain interface for counting items inside one region of a frame.
///
/// Detection is a pure function of the region pixels, hence `&self`.
pub trait RegionDetector: Send {
    fn detect(&self, region: &Frame) -> Result<Detection, DetectError>;
}
