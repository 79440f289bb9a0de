use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector_params::DetectorParams;
use crate::detection::domain::region_detector::{DetectError, RegionDetector};
use crate::detection::infrastructure::contours::external_blobs;
use crate::detection::infrastructure::gaussian::{blur, gaussian_kernel_1d};
use crate::detection::infrastructure::luminance::{binarize, luminance};
use crate::shared::frame::Frame;

/// Counts items as large connected blobs of a thresholded, smoothed
/// luminance image.
///
/// Pipeline: luma → Gaussian blur → fixed threshold (polarity-aware) →
/// outermost 8-connected components → area filter → bounding boxes.
pub struct ThresholdBlobDetector {
    params: DetectorParams,
    kernel: Vec<f32>,
}

impl ThresholdBlobDetector {
    pub fn new(params: DetectorParams) -> Result<Self, DetectError> {
        params.validate()?;
        Ok(Self {
            kernel: gaussian_kernel_1d(params.blur_kernel),
            params,
        })
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }
}

impl RegionDetector for ThresholdBlobDetector {
    fn detect(&self, region: &Frame) -> Result<Detection, DetectError> {
        if region.channels() != 3 {
            return Err(DetectError::InvalidArgument(format!(
                "expected 3 color channels, got {}",
                region.channels()
            )));
        }
        region
            .check_buffer()
            .map_err(|e| DetectError::InvalidArgument(e.to_string()))?;
        if region.is_empty() {
            return Ok(Detection::empty());
        }

        let gray = luminance(region);
        let smoothed = blur(&gray, &self.kernel);
        let mask = binarize(&smoothed, self.params.cutoff, self.params.polarity);

        let boxes = external_blobs(&mask)
            .into_iter()
            .filter(|blob| blob.area > self.params.min_area)
            .map(|blob| blob.bounds)
            .collect();
        Ok(Detection::from_boxes(boxes))
    }
}
