pub mod contours;
pub mod gaussian;
pub mod luminance;
pub mod threshold_blob_detector;
