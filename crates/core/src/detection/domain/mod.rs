pub mod detection;
pub mod detector_params;
pub mod region_detector;
