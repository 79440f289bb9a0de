/// Odd Gaussian kernel size applied before thresholding.
pub const DEFAULT_BLUR_KERNEL: usize = 7;

/// Intensity cutoff (0-255) separating items from the tray background.
pub const DEFAULT_CUTOFF: u8 = 100;

/// Minimum contour area, in region pixels, for a blob to count as an item.
pub const DEFAULT_MIN_AREA: f64 = 2000.0;

/// A region alerts when its count is strictly below this value.
pub const DEFAULT_LOW_THRESHOLD: usize = 1;

pub const DEFAULT_DEVICE: &str = "0";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "TrayCount";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Reference tray layout: three compartments on a 1280x720 webcam frame.
pub const DEFAULT_REGIONS: &[(&str, u32, u32, u32, u32)] = &[
    ("compartment1", 90, 50, 350, 550),
    ("compartment2", 500, 50, 200, 550),
    ("compartment3", 720, 50, 320, 550),
];
