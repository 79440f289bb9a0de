use ndarray::Array2;

use crate::detection::domain::detector_params::Polarity;
use crate::shared::frame::Frame;

/// ITU-R BT.601 luma weights for R, G, B.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Reduces an RGB frame to a single-channel intensity image (rows x cols).
///
/// Callers guarantee three channels.
pub fn luminance(frame: &Frame) -> Array2<u8> {
    let rgb = frame.as_ndarray();
    let shape = (frame.height() as usize, frame.width() as usize);
    Array2::from_shape_fn(shape, |(y, x)| {
        let luma = LUMA_WEIGHTS[0] * rgb[[y, x, 0]] as f32
            + LUMA_WEIGHTS[1] * rgb[[y, x, 1]] as f32
            + LUMA_WEIGHTS[2] * rgb[[y, x, 2]] as f32;
        luma.round().clamp(0.0, 255.0) as u8
    })
}

/// Fixed-threshold binarization; `true` marks foreground.
pub fn binarize(gray: &Array2<u8>, cutoff: u8, polarity: Polarity) -> Array2<bool> {
    gray.mapv(|v| polarity.is_foreground(v, cutoff))
}
