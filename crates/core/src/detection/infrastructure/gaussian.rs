use ndarray::Array2;

/// Sigma implied by a kernel size when no explicit sigma is given.
///
/// Same derivation as the usual `sigma = 0` convention of vision toolkits,
/// so calibration values carry over between implementations.
pub fn sigma_for_kernel(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Precompute a normalized 1D Gaussian kernel of the given odd size.
pub fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let sigma = sigma_for_kernel(kernel_size);
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge sample (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut i = index.rem_euclid(period);
    if i >= len as isize {
        i = period - i;
    }
    i as usize
}

/// Separable Gaussian blur of a single-channel image.
pub fn blur(gray: &Array2<u8>, kernel: &[f32]) -> Array2<u8> {
    let (height, width) = gray.dim();
    let kernel_size = kernel.len();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return gray.clone();
    }
    let half = (kernel_size / 2) as isize;

    // Horizontal pass: gray → temp
    let temp = Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| {
                let sx = reflect_101(x as isize + k as isize - half, width);
                gray[[y, sx]] as f32 * w
            })
            .sum::<f32>()
    });

    // Vertical pass: temp → output
    Array2::from_shape_fn((height, width), |(y, x)| {
        let sum: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| {
                let sy = reflect_101(y as isize + k as isize - half, height);
                temp[[sy, x]] * w
            })
            .sum();
        sum.round().clamp(0.0, 255.0) as u8
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_sums_to_one() {
        let k = gaussian_kernel_1d(7);
        let sum: f32 = k.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_kernel_is_symmetric() {
        let k = gaussian_kernel_1d(7);
        for i in 0..k.len() / 2 {
            assert_relative_eq!(k[i], k[k.len() - 1 - i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_kernel_center_is_largest() {
        let k = gaussian_kernel_1d(7);
        assert!(k.iter().all(|&v| v <= k[3]));
    }

    #[test]
    fn test_sigma_for_seven_tap_kernel() {
        assert_relative_eq!(sigma_for_kernel(7), 1.4, epsilon = 1e-9);
        assert_relative_eq!(sigma_for_kernel(3), 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_reflect_101_indices() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
        assert_eq!(reflect_101(-5, 2), 1);
    }

    #[test]
    fn test_blur_uniform_image_unchanged() {
        let gray = Array2::from_elem((10, 10), 128u8);
        let out = blur(&gray, &gaussian_kernel_1d(7));
        assert!(out.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_blur_spreads_single_bright_pixel() {
        let mut gray = Array2::zeros((11, 11));
        gray[[5, 5]] = 255u8;
        let out = blur(&gray, &gaussian_kernel_1d(5));
        assert!(out[[5, 5]] < 255);
        assert!(out[[5, 6]] > 0);
        assert!(out[[4, 5]] > 0);
        assert_eq!(out[[0, 0]], 0);
    }

    #[test]
    fn test_kernel_size_1_is_identity() {
        let gray = Array2::from_shape_fn((5, 5), |(y, x)| (y * 5 + x) as u8);
        let out = blur(&gray, &gaussian_kernel_1d(1));
        assert_eq!(out, gray);
    }

    #[test]
    fn test_kernel_larger_than_image() {
        let gray = Array2::from_elem((2, 3), 40u8);
        let out = blur(&gray, &gaussian_kernel_1d(7));
        assert!(out.iter().all(|&v| v == 40));
    }
}
