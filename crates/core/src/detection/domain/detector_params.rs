use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::domain::region_detector::DetectError;
use crate::shared::constants::{DEFAULT_BLUR_KERNEL, DEFAULT_CUTOFF, DEFAULT_MIN_AREA};

/// Which side of the cutoff counts as an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Items darker than the tray: intensities at or below the cutoff.
    #[default]
    Dark,
    /// Items lighter than the tray: intensities above the cutoff.
    Light,
}

impl Polarity {
    pub fn is_foreground(self, intensity: u8, cutoff: u8) -> bool {
        match self {
            Polarity::Dark => intensity <= cutoff,
            Polarity::Light => intensity > cutoff,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Dark => write!(f, "dark"),
            Polarity::Light => write!(f, "light"),
        }
    }
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Polarity::Dark),
            "light" => Ok(Polarity::Light),
            other => Err(format!("Polarity must be 'dark' or 'light', got '{other}'")),
        }
    }
}

/// Calibration for the threshold blob pipeline.
///
/// The defaults were tuned for one tray under one camera and lighting
/// setup; other deployments are expected to override them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    pub blur_kernel: usize,
    pub cutoff: u8,
    pub min_area: f64,
    pub polarity: Polarity,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            blur_kernel: DEFAULT_BLUR_KERNEL,
            cutoff: DEFAULT_CUTOFF,
            min_area: DEFAULT_MIN_AREA,
            polarity: Polarity::Dark,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(DetectError::InvalidParams(format!(
                "blur kernel must be a positive odd integer, got {}",
                self.blur_kernel
            )));
        }
        if !self.min_area.is_finite() || self.min_area <= 0.0 {
            return Err(DetectError::InvalidParams(format!(
                "minimum area must be a positive number, got {}",
                self.min_area
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Polarity::Dark, 0, true)]
    #[case(Polarity::Dark, 100, true)]
    #[case(Polarity::Dark, 101, false)]
    #[case(Polarity::Light, 100, false)]
    #[case(Polarity::Light, 101, true)]
    #[case(Polarity::Light, 255, true)]
    fn test_polarity_at_cutoff_100(
        #[case] polarity: Polarity,
        #[case] intensity: u8,
        #[case] expected: bool,
    ) {
        assert_eq!(polarity.is_foreground(intensity, 100), expected);
    }

    #[test]
    fn test_polarity_parse_is_case_insensitive() {
        assert_eq!("Light".parse::<Polarity>().unwrap(), Polarity::Light);
        assert_eq!("dark".parse::<Polarity>().unwrap(), Polarity::Dark);
        assert!("grey".parse::<Polarity>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let params = DetectorParams::default();
        assert_eq!(params.blur_kernel, 7);
        assert_eq!(params.cutoff, 100);
        assert_eq!(params.polarity, Polarity::Dark);
        assert!(params.validate().is_ok());
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    fn test_even_or_zero_kernel_rejected(#[case] kernel: usize) {
        let params = DetectorParams {
            blur_kernel: kernel,
            ..DetectorParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(DetectError::InvalidParams(_))
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    fn test_non_positive_min_area_rejected(#[case] min_area: f64) {
        let params = DetectorParams {
            min_area,
            ..DetectorParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params: DetectorParams = serde_json::from_str(r#"{"cutoff": 80, "polarity": "light"}"#).unwrap();
        assert_eq!(params.cutoff, 80);
        assert_eq!(params.polarity, Polarity::Light);
        assert_eq!(params.blur_kernel, 7);
    }
}
