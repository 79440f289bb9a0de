use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle. `x`/`y` is the top-left corner.
///
/// Used both for region specifications (frame coordinates) and for blob
/// bounding boxes (region-local coordinates).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }

    /// Translates a region-local rectangle into the coordinate space of the
    /// region's parent frame.
    pub fn offset_by(&self, origin: &Rect) -> Rect {
        Rect {
            x: self.x + origin.x,
            y: self.y + origin.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A named tray compartment: a fixed rectangle of the camera frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    #[serde(flatten)]
    pub rect: Rect,
}

impl RegionSpec {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // ── Rect geometry ────────────────────────────────────────────────

    #[test]
    fn test_edges_and_area() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.area(), 1200);
        assert!(!r.is_empty());
    }

    #[rstest]
    #[case(Rect::new(0, 0, 0, 10))]
    #[case(Rect::new(0, 0, 10, 0))]
    fn test_zero_dimension_is_empty(#[case] r: Rect) {
        assert!(r.is_empty());
        assert_eq!(r.area(), 0);
    }

    #[rstest]
    #[case(Rect::new(0, 0, 100, 100), true)]
    #[case(Rect::new(50, 50, 50, 50), true)]
    #[case(Rect::new(50, 50, 51, 50), false)]
    #[case(Rect::new(0, 99, 10, 2), false)]
    fn test_fits_within_100x100(#[case] r: Rect, #[case] expected: bool) {
        assert_eq!(r.fits_within(100, 100), expected);
    }

    #[test]
    fn test_edges_do_not_overflow() {
        let r = Rect::new(u32::MAX, u32::MAX, u32::MAX, 1);
        assert_eq!(r.right(), u32::MAX as u64 * 2);
        assert!(!r.fits_within(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_offset_by_translates_origin_only() {
        let local = Rect::new(5, 6, 7, 8);
        let origin = Rect::new(100, 200, 300, 400);
        assert_eq!(local.offset_by(&origin), Rect::new(105, 206, 7, 8));
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn test_region_spec_json_is_flat() {
        let json = r#"{"name":"left","x":1,"y":2,"width":3,"height":4}"#;
        let spec: RegionSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec, RegionSpec::new("left", Rect::new(1, 2, 3, 4)));
    }
}
