use std::fmt;

use crate::detection::domain::detection::Detection;
use crate::shared::region::{Rect, RegionSpec};

/// A region whose count dropped below the low-stock threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub region: String,
    pub count: usize,
    pub threshold: usize,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is running low!", self.region)
    }
}

/// Strict less-than: a threshold of 1 alerts only on empty compartments.
pub fn is_low(count: usize, threshold: usize) -> bool {
    count < threshold
}

/// Alerts for every low region, in the order the counts are given.
pub fn evaluate_alerts<'a>(
    counts: impl IntoIterator<Item = (&'a str, usize)>,
    threshold: usize,
) -> Vec<Alert> {
    counts
        .into_iter()
        .filter(|&(_, count)| is_low(count, threshold))
        .map(|(region, count)| Alert {
            region: region.to_string(),
            count,
            threshold,
        })
        .collect()
}

/// Detection outcome for one configured region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionReport {
    pub name: String,
    /// Region rectangle in frame coordinates.
    pub rect: Rect,
    pub count: usize,
    /// Item boxes in region-local coordinates.
    pub boxes: Vec<Rect>,
    pub low: bool,
}

impl RegionReport {
    pub fn new(spec: &RegionSpec, detection: Detection, threshold: usize) -> Self {
        Self {
            name: spec.name.clone(),
            rect: spec.rect,
            count: detection.count,
            low: is_low(detection.count, threshold),
            boxes: detection.boxes,
        }
    }

    /// Item boxes translated into frame coordinates.
    pub fn frame_boxes(&self) -> impl Iterator<Item = Rect> + '_ {
        self.boxes.iter().map(|b| b.offset_by(&self.rect))
    }
}

/// Everything the presentation side needs to know about one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: usize,
    pub regions: Vec<RegionReport>,
    pub alerts: Vec<Alert>,
}

impl FrameReport {
    pub fn new(frame_index: usize, regions: Vec<RegionReport>, threshold: usize) -> Self {
        let alerts = evaluate_alerts(
            regions.iter().map(|r| (r.name.as_str(), r.count)),
            threshold,
        );
        Self {
            frame_index,
            regions,
            alerts,
        }
    }

    pub fn count_for(&self, name: &str) -> Option<usize> {
        self.regions.iter().find(|r| r.name == name).map(|r| r.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.region.as_str()).collect()
    }

    #[rstest]
    #[case(0, 1, true)]
    #[case(1, 1, false)]
    #[case(3, 1, false)]
    #[case(1, 2, true)]
    #[case(2, 2, false)]
    #[case(0, 0, false)]
    fn test_is_low_is_strict(#[case] count: usize, #[case] threshold: usize, #[case] low: bool) {
        assert_eq!(is_low(count, threshold), low);
    }

    #[test]
    fn test_only_empty_region_alerts_at_threshold_one() {
        let alerts = evaluate_alerts([("A", 0), ("B", 3), ("C", 1)], 1);
        assert_eq!(names(&alerts), vec!["A"]);
        assert_eq!(alerts[0].count, 0);
        assert_eq!(alerts[0].threshold, 1);
    }

    #[test]
    fn test_threshold_two_alerts_strictly_below() {
        let alerts = evaluate_alerts([("A", 1), ("B", 2)], 2);
        assert_eq!(names(&alerts), vec!["A"]);
    }

    #[test]
    fn test_alerts_follow_region_order() {
        let alerts = evaluate_alerts([("z", 0), ("a", 0), ("m", 5), ("b", 0)], 1);
        assert_eq!(names(&alerts), vec!["z", "a", "b"]);
    }

    #[test]
    fn test_alert_message() {
        let alert = Alert {
            region: "compartment2".to_string(),
            count: 0,
            threshold: 1,
        };
        assert_eq!(alert.to_string(), "compartment2 is running low!");
    }

    #[test]
    fn test_frame_report_derives_alerts_and_flags() {
        let spec_a = RegionSpec::new("A", Rect::new(0, 0, 10, 10));
        let spec_b = RegionSpec::new("B", Rect::new(10, 0, 10, 10));
        let regions = vec![
            RegionReport::new(&spec_a, Detection::empty(), 1),
            RegionReport::new(
                &spec_b,
                Detection::from_boxes(vec![Rect::new(1, 1, 2, 2)]),
                1,
            ),
        ];
        let report = FrameReport::new(4, regions, 1);
        assert_eq!(report.frame_index, 4);
        assert!(report.regions[0].low);
        assert!(!report.regions[1].low);
        assert_eq!(names(&report.alerts), vec!["A"]);
        assert_eq!(report.count_for("B"), Some(1));
        assert_eq!(report.count_for("missing"), None);
    }

    #[test]
    fn test_frame_boxes_are_offset_by_region_origin() {
        let spec = RegionSpec::new("A", Rect::new(100, 50, 80, 80));
        let report = RegionReport::new(
            &spec,
            Detection::from_boxes(vec![Rect::new(5, 6, 10, 12)]),
            1,
        );
        let boxes: Vec<Rect> = report.frame_boxes().collect();
        assert_eq!(boxes, vec![Rect::new(105, 56, 10, 12)]);
    }
}
