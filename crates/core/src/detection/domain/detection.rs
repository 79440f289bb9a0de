use crate::shared::region::Rect;

/// Items found in one region for one frame.
///
/// `boxes` are region-local and follow discovery order; nothing downstream
/// may rely on that order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Detection {
    pub count: usize,
    pub boxes: Vec<Rect>,
}

impl Detection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_boxes(boxes: Vec<Rect>) -> Self {
        Self {
            count: boxes.len(),
            boxes,
        }
    }
}
