//! Committed bounding boxes for the current annotation session.

/// One labeled rectangular region, in display-space pixels.
///
/// `(x1, y1)` is the corner where the gesture started and `(x2, y2)` the
/// corner where it ended; they are deliberately *not* sorted, so `x2 < x1`
/// or `y2 < y1` encodes the drag direction. Normalize with min/max before
/// using the box as a rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub id: u64,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Empty string means the box has not been labeled yet.
    pub label: String,
    /// Cosmetic accent, `"#RRGGBB"`. Chosen once at creation.
    pub color: String,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }
}

/// Ordered collection of committed boxes. Insertion order doubles as render
/// z-order; there is no way to reorder.
#[derive(Default, Debug)]
pub struct BoxStore {
    boxes: Vec<BoundingBox>,
}

impl BoxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bbox: BoundingBox) {
        self.boxes.push(bbox);
    }

    /// Removes the box with the given id. No-op if absent.
    pub fn remove(&mut self, id: u64) {
        self.boxes.retain(|b| b.id != id);
    }

    /// Replaces only the label of the box with the given id, leaving
    /// geometry and color untouched. No-op if absent.
    pub fn set_label(&mut self, id: u64, label: &str) {
        if let Some(b) = self.boxes.iter_mut().find(|b| b.id == id) {
            b.label = label.to_string();
        }
    }

    pub fn get(&self, id: u64) -> Option<&BoundingBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Ids of boxes that still have an empty label, in insertion order.
    pub fn unlabeled_ids(&self) -> Vec<u64> {
        self.boxes
            .iter()
            .filter(|b| b.label.is_empty())
            .map(|b| b.id)
            .collect()
    }

    /// Rescales every box's display coordinates. Used when the rendered
    /// image is laid out at a new size, so boxes stay anchored to the same
    /// image pixels.
    pub fn rescale(&mut self, sx: f32, sy: f32) {
        for b in &mut self.boxes {
            b.x1 *= sx;
            b.y1 *= sy;
            b.x2 *= sx;
            b.y2 *= sy;
        }
    }

    /// Post-success teardown: drops every box.
    pub fn clear(&mut self) {
        self.boxes.clear();
    }
}
