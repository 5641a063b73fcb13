//! Tracked object input and a builder for the box layouts trackers emit.

use crate::aggregator::Rect;

/// One object reported by the upstream tracker for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    /// Identifier assigned by the tracker, stable across frames
    pub object_id: u64,
    pub bbox: Rect,
    /// Detection confidence, when the tracker reports one
    pub score: f32,
}

impl TrackedObject {
    pub fn new(object_id: u64, bbox: Rect) -> Self {
        Self {
            object_id,
            bbox,
            score: 1.0,
        }
    }
}

/// Assembles a [`TrackedObject`] from whichever box layout a tracker emits.
#[derive(Debug, Clone, Default)]
pub struct TrackedObjectBuilder {
    object_id: u64,
    bbox: Rect,
    score: Option<f32>,
}

impl TrackedObjectBuilder {
    pub fn new(object_id: u64) -> Self {
        Self {
            object_id,
            ..Self::default()
        }
    }

    /// Corners `(x1, y1)` and `(x2, y2)`.
    pub fn tlbr(self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.with_box(Rect::from_tlbr(x1, y1, x2, y2))
    }

    /// Center and size.
    pub fn xywh(self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.with_box(Rect::from_xywh(cx, cy, w, h))
    }

    /// Left, top, width, height; the MOT file layout.
    pub fn tlwh(self, left: f32, top: f32, w: f32, h: f32) -> Self {
        self.with_box(Rect::new(left, top, w, h))
    }

    pub fn score(self, score: f32) -> Self {
        Self {
            score: Some(score),
            ..self
        }
    }

    pub fn build(self) -> TrackedObject {
        TrackedObject {
            object_id: self.object_id,
            bbox: self.bbox,
            score: self.score.unwrap_or(1.0),
        }
    }

    fn with_box(self, bbox: Rect) -> Self {
        Self { bbox, ..self }
    }
}
