//! Drawing directives produced by the aggregator and burned in by the renderer.

use super::rect::Rect;

/// Vertical gap between the bottom of a box and the speed label baseline.
pub const SPEED_LABEL_OFFSET: f32 = 25.0;
/// Vertical gap between a region's top edge and its name baseline.
pub const REGION_LABEL_OFFSET: i32 = 10;

const TOTALS_ORIGIN: (i32, i32) = (10, 30);
const REGION_TOTALS_START_Y: i32 = 60;
const REGION_TOTALS_STEP: i32 = 30;

/// What a label describes; the renderer picks style from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    RegionName,
    ObjectId,
    Speed,
    TotalObjects,
    RegionCount,
}

/// Horizontal placement of a label relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A line of text; `(x, y)` is a baseline point.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub kind: LabelKind,
    pub align: Align,
    /// Draw a filled background behind the text.
    pub background: bool,
}

impl TextLabel {
    pub fn left(kind: LabelKind, text: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            kind,
            align: Align::Left,
            background: false,
        }
    }

    /// Speed label centered below the box, e.g. `12.3 km/h`.
    pub fn speed(speed: f64, bbox: &Rect) -> Self {
        let center = bbox.center();
        Self {
            text: format!("{speed:.1} km/h"),
            x: center.x as i32,
            y: (center.y + bbox.height / 2.0 + SPEED_LABEL_OFFSET) as i32,
            kind: LabelKind::Speed,
            align: Align::Center,
            background: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionOverlay {
    pub rect: Rect,
    pub label: TextLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectOverlay {
    pub object_id: u64,
    pub bbox: Rect,
    pub id_label: TextLabel,
    pub speed_label: TextLabel,
}

/// Everything to draw on one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameAnnotations {
    pub regions: Vec<RegionOverlay>,
    pub objects: Vec<ObjectOverlay>,
    pub totals: Vec<TextLabel>,
}

/// Running totals: `Total Objects: N` then one `{Region} Count: n` line per region.
pub fn totals_labels(
    unique: usize,
    region_counts: impl IntoIterator<Item = (String, usize)>,
) -> Vec<TextLabel> {
    let mut labels = vec![TextLabel::left(
        LabelKind::TotalObjects,
        format!("Total Objects: {unique}"),
        TOTALS_ORIGIN.0,
        TOTALS_ORIGIN.1,
    )];
    let mut y = REGION_TOTALS_START_Y;
    for (name, count) in region_counts {
        labels.push(TextLabel::left(
            LabelKind::RegionCount,
            format!("{name} Count: {count}"),
            TOTALS_ORIGIN.0,
            y,
        ));
        y += REGION_TOTALS_STEP;
    }
    labels
}
