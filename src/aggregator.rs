//! Frame track aggregator.
//!
//! Consumes the tracked objects of each frame and keeps, for one run:
//! a speed estimate per object, the set of ids seen inside each region and
//! the set of all ids seen. Each observation produces one log record and
//! the drawing directives for the annotated frame.

mod annotation;
mod frame_aggregator;
mod rect;
mod region;
mod speed;
mod state;

pub use annotation::{
    Align, FrameAnnotations, LabelKind, ObjectOverlay, RegionOverlay, TextLabel, totals_labels,
};
pub use frame_aggregator::{FrameTrackAggregator, Observation, RunSummary};
pub use rect::Rect;
pub use region::{Region, RegionCounter};
pub use speed::{DEFAULT_CALIBRATION, SpeedEstimator};
pub use state::AggregatorState;
