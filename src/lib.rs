//! Per-object speed and region statistics over tracked video frames.
//!
//! An external tracker supplies objects with stable ids for every frame.
//! The [`FrameTrackAggregator`] turns them into a speed estimate per
//! object, cumulative per-region counts of unique ids, one log record per
//! observation and the overlays drawn on the streamed frame.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod source;
pub mod stats_log;

pub use aggregator::{FrameTrackAggregator, Observation, Rect, Region, RunSummary};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{ProcessedFrame, TrackingPipeline, open_file_pipeline};
pub use render::Renderer;
pub use source::{FrameSource, TrackSource, TrackedObject, TrackedObjectBuilder};
pub use stats_log::{CsvRecordSink, LogRecord, RecordSink, RetryPolicy};
