//! Upstream collaborators: the frame source and the tracker.
//!
//! Detection and tracking happen outside this crate. A `TrackSource`
//! hands over objects whose identifiers were already assigned; the
//! aggregator trusts those identifiers as stable.

mod frames;
mod mot;
mod tracked;

pub use frames::ImageSequence;
pub use mot::MotTracks;
pub use tracked::{TrackedObject, TrackedObjectBuilder};

use image::RgbImage;

/// A decoded frame and its 1-based position in the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

/// Ordered frames with a nominal frame rate.
///
/// End of stream is signalled by `Ok(None)`.
pub trait FrameSource {
    /// Error type for frame read failures.
    type Error: std::fmt::Display;

    /// Nominal frames per second of the stream.
    fn frame_rate(&self) -> f64;

    /// Read the next frame.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}

/// Per-frame output of an external tracker.
///
/// Each returned object carries the identifier the tracker assigned to it.
/// The same physical object must keep its identifier from frame to frame:
/// speeds and region counts are keyed by it and are never re-associated.
/// An empty vector means the frame has zero observations; it does not end
/// the stream. An `Err` is treated the same way by the pipeline, after
/// being logged.
///
/// [`MotTracks`] replays a tracker's output saved in MOTChallenge format.
pub trait TrackSource {
    /// Error type for tracking failures.
    type Error: std::fmt::Display;

    /// Objects visible in `frame`. An empty vector means nothing was tracked.
    fn tracks(&mut self, frame: &Frame) -> Result<Vec<TrackedObject>, Self::Error>;
}
