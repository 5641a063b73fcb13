/// Lifecycle of a [`FrameTrackAggregator`](super::FrameTrackAggregator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregatorState {
    /// Accepting observations
    #[default]
    Streaming,
    /// Log completed; no further observations accepted
    Finalized,
}
