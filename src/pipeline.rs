//! TrackingPipeline for driving one run from frames to annotated JPEGs.

use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{info, warn};

use crate::aggregator::{FrameAnnotations, FrameTrackAggregator, RunSummary};
use crate::config::Config;
use crate::error::Result;
use crate::render::Renderer;
use crate::source::{FrameSource, ImageSequence, MotTracks, TrackSource};
use crate::stats_log::{CsvRecordSink, RecordSink};

/// One fully processed frame.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub index: u64,
    pub jpeg: Vec<u8>,
    pub annotations: FrameAnnotations,
}

/// Pipeline reading image files, MOT tracks and writing the CSV log.
pub type FilePipeline = TrackingPipeline<ImageSequence, MotTracks, CsvRecordSink>;

/// Bundles a frame source, a tracker, an aggregator and a renderer.
///
/// Frames are processed one at a time: read, track, aggregate, draw,
/// encode. The aggregator is finalized once the frame source is exhausted
/// or the run is stopped early.
pub struct TrackingPipeline<F: FrameSource, T: TrackSource, S: RecordSink> {
    frames: F,
    tracker: T,
    aggregator: FrameTrackAggregator<S>,
    renderer: Arc<Renderer>,
    finished: bool,
}

impl<F: FrameSource, T: TrackSource, S: RecordSink> TrackingPipeline<F, T, S> {
    /// Assemble a pipeline from its parts. Nothing is read until the first
    /// [`process_next`](Self::process_next).
    pub fn new(
        frames: F,
        tracker: T,
        aggregator: FrameTrackAggregator<S>,
        renderer: Arc<Renderer>,
    ) -> Self {
        Self {
            frames,
            tracker,
            aggregator,
            renderer,
            finished: false,
        }
    }

    /// Process a single frame.
    ///
    /// Returns `None` once the stream has ended, after finalizing the log.
    /// A frame that cannot be read ends the stream; a tracker failure only
    /// leaves that frame without observations.
    pub fn process_next(&mut self) -> Result<Option<ProcessedFrame>> {
        if self.finished {
            return Ok(None);
        }

        let frame = match self.frames.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.finish()?;
                return Ok(None);
            }
            Err(err) => {
                warn!("Frame read failed, ending stream: {err}");
                self.finish()?;
                return Ok(None);
            }
        };

        let tracks = self.tracker.tracks(&frame).unwrap_or_else(|err| {
            warn!("Tracker failed on frame {}: {err}", frame.index);
            Vec::new()
        });

        let annotations =
            self.aggregator
                .observe_frame(frame.index, self.frames.frame_rate(), &tracks)?;

        let mut image = frame.image;
        self.renderer.render(&mut image, &annotations);
        let jpeg = self.renderer.encode_jpeg(&image)?;

        Ok(Some(ProcessedFrame {
            index: frame.index,
            jpeg,
            annotations,
        }))
    }

    /// Drive the stream, handing each frame to `emit` before reading the next.
    ///
    /// `emit` returning `ControlFlow::Break` stops the run; the log is
    /// finalized either way.
    pub fn run<E>(&mut self, mut emit: E) -> Result<RunSummary>
    where
        E: FnMut(ProcessedFrame) -> ControlFlow<()>,
    {
        while let Some(frame) = self.process_next()? {
            if emit(frame).is_break() {
                info!("Run stopped before the end of the stream");
                break;
            }
        }
        self.finish()?;
        Ok(self.aggregator.summary())
    }

    /// Finalize the log if that has not happened yet.
    pub fn finish(&mut self) -> Result<()> {
        if !self.finished {
            self.finished = true;
            self.aggregator.finalize()?;
        }
        Ok(())
    }

    /// Whether the aggregator has been finalized.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn aggregator(&self) -> &FrameTrackAggregator<S> {
        &self.aggregator
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }
}

/// Build the image-sequence + MOT + CSV pipeline described by `config`.
///
/// A fresh aggregator is created for every call, and the log at
/// `output.log_path` is overwritten.
pub fn open_file_pipeline(config: &Config, renderer: Arc<Renderer>) -> Result<FilePipeline> {
    let frames = ImageSequence::open(&config.input.frames_dir, config.input.frame_rate)?;
    let tracks = MotTracks::from_path(&config.input.tracks_file)?;
    let sink = CsvRecordSink::create(
        &config.output.log_path,
        config.output.flush_every,
        config.output.retry,
    )?;
    let aggregator = FrameTrackAggregator::new(
        config.aggregator.regions(),
        config.aggregator.calibration,
        sink,
    );
    Ok(TrackingPipeline::new(frames, tracks, aggregator, renderer))
}
