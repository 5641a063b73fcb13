//! Per-run object bookkeeping: speed, region membership and unique ids.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use nalgebra::Point2;
use tracing::{debug, error, info};

use super::annotation::{
    FrameAnnotations, LabelKind, ObjectOverlay, REGION_LABEL_OFFSET, RegionOverlay, TextLabel,
    totals_labels,
};
use super::rect::Rect;
use super::region::{Region, RegionCounter};
use super::speed::SpeedEstimator;
use super::state::AggregatorState;
use crate::error::{Error, Result};
use crate::source::TrackedObject;
use crate::stats_log::{LogRecord, RecordSink};

/// Result of observing one object in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub object_id: u64,
    pub centroid: Point2<f32>,
    /// Speed computed on this call; `None` on the first sighting of an id
    pub speed: Option<f64>,
    /// Regions whose rectangle contains the centroid in this frame
    pub inside: Vec<String>,
    /// Regions that have counted this object so far, as logged
    pub regions: Vec<String>,
    pub speed_label: TextLabel,
}

/// Totals at some point of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub records: u64,
    pub unique_objects: usize,
    /// `(region name, unique ids counted)` in configuration order
    pub region_counts: Vec<(String, usize)>,
}

/// Aggregates tracked objects across the frames of a single run.
///
/// Construct one per run. Records go to the sink as they are produced;
/// [`finalize`](Self::finalize) completes the log. Dropping an aggregator
/// that was never finalized finalizes it.
pub struct FrameTrackAggregator<S: RecordSink> {
    speeds: SpeedEstimator,
    regions: RegionCounter,
    unique_ids: HashSet<u64>,
    sink: S,
    state: AggregatorState,
    frames: u64,
    records: u64,
}

impl<S: RecordSink> FrameTrackAggregator<S> {
    /// Create an aggregator for one run.
    ///
    /// # Arguments
    ///
    /// * `regions` - Rectangles to count ids in, kept in this order for totals
    /// * `calibration` - Factor applied to pixels/frame × frame rate
    /// * `sink` - Receives one record per observation
    pub fn new(regions: Vec<Region>, calibration: f64, sink: S) -> Self {
        Self {
            speeds: SpeedEstimator::new(calibration),
            regions: RegionCounter::new(regions),
            unique_ids: HashSet::new(),
            sink,
            state: AggregatorState::Streaming,
            frames: 0,
            records: 0,
        }
    }

    /// Observe one object at one frame and append its log record.
    ///
    /// # Returns
    ///
    /// The speed computed on this call, the regions containing the centroid
    /// now, the cumulative regions that were logged and the speed label.
    /// If the sink rejects the record the error is returned and no state
    /// changes, so the id is neither counted nor used as a speed baseline.
    pub fn observe(
        &mut self,
        object_id: u64,
        bbox: &Rect,
        frame_index: u64,
        frame_rate: f64,
        timestamp: DateTime<Local>,
    ) -> Result<Observation> {
        if self.state == AggregatorState::Finalized {
            return Err(Error::Finalized);
        }

        // nothing is committed until the record is in the log
        let centroid = bbox.center();
        let speed = self.speeds.estimate(object_id, &centroid, frame_rate);
        let inside = self.regions.containing(&centroid);
        let regions = self.regions.memberships_with(object_id, Some(&centroid));
        let logged_speed = speed.or(self.speeds.speed(object_id)).unwrap_or(0.0);
        self.sink.append(&LogRecord {
            timestamp,
            frame_id: frame_index,
            object_id,
            regions: regions.clone(),
            speed_kmph: logged_speed,
        })?;

        self.speeds.commit(object_id, &centroid, speed);
        self.regions.count(object_id, &centroid);
        if self.unique_ids.insert(object_id) {
            debug!("New object {object_id} at frame {frame_index}");
        }
        self.records += 1;

        Ok(Observation {
            object_id,
            centroid,
            speed,
            inside,
            regions,
            speed_label: TextLabel::speed(logged_speed, bbox),
        })
    }

    /// Observe every object of one frame and build its annotations.
    pub fn observe_frame(
        &mut self,
        frame_index: u64,
        frame_rate: f64,
        tracks: &[TrackedObject],
    ) -> Result<FrameAnnotations> {
        let timestamp = Local::now();
        let mut objects = Vec::with_capacity(tracks.len());
        for track in tracks {
            let observation =
                self.observe(track.object_id, &track.bbox, frame_index, frame_rate, timestamp)?;
            objects.push(ObjectOverlay {
                object_id: track.object_id,
                bbox: track.bbox,
                id_label: TextLabel::left(
                    LabelKind::ObjectId,
                    format!("id:{}", track.object_id),
                    track.bbox.x as i32,
                    track.bbox.y as i32 - 4,
                ),
                speed_label: observation.speed_label,
            });
        }
        self.frames += 1;

        Ok(FrameAnnotations {
            regions: self.region_overlays(),
            objects,
            totals: totals_labels(
                self.unique_count(),
                self.regions
                    .counts()
                    .map(|(region, n)| (region.display_name(), n)),
            ),
        })
    }

    /// Complete the log. Only the first call succeeds.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state == AggregatorState::Finalized {
            return Err(Error::AlreadyFinalized);
        }
        self.state = AggregatorState::Finalized;
        self.sink.finish()?;

        info!(
            "Stats log finalized: {} record(s), {} frame(s), {} unique object(s)",
            self.records,
            self.frames,
            self.unique_ids.len()
        );
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// Number of distinct ids observed so far.
    pub fn unique_count(&self) -> usize {
        self.unique_ids.len()
    }

    /// `(region name, unique ids counted)` in configuration order.
    pub fn region_counts(&self) -> Vec<(String, usize)> {
        self.regions
            .counts()
            .map(|(region, n)| (region.name.clone(), n))
            .collect()
    }

    /// Last computed speed of an object.
    pub fn speed(&self, object_id: u64) -> Option<f64> {
        self.speeds.speed(object_id)
    }

    /// The record sink, e.g. to inspect an in-memory log.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Frames, records and counts accumulated so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frames,
            records: self.records,
            unique_objects: self.unique_count(),
            region_counts: self.region_counts(),
        }
    }

    fn region_overlays(&self) -> Vec<RegionOverlay> {
        self.regions
            .regions()
            .map(|region| RegionOverlay {
                rect: region.rect,
                label: TextLabel::left(
                    LabelKind::RegionName,
                    region.name.clone(),
                    region.rect.x as i32,
                    region.rect.y as i32 - REGION_LABEL_OFFSET,
                ),
            })
            .collect()
    }
}

impl<S: RecordSink> Drop for FrameTrackAggregator<S> {
    fn drop(&mut self) {
        if self.state == AggregatorState::Streaming {
            if let Err(err) = self.finalize() {
                error!("Failed to finalize stats log: {err}");
            }
        }
    }
}
