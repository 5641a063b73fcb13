//! Centroid displacement speed estimate.

use std::collections::HashMap;

use nalgebra::Point2;

/// Default calibration: pixels-per-frame × frame rate × 0.05 is reported as km/h.
///
/// No camera calibration is involved; the factor only rescales pixel motion.
pub const DEFAULT_CALIBRATION: f64 = 0.05;

/// Tracks the last centroid and last computed speed of every object.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    calibration: f64,
    last_positions: HashMap<u64, Point2<f64>>,
    speeds: HashMap<u64, f64>,
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION)
    }
}

impl SpeedEstimator {
    pub fn new(calibration: f64) -> Self {
        Self {
            calibration,
            last_positions: HashMap::new(),
            speeds: HashMap::new(),
        }
    }

    /// Update the estimate for `object_id` with its centroid at this frame.
    ///
    /// Returns the speed computed on this call, or `None` for the first
    /// observation of an id. The stored position is replaced either way.
    pub fn update(&mut self, object_id: u64, centroid: &Point2<f32>, frame_rate: f64) -> Option<f64> {
        let speed = self.estimate(object_id, centroid, frame_rate);
        self.commit(object_id, centroid, speed);
        speed
    }

    /// Speed `update` would compute, without touching any state.
    pub fn estimate(&self, object_id: u64, centroid: &Point2<f32>, frame_rate: f64) -> Option<f64> {
        let current = to_f64(centroid);
        self.last_positions
            .get(&object_id)
            .map(|prev| nalgebra::distance(prev, &current) * frame_rate * self.calibration)
    }

    /// Store `centroid` as the new baseline and `speed`, if any, as the last speed.
    pub fn commit(&mut self, object_id: u64, centroid: &Point2<f32>, speed: Option<f64>) {
        if let Some(speed) = speed {
            self.speeds.insert(object_id, speed);
        }
        self.last_positions.insert(object_id, to_f64(centroid));
    }

    /// Last computed speed, if the id has been observed at least twice.
    pub fn speed(&self, object_id: u64) -> Option<f64> {
        self.speeds.get(&object_id).copied()
    }

    pub fn calibration(&self) -> f64 {
        self.calibration
    }
}

fn to_f64(p: &Point2<f32>) -> Point2<f64> {
    Point2::new(p.x as f64, p.y as f64)
}
