//! Tracker output in the MOTChallenge text format.
//!
//! One row per (frame, track): `frame,id,bb_left,bb_top,bb_width,bb_height,conf,...`.
//! Frame numbers are 1-based; trailing columns beyond `conf` are ignored.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::{Frame, TrackSource, TrackedObject, TrackedObjectBuilder};
use crate::error::{Error, Result};

/// Pre-computed tracks indexed by frame number.
#[derive(Debug, Clone, Default)]
pub struct MotTracks {
    frames: BTreeMap<u64, Vec<TrackedObject>>,
}

impl MotTracks {
    /// Load a tracks file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let tracks = Self::from_reader(file)?;
        info!(
            "Loaded tracks for {} frame(s) from {}",
            tracks.frames.len(),
            path.display()
        );
        Ok(tracks)
    }

    /// Parse MOT rows from any reader.
    ///
    /// # Returns
    ///
    /// Tracks grouped by frame number, or [`Error::TrackRow`] naming the
    /// first line with a missing or non-numeric column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut frames: BTreeMap<u64, Vec<TrackedObject>> = BTreeMap::new();
        let mut skipped = 0usize;
        for row in rdr.records() {
            let row = row?;
            let line = row.position().map_or(0, |p| p.line());
            let field = |idx: usize| -> Result<f64> {
                let raw = row.get(idx).ok_or_else(|| Error::TrackRow {
                    line,
                    reason: format!("missing column {}", idx + 1),
                })?;
                raw.parse::<f64>().map_err(|e| Error::TrackRow {
                    line,
                    reason: format!("column {}: {e}", idx + 1),
                })
            };

            let frame = field(0)?;
            let id = field(1)?;
            // Detections without an identity carry id -1.
            if id < 0.0 || frame < 0.0 {
                skipped += 1;
                continue;
            }
            let mut builder = TrackedObjectBuilder::new(id as u64).tlwh(
                field(2)? as f32,
                field(3)? as f32,
                field(4)? as f32,
                field(5)? as f32,
            );
            if row.len() > 6 {
                builder = builder.score(field(6)? as f32);
            }
            frames.entry(frame as u64).or_default().push(builder.build());
        }

        if skipped > 0 {
            debug!("Skipped {skipped} row(s) without a track identity");
        }
        Ok(Self { frames })
    }

    /// Tracks for a 1-based frame number.
    pub fn frame(&self, index: u64) -> &[TrackedObject] {
        self.frames.get(&index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Highest frame number that has any track.
    pub fn last_frame(&self) -> Option<u64> {
        self.frames.keys().next_back().copied()
    }
}

impl TrackSource for MotTracks {
    type Error = Infallible;

    fn tracks(&mut self, frame: &Frame) -> std::result::Result<Vec<TrackedObject>, Infallible> {
        Ok(self.frame(frame.index).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1,1,0,0,10,10,0.9,-1,-1,-1
1,2,100,100,20,40,0.8,-1,-1,-1
2,1,10,0,10,10,0.9,-1,-1,-1
2,-1,5,5,5,5,0.3,-1,-1,-1
# comment line
4,3,50,50,10,10
";

    #[test]
    fn test_parse_rows_by_frame() {
        let tracks = MotTracks::from_reader(SAMPLE.as_bytes()).unwrap();

        let first = tracks.frame(1);
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].object_id, 2);
        assert_eq!(first[1].bbox.to_tlbr(), [100.0, 100.0, 120.0, 140.0]);
        assert!((first[1].score - 0.8).abs() < 1e-6);

        // the id -1 row is dropped
        assert_eq!(tracks.frame(2).len(), 1);
        assert!(tracks.frame(3).is_empty());
        assert_eq!(tracks.frame(4)[0].score, 1.0);
        assert_eq!(tracks.last_frame(), Some(4));
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let err = MotTracks::from_reader("1,1,0,0,10\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::TrackRow { line: 1, .. }));

        let err = MotTracks::from_reader("1,x,0,0,10,10\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::TrackRow { .. }));
    }
}
