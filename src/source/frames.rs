use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Frame, FrameSource};
use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Frames stored as image files in one directory, read in file-name order.
#[derive(Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    frame_rate: f64,
    cursor: usize,
}

impl ImageSequence {
    /// List the frames of `dir`.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding jpg, jpeg, png or bmp files; other files are ignored
    /// * `frame_rate` - Nominal frames per second, used for speed estimates
    ///
    /// # Returns
    ///
    /// A sequence ordered by file name. Images are decoded lazily.
    pub fn open(dir: impl AsRef<Path>, frame_rate: f64) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();

        info!(
            "Found {} frame(s) in {} @ {:.1} FPS",
            paths.len(),
            dir.display(),
            frame_rate
        );
        Ok(Self::from_paths(paths, frame_rate))
    }

    /// Sequence over explicit paths, in the given order.
    pub fn from_paths(paths: Vec<PathBuf>, frame_rate: f64) -> Self {
        Self {
            paths,
            frame_rate,
            cursor: 0,
        }
    }

    /// Number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the sequence has no frames at all.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    type Error = Error;

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        debug!("Decoding {}", path.display());
        let image = image::open(path)?.to_rgb8();
        self.cursor += 1;
        Ok(Some(Frame {
            index: self.cursor as u64,
            image,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("000002.png", 20u8), ("000001.png", 10u8)] {
            RgbImage::from_pixel(4, 3, Rgb([shade, 0, 0]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut seq = ImageSequence::open(dir.path(), 25.0).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.frame_rate(), 25.0);

        let first = seq.next_frame().unwrap().unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.image.get_pixel(0, 0), &Rgb([10, 0, 0]));

        let second = seq.next_frame().unwrap().unwrap();
        assert_eq!(second.index, 2);
        assert_eq!(second.image.dimensions(), (4, 3));

        assert!(seq.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_missing_dir_is_error() {
        assert!(ImageSequence::open("/nonexistent/frames", 30.0).is_err());
    }
}
