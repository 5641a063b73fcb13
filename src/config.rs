//! Runtime configuration loaded from YAML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregator::{DEFAULT_CALIBRATION, Region};
use crate::error::Result;
use crate::stats_log::RetryPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub aggregator: AggregatorConfig,
    pub output: OutputConfig,
    pub render: RenderConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory of frame images, read in file-name order
    pub frames_dir: PathBuf,
    /// Tracker output in MOT format
    pub tracks_file: PathBuf,
    /// Nominal frames per second of the sequence
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Factor turning pixels/frame × frame rate into the reported km/h.
    /// Not derived from camera calibration.
    pub calibration: f64,
    pub regions: Vec<RegionConfig>,
}

/// Rectangle given by two corners in frame pixels, bounds inclusive.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub top_left: (i32, i32),
    pub bottom_right: (i32, i32),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub log_path: PathBuf,
    /// Flush the log after this many records
    pub flush_every: usize,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub jpeg_quality: u8,
    /// TrueType font for labels; without one only boxes are drawn
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("data/frames"),
            tracks_file: PathBuf::from("data/tracks.txt"),
            frame_rate: 30.0,
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            calibration: DEFAULT_CALIBRATION,
            regions: vec![
                RegionConfig {
                    name: "entry".to_string(),
                    top_left: (50, 200),
                    bottom_right: (300, 400),
                },
                RegionConfig {
                    name: "exit".to_string(),
                    top_left: (400, 100),
                    bottom_right: (600, 300),
                },
            ],
        }
    }
}

impl AggregatorConfig {
    /// Configured rectangles as aggregator regions, in file order.
    pub fn regions(&self) -> Vec<Region> {
        self.regions
            .iter()
            .map(|r| Region::new(r.name.clone(), r.top_left, r.bottom_right))
            .collect()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("logs/object_stats.csv"),
            flush_every: 64,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            font_path: Some(PathBuf::from(
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            )),
            font_size: 20.0,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Read and parse a YAML configuration file.
    ///
    /// Sections and keys absent from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_regions() {
        let config = Config::default();
        let regions = config.aggregator.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0], Region::new("entry", (50, 200), (300, 400)));
        assert_eq!(config.aggregator.calibration, 0.05);
        assert_eq!(config.output.log_path, PathBuf::from("logs/object_stats.csv"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
aggregator:
  calibration: 0.1
  regions:
    - name: gate
      top_left: [0, 0]
      bottom_right: [10, 20]
server:
  port: 8080
"#,
        )
        .unwrap();

        assert_eq!(config.aggregator.calibration, 0.1);
        assert_eq!(config.aggregator.regions.len(), 1);
        assert_eq!(config.aggregator.regions[0].bottom_right, (10, 20));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.input.frame_rate, 30.0);
        assert_eq!(config.output.retry, RetryPolicy::default());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = Config::from_yaml("aggregator: [1, 2").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
