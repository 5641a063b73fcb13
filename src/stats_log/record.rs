use chrono::{DateTime, Local};
use serde::Serialize;

/// Column names of the persisted log, in order.
pub const CSV_HEADER: [&str; 5] = ["timestamp", "frame_id", "object_id", "region", "speed_kmph"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One observation of one object in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub frame_id: u64,
    pub object_id: u64,
    /// Regions that have counted this object so far in the run
    pub regions: Vec<String>,
    /// Last computed speed, 0 until the object has been seen twice
    pub speed_kmph: f64,
}

/// Flat row as written to CSV.
#[derive(Debug, Serialize)]
pub(crate) struct CsvRow {
    timestamp: String,
    frame_id: u64,
    object_id: u64,
    region: String,
    speed_kmph: f64,
}

impl From<&LogRecord> for CsvRow {
    fn from(record: &LogRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            frame_id: record.frame_id,
            object_id: record.object_id,
            region: format_region_list(&record.regions),
            speed_kmph: record.speed_kmph,
        }
    }
}

/// `['entry', 'exit']`, or `[]` when the object was never in a region.
pub fn format_region_list(regions: &[String]) -> String {
    let quoted: Vec<String> = regions.iter().map(|r| format!("'{r}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_region_list_format() {
        assert_eq!(format_region_list(&[]), "[]");
        assert_eq!(
            format_region_list(&["entry".to_string(), "exit".to_string()]),
            "['entry', 'exit']"
        );
    }

    #[test]
    fn test_row_from_record() {
        let record = LogRecord {
            timestamp: Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            frame_id: 7,
            object_id: 3,
            regions: vec!["entry".to_string()],
            speed_kmph: 4.5,
        };
        let row = CsvRow::from(&record);
        assert_eq!(row.timestamp, "2024-03-01 12:30:05.000000");
        assert_eq!(row.region, "['entry']");
        assert_eq!(row.frame_id, 7);
    }
}
