use approx::assert_relative_eq;
use chrono::Local;
use trackstat_rs::stats_log::CSV_HEADER;
use trackstat_rs::{
    CsvRecordSink, FrameTrackAggregator, LogRecord, Rect, Region, RetryPolicy,
    TrackedObjectBuilder,
};

fn stock_regions() -> Vec<Region> {
    vec![
        Region::new("entry", (50, 200), (300, 400)),
        Region::new("exit", (400, 100), (600, 300)),
    ]
}

#[test]
fn test_two_frame_speed_scenario() {
    let mut agg = FrameTrackAggregator::new(stock_regions(), 0.05, Vec::<LogRecord>::new());

    // Frame 0: centroid (5, 5)
    agg.observe(1, &Rect::from_tlbr(0.0, 0.0, 10.0, 10.0), 0, 10.0, Local::now())
        .unwrap();
    // Frame 1: centroid (15, 5), ten pixels further
    agg.observe(1, &Rect::from_tlbr(10.0, 0.0, 20.0, 10.0), 1, 10.0, Local::now())
        .unwrap();

    let log = agg.sink();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|r| r.object_id == 1));
    assert_eq!(log[0].speed_kmph, 0.0);
    assert_relative_eq!(log[1].speed_kmph, 10.0 * 10.0 * 0.05, epsilon = 1e-9);
}

#[test]
fn test_entry_never_exit() {
    let mut agg = FrameTrackAggregator::new(stock_regions(), 0.05, Vec::<LogRecord>::new());

    // centroid (100, 300) drifting right but staying left of exit
    for frame in 0..5u64 {
        let cx = 100.0 + frame as f32 * 20.0;
        let obj = TrackedObjectBuilder::new(4).xywh(cx, 300.0, 20.0, 20.0).build();
        agg.observe_frame(frame + 1, 30.0, &[obj]).unwrap();
    }

    let log = agg.sink();
    assert!(log.iter().all(|r| r.regions == vec!["entry".to_string()]));
    assert_eq!(agg.region_counts(), vec![("entry".to_string(), 1), ("exit".to_string(), 0)]);
}

#[test]
fn test_counts_are_monotonic_and_unique() {
    let mut agg = FrameTrackAggregator::new(stock_regions(), 0.05, Vec::<LogRecord>::new());

    // ids 1..=3 pass through entry, then id 1 and 2 move into exit
    let frames: Vec<Vec<(u64, f32, f32)>> = vec![
        vec![(1, 100.0, 300.0), (2, 150.0, 250.0)],
        vec![(1, 200.0, 300.0), (2, 250.0, 250.0), (3, 60.0, 210.0)],
        vec![(1, 450.0, 200.0), (3, 700.0, 700.0)],
        vec![(2, 500.0, 150.0)],
        vec![],
    ];

    let mut previous = vec![0usize; 2];
    for (i, tracks) in frames.iter().enumerate() {
        let objects: Vec<_> = tracks
            .iter()
            .map(|&(id, cx, cy)| TrackedObjectBuilder::new(id).xywh(cx, cy, 10.0, 10.0).build())
            .collect();
        agg.observe_frame(i as u64 + 1, 25.0, &objects).unwrap();

        let counts: Vec<usize> = agg.region_counts().into_iter().map(|(_, n)| n).collect();
        assert!(counts.iter().zip(&previous).all(|(now, before)| now >= before));
        previous = counts;
    }

    assert_eq!(agg.unique_count(), 3);
    assert_eq!(previous, vec![3, 2]);

    // object 1 keeps its entry membership after reaching exit
    let last_of_1 = agg.sink().iter().rev().find(|r| r.object_id == 1).unwrap();
    assert_eq!(last_of_1.regions, vec!["entry".to_string(), "exit".to_string()]);
}

#[test]
fn test_finalize_without_observations_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("object_stats.csv");
    let sink = CsvRecordSink::create(&path, 64, RetryPolicy::none()).unwrap();
    let mut agg = FrameTrackAggregator::new(stock_regions(), 0.05, sink);
    agg.observe_frame(1, 30.0, &[]).unwrap();
    agg.finalize().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.trim_end(), CSV_HEADER.join(","));
}

#[test]
fn test_drop_finalizes_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("object_stats.csv");
    {
        // large flush interval: rows only reach disk on finalize
        let sink = CsvRecordSink::create(&path, 1000, RetryPolicy::none()).unwrap();
        let mut agg = FrameTrackAggregator::new(stock_regions(), 0.05, sink);
        let obj = TrackedObjectBuilder::new(8).tlbr(90.0, 290.0, 110.0, 310.0).build();
        agg.observe_frame(1, 30.0, &[obj.clone()]).unwrap();
        agg.observe_frame(2, 30.0, &[obj]).unwrap();
    }

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "1");
    assert_eq!(&rows[1][2], "8");
    assert_eq!(&rows[1][3], "['entry']");
    assert_eq!(&rows[1][4], "0.0");
}
