use perf_check::{
    config::Config,
    extract::{Attempt, Cascade, MetricExtractor, Strategy},
    record::{Metric, Sample},
};
use regex::Regex;
use std::path::Path;

const FULL_REPORT: &str = "Game Session Report
Play Time
325.4 s
FPS
Min : 30.00 Max : 60.00 Avg : 58.75
Bandwidth
Min : 10.1 Mbps Max : 25.0 Mbps Avg : 18.42 Mbps
Round Trip Time
Min : 12 ms Max : 40 ms Avg : 23.5 ms
";

fn extractor() -> MetricExtractor {
    MetricExtractor::new(&Config::default()).unwrap()
}

fn resolve(metric: Metric, text: &str) -> Sample {
    extractor().cascade(metric).unwrap().resolve(text)
}

#[test]
fn play_time_on_next_line() {
    assert_eq!(resolve(Metric::Playtime, "Play Time\n12.5s"), Sample::Value(12.5));
}

#[test]
fn unrelated_text_resolves_to_error() {
    let rec = extractor().extract("Summary page, nothing measured here.", Path::new("a.pdf"));
    assert_eq!(rec.playtime, Sample::Error);
    assert_eq!(rec.fps, Sample::Error);
    assert_eq!(rec.bandwidth, Sample::Error);
    assert_eq!(rec.rtt, Sample::Error);
}

#[test]
fn full_report_resolves_every_metric() {
    let rec = extractor().extract(FULL_REPORT, Path::new("run.pdf"));
    assert_eq!(rec.playtime, Sample::Value(325.4));
    assert_eq!(rec.fps, Sample::Value(58.75));
    assert_eq!(rec.bandwidth, Sample::Value(18.42));
    assert_eq!(rec.rtt, Sample::Value(23.5));
}

#[test]
fn units_are_required_for_bandwidth_and_rtt() {
    let text = "Bandwidth Avg : 18.4\nRound Trip Time Avg : 23";
    assert_eq!(resolve(Metric::Bandwidth, text), Sample::Error);
    assert_eq!(resolve(Metric::Rtt, text), Sample::Error);
}

#[test]
fn unparsable_capture_falls_through_to_next_strategy() {
    let cascade = Cascade {
        metric: Metric::Fps,
        strategies: vec![
            Strategy::Pattern {
                rank: 1,
                regex: Regex::new(r"Avg\s*:\s*(\S+)").unwrap(),
            },
            Strategy::Pattern {
                rank: 2,
                regex: Regex::new(r"(\d+) fps").unwrap(),
            },
        ],
    };
    let text = "Avg : n/a, measured 30 fps";
    assert_eq!(
        cascade.strategies[0].attempt(text),
        Attempt::Unparsable("n/a,".to_string())
    );
    assert_eq!(cascade.resolve(text), Sample::Value(30.0));
}

#[test]
fn label_window_catches_single_digit_playtime() {
    assert_eq!(
        resolve(Metric::Playtime, "Report\nPlay Time: 7 s\nEnd"),
        Sample::Value(7.0)
    );
}

fn padded(head: &str) -> String {
    format!("{head}\n{}", "-".repeat(500))
}

#[test]
fn leading_scan_accepts_plausible_duration() {
    assert_eq!(
        resolve(Metric::Playtime, &padded("Session 42 s")),
        Sample::Value(42.0)
    );
}

#[test]
fn leading_scan_rejects_out_of_range_values() {
    assert_eq!(resolve(Metric::Playtime, &padded("Session 9999 s")), Sample::Error);
    assert_eq!(
        resolve(Metric::Playtime, &padded("Session 9999 s, segment 30 s")),
        Sample::Value(30.0)
    );
}

#[test]
fn leading_scan_only_looks_at_the_head() {
    let text = format!("{}\nSession 42 s", "-".repeat(500));
    assert_eq!(resolve(Metric::Playtime, &text), Sample::Error);
}

#[test]
fn only_playtime_has_a_leading_scan() {
    let ex = extractor();
    for metric in Metric::ALL {
        let cascade = ex.cascade(metric).unwrap();
        let has_scan = cascade
            .strategies
            .iter()
            .any(|s| matches!(s, Strategy::LeadingScan { .. }));
        assert_eq!(has_scan, metric == Metric::Playtime, "{metric}");
        assert!(matches!(
            cascade.strategies.first(),
            Some(Strategy::Pattern { rank: 1, .. })
        ));
    }
}

#[test]
fn extra_patterns_run_before_builtin_ones() {
    let mut cfg = Config::default();
    cfg.extraction.extra_fps_patterns = vec![r"Frames avg\s*=\s*(\d+)".to_string()];
    let ex = MetricExtractor::new(&cfg).unwrap();
    let rec = ex.extract("FPS Avg : 58\nFrames avg = 42", Path::new("x.pdf"));
    assert_eq!(rec.fps, Sample::Value(42.0));
}

#[test]
fn invalid_extra_pattern_is_a_construction_error() {
    let mut cfg = Config::default();
    cfg.extraction.extra_rtt_patterns = vec!["(".to_string()];
    assert!(MetricExtractor::new(&cfg).is_err());
}

#[test]
fn region_and_timestamp_come_from_filename() {
    let rec = extractor().extract(
        FULL_REPORT,
        Path::new("reports/Stream (Seoul) 2024_01_05_10_20_30.pdf"),
    );
    assert_eq!(rec.filename, "Stream (Seoul) 2024_01_05_10_20_30.pdf");
    assert_eq!(rec.region, "Seoul");
    assert_eq!(rec.timestamp, "2024-01-05-10-20-30");
}

#[test]
fn missing_filename_tokens_fall_back() {
    let rec = extractor().extract(FULL_REPORT, Path::new("/nonexistent/dir/plain.pdf"));
    assert_eq!(rec.region, "Unknown");
    assert_eq!(rec.timestamp, "Unknown");
}

#[test]
fn timestamp_falls_back_to_modification_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.pdf");
    std::fs::write(&path, b"").unwrap();
    let rec = extractor().extract(FULL_REPORT, &path);
    assert_ne!(rec.timestamp, "Unknown");
    assert_eq!(rec.timestamp.split('-').count(), 6);
}

#[test]
fn error_serializes_as_sentinel() {
    let rec = extractor().extract("Play Time\n12.5s", Path::new("a.pdf"));
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["playtime"], serde_json::json!(12.5));
    assert_eq!(json["rtt"], serde_json::json!(-1.0));
}
