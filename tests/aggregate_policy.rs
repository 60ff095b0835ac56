use perf_check::{
    aggregate::{AveragePolicy, ExclusionPolicy, MetricSummary, aggregate, trimmed_mean},
    record::{Metric, MetricRecord, Sample},
};
use std::collections::BTreeMap;

fn record(name: &str, fps: Sample) -> MetricRecord {
    MetricRecord {
        filename: name.to_string(),
        path: name.to_string(),
        region: "Unknown".to_string(),
        timestamp: "Unknown".to_string(),
        playtime: Sample::Value(100.0),
        fps,
        bandwidth: Sample::Error,
        rtt: Sample::Value(20.0),
    }
}

fn close(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}

#[test]
fn minmax_drops_one_of_each_extreme() {
    assert!(close(trimmed_mean(&[10.0, 20.0, 30.0, 40.0], ExclusionPolicy::MinMax), 25.0));
    // Duplicated extremes lose only one instance each.
    assert!(close(
        trimmed_mean(&[10.0, 10.0, 20.0, 30.0, 30.0], ExclusionPolicy::MinMax),
        20.0
    ));
}

#[test]
fn single_sided_policies() {
    let v = [10.0, 20.0, 30.0, 60.0];
    assert!(close(trimmed_mean(&v, ExclusionPolicy::MinOnly), 110.0 / 3.0));
    assert!(close(trimmed_mean(&v, ExclusionPolicy::MaxOnly), 20.0));
    assert!(close(trimmed_mean(&v, ExclusionPolicy::None), 30.0));
}

#[test]
fn small_sets_use_plain_mean() {
    for policy in [
        ExclusionPolicy::MinMax,
        ExclusionPolicy::MinOnly,
        ExclusionPolicy::MaxOnly,
        ExclusionPolicy::None,
    ] {
        assert!(close(trimmed_mean(&[7.0], policy), 7.0));
        assert!(close(trimmed_mean(&[10.0, 20.0], policy), 15.0));
    }
    assert_eq!(trimmed_mean(&[], ExclusionPolicy::MinMax), None);
}

#[test]
fn identical_values_never_trim_to_nothing() {
    assert!(close(trimmed_mean(&[5.0, 5.0, 5.0], ExclusionPolicy::MinMax), 5.0));
}

#[test]
fn all_errors_differs_from_nothing_attempted() {
    let errs = vec![record("a", Sample::Error), record("b", Sample::Error)];
    let s = MetricSummary::from_records(&errs, Metric::Fps, ExclusionPolicy::MinMax);
    assert_eq!(s.label(), "Error (all 2 files)");

    let empty = MetricSummary::from_records(&[], Metric::Fps, ExclusionPolicy::MinMax);
    assert_eq!(empty.label(), "N/A");
}

#[test]
fn partial_errors_are_annotated() {
    let recs = vec![
        record("a", Sample::Value(30.0)),
        record("b", Sample::Value(60.0)),
        record("c", Sample::Error),
    ];
    let s = MetricSummary::from_records(&recs, Metric::Fps, ExclusionPolicy::MinMax);
    assert_eq!(s.valid, 2);
    assert_eq!(s.errors, 1);
    assert_eq!(s.label(), "45.00 (errors: 1 files)");
}

#[test]
fn non_positive_values_are_ignored() {
    let recs = vec![
        record("a", Sample::Value(0.0)),
        record("b", Sample::Value(-3.0)),
        record("c", Sample::Value(50.0)),
    ];
    let s = MetricSummary::from_records(&recs, Metric::Fps, ExclusionPolicy::MinMax);
    assert_eq!(s.valid, 1);
    assert_eq!(s.errors, 0);
    assert_eq!(s.label(), "50.00");
}

#[test]
fn highlight_needs_spread() {
    let flat = vec![record("a", Sample::Value(30.0)), record("b", Sample::Value(30.0))];
    let s = MetricSummary::from_records(&flat, Metric::Fps, ExclusionPolicy::MinMax);
    assert!(!s.is_max(30.0) && !s.is_min(30.0));

    let spread = vec![record("a", Sample::Value(30.0)), record("b", Sample::Value(60.0))];
    let s = MetricSummary::from_records(&spread, Metric::Fps, ExclusionPolicy::MinMax);
    assert!(s.is_max(60.0));
    assert!(s.is_min(30.0));
}

#[test]
fn aggregate_decodes_folders_and_applies_per_metric_policy() {
    let mut groups = BTreeMap::new();
    groups.insert(
        "20240101/Seoul/Gangnam/East/skt/5g/MyGame/PhoneX".to_string(),
        vec![
            record("c.pdf", Sample::Value(60.0)),
            record("a.pdf", Sample::Value(10.0)),
            record("b.pdf", Sample::Value(20.0)),
        ],
    );
    groups.insert("misc".to_string(), vec![record("z.pdf", Sample::Error)]);

    let policy = AveragePolicy {
        fps: ExclusionPolicy::None,
        ..Default::default()
    };
    let out = aggregate(groups, &policy);
    assert_eq!(out.len(), 2);

    let agg = &out["20240101/Seoul/Gangnam/East/skt/5g/MyGame/PhoneX"];
    assert_eq!(agg.dimensions.network, "5G");
    assert_eq!(agg.file_count(), 3);
    let names: Vec<_> = agg.records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
    assert!(close(agg.fps.average, 30.0));
    assert_eq!(agg.bandwidth.label(), "Error (all 3 files)");
    assert_eq!(agg.rtt.label(), "20.00");

    let misc = &out["misc"];
    assert_eq!(misc.dimensions.date, "Unknown");
    assert_eq!(misc.fps.label(), "Error (all 1 files)");
}

#[test]
fn policy_names_parse_from_config_strings() {
    #[derive(serde::Deserialize)]
    struct P {
        p: ExclusionPolicy,
    }
    for (raw, want) in [
        ("minmax", ExclusionPolicy::MinMax),
        ("min", ExclusionPolicy::MinOnly),
        ("min-only", ExclusionPolicy::MinOnly),
        ("max-only", ExclusionPolicy::MaxOnly),
        ("none", ExclusionPolicy::None),
    ] {
        let parsed: P = toml::from_str(&format!("p = \"{raw}\"")).unwrap();
        assert_eq!(parsed.p, want);
    }
}
