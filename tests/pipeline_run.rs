use perf_check::{
    config::Config,
    engine::MemoryEngine,
    pipeline::{NoEvents, Pipeline, RunEvent},
    record::Sample,
    render::ArtifactKind,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

const REPORT: &str = "Play Time\n300 . 5 s\nFPS Min : 30 Max : 60 Avg : 58.75\n\
Bandwidth Avg : 18.42 Mbps\nRound Trip Time Avg : 23.5 ms\n";

const CARRIER_DIR: &str = "20240101/Seoul/Gangnam/East/skt/5g/MyGame/PhoneX";

fn touch(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"%PDF-1.4").unwrap();
    path
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    engine: MemoryEngine,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data");
    let mut engine = MemoryEngine::new();

    let a = touch(&root, &format!("{CARRIER_DIR}/run (Seoul) 2024_01_01_10_00_00.pdf"));
    engine.insert(a, REPORT);
    let b = touch(&root, &format!("{CARRIER_DIR}/second.PDF"));
    engine.insert(b, "Play Time\n250 s\nnothing else");
    let c = touch(&root, "20240102/Busan/Haeundae/South/WIFI/MyGame/PhoneY/wifi.pdf");
    engine.insert(c, REPORT);

    // Unreadable: no text registered.
    touch(&root, "20240102/Busan/Haeundae/South/WIFI/MyGame/PhoneY/broken.pdf");
    // Blank text.
    let blank = touch(&root, "misc/blank.pdf");
    engine.insert(blank, "   \n");
    // Not a document, and an old report that must not be re-read.
    touch(&root, "misc/notes.txt");
    let old = touch(&root, "reports/old.pdf");
    engine.insert(old, REPORT);

    Fixture {
        _dir: dir,
        root,
        engine,
    }
}

#[test]
fn discovery_filters_extensions_and_skips_reports() {
    let fx = fixture();
    let pipeline = Pipeline::new(&Config::default(), fx.engine).unwrap();
    let out = pipeline.default_output_dir(&fx.root);
    assert_eq!(out, fx.root.join("reports"));

    let files = pipeline.discover(&fx.root, &out);
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "run (Seoul) 2024_01_01_10_00_00.pdf",
            "second.PDF",
            "broken.pdf",
            "wifi.pdf",
            "blank.pdf"
        ]
    );
}

#[test]
fn run_skips_bad_files_and_writes_reports() {
    let fx = fixture();
    let pipeline = Pipeline::new(&Config::default(), fx.engine).unwrap();
    let output = pipeline.run(&fx.root, None, &NoEvents).unwrap();

    let stats = output.model.stats;
    assert_eq!(stats.discovered, 5);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.skipped, 2);

    let folders: Vec<_> = output.model.folders.keys().cloned().collect();
    assert_eq!(
        folders,
        [
            CARRIER_DIR.to_string(),
            "20240102/Busan/Haeundae/South/WIFI/MyGame/PhoneY".to_string()
        ]
    );

    let carrier = &output.model.folders[CARRIER_DIR];
    assert_eq!(carrier.dimensions.network, "5G");
    assert_eq!(carrier.file_count(), 2);
    let first = &carrier.records[0];
    assert_eq!(first.region, "Seoul");
    assert_eq!(first.timestamp, "2024-01-01-10-00-00");
    // "300 . 5 s" is rejoined before extraction.
    assert_eq!(first.playtime, Sample::Value(300.5));
    assert_eq!(carrier.fps.label(), "58.75 (errors: 1 files)");
    assert_eq!(carrier.playtime.label(), "275.25");

    let reports = fx.root.join("reports");
    assert_eq!(output.outcome.output_dir.as_deref(), Some(reports.as_path()));
    assert_eq!(output.outcome.failed().count(), 0);
    assert!(reports.join("performance_report.md").is_file());
    assert!(!output.outcome.paths(ArtifactKind::AveragesXlsx).is_empty());
}

#[test]
fn events_follow_run_order() {
    let fx = fixture();
    let out_dir = fx.root.join("custom-out");
    let pipeline = Pipeline::new(&Config::default(), fx.engine).unwrap();

    let (tx, rx) = mpsc::channel::<RunEvent>();
    pipeline.run(&fx.root, Some(out_dir.as_path()), &tx).unwrap();
    drop(tx);
    let events: Vec<RunEvent> = rx.into_iter().collect();

    assert_eq!(events.first(), Some(&RunEvent::Discovered { total: 5 }));
    let started = events
        .iter()
        .filter(|e| matches!(e, RunEvent::FileStarted { .. }))
        .count();
    let done = events
        .iter()
        .filter(|e| matches!(e, RunEvent::FileDone { .. }))
        .count();
    let skipped: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::FileSkipped { index, path, .. } => Some((*index, path.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(started, 5);
    assert_eq!(done, 3);
    assert_eq!(skipped.len(), 2);
    assert!(skipped[0].1.ends_with("broken.pdf"));
    assert!(skipped[1].1.ends_with("blank.pdf"));

    assert!(events.contains(&RunEvent::Aggregated { folders: 2 }));
    assert_eq!(
        events.last(),
        Some(&RunEvent::Finished {
            processed: 3,
            skipped: 2,
            failed_artifacts: 0,
        })
    );
    assert!(out_dir.join("performance_report.md").is_file());
}

#[test]
fn missing_root_is_an_error() {
    let pipeline = Pipeline::new(&Config::default(), MemoryEngine::new()).unwrap();
    let err = pipeline
        .run(Path::new("/definitely/not/here"), None, &NoEvents)
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("not a directory"));
}

#[test]
fn empty_root_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&Config::default(), MemoryEngine::new()).unwrap();
    let output = pipeline.run(dir.path(), None, &NoEvents).unwrap();
    assert!(output.model.folders.is_empty());
    let md = std::fs::read_to_string(dir.path().join("reports/performance_report.md")).unwrap();
    assert!(md.contains("No documents were processed."));
}
