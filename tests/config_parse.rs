use perf_check::{aggregate::ExclusionPolicy, config::Config};

#[test]
fn parse_example_config() {
    let raw = include_str!("../perf-check.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.input.extensions, vec!["pdf".to_string()]);
    assert_eq!(cfg.averaging.fps, ExclusionPolicy::MinMax);
    assert_eq!(cfg.extraction.context_after, 180);
    assert!(!cfg.output.markdown_stem.is_empty());
}

#[test]
fn partial_sections_fall_back_to_defaults() {
    let raw = r#"
[averaging]
fps = "none"
rtt = "max-only"

[output]
write_xlsx = false
"#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.averaging.fps, ExclusionPolicy::None);
    assert_eq!(cfg.averaging.rtt, ExclusionPolicy::MaxOnly);
    assert_eq!(cfg.averaging.bandwidth, ExclusionPolicy::MinMax);
    assert!(!cfg.output.write_xlsx);
    assert!(cfg.output.write_csv);
    assert_eq!(cfg.extraction.playtime_max_seconds, 3600.0);
}
