use perf_check::{config::Config, postprocess::normalize_text};

#[test]
fn sanitizes_control_chars() {
    let cfg = Config::default();
    let out = normalize_text(&cfg, "Alpha\u{0002}Beta\nLine\tTabbed\r\nNext").unwrap();

    assert!(!out.contains('\u{0002}'));
    assert!(out.contains("AlphaBeta"));
    assert!(out.contains('\t'));
    assert!(!out.contains('\r'));
    assert!(out.contains("Tabbed\nNext"));
}

#[test]
fn rejoins_split_decimals() {
    let cfg = Config::default();
    let out = normalize_text(&cfg, "Avg : 58 . 75\nPlay Time\n12 .5 s").unwrap();
    assert!(out.contains("Avg : 58.75"));
    assert!(out.contains("12.5 s"));
}

#[test]
fn fullwidth_digits_become_ascii() {
    let cfg = Config::default();
    let out = normalize_text(&cfg, "FPS Avg : ６０").unwrap();
    assert!(out.ends_with("60"));
}

#[test]
fn toggles_are_respected() {
    let mut cfg = Config::default();
    cfg.normalize.collapse_decimal_spacing = false;
    cfg.normalize.control_chars_to_sanitize.clear();
    let out = normalize_text(&cfg, "12 . 5\u{0002}").unwrap();
    assert_eq!(out, "12 . 5\u{0002}");
}
