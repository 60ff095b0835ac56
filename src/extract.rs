//! Metric extraction from raw report text.
//!
//! Every metric is resolved by a [`Cascade`]: an ordered list of
//! [`Strategy`] values, most specific first. Each strategy is tried with the
//! same `attempt` contract and the first [`Attempt::Hit`] wins. A cascade that
//! runs out of strategies resolves to [`Sample::Error`].

use crate::{
    config::{Config, Extraction},
    record::{Metric, MetricRecord, Sample},
};
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::path::Path;
use time::{OffsetDateTime, macros::format_description};
use tracing::{debug, info, warn};

const PLAYTIME_PATTERNS: &[&str] = &[
    r"Play\s*Time\s*\n\s*(\d+\.?\d*)\s*s",
    r"Play\s+Time\s*[\r\n\s]*(\d+\.?\d*)\s*s",
    r"Play Time.*?(\d+\.\d+)\s*s",
    r"Play\s*Time[^0-9]*(\d+\.?\d+)",
    r"Play\s*Time.*?(\d+\.?\d+)",
    r"duration.*?(\d+\.?\d+)\s*s",
    r"length.*?(\d+\.?\d+)\s*s",
    r"time.*?(\d+\.?\d+)\s*s",
];

const FPS_PATTERNS: &[&str] = &[
    r"FPS\s*.*?\s*Avg\s*:\s*(\d+\.?\d*)",
    r"FPS.*?average.*?(\d+\.?\d*)",
    r"Frames\s*Per\s*Second.*?(\d+\.?\d*)",
    r"Frame\s*Rate.*?(\d+\.?\d*)",
    r"Average\s*FPS.*?(\d+\.?\d*)",
    r"fps.*?(\d+\.?\d*)",
];

const BANDWIDTH_PATTERNS: &[&str] = &[
    r"Bandwidth\s*.*?\s*Avg\s*:\s*(\d+\.?\d*)\s*Mbps",
    r"Bandwidth.*?(\d+\.?\d*)\s*Mbps",
    r"Average\s*Bandwidth.*?(\d+\.?\d*)\s*Mbps",
    r"Network\s*Speed.*?(\d+\.?\d*)\s*Mbps",
    r"Data\s*Rate.*?(\d+\.?\d*)\s*Mbps",
    r"(\d+\.?\d*)\s*Mbps",
];

const RTT_PATTERNS: &[&str] = &[
    r"Round Trip Time\s*.*?\s*Avg\s*:\s*(\d+\.?\d*)\s*ms",
    r"RTT.*?(\d+\.?\d*)\s*ms",
    r"Round\s*Trip.*?(\d+\.?\d*)\s*ms",
    r"Latency.*?(\d+\.?\d*)\s*ms",
    r"Ping.*?(\d+\.?\d*)\s*ms",
    r"Response\s*Time.*?(\d+\.?\d*)\s*ms",
];

const TIME_VALUE: &str = r"(\d+\.?\d*)\s*(?:s|sec|seconds)";

/// Outcome of a single strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Hit(f64),
    Miss,
    /// Matched, but the captured text is not a number.
    Unparsable(String),
    /// Found a candidate, but it lies outside the sanity bounds.
    Rejected(f64),
}

#[derive(Debug, Clone)]
pub enum Strategy {
    Pattern {
        rank: usize,
        regex: Regex,
    },
    LabelWindow {
        label: &'static str,
        before: usize,
        after: usize,
        value: Regex,
    },
    LeadingScan {
        fraction: f64,
        min: f64,
        max: f64,
        value: Regex,
    },
}

impl Strategy {
    pub fn describe(&self) -> String {
        match self {
            Strategy::Pattern { rank, regex } => format!("pattern {rank} `{}`", regex.as_str()),
            Strategy::LabelWindow { label, .. } => format!("context around \"{label}\""),
            Strategy::LeadingScan { fraction, .. } => {
                format!("leading {:.0}% scan", fraction * 100.0)
            }
        }
    }

    pub fn attempt(&self, text: &str) -> Attempt {
        match self {
            Strategy::Pattern { regex, .. } => first_capture(regex, text),
            Strategy::LabelWindow {
                label,
                before,
                after,
                value,
            } => match find_label(text, label) {
                Some(idx) => {
                    let ctx = window(text, idx, *before, *after);
                    debug!(target: "perf_check::extract", "context for \"{label}\": {ctx:?}");
                    first_capture(value, ctx)
                }
                None => Attempt::Miss,
            },
            Strategy::LeadingScan {
                fraction,
                min,
                max,
                value,
            } => {
                let section = leading_chars(text, *fraction);
                let mut rejected = None;
                for caps in value.captures_iter(section) {
                    let Some(m) = caps.get(1) else { continue };
                    let Ok(v) = m.as_str().parse::<f64>() else {
                        continue;
                    };
                    if (*min..=*max).contains(&v) {
                        return Attempt::Hit(v);
                    }
                    rejected.get_or_insert(v);
                }
                rejected.map_or(Attempt::Miss, Attempt::Rejected)
            }
        }
    }
}

fn first_capture(regex: &Regex, text: &str) -> Attempt {
    let Some(caps) = regex.captures(text) else {
        return Attempt::Miss;
    };
    let Some(m) = caps.get(1) else {
        return Attempt::Unparsable(caps.get(0).map_or("", |m| m.as_str()).to_string());
    };
    match m.as_str().parse::<f64>() {
        Ok(v) => Attempt::Hit(v),
        Err(_) => Attempt::Unparsable(m.as_str().to_string()),
    }
}

/// Byte offset of `label`, exact case first, then ASCII case-insensitive.
fn find_label(text: &str, label: &str) -> Option<usize> {
    text.find(label).or_else(|| {
        text.to_ascii_lowercase()
            .find(&label.to_ascii_lowercase())
    })
}

/// `before` chars ahead of `idx` through `after` chars from `idx`.
fn window(text: &str, idx: usize, before: usize, after: usize) -> &str {
    let start = if before == 0 {
        idx
    } else {
        text[..idx]
            .char_indices()
            .rev()
            .nth(before - 1)
            .map_or(0, |(i, _)| i)
    };
    let end = text[idx..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(i, _)| idx + i);
    &text[start..end]
}

fn leading_chars(text: &str, fraction: f64) -> &str {
    let total = text.chars().count();
    let keep = (total as f64 * fraction.clamp(0.0, 1.0)) as usize;
    let end = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
    &text[..end]
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .with_context(|| format!("compiling extraction pattern: {pattern}"))
}

/// Ranked strategies for one metric.
#[derive(Debug, Clone)]
pub struct Cascade {
    pub metric: Metric,
    pub strategies: Vec<Strategy>,
}

impl Cascade {
    pub fn for_metric(metric: Metric, cfg: &Extraction) -> Result<Self> {
        let (extra, builtin, window_value) = match metric {
            Metric::Playtime => (
                &cfg.extra_playtime_patterns,
                PLAYTIME_PATTERNS,
                r"(\d+\.?\d*)\s*s",
            ),
            Metric::Fps => (&cfg.extra_fps_patterns, FPS_PATTERNS, r"(\d+\.?\d*)"),
            Metric::Bandwidth => (
                &cfg.extra_bandwidth_patterns,
                BANDWIDTH_PATTERNS,
                r"(\d+\.?\d*)\s*Mbps",
            ),
            Metric::Rtt => (&cfg.extra_rtt_patterns, RTT_PATTERNS, r"(\d+\.?\d*)\s*ms"),
        };

        let mut strategies = Vec::new();
        let patterns = extra
            .iter()
            .map(String::as_str)
            .chain(builtin.iter().copied());
        for (i, p) in patterns.enumerate() {
            strategies.push(Strategy::Pattern {
                rank: i + 1,
                regex: compile(p)?,
            });
        }

        strategies.push(Strategy::LabelWindow {
            label: metric.canonical_label(),
            before: cfg.context_before,
            after: cfg.context_after,
            value: compile(window_value)?,
        });

        if metric == Metric::Playtime {
            strategies.push(Strategy::LeadingScan {
                fraction: cfg.scan_fraction,
                min: cfg.playtime_min_seconds,
                max: cfg.playtime_max_seconds,
                value: compile(TIME_VALUE)?,
            });
        }

        Ok(Self { metric, strategies })
    }

    pub fn resolve(&self, text: &str) -> Sample {
        for strategy in &self.strategies {
            match strategy.attempt(text) {
                Attempt::Hit(v) => {
                    debug!(
                        target: "perf_check::extract",
                        metric = %self.metric,
                        "hit via {}: {v}",
                        strategy.describe()
                    );
                    return Sample::Value(v);
                }
                Attempt::Miss => {
                    debug!(
                        target: "perf_check::extract",
                        metric = %self.metric,
                        "miss via {}",
                        strategy.describe()
                    );
                }
                Attempt::Unparsable(raw) => {
                    debug!(
                        target: "perf_check::extract",
                        metric = %self.metric,
                        "unparsable {raw:?} via {}",
                        strategy.describe()
                    );
                }
                Attempt::Rejected(v) => {
                    debug!(
                        target: "perf_check::extract",
                        metric = %self.metric,
                        "implausible {v} via {}",
                        strategy.describe()
                    );
                }
            }
        }
        Sample::Error
    }
}

pub struct MetricExtractor {
    cascades: Vec<Cascade>,
    region: Regex,
    timestamp: Regex,
}

impl MetricExtractor {
    pub fn new(cfg: &Config) -> Result<Self> {
        let cascades = Metric::ALL
            .into_iter()
            .map(|m| Cascade::for_metric(m, &cfg.extraction))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            cascades,
            region: Regex::new(r"\(([^)]+)\)")?,
            timestamp: Regex::new(r"(\d{4}_\d{2}_\d{2}_\d{2}_\d{2}_\d{2})")?,
        })
    }

    pub fn cascade(&self, metric: Metric) -> Option<&Cascade> {
        self.cascades.iter().find(|c| c.metric == metric)
    }

    /// Resolve all four metrics. Unresolved metrics become [`Sample::Error`].
    pub fn extract(&self, text: &str, path: &Path) -> MetricRecord {
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let region = self
            .region
            .captures(&filename)
            .and_then(|c| c.get(1))
            .map_or_else(|| "Unknown".to_string(), |m| m.as_str().to_string());

        let timestamp = match self.timestamp.captures(&filename).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().replace('_', "-"),
            None => modified_stamp(path).unwrap_or_else(|| "Unknown".to_string()),
        };

        let mut record = MetricRecord {
            filename,
            path: path.display().to_string(),
            region,
            timestamp,
            playtime: Sample::Error,
            fps: Sample::Error,
            bandwidth: Sample::Error,
            rtt: Sample::Error,
        };

        for cascade in &self.cascades {
            let sample = cascade.resolve(text);
            match sample {
                Sample::Value(v) => info!(
                    target: "perf_check::extract",
                    "{} {}={v}",
                    record.filename,
                    cascade.metric
                ),
                Sample::Error => warn!(
                    target: "perf_check::extract",
                    "{} {}: no strategy matched",
                    record.filename,
                    cascade.metric
                ),
            }
            record.set(cascade.metric, sample);
        }

        record
    }
}

fn modified_stamp(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    OffsetDateTime::from(modified)
        .format(format_description!(
            "[year]-[month]-[day]-[hour]-[minute]-[second]"
        ))
        .ok()
}
