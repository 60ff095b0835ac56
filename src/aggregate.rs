use crate::{
    folder::{self, FolderDimensions},
    record::{Metric, MetricRecord, Sample},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Which extremes to drop before averaging a metric.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ExclusionPolicy {
    #[default]
    #[serde(rename = "minmax")]
    #[value(name = "minmax")]
    MinMax,
    #[serde(rename = "min", alias = "min-only")]
    #[value(name = "min", alias = "min-only")]
    MinOnly,
    #[serde(rename = "max", alias = "max-only")]
    #[value(name = "max", alias = "max-only")]
    MaxOnly,
    #[serde(rename = "none")]
    #[value(name = "none")]
    None,
}

impl fmt::Display for ExclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExclusionPolicy::MinMax => "minmax",
            ExclusionPolicy::MinOnly => "min",
            ExclusionPolicy::MaxOnly => "max",
            ExclusionPolicy::None => "none",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AveragePolicy {
    pub playtime: ExclusionPolicy,
    pub fps: ExclusionPolicy,
    pub bandwidth: ExclusionPolicy,
    pub rtt: ExclusionPolicy,
}

impl AveragePolicy {
    pub fn get(&self, metric: Metric) -> ExclusionPolicy {
        match metric {
            Metric::Playtime => self.playtime,
            Metric::Fps => self.fps,
            Metric::Bandwidth => self.bandwidth,
            Metric::Rtt => self.rtt,
        }
    }
}

/// Shared two-decimal rendering for every sink.
pub fn format_number(v: f64) -> String {
    format!("{v:.2}")
}

/// Mean after dropping extremes per `policy`.
///
/// Trimming only happens with three or more values; one instance of an
/// extreme is removed even if it occurs several times.
pub fn trimmed_mean(values: &[f64], policy: ExclusionPolicy) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut kept = values.to_vec();
    if values.len() >= 3 {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if matches!(policy, ExclusionPolicy::MinMax | ExclusionPolicy::MinOnly) {
            remove_one(&mut kept, min);
        }
        if matches!(policy, ExclusionPolicy::MinMax | ExclusionPolicy::MaxOnly) {
            remove_one(&mut kept, max);
        }
    }
    if kept.is_empty() {
        kept = values.to_vec();
    }

    Some(kept.iter().sum::<f64>() / kept.len() as f64)
}

fn remove_one(values: &mut Vec<f64>, target: f64) {
    if let Some(i) = values.iter().position(|v| *v == target) {
        values.remove(i);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub policy: ExclusionPolicy,
    pub average: Option<f64>,
    pub valid: usize,
    pub errors: usize,
    /// Untrimmed extremes of the valid set.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricSummary {
    pub fn from_records(records: &[MetricRecord], metric: Metric, policy: ExclusionPolicy) -> Self {
        let samples: Vec<Sample> = records.iter().map(|r| r.get(metric)).collect();
        let valid: Vec<f64> = samples.iter().filter_map(|s| s.valid()).collect();
        let errors = samples.iter().filter(|s| s.is_error()).count();

        Self {
            metric,
            policy,
            average: trimmed_mean(&valid, policy),
            valid: valid.len(),
            errors,
            min: valid.iter().copied().reduce(f64::min),
            max: valid.iter().copied().reduce(f64::max),
        }
    }

    /// `N/A` means nothing was attempted; `Error (all N files)` means every
    /// attempt failed.
    pub fn label(&self) -> String {
        match (self.average, self.errors) {
            (Some(avg), 0) => format_number(avg),
            (Some(avg), n) => format!("{} (errors: {n} files)", format_number(avg)),
            (None, 0) => "N/A".to_string(),
            (None, n) => format!("Error (all {n} files)"),
        }
    }

    /// Whether `v` should be highlighted as the folder max / min.
    pub fn is_max(&self, v: f64) -> bool {
        self.has_spread() && self.max == Some(v)
    }

    pub fn is_min(&self, v: f64) -> bool {
        self.has_spread() && self.min == Some(v)
    }

    fn has_spread(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo < hi)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderAggregate {
    pub folder: String,
    pub dimensions: FolderDimensions,
    pub records: Vec<MetricRecord>,
    pub playtime: MetricSummary,
    pub fps: MetricSummary,
    pub bandwidth: MetricSummary,
    pub rtt: MetricSummary,
}

impl FolderAggregate {
    pub fn new(folder: &str, mut records: Vec<MetricRecord>, policy: &AveragePolicy) -> Self {
        records.sort_by(|a, b| a.filename.cmp(&b.filename));
        let summarize = |m: Metric| MetricSummary::from_records(&records, m, policy.get(m));
        Self {
            folder: folder.to_string(),
            dimensions: folder::decode(folder),
            playtime: summarize(Metric::Playtime),
            fps: summarize(Metric::Fps),
            bandwidth: summarize(Metric::Bandwidth),
            rtt: summarize(Metric::Rtt),
            records,
        }
    }

    pub fn summary(&self, metric: Metric) -> &MetricSummary {
        match metric {
            Metric::Playtime => &self.playtime,
            Metric::Fps => &self.fps,
            Metric::Bandwidth => &self.bandwidth,
            Metric::Rtt => &self.rtt,
        }
    }

    pub fn file_count(&self) -> usize {
        self.records.len()
    }
}

pub fn aggregate(
    groups: BTreeMap<String, Vec<MetricRecord>>,
    policy: &AveragePolicy,
) -> BTreeMap<String, FolderAggregate> {
    groups
        .into_iter()
        .map(|(folder, records)| {
            let agg = FolderAggregate::new(&folder, records, policy);
            debug!(
                folder = %folder,
                files = agg.file_count(),
                playtime = %agg.playtime.label(),
                fps = %agg.fps.label(),
                bandwidth = %agg.bandwidth.label(),
                rtt = %agg.rtt.label(),
                "aggregated folder"
            );
            (folder, agg)
        })
        .collect()
}
