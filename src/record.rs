use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Numeric stand-in for [`Sample::Error`] wherever a sink needs a number.
pub const ERROR_SENTINEL: f64 = -1.0;

/// Label shown in per-file tables when a metric could not be extracted.
pub const EXTRACTION_FAILED: &str = "Error (extraction failed)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Playtime,
    Fps,
    Bandwidth,
    Rtt,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Playtime, Metric::Fps, Metric::Bandwidth, Metric::Rtt];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Playtime => "playtime",
            Metric::Fps => "fps",
            Metric::Bandwidth => "bandwidth",
            Metric::Rtt => "rtt",
        }
    }

    /// The label the source documents use for this metric.
    pub fn canonical_label(self) -> &'static str {
        match self {
            Metric::Playtime => "Play Time",
            Metric::Fps => "FPS",
            Metric::Bandwidth => "Bandwidth",
            Metric::Rtt => "Round Trip Time",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Playtime => "s",
            Metric::Fps => "",
            Metric::Bandwidth => "Mbps",
            Metric::Rtt => "ms",
        }
    }

    /// Column heading with unit, e.g. `Bandwidth (Mbps)`.
    pub fn heading(self) -> &'static str {
        match self {
            Metric::Playtime => "Playtime (s)",
            Metric::Fps => "FPS",
            Metric::Bandwidth => "Bandwidth (Mbps)",
            Metric::Rtt => "RTT (ms)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One extracted metric value. `Error` means every extraction strategy
/// failed; it is never averaged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Value(f64),
    Error,
}

impl Sample {
    pub fn value(self) -> Option<f64> {
        match self {
            Sample::Value(v) => Some(v),
            Sample::Error => None,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Sample::Error)
    }

    /// Positive values only; zero and negatives are not usable samples.
    pub fn valid(self) -> Option<f64> {
        self.value().filter(|v| *v > 0.0)
    }

    pub fn as_number(self) -> f64 {
        self.value().unwrap_or(ERROR_SENTINEL)
    }
}

impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_number())
    }
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = f64::deserialize(deserializer)?;
        if v == ERROR_SENTINEL {
            Ok(Sample::Error)
        } else {
            Ok(Sample::Value(v))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub filename: String,
    pub path: String,
    pub region: String,
    pub timestamp: String,
    pub playtime: Sample,
    pub fps: Sample,
    pub bandwidth: Sample,
    pub rtt: Sample,
}

impl MetricRecord {
    pub fn get(&self, metric: Metric) -> Sample {
        match metric {
            Metric::Playtime => self.playtime,
            Metric::Fps => self.fps,
            Metric::Bandwidth => self.bandwidth,
            Metric::Rtt => self.rtt,
        }
    }

    pub fn set(&mut self, metric: Metric, sample: Sample) {
        match metric {
            Metric::Playtime => self.playtime = sample,
            Metric::Fps => self.fps = sample,
            Metric::Bandwidth => self.bandwidth = sample,
            Metric::Rtt => self.rtt = sample,
        }
    }
}
