use crate::aggregate::{AveragePolicy, ExclusionPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub input: Input,
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub normalize: Normalize,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub averaging: Averaging,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub charts: Charts,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_summary: bool,
    pub dump_effective_config: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            dump_effective_config: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Empty means `<root>/reports`.
    pub reports_dir: String,
    pub fallback_reports_dir: String,
    pub scripts_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            reports_dir: "".into(),
            fallback_reports_dir: "reports".into(),
            scripts_dir: "scripts".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    pub extensions: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub follow_links: bool,
}
impl Default for Input {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".into()],
            skip_dirs: vec!["reports".into()],
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub python_exe: String,
    pub script: String,
    pub timeout_seconds: u64,
    pub keep_python_stderr: bool,
    #[serde(default)]
    pub env: std::collections::BTreeMap<String, String>,
}
impl Default for Engine {
    fn default() -> Self {
        Self {
            python_exe: "python3".into(),
            script: "pdf_text.py".into(),
            timeout_seconds: 120,
            keep_python_stderr: true,
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalize {
    pub normalize_newlines: bool,
    pub normalize_unicode: bool,
    pub collapse_decimal_spacing: bool,
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Normalize {
    fn default() -> Self {
        Self {
            normalize_newlines: true,
            normalize_unicode: true,
            collapse_decimal_spacing: true,
            control_chars_to_sanitize: (0u8..32).chain(std::iter::once(127)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extraction {
    pub context_before: usize,
    pub context_after: usize,
    pub scan_fraction: f64,
    pub playtime_min_seconds: f64,
    pub playtime_max_seconds: f64,
    #[serde(default)]
    pub extra_playtime_patterns: Vec<String>,
    #[serde(default)]
    pub extra_fps_patterns: Vec<String>,
    #[serde(default)]
    pub extra_bandwidth_patterns: Vec<String>,
    #[serde(default)]
    pub extra_rtt_patterns: Vec<String>,
}
impl Default for Extraction {
    fn default() -> Self {
        Self {
            context_before: 20,
            context_after: 180,
            scan_fraction: 0.1,
            playtime_min_seconds: 1.0,
            playtime_max_seconds: 3600.0,
            extra_playtime_patterns: Vec::new(),
            extra_fps_patterns: Vec::new(),
            extra_bandwidth_patterns: Vec::new(),
            extra_rtt_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Averaging {
    pub playtime: ExclusionPolicy,
    pub fps: ExclusionPolicy,
    pub bandwidth: ExclusionPolicy,
    pub rtt: ExclusionPolicy,
}
impl Default for Averaging {
    fn default() -> Self {
        Self {
            playtime: ExclusionPolicy::MinMax,
            fps: ExclusionPolicy::MinMax,
            bandwidth: ExclusionPolicy::MinMax,
            rtt: ExclusionPolicy::MinMax,
        }
    }
}

impl Averaging {
    pub fn policy(&self) -> AveragePolicy {
        AveragePolicy {
            playtime: self.playtime,
            fps: self.fps,
            bandwidth: self.bandwidth,
            rtt: self.rtt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub write_markdown: bool,
    pub write_html: bool,
    pub write_xlsx: bool,
    pub write_csv: bool,
    pub write_charts: bool,
    pub markdown_stem: String,
    pub details_stem: String,
    pub averages_stem: String,
    pub write_summary_json: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_markdown: true,
            write_html: true,
            write_xlsx: true,
            write_csv: true,
            write_charts: false,
            markdown_stem: "performance_report".into(),
            details_stem: "performance_details".into(),
            averages_stem: "performance_averages".into(),
            write_summary_json: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Charts {
    pub width: u32,
    pub height: u32,
}
impl Default for Charts {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    /// Log the full normalized text of every document at debug level.
    pub dump_document_text: bool,
}
