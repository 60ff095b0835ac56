pub mod charts;
pub mod delimited;
pub mod html;
pub mod markdown;
pub mod rows;
pub mod workbook;

use crate::{config::Config, report::ReportModel, util::ensure_dir};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Markdown,
    Html,
    DetailsXlsx,
    AveragesXlsx,
    DetailsCsv,
    AveragesCsv,
    Charts,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Markdown => "markdown report",
            ArtifactKind::Html => "html report",
            ArtifactKind::DetailsXlsx => "details workbook",
            ArtifactKind::AveragesXlsx => "averages workbook",
            ArtifactKind::DetailsCsv => "details csv",
            ArtifactKind::AveragesCsv => "averages csv",
            ArtifactKind::Charts => "charts",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Written { paths: Vec<PathBuf> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

impl Artifact {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, ArtifactStatus::Written { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub output_dir: Option<PathBuf>,
    pub artifacts: Vec<Artifact>,
}

impl RenderOutcome {
    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    pub fn paths(&self, kind: ArtifactKind) -> &[PathBuf] {
        match self.get(kind).map(|a| &a.status) {
            Some(ArtifactStatus::Written { paths }) => paths.as_slice(),
            _ => &[],
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| !a.is_ok())
    }
}

fn requested(cfg: &Config) -> Vec<ArtifactKind> {
    let o = &cfg.output;
    let mut kinds = Vec::new();
    if o.write_markdown {
        kinds.push(ArtifactKind::Markdown);
    }
    if o.write_html {
        kinds.push(ArtifactKind::Html);
    }
    if o.write_xlsx {
        kinds.extend([ArtifactKind::DetailsXlsx, ArtifactKind::AveragesXlsx]);
    }
    if o.write_csv {
        kinds.extend([ArtifactKind::DetailsCsv, ArtifactKind::AveragesCsv]);
    }
    if o.write_charts {
        kinds.push(ArtifactKind::Charts);
    }
    kinds
}

/// Create `preferred`, falling back to `paths.fallback_reports_dir`.
pub fn prepare_output_dir(cfg: &Config, preferred: &Path) -> Result<PathBuf> {
    let first = match ensure_dir(preferred) {
        Ok(()) => return Ok(preferred.to_path_buf()),
        Err(e) => e,
    };
    warn!("{:#}", first);

    let fallback = PathBuf::from(&cfg.paths.fallback_reports_dir);
    if cfg.paths.fallback_reports_dir.is_empty() || fallback == preferred {
        return Err(first);
    }
    ensure_dir(&fallback)
        .map_err(|e| anyhow!("{first:#}; fallback also failed: {e:#}"))?;
    warn!("writing reports to fallback dir {}", fallback.display());
    Ok(fallback)
}

/// Write every requested artifact. Each one succeeds or fails on its own.
pub fn render_all(cfg: &Config, model: &ReportModel) -> RenderOutcome {
    let kinds = requested(cfg);

    let dir = match prepare_output_dir(cfg, &model.output_dir) {
        Ok(dir) => dir,
        Err(e) => {
            error!("no usable output directory: {:#}", e);
            let msg = format!("{e:#}");
            return RenderOutcome {
                output_dir: None,
                artifacts: kinds
                    .into_iter()
                    .map(|kind| Artifact {
                        kind,
                        status: ArtifactStatus::Failed { error: msg.clone() },
                    })
                    .collect(),
            };
        }
    };

    let stamp = &model.file_stamp;
    let md_stem = &cfg.output.markdown_stem;
    let markdown = markdown::render_markdown(model);
    let details = rows::detail_table(model);
    let averages = rows::averages_table(model);

    let mut artifacts = Vec::new();
    for kind in kinds {
        let result = match kind {
            ArtifactKind::Markdown => write_pair(&dir, md_stem, stamp, "md", &markdown),
            ArtifactKind::Html => {
                let page = html::render_html(&markdown, markdown::TITLE);
                write_pair(&dir, md_stem, stamp, "html", &page)
            }
            ArtifactKind::DetailsXlsx => {
                let path = dir.join(format!("{}_{stamp}.xlsx", cfg.output.details_stem));
                workbook::write_workbook(&details, &path).map(|_| vec![path])
            }
            ArtifactKind::AveragesXlsx => {
                let path = dir.join(format!("{}_{stamp}.xlsx", cfg.output.averages_stem));
                workbook::write_workbook(&averages, &path).map(|_| vec![path])
            }
            ArtifactKind::DetailsCsv => {
                let path = dir.join(format!("{}_{stamp}.csv", cfg.output.details_stem));
                delimited::write_csv(&details, &path).map(|_| vec![path])
            }
            ArtifactKind::AveragesCsv => {
                let path = dir.join(format!("{}_{stamp}.csv", cfg.output.averages_stem));
                delimited::write_csv(&averages, &path).map(|_| vec![path])
            }
            ArtifactKind::Charts => charts::write_charts(cfg, model, &dir),
        };

        let status = match result {
            Ok(paths) => {
                for p in &paths {
                    info!("wrote {kind}: {}", p.display());
                }
                ArtifactStatus::Written { paths }
            }
            Err(e) => {
                error!("failed to write {kind}: {:#}", e);
                ArtifactStatus::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        artifacts.push(Artifact { kind, status });
    }

    RenderOutcome {
        output_dir: Some(dir),
        artifacts,
    }
}

/// Fixed-name copy plus a timestamped copy.
fn write_pair(dir: &Path, stem: &str, stamp: &str, ext: &str, body: &str) -> Result<Vec<PathBuf>> {
    let fixed = dir.join(format!("{stem}.{ext}"));
    let stamped = dir.join(format!("{stem}_{stamp}.{ext}"));
    for p in [&fixed, &stamped] {
        std::fs::write(p, body).with_context(|| format!("writing {}", p.display()))?;
    }
    Ok(vec![fixed, stamped])
}
