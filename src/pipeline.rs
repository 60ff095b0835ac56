use crate::{
    aggregate,
    config::Config,
    engine::Engine,
    extract::MetricExtractor,
    postprocess,
    record::MetricRecord,
    render::{self, ArtifactStatus, RenderOutcome},
    report::{ReportModel, RunStats},
    util::{folder_key, now_file_stamp, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Progress notifications for whoever drives the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Discovered {
        total: usize,
    },
    FileStarted {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    FileDone {
        index: usize,
        total: usize,
    },
    FileSkipped {
        index: usize,
        total: usize,
        path: PathBuf,
        reason: String,
    },
    Aggregated {
        folders: usize,
    },
    ArtifactWritten {
        kind: render::ArtifactKind,
        paths: Vec<PathBuf>,
    },
    ArtifactFailed {
        kind: render::ArtifactKind,
        error: String,
    },
    Finished {
        processed: usize,
        skipped: usize,
        failed_artifacts: usize,
    },
}

pub trait EventSink {
    fn emit(&self, event: RunEvent);
}

impl EventSink for Sender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        // A subscriber that hung up just stops receiving.
        let _ = self.send(event);
    }
}

pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: RunEvent) {}
}

pub struct Pipeline<E: Engine> {
    cfg: Config,
    engine: E,
    extractor: MetricExtractor,
}

pub struct RunOutput {
    pub model: ReportModel,
    pub outcome: RenderOutcome,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(cfg: &Config, engine: E) -> Result<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            extractor: MetricExtractor::new(cfg)?,
            engine,
        })
    }

    /// Where reports go when the caller does not say.
    pub fn default_output_dir(&self, root: &Path) -> PathBuf {
        if self.cfg.paths.reports_dir.is_empty() {
            root.join("reports")
        } else {
            PathBuf::from(&self.cfg.paths.reports_dir)
        }
    }

    /// Documents below `root` with a configured extension, sorted by path.
    pub fn discover(&self, root: &Path, out_dir: &Path) -> Vec<PathBuf> {
        let exts: Vec<String> = self
            .cfg
            .input
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        let skip = &self.cfg.input.skip_dirs;

        let walker = WalkDir::new(root)
            .follow_links(self.cfg.input.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                e.path() != out_dir && !skip.iter().any(|s| *s == name)
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!("walk error: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| exts.contains(&ext.to_ascii_lowercase()));
            if matches {
                files.push(entry.into_path());
            }
        }
        files.sort();
        files
    }

    /// Text extraction + metric extraction for one document.
    pub fn extract_file(&self, path: &Path) -> Result<MetricRecord> {
        let raw = self
            .engine
            .extract_text(path)
            .with_context(|| format!("extracting text: {}", path.display()))?;
        if raw.trim().is_empty() {
            return Err(anyhow!("no text extracted from {}", path.display()));
        }
        let text = postprocess::normalize_text(&self.cfg, &raw)?;
        if self.cfg.debug.dump_document_text {
            debug!("text of {}:\n{}", path.display(), text);
        }
        Ok(self.extractor.extract(&text, path))
    }

    /// Process `files` one at a time, grouping records by folder.
    pub fn collect(
        &self,
        root: &Path,
        files: &[PathBuf],
        events: &dyn EventSink,
    ) -> (BTreeMap<String, Vec<MetricRecord>>, RunStats) {
        let total = files.len();
        let mut groups: BTreeMap<String, Vec<MetricRecord>> = BTreeMap::new();
        let mut stats = RunStats {
            discovered: total,
            ..Default::default()
        };

        for (i, path) in files.iter().enumerate() {
            let index = i + 1;
            info!("[{index}/{total}] processing {}", path.display());
            events.emit(RunEvent::FileStarted {
                index,
                total,
                path: path.clone(),
            });

            match self.extract_file(path) {
                Ok(record) => {
                    groups
                        .entry(folder_key(root, path))
                        .or_default()
                        .push(record);
                    stats.processed += 1;
                    events.emit(RunEvent::FileDone { index, total });
                }
                Err(err) => {
                    warn!("skipping {}: {:#}", path.display(), err);
                    stats.skipped += 1;
                    events.emit(RunEvent::FileSkipped {
                        index,
                        total,
                        path: path.clone(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }

        (groups, stats)
    }

    pub fn run(
        &self,
        root: &Path,
        out_dir: Option<&Path>,
        events: &dyn EventSink,
    ) -> Result<RunOutput> {
        if !root.is_dir() {
            return Err(anyhow!("input root is not a directory: {}", root.display()));
        }
        let output_dir = out_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_output_dir(root));

        let files = self.discover(root, &output_dir);
        info!("found {} documents under {}", files.len(), root.display());
        events.emit(RunEvent::Discovered { total: files.len() });

        let (groups, stats) = self.collect(root, &files, events);

        let policy = self.cfg.averaging.policy();
        let folders = aggregate::aggregate(groups, &policy);
        info!(
            "aggregated {} folders (processed={} skipped={})",
            folders.len(),
            stats.processed,
            stats.skipped
        );
        events.emit(RunEvent::Aggregated {
            folders: folders.len(),
        });

        let model = ReportModel {
            generated_at: now_rfc3339(),
            file_stamp: now_file_stamp(),
            root: root.to_path_buf(),
            output_dir,
            policy,
            stats,
            folders,
        };

        let outcome = render::render_all(&self.cfg, &model);
        for artifact in &outcome.artifacts {
            events.emit(match &artifact.status {
                ArtifactStatus::Written { paths } => RunEvent::ArtifactWritten {
                    kind: artifact.kind,
                    paths: paths.clone(),
                },
                ArtifactStatus::Failed { error } => RunEvent::ArtifactFailed {
                    kind: artifact.kind,
                    error: error.clone(),
                },
            });
        }

        events.emit(RunEvent::Finished {
            processed: model.stats.processed,
            skipped: model.stats.skipped,
            failed_artifacts: outcome.failed().count(),
        });

        Ok(RunOutput { model, outcome })
    }
}
