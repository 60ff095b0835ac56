use crate::aggregate::{AveragePolicy, FolderAggregate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything one batch run produced. Built once after aggregation and only
/// read from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportModel {
    pub generated_at: String,
    /// `YYYYmmdd_HHMMSS`, used in artifact filenames.
    pub file_stamp: String,
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub policy: AveragePolicy,
    pub stats: RunStats,
    pub folders: BTreeMap<String, FolderAggregate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub discovered: usize,
    pub processed: usize,
    pub skipped: usize,
}

impl ReportModel {
    pub fn total_files(&self) -> usize {
        self.folders.values().map(FolderAggregate::file_count).sum()
    }
}
