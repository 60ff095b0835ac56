use anyhow::{Context, Result};
use std::path::{Component, Path};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// `YYYYmmdd_HHMMSS`, for artifact filenames.
pub fn now_file_stamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_else(|_| "19700101_000000".to_string())
}

/// Grouping key for a document: its parent directory relative to `root`,
/// `/`-separated, `.` for the root itself.
pub fn folder_key(root: &Path, file: &Path) -> String {
    let parent = file.parent().unwrap_or_else(|| Path::new(""));
    let rel = parent.strip_prefix(root).unwrap_or(parent);
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
            Component::ParentDir => Some("..".to_string()),
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
