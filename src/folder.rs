//! Test dimensions encoded in the folder layout below the input root:
//!
//! ```text
//! <date>/<city>/<area>/<region>/<carrier>/<4g|5g>/<game>/<device>
//! <date>/<city>/<area>/<region>/WIFI/<game>/<device>
//! ```

use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDimensions {
    pub date: String,
    pub city: String,
    pub area: String,
    pub region: String,
    pub carrier: String,
    pub network: String,
    pub device: String,
    pub game: String,
}

impl Default for FolderDimensions {
    fn default() -> Self {
        Self {
            date: UNKNOWN.into(),
            city: UNKNOWN.into(),
            area: UNKNOWN.into(),
            region: UNKNOWN.into(),
            carrier: UNKNOWN.into(),
            network: UNKNOWN.into(),
            device: UNKNOWN.into(),
            game: UNKNOWN.into(),
        }
    }
}

/// Decode a folder path. Never fails: anything undecidable keeps its default.
pub fn decode(path: &str) -> FolderDimensions {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::trim)
        .collect();

    let mut dims = FolderDimensions::default();
    let Some(pos) = segments.iter().position(|s| is_date_segment(s)) else {
        return dims;
    };
    dims.date = segments[pos].to_string();

    let rest = &segments[pos + 1..];
    if rest.len() < 4 {
        return dims;
    }

    let at = |i: usize| rest.get(i).map(|s| s.to_string()).unwrap_or_default();

    dims.city = at(0);
    dims.area = at(1);
    dims.region = at(2);
    let carrier = at(3);

    if carrier.eq_ignore_ascii_case("wifi") {
        dims.carrier = String::new();
        dims.network = "WIFI".into();
        dims.game = at(4);
        dims.device = at(5);
    } else {
        let network = at(4);
        dims.carrier = carrier;
        dims.network = if network.eq_ignore_ascii_case("4g") || network.eq_ignore_ascii_case("5g") {
            network.to_ascii_uppercase()
        } else {
            String::new()
        };
        dims.game = at(5);
        dims.device = at(6);
    }

    dims
}

/// Eight ASCII digits forming `YYYYMMDD` with year 2000-2100, month 1-12,
/// day 1-31.
pub fn is_date_segment(s: &str) -> bool {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let num = |r: std::ops::Range<usize>| s[r].parse::<u32>().unwrap_or(0);
    let (year, month, day) = (num(0..4), num(4..6), num(6..8));
    (2000..=2100).contains(&year) && (1..=12).contains(&month) && (1..=31).contains(&day)
}
