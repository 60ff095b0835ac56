//! Tabular view of a [`ReportModel`], built once and shared by the
//! spreadsheet and CSV sinks.

use crate::{
    aggregate::{FolderAggregate, format_number},
    folder::FolderDimensions,
    record::{Metric, Sample},
    report::ReportModel,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Count(usize),
}

impl Cell {
    /// Text form used by CSV; numbers use the shared two-decimal format.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format_number(*v),
            Cell::Count(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub folder: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// `true` rows get the alternate fill. The colour flips only where the
    /// folder changes from the previous row.
    pub fn bands(&self) -> Vec<bool> {
        let mut out = Vec::with_capacity(self.rows.len());
        let mut shade = false;
        let mut prev: Option<&str> = None;
        for row in &self.rows {
            if let Some(p) = prev {
                if p != row.folder {
                    shade = !shade;
                }
            }
            out.push(shade);
            prev = Some(&row.folder);
        }
        out
    }
}

const DIMENSION_HEADERS: [&str; 8] = [
    "Date", "City", "Area", "Region", "Carrier", "Network", "Device", "Game",
];

fn dimension_cells(d: &FolderDimensions) -> impl Iterator<Item = Cell> {
    [
        &d.date, &d.city, &d.area, &d.region, &d.carrier, &d.network, &d.device, &d.game,
    ]
    .map(|s| Cell::Text(s.clone()))
    .into_iter()
}

fn sample_cell(s: Sample) -> Cell {
    match s {
        Sample::Value(v) => Cell::Number(v),
        Sample::Error => Cell::Text("Error".to_string()),
    }
}

pub fn detail_table(model: &ReportModel) -> Table {
    let mut headers = vec!["Folder".to_string()];
    headers.extend(DIMENSION_HEADERS.iter().map(|s| s.to_string()));
    headers.extend(["Filename", "File Region", "Timestamp"].map(String::from));
    headers.extend(Metric::ALL.iter().map(|m| m.heading().to_string()));

    let rows = model
        .folders
        .values()
        .flat_map(|agg| {
            agg.records.iter().map(move |r| {
                let mut cells = vec![Cell::Text(agg.folder.clone())];
                cells.extend(dimension_cells(&agg.dimensions));
                cells.push(Cell::Text(r.filename.clone()));
                cells.push(Cell::Text(r.region.clone()));
                cells.push(Cell::Text(r.timestamp.clone()));
                cells.extend(Metric::ALL.iter().map(|m| sample_cell(r.get(*m))));
                Row {
                    folder: agg.folder.clone(),
                    cells,
                }
            })
        })
        .collect();

    Table {
        name: "Details",
        headers,
        rows,
    }
}

pub fn average_header(metric: Metric) -> String {
    format!("Avg {}", metric.heading())
}

fn average_cells(agg: &FolderAggregate) -> Vec<Cell> {
    let mut cells = Vec::new();
    for m in Metric::ALL {
        let s = agg.summary(m);
        cells.push(match s.average {
            Some(v) => Cell::Number(v),
            None => Cell::Text(s.label()),
        });
        cells.push(Cell::Count(s.errors));
    }
    cells
}

pub fn averages_table(model: &ReportModel) -> Table {
    let mut headers = vec!["Folder".to_string()];
    headers.extend(DIMENSION_HEADERS.iter().map(|s| s.to_string()));
    headers.push("Files".to_string());
    for m in Metric::ALL {
        headers.push(average_header(m));
        headers.push(format!("{} Errors", m.heading()));
    }

    let rows = model
        .folders
        .values()
        .map(|agg| {
            let mut cells = vec![Cell::Text(agg.folder.clone())];
            cells.extend(dimension_cells(&agg.dimensions));
            cells.push(Cell::Count(agg.file_count()));
            cells.extend(average_cells(agg));
            Row {
                folder: agg.folder.clone(),
                cells,
            }
        })
        .collect();

    Table {
        name: "Averages",
        headers,
        rows,
    }
}
