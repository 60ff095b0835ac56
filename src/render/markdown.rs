use crate::{
    aggregate::{FolderAggregate, MetricSummary, format_number},
    record::{EXTRACTION_FAILED, Metric, Sample},
    render::rows::average_header,
    report::ReportModel,
};
use std::fmt::Write;

pub const TITLE: &str = "Performance Metrics Report";

pub fn render_markdown(model: &ReportModel) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# {TITLE}\n");
    let _ = writeln!(md, "Generated on: {}\n", model.generated_at);
    let _ = writeln!(md, "Source folder: `{}`\n", model.root.display());
    let _ = writeln!(
        md,
        "Files processed: {} of {} (skipped: {})\n",
        model.stats.processed, model.stats.discovered, model.stats.skipped
    );
    let policy = Metric::ALL
        .iter()
        .map(|m| format!("{m}={}", model.policy.get(*m)))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(md, "Averaging (extremes excluded): {policy}\n");

    md.push_str("## Summary by Folder\n\n");
    if model.folders.is_empty() {
        md.push_str("No documents were processed.\n");
        return md;
    }

    let mut header = vec![
        "Folder", "Date", "City", "Area", "Region", "Carrier", "Network", "Device", "Game", "Files",
    ]
    .into_iter()
    .map(String::from)
    .collect::<Vec<_>>();
    header.extend(Metric::ALL.iter().map(|m| average_header(*m)));
    push_row(&mut md, &header);
    push_rule(&mut md, header.len());

    for agg in model.folders.values() {
        let d = &agg.dimensions;
        let mut row = vec![
            agg.folder.clone(),
            d.date.clone(),
            d.city.clone(),
            d.area.clone(),
            d.region.clone(),
            d.carrier.clone(),
            d.network.clone(),
            d.device.clone(),
            d.game.clone(),
            agg.file_count().to_string(),
        ];
        row.extend(Metric::ALL.iter().map(|m| agg.summary(*m).label()));
        push_row(&mut md, &row);
    }

    md.push_str("\n\n## Appendix: Detailed Metrics by Folder\n\n");
    for agg in model.folders.values() {
        push_folder_detail(&mut md, agg);
    }

    md
}

fn push_folder_detail(md: &mut String, agg: &FolderAggregate) {
    let _ = writeln!(md, "### {}\n", agg.folder);

    let mut header = vec![
        "Filename".to_string(),
        "Timestamp".to_string(),
        "Region".to_string(),
    ];
    header.extend(Metric::ALL.iter().map(|m| m.heading().to_string()));
    push_row(md, &header);
    push_rule(md, header.len());

    for r in &agg.records {
        let mut row = vec![r.filename.clone(), r.timestamp.clone(), r.region.clone()];
        row.extend(
            Metric::ALL
                .iter()
                .map(|m| detail_cell(r.get(*m), agg.summary(*m))),
        );
        push_row(md, &row);
    }

    let mut avg = vec!["**AVERAGE**".to_string(), String::new(), String::new()];
    avg.extend(Metric::ALL.iter().map(|m| agg.summary(*m).label()));
    push_row(md, &avg);
    md.push('\n');
}

/// Raw value with the folder max in bold and min in italics.
fn detail_cell(sample: Sample, summary: &MetricSummary) -> String {
    match sample {
        Sample::Error => EXTRACTION_FAILED.to_string(),
        Sample::Value(v) => {
            let s = format_number(v);
            if summary.is_max(v) {
                format!("**{s}**")
            } else if summary.is_min(v) {
                format!("_{s}_")
            } else {
                s
            }
        }
    }
}

fn push_row(md: &mut String, cells: &[String]) {
    md.push('|');
    for c in cells {
        md.push(' ');
        md.push_str(&c.replace('|', "\\|"));
        md.push_str(" |");
    }
    md.push('\n');
}

fn push_rule(md: &mut String, n: usize) {
    md.push('|');
    for _ in 0..n {
        md.push_str(" --- |");
    }
    md.push('\n');
}
