//! PNG charts grouped by region and by carrier. Compiled only with the
//! `charts` feature.

use crate::{aggregate::FolderAggregate, record::Metric, report::ReportModel};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Region,
    Carrier,
}

impl Grouping {
    pub const ALL: [Grouping; 2] = [Grouping::Region, Grouping::Carrier];

    pub fn key(self) -> &'static str {
        match self {
            Grouping::Region => "region",
            Grouping::Carrier => "carrier",
        }
    }

    fn group_of(self, agg: &FolderAggregate) -> String {
        let d = &agg.dimensions;
        let raw = match self {
            Grouping::Region => d.region.as_str(),
            Grouping::Carrier if d.network == "WIFI" => "WIFI",
            Grouping::Carrier => d.carrier.as_str(),
        };
        if raw.is_empty() {
            "Unknown".to_string()
        } else {
            raw.to_string()
        }
    }
}

/// Per-group chart input for one metric: folder averages (for bars) and raw
/// valid samples (for box plots).
#[derive(Debug, Clone, Default)]
pub struct GroupSeries {
    pub averages: Vec<f64>,
    pub samples: Vec<f64>,
}

impl GroupSeries {
    pub fn mean_of_averages(&self) -> Option<f64> {
        if self.averages.is_empty() {
            None
        } else {
            Some(self.averages.iter().sum::<f64>() / self.averages.len() as f64)
        }
    }
}

pub fn group_series(
    model: &ReportModel,
    grouping: Grouping,
    metric: Metric,
) -> BTreeMap<String, GroupSeries> {
    let mut out: BTreeMap<String, GroupSeries> = BTreeMap::new();
    for agg in model.folders.values() {
        let entry = out.entry(grouping.group_of(agg)).or_default();
        if let Some(avg) = agg.summary(metric).average {
            entry.averages.push(avg);
        }
        entry
            .samples
            .extend(agg.records.iter().filter_map(|r| r.get(metric).valid()));
    }
    out
}

#[cfg(feature = "charts")]
pub use imp::write_charts;

#[cfg(not(feature = "charts"))]
pub fn write_charts(
    _cfg: &crate::config::Config,
    _model: &ReportModel,
    _dir: &std::path::Path,
) -> anyhow::Result<Vec<std::path::PathBuf>> {
    anyhow::bail!("perf-check was built without the `charts` feature")
}

#[cfg(feature = "charts")]
mod imp {
    use super::{GroupSeries, Grouping, group_series};
    use crate::{config::Config, record::Metric, report::ReportModel};
    use anyhow::Result;
    use plotters::prelude::*;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use tracing::info;

    pub fn write_charts(cfg: &Config, model: &ReportModel, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for grouping in Grouping::ALL {
            let bar_path = dir.join(format!(
                "performance_bar_by_{}_{}.png",
                grouping.key(),
                model.file_stamp
            ));
            draw_grid(cfg, model, grouping, &bar_path, draw_bars)?;
            info!("wrote chart {}", bar_path.display());
            written.push(bar_path);

            let box_path = dir.join(format!(
                "performance_box_by_{}_{}.png",
                grouping.key(),
                model.file_stamp
            ));
            draw_grid(cfg, model, grouping, &box_path, draw_boxes)?;
            info!("wrote chart {}", box_path.display());
            written.push(box_path);
        }
        Ok(written)
    }

    type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

    fn draw_grid(
        cfg: &Config,
        model: &ReportModel,
        grouping: Grouping,
        path: &Path,
        draw: fn(&Area<'_>, &str, &BTreeMap<String, GroupSeries>) -> Result<()>,
    ) -> Result<()> {
        let root = BitMapBackend::new(path, (cfg.charts.width, cfg.charts.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let panels = root.split_evenly((2, 2));
        for (panel, metric) in panels.iter().zip(Metric::ALL) {
            let series = group_series(model, grouping, metric);
            let title = format!("{} by {}", metric.heading(), grouping.key());
            draw(panel, &title, &series)?;
        }
        root.present()?;
        Ok(())
    }

    fn draw_bars(area: &Area<'_>, title: &str, series: &BTreeMap<String, GroupSeries>) -> Result<()> {
        let names: Vec<String> = series.keys().cloned().collect();
        let values: Vec<f64> = series
            .values()
            .map(|s| s.mean_of_averages().unwrap_or(0.0))
            .collect();
        let n = names.len().max(1);
        let top = values.iter().copied().fold(0.0, f64::max).max(1.0) * 1.15;

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..top)?;

        let label = |x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&label)
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.7).filled())
                .margin(12)
                .data(values.iter().enumerate().map(|(i, v)| (i, *v))),
        )?;
        Ok(())
    }

    fn draw_boxes(area: &Area<'_>, title: &str, series: &BTreeMap<String, GroupSeries>) -> Result<()> {
        let names: Vec<String> = series.keys().cloned().collect();
        let n = names.len().max(1);
        let quartiles: Vec<(usize, Quartiles)> = series
            .values()
            .enumerate()
            .filter(|(_, s)| !s.samples.is_empty())
            .map(|(i, s)| (i, Quartiles::new(&s.samples)))
            .collect();
        let top = series
            .values()
            .flat_map(|s| s.samples.iter().copied())
            .fold(0.0, f64::max)
            .max(1.0) as f32
            * 1.15;

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0..n).into_segmented(), 0f32..top)?;

        let label = |x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&label)
            .draw()?;

        chart.draw_series(
            quartiles
                .iter()
                .map(|(i, q)| Boxplot::new_vertical(SegmentValue::CenterOf(*i), q)),
        )?;
        Ok(())
    }
}
