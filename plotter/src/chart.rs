use std::ops::Range;
use std::path::Path;

use anyhow::anyhow;
use itertools::Itertools;
use openabl_bench_core::prelude::WorkloadPoint;
use plotters::coord::combinators::{BindKeyPoints, IntoLogRange};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::aggregate::{Aggregation, Panel, PlotMode};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

const RUNTIME_LABEL: &str = "Runtime (s)";
const IDEAL_LABEL: &str = "ideal";

/// Grid of chart panels, filled row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLayout {
    panels: usize,
}

impl ChartLayout {
    pub const COLUMNS: usize = 3;

    pub fn new(panels: usize) -> Self {
        Self { panels }
    }

    pub fn rows(&self) -> usize {
        self.panels.div_ceil(Self::COLUMNS).max(1)
    }

    /// `(row, column)` of panel `index`.
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / Self::COLUMNS, index % Self::COLUMNS)
    }
}

/// Perfect scaling from the first measurement: every further point halves the runtime.
pub fn ideal_curve(points: &[WorkloadPoint]) -> Vec<WorkloadPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    points
        .iter()
        .scan(first.elapsed_seconds, |elapsed, point| {
            let ideal = WorkloadPoint::new(point.key, *elapsed);
            *elapsed /= 2.0;
            Some(ideal)
        })
        .collect()
}

/// Pixel size of the rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Render `aggregation` to an SVG file at `path`.
pub fn render_svg_file(
    aggregation: &Aggregation,
    path: &Path,
    options: ChartOptions,
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    draw(aggregation, &root)?;
    root.present().map_err(draw_error)?;

    log::info!("Wrote chart to {}", path.display());
    Ok(())
}

/// Render `aggregation` to an SVG document in memory.
pub fn render_svg_string(aggregation: &Aggregation, options: ChartOptions) -> anyhow::Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        draw(aggregation, &root)?;
        root.present().map_err(draw_error)?;
    }
    Ok(svg)
}

fn draw<DB: DrawingBackend>(
    aggregation: &Aggregation,
    root: &DrawingArea<DB, Shift>,
) -> anyhow::Result<()> {
    root.fill(&WHITE).map_err(draw_error)?;

    let layout = ChartLayout::new(aggregation.panels.len());
    let areas = root.split_evenly((layout.rows(), ChartLayout::COLUMNS));

    match aggregation.mode {
        PlotMode::Grouped => {
            let keys = key_range(aggregation.panels.iter().flat_map(all_points));
            let runtimes = runtime_range(aggregation.panels.iter().flat_map(all_points));
            let labels = aggregation.series_labels();

            for (index, (panel, area)) in aggregation.panels.iter().zip(&areas).enumerate() {
                let (_, column) = layout.position(index);
                draw_grouped_panel(area, panel, column, keys.clone(), runtimes.clone(), &labels)?;
            }
        }
        PlotMode::Scaling => {
            for (panel, area) in aggregation.panels.iter().zip(&areas) {
                draw_scaling_panel(area, panel)?;
            }
        }
    }

    Ok(())
}

fn draw_grouped_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    column: usize,
    keys: Range<f64>,
    runtimes: Range<f64>,
    labels: &[&str],
) -> anyhow::Result<()> {
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .x_label_area_size(30)
        .y_label_area_size(if column == 0 { 50 } else { 40 })
        .build_cartesian_2d(keys.log_scale(), runtimes.log_scale())
        .map_err(draw_error)?;

    let tick = |v: &f64| format_tick(*v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(panel.model.as_str())
            .x_label_formatter(&tick)
            .y_label_formatter(&tick);
        if column == 0 {
            mesh.y_desc(RUNTIME_LABEL);
        }
        mesh.draw().map_err(draw_error)?;
    }

    for series in &panel.series {
        let index = labels
            .iter()
            .position(|label| *label == series.label)
            .unwrap_or_default();
        let color = series_color(index);
        chart
            .draw_series(LineSeries::new(
                positive(&series.points),
                color.stroke_width(2),
            ))
            .map_err(draw_error)?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_error)?;

    Ok(())
}

fn draw_scaling_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
) -> anyhow::Result<()> {
    let measured = panel
        .series
        .iter()
        .flat_map(|series| series.points.iter().copied())
        .collect::<Vec<_>>();
    let ideal = ideal_curve(&measured);

    let threads = measured
        .iter()
        .filter(|point| point.key > 0)
        .map(|point| point.key as f64)
        .dedup()
        .collect::<Vec<_>>();
    let keys = key_range(measured.iter().copied());
    let runtimes = runtime_range(measured.iter().chain(&ideal).copied());

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .caption(panel.model.as_str(), ("sans-serif", 14))
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(
            keys.log_scale().base(2.0).with_key_points(threads),
            runtimes.log_scale(),
        )
        .map_err(draw_error)?;

    let tick = |v: &f64| format_tick(*v);
    chart
        .configure_mesh()
        .x_desc("Threads")
        .y_desc(RUNTIME_LABEL)
        .x_label_formatter(&tick)
        .y_label_formatter(&tick)
        .draw()
        .map_err(draw_error)?;

    for (index, (label, points)) in [
        (crate::aggregate::SCALING_LABEL, &measured),
        (IDEAL_LABEL, &ideal),
    ]
    .into_iter()
    .enumerate()
    {
        let color = series_color(index);
        chart
            .draw_series(LineSeries::new(positive(points), color.stroke_width(2)))
            .map_err(draw_error)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_error)?;

    Ok(())
}

fn all_points(panel: &Panel) -> impl Iterator<Item = WorkloadPoint> + '_ {
    panel
        .series
        .iter()
        .flat_map(|series| series.points.iter().copied())
}

/// Points that can be shown on log axes.
fn positive(points: &[WorkloadPoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|point| point.key > 0 && point.elapsed_seconds > 0.0)
        .map(|point| (point.key as f64, point.elapsed_seconds))
        .collect()
}

fn key_range(points: impl Iterator<Item = WorkloadPoint>) -> Range<f64> {
    log_range(points.filter(|p| p.key > 0).map(|p| p.key as f64))
}

fn runtime_range(points: impl Iterator<Item = WorkloadPoint>) -> Range<f64> {
    log_range(points.map(|p| p.elapsed_seconds))
}

/// Range covering all positive `values` with some room on either side.
fn log_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    match values
        .filter(|v| v.is_finite() && *v > 0.0)
        .minmax_by(|a, b| a.total_cmp(b))
        .into_option()
    {
        Some((min, max)) => (min / 1.25)..(max * 1.25),
        None => 1.0..10.0,
    }
}

fn series_color(index: usize) -> RGBColor {
    let (r, g, b) = Palette99::COLORS[index % Palette99::COLORS.len()];
    RGBColor(r, g, b)
}

fn format_tick(value: f64) -> String {
    if value >= 1.0 && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

fn draw_error<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("Failed to draw chart: {err}")
}
