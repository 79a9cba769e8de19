//! Static Chart Export Module
//! Renders the active view's trend and top-N charts to a PNG file.

use std::path::Path;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::map_layer::{RankedEntity, TrendPoint};

const EXPORT_WIDTH: u32 = 1400;
const EXPORT_HEIGHT: u32 = 600;

/// Render a two-panel overview (trend line left, ranked bars right) to
/// `path` as a PNG.
pub fn export_overview_png(
    path: &Path,
    title: &str,
    trend: &[TrendPoint],
    ranked: &[RankedEntity],
) -> Result<()> {
    let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("fill background: {e}"))?;

    let (left, right) = root.split_horizontally((EXPORT_WIDTH / 2) as i32);
    draw_trend_panel(&left, title, trend)?;
    draw_ranked_panel(&right, title, ranked)?;

    root.present()
        .map_err(|e| anyhow::anyhow!("write chart image to {}: {e}", path.display()))?;
    Ok(())
}

fn draw_trend_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    trend: &[TrendPoint],
) -> Result<()> {
    let y_max = trend
        .iter()
        .map(|p| p.value)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let n = trend.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{title}: trend"), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(0..n, 0f64..y_max * 1.1)
        .map_err(|e| anyhow::anyhow!("build trend chart: {e}"))?;

    let labels: Vec<String> = trend
        .iter()
        .map(|p| p.date.format("%m-%d").to_string())
        .collect();
    chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|i| labels.get(*i).cloned().unwrap_or_default())
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .draw()
        .map_err(|e| anyhow::anyhow!("draw trend mesh: {e}"))?;

    if !trend.is_empty() {
        chart
            .draw_series(
                AreaSeries::new(
                    trend.iter().enumerate().map(|(i, p)| (i, p.value)),
                    0.0,
                    BLUE.mix(0.2),
                )
                .border_style(&BLUE),
            )
            .map_err(|e| anyhow::anyhow!("draw trend series: {e}"))?;
    }

    Ok(())
}

fn draw_ranked_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    ranked: &[RankedEntity],
) -> Result<()> {
    let y_max = ranked
        .iter()
        .map(|e| e.value)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let n = ranked.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{title}: top countries"), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(110)
        .y_label_area_size(80)
        .build_cartesian_2d(0..n, 0f64..y_max * 1.1)
        .map_err(|e| anyhow::anyhow!("build ranking chart: {e}"))?;

    let labels: Vec<String> = ranked.iter().map(|e| e.name.clone()).collect();
    chart
        .configure_mesh()
        .x_labels(n)
        .x_label_formatter(&|i| labels.get(*i).cloned().unwrap_or_default())
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .draw()
        .map_err(|e| anyhow::anyhow!("draw ranking mesh: {e}"))?;

    chart
        .draw_series(ranked.iter().enumerate().map(|(i, e)| {
            Rectangle::new([(i, 0.0), (i + 1, e.value)], RED.mix(0.5).filled())
        }))
        .map_err(|e| anyhow::anyhow!("draw ranking bars: {e}"))?;

    Ok(())
}
