//! Chart Plotter Module
//! Draws the interactive map and chart widgets using egui_plot.

use chrono::{Duration, NaiveDate};
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::charts::map_layer::{MapMarker, RankedEntity, TrendPoint};

/// Line colors for multi-series charts.
pub const SERIES_PALETTE: [Color32; 4] = [
    Color32::from_rgb(52, 152, 219),  // Blue
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(243, 156, 18),  // Orange
];

/// On-screen marker sizing. Marker radii are linear in the data; here they
/// are only rescaled so the largest marker stays readable.
const MAX_MARKER_PX: f64 = 18.0;
const MIN_MARKER_PX: f64 = 2.0;

/// Hover search distance on the map, in degrees.
const HOVER_RANGE_DEG: f64 = 4.0;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

fn date_to_x(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    epoch().checked_add_signed(Duration::days(x.round() as i64))
}

/// Creates the dashboard's interactive visualizations using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    fn marker_px(radius: f64, max_radius: f64) -> f32 {
        if max_radius <= 0.0 {
            return MIN_MARKER_PX as f32;
        }
        (MAX_MARKER_PX * radius / max_radius).clamp(MIN_MARKER_PX, MAX_MARKER_PX) as f32
    }

    /// Draw the world map scatter: one circle per entity, radius and color
    /// from the presentation adapter, hover label with name and value.
    pub fn draw_map(ui: &mut egui::Ui, id: &str, markers: &[MapMarker], height: f32) {
        let max_radius = markers.iter().map(|m| m.radius).fold(0.0_f64, f64::max);

        Plot::new(format!("map_{id}"))
            .height(height)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .include_x(-180.0)
            .include_x(180.0)
            .include_y(-60.0)
            .include_y(80.0)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for marker in markers {
                    let points: PlotPoints = vec![[marker.longitude, marker.latitude]].into();
                    plot_ui.points(
                        Points::new(points)
                            .radius(Self::marker_px(marker.radius, max_radius))
                            .color(marker.color.gamma_multiply(0.6)),
                    );
                }

                // Hover tooltip: nearest marker within range.
                if let Some(pointer) = plot_ui.pointer_coordinate() {
                    let nearest = markers
                        .iter()
                        .map(|m| {
                            let dx = m.longitude - pointer.x;
                            let dy = m.latitude - pointer.y;
                            (m, (dx * dx + dy * dy).sqrt())
                        })
                        .filter(|(_, dist)| *dist <= HOVER_RANGE_DEG)
                        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

                    if let Some((marker, _)) = nearest {
                        plot_ui.text(Text::new(
                            PlotPoint::new(marker.longitude, marker.latitude + 4.0),
                            format!("{} ({}): {:.0}", marker.name, marker.region, marker.value),
                        ));
                    }
                }
            });
    }

    /// Draw a date-keyed series as a line chart, optionally filled to zero
    /// (area chart).
    pub fn draw_trend(
        ui: &mut egui::Ui,
        id: &str,
        points: &[TrendPoint],
        color: Color32,
        filled: bool,
        height: f32,
    ) {
        Plot::new(format!("trend_{id}"))
            .height(height)
            .allow_scroll(false)
            .x_axis_formatter(|mark, _range| {
                x_to_date(mark.value)
                    .map(|d| d.format("%m-%d").to_string())
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                let plot_points: PlotPoints = points
                    .iter()
                    .map(|p| [date_to_x(p.date), p.value])
                    .collect();
                let mut line = Line::new(plot_points).color(color).width(1.5);
                if filled {
                    line = line.fill(0.0);
                }
                plot_ui.line(line);
            });
    }

    /// Draw ranked entities as vertical bars with name labels on the x-axis.
    pub fn draw_bars(
        ui: &mut egui::Ui,
        id: &str,
        entities: &[RankedEntity],
        color: Color32,
        height: f32,
    ) {
        let labels: Vec<String> = entities.iter().map(|e| e.name.clone()).collect();

        Plot::new(format!("bars_{id}"))
            .height(height)
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = entities
                    .iter()
                    .enumerate()
                    .map(|(i, e)| Bar::new(i as f64, e.value).width(0.6).fill(color.gamma_multiply(0.7)))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Draw one or more named date-keyed series with a legend (per-country
    /// detail chart).
    pub fn draw_series(
        ui: &mut egui::Ui,
        id: &str,
        series: &[(String, Vec<TrendPoint>)],
        height: f32,
    ) {
        Plot::new(format!("series_{id}"))
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_formatter(|mark, _range| {
                x_to_date(mark.value)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                for (i, (name, points)) in series.iter().enumerate() {
                    let color = SERIES_PALETTE[i % SERIES_PALETTE.len()];
                    let plot_points: PlotPoints = points
                        .iter()
                        .map(|p| [date_to_x(p.date), p.value])
                        .collect();
                    plot_ui.line(Line::new(plot_points).color(color).width(1.5).name(name));
                }
            });
    }
}
