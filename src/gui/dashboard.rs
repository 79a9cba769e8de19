//! Dashboard View Widget
//! Central panel rendering one tab's computed view: map, metric tiles,
//! trend and ranking charts, country detail, and the snapshot table.

use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};

use crate::charts::{ChartPlotter, MapMarker, RankedEntity, SnapshotRow, TrendPoint};

const MAP_HEIGHT: f32 = 340.0;
const CHART_HEIGHT: f32 = 220.0;
const TREND_COLOR: Color32 = Color32::from_rgb(52, 152, 219);
const RANK_COLOR: Color32 = Color32::from_rgb(231, 76, 60);
const REGION_COLOR: Color32 = Color32::from_rgb(155, 89, 182);

/// Key figures for the selected country, taken from its latest row.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryMetrics {
    pub name: String,
    pub region: String,
    pub cumulative: f64,
    pub latest_new: Option<f64>,
}

/// Everything one render pass produced for the active tab.
#[derive(Default)]
pub struct ViewData {
    pub markers: Vec<MapMarker>,
    pub trend: Vec<TrendPoint>,
    pub trend_title: String,
    pub top: Vec<RankedEntity>,
    pub top_title: String,
    pub region_totals: Vec<RankedEntity>,
    pub snapshot: Vec<SnapshotRow>,
    pub measure_labels: Vec<String>,
    pub country_series: Vec<(String, Vec<TrendPoint>)>,
    pub country_metrics: Option<CountryMetrics>,
    pub latest_date: Option<NaiveDate>,
    pub filtered_rows: usize,
}

/// Central dashboard area for one tab.
pub struct DashboardView {
    pub data: Option<ViewData>,
    sort_col: usize,
    sort_desc: bool,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            data: None,
            sort_col: 2,
            sort_desc: true,
        }
    }
}

/// Format a count with thousands separators ("1,234,567").
pub fn format_count(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn set_data(&mut self, data: ViewData) {
        self.data = Some(data);
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let rows = self.sorted_rows();
        let (sort_col, sort_desc) = (self.sort_col, self.sort_desc);
        let mut clicked: Option<usize> = None;

        let Some(data) = &self.data else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };
        let header = match data.latest_date {
            Some(date) => format!(
                "Latest data: {date} ({} rows in range)",
                format_count(data.filtered_rows as f64)
            ),
            None => "No rows match the current filters".to_string(),
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new(header)
                        .size(13.0)
                        .color(Color32::from_rgb(40, 167, 69)),
                );
                ui.add_space(8.0);

                Self::card(ui, "🌍 Map", |ui| {
                    ChartPlotter::draw_map(ui, "dashboard", &data.markers, MAP_HEIGHT);
                });
                ui.add_space(10.0);

                if let Some(metrics) = &data.country_metrics {
                    ui.horizontal(|ui| {
                        Self::metric_tile(
                            ui,
                            &format!("Total, {}", metrics.name),
                            &format_count(metrics.cumulative),
                            metrics
                                .latest_new
                                .map(|v| format!("+{} latest", format_count(v))),
                        );
                        Self::metric_tile(ui, "Region", &metrics.region, None);
                    });
                    ui.add_space(10.0);
                }

                ui.columns(2, |columns| {
                    Self::card(&mut columns[0], &data.trend_title, |ui| {
                        ChartPlotter::draw_trend(
                            ui,
                            "recent",
                            &data.trend,
                            TREND_COLOR,
                            true,
                            CHART_HEIGHT,
                        );
                    });
                    Self::card(&mut columns[1], &data.top_title, |ui| {
                        ChartPlotter::draw_bars(ui, "top", &data.top, RANK_COLOR, CHART_HEIGHT);
                    });
                });
                ui.add_space(10.0);

                ui.columns(2, |columns| {
                    Self::card(&mut columns[0], "Totals by region (latest)", |ui| {
                        ChartPlotter::draw_bars(
                            ui,
                            "regions",
                            &data.region_totals,
                            REGION_COLOR,
                            CHART_HEIGHT,
                        );
                    });
                    if !data.country_series.is_empty() {
                        Self::card(&mut columns[1], "Country detail", |ui| {
                            ChartPlotter::draw_series(
                                ui,
                                "country",
                                &data.country_series,
                                CHART_HEIGHT,
                            );
                        });
                    }
                });
                ui.add_space(10.0);

                Self::card(ui, "🔢 Latest data by country", |ui| {
                    egui::Grid::new("snapshot_table")
                        .striped(true)
                        .min_col_width(90.0)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            let mut headers = vec!["Country".to_string(), "Region".to_string()];
                            headers.extend(data.measure_labels.iter().cloned());
                            for (i, title) in headers.iter().enumerate() {
                                let marker = if i == sort_col {
                                    if sort_desc {
                                        " ▼"
                                    } else {
                                        " ▲"
                                    }
                                } else {
                                    ""
                                };
                                if ui
                                    .button(
                                        RichText::new(format!("{title}{marker}"))
                                            .strong()
                                            .size(11.0),
                                    )
                                    .clicked()
                                {
                                    clicked = Some(i);
                                }
                            }
                            ui.end_row();

                            for row in &rows {
                                ui.label(RichText::new(&row.name).size(11.0));
                                ui.label(RichText::new(&row.region).size(11.0));
                                for value in &row.values {
                                    match value {
                                        Some(v) => {
                                            ui.label(RichText::new(format_count(*v)).size(11.0))
                                        }
                                        None => ui.label(RichText::new("-").size(11.0)),
                                    };
                                }
                                ui.end_row();
                            }
                        });
                });
            });

        if let Some(col) = clicked {
            if col == self.sort_col {
                self.sort_desc = !self.sort_desc;
            } else {
                self.sort_col = col;
                self.sort_desc = true;
            }
        }
    }

    /// Snapshot rows under the current sort order.
    fn sorted_rows(&self) -> Vec<SnapshotRow> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        let mut rows = data.snapshot.clone();
        match self.sort_col {
            0 => rows.sort_by(|a, b| a.name.cmp(&b.name)),
            1 => rows.sort_by(|a, b| a.region.cmp(&b.region)),
            col => {
                let idx = col - 2;
                rows.sort_by(|a, b| {
                    let av = a.values.get(idx).copied().flatten();
                    let bv = b.values.get(idx).copied().flatten();
                    av.partial_cmp(&bv).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
        if self.sort_desc {
            rows.reverse();
        }
        rows
    }

    fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(RichText::new(title).size(14.0).strong());
                ui.add_space(6.0);
                add_contents(ui);
            });
    }

    fn metric_tile(ui: &mut egui::Ui, label: &str, value: &str, delta: Option<String>) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(RichText::new(label).size(11.0).color(Color32::GRAY));
                    ui.label(RichText::new(value).size(20.0).strong());
                    if let Some(delta) = delta {
                        ui.label(
                            RichText::new(delta)
                                .size(11.0)
                                .color(Color32::from_rgb(220, 53, 69)),
                        );
                    }
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_grouped_by_thousands() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1234.0), "1,234");
        assert_eq!(format_count(1_234_567.0), "1,234,567");
        assert_eq!(format_count(-4500.0), "-4,500");
    }

    #[test]
    fn rows_sort_by_measure_descending_by_default() {
        let mut view = DashboardView::new();
        view.set_data(ViewData {
            snapshot: vec![
                SnapshotRow {
                    name: "France".to_string(),
                    region: "EUROPE".to_string(),
                    values: vec![Some(3.0)],
                },
                SnapshotRow {
                    name: "United States".to_string(),
                    region: "NORTH_AMERICA".to_string(),
                    values: vec![Some(15.0)],
                },
            ],
            measure_labels: vec!["Cumulative cases".to_string()],
            ..Default::default()
        });

        let rows = view.sorted_rows();
        assert_eq!(rows[0].name, "United States");
        assert_eq!(rows[1].name, "France");
    }
}
