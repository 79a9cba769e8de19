//! Control Panel Widget
//! Left side panel with the filter controls for the active dashboard tab.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use egui::{Color32, ComboBox, RichText};

use crate::stats::MetricKind;

/// Sentinel entries for the selection combos.
pub const ALL_REGIONS: &str = "All";
pub const NO_COUNTRY: &str = "None";

/// Selectable recent-trend windows, in days.
pub const RECENT_WINDOWS: [i64; 3] = [7, 14, 28];

const MAX_TOP_N: usize = 20;

/// User selections driving one render pass.
#[derive(Clone, PartialEq)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub region: String,
    /// Date bounds as day offsets from the loaded minimum date (inclusive).
    pub from_offset: i64,
    pub until_offset: i64,
    pub metric: MetricKind,
    pub recent_window: i64,
    pub top_n: usize,
    pub country: String,
    pub exclude_zero_coordinates: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            csv_path: None,
            region: ALL_REGIONS.to_string(),
            from_offset: 0,
            until_offset: 0,
            metric: MetricKind::default(),
            recent_window: 28,
            top_n: 10,
            country: NO_COUNTRY.to_string(),
            exclude_zero_coordinates: true,
        }
    }
}

/// Action requested by the user this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    BrowseSchema,
    SettingsChanged,
    ExportPng,
}

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    /// Whether the active tab carries an incremental measure (enables the
    /// new-vs-cumulative toggle).
    pub has_incremental: bool,
    pub progress: f32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            regions: Vec::new(),
            countries: Vec::new(),
            date_span: None,
            has_incremental: true,
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the selectable values after a CSV load and reset the date
    /// sliders to the full loaded span.
    pub fn update_data(
        &mut self,
        regions: Vec<String>,
        countries: Vec<String>,
        date_span: Option<(NaiveDate, NaiveDate)>,
    ) {
        self.regions = regions;
        self.countries = countries;
        self.date_span = date_span;
        self.settings.from_offset = 0;
        self.settings.until_offset = self.span_days();
        if !self.regions.contains(&self.settings.region) {
            self.settings.region = ALL_REGIONS.to_string();
        }
        if !self.countries.contains(&self.settings.country) {
            self.settings.country = NO_COUNTRY.to_string();
        }
    }

    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }

    /// Number of days between the loaded min and max date.
    pub fn span_days(&self) -> i64 {
        self.date_span
            .map(|(min, max)| (max - min).num_days())
            .unwrap_or(0)
    }

    /// Calendar date for a slider offset.
    pub fn offset_date(&self, offset: i64) -> Option<NaiveDate> {
        self.date_span
            .map(|(min, _)| min + Duration::days(offset))
    }

    /// Draw the control panel, reporting the strongest action this frame.
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let mut changed = false;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌍 Epidash")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("COVID-19 Dashboard").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let path_text = self
                    .settings
                    .csv_path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "No file selected".to_string());
                ui.label(RichText::new(&path_text).size(12.0).color(
                    if self.settings.csv_path.is_some() {
                        Color32::WHITE
                    } else {
                        Color32::GRAY
                    },
                ));
                ui.horizontal(|ui| {
                    if ui.button("Browse CSV…").clicked() {
                        action = ControlPanelAction::BrowseCsv;
                    }
                    if ui.button("Column mapping…").clicked() {
                        action = ControlPanelAction::BrowseSchema;
                    }
                });
            });
        ui.add_space(10.0);

        // ===== Filters =====
        ui.label(RichText::new("🔎 Filters").size(14.0).strong());
        ui.add_space(5.0);
        let span = self.span_days();
        let date_span = self.date_span;
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Region").size(12.0));
                ComboBox::from_id_salt("region_select")
                    .selected_text(&self.settings.region)
                    .width(180.0)
                    .show_ui(ui, |ui| {
                        changed |= ui
                            .selectable_value(
                                &mut self.settings.region,
                                ALL_REGIONS.to_string(),
                                ALL_REGIONS,
                            )
                            .changed();
                        for region in &self.regions {
                            changed |= ui
                                .selectable_value(
                                    &mut self.settings.region,
                                    region.clone(),
                                    region,
                                )
                                .changed();
                        }
                    });
                ui.add_space(5.0);

                ui.add_enabled_ui(span > 0, |ui| {
                    ui.label(RichText::new("Date range").size(12.0));
                    changed |= ui
                        .add(egui::Slider::new(&mut self.settings.from_offset, 0..=span).text("from"))
                        .changed();
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut self.settings.until_offset, 0..=span)
                                .text("until"),
                        )
                        .changed();
                    if self.settings.until_offset < self.settings.from_offset {
                        self.settings.until_offset = self.settings.from_offset;
                    }
                    if let Some((min, _)) = date_span {
                        let from = min + Duration::days(self.settings.from_offset);
                        let until = min + Duration::days(self.settings.until_offset);
                        ui.label(
                            RichText::new(format!("{from} → {until}"))
                                .size(11.0)
                                .color(Color32::GRAY),
                        );
                    }
                });
                ui.add_space(5.0);

                changed |= ui
                    .checkbox(
                        &mut self.settings.exclude_zero_coordinates,
                        "Hide entries without coordinates",
                    )
                    .changed();
            });
        ui.add_space(10.0);

        // ===== Display =====
        ui.label(RichText::new("📊 Display").size(14.0).strong());
        ui.add_space(5.0);
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                if self.has_incremental {
                    ui.horizontal(|ui| {
                        changed |= ui
                            .radio_value(&mut self.settings.metric, MetricKind::Incremental, "New")
                            .changed();
                        changed |= ui
                            .radio_value(
                                &mut self.settings.metric,
                                MetricKind::Cumulative,
                                "Cumulative",
                            )
                            .changed();
                    });
                    ui.add_space(5.0);
                }

                ui.label(RichText::new("Recent trend window").size(12.0));
                ui.horizontal(|ui| {
                    for window in RECENT_WINDOWS {
                        changed |= ui
                            .radio_value(
                                &mut self.settings.recent_window,
                                window,
                                format!("{window}d"),
                            )
                            .changed();
                    }
                });
                ui.add_space(5.0);

                changed |= ui
                    .add(
                        egui::Slider::new(&mut self.settings.top_n, 3..=MAX_TOP_N)
                            .text("top countries"),
                    )
                    .changed();
                ui.add_space(5.0);

                ui.label(RichText::new("Country detail").size(12.0));
                ComboBox::from_id_salt("country_select")
                    .selected_text(&self.settings.country)
                    .width(180.0)
                    .show_ui(ui, |ui| {
                        changed |= ui
                            .selectable_value(
                                &mut self.settings.country,
                                NO_COUNTRY.to_string(),
                                NO_COUNTRY,
                            )
                            .changed();
                        for country in &self.countries {
                            changed |= ui
                                .selectable_value(
                                    &mut self.settings.country,
                                    country.clone(),
                                    country,
                                )
                                .changed();
                        }
                    });
            });
        ui.add_space(10.0);

        if ui.button("💾 Export charts as PNG").clicked() {
            action = ControlPanelAction::ExportPng;
        }

        ui.add_space(10.0);
        ui.separator();
        ui.add(egui::ProgressBar::new(self.progress / 100.0).show_percentage());
        ui.label(RichText::new(&self.status).size(11.0));

        if action == ControlPanelAction::None && changed {
            action = ControlPanelAction::SettingsChanged;
        }
        action
    }
}
