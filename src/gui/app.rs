//! Epidash Main Application
//! Tabbed main window: one dashboard per dataset (cases, deaths, vaccines),
//! each with a control panel, background loading, and background
//! recomputation of the view.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use chrono::Duration;
use egui::SidePanel;
use polars::prelude::DataFrame;
use rayon::prelude::*;

use crate::charts::{
    export_overview_png, map_markers, ranked_entities, series_points, snapshot_rows, trend_points,
    MarkerScale, TrendPoint, CASES_MAP_SCALE, DEATHS_MAP_SCALE, VACCINES_MAP_SCALE,
    WORLD_OVERVIEW_SCALE,
};
use crate::data::schema::{
    self, CUMULATIVE_CASES, CUMULATIVE_DEATHS, FIRST_DOSES, BOOSTER_DOSES, NEW_CASES, NEW_DEATHS,
};
use crate::data::{load_frame, unique_values, DataLoader, DatasetSchema, FilterCriteria, RegionFilter};
use crate::gui::control_panel::{
    ControlPanel, ControlPanelAction, UserSettings, ALL_REGIONS, NO_COUNTRY,
};
use crate::gui::dashboard::{format_count, CountryMetrics, DashboardView, ViewData};
use crate::stats::{Aggregator, MetricKind};

/// Static description of one dashboard tab.
#[derive(Clone, Copy)]
struct TabConfig {
    title: &'static str,
    /// Per-period measure, when the dataset carries one.
    incremental: Option<&'static str>,
    /// Running-total measure used for cumulative views.
    cumulative: &'static str,
    /// Measures shown in the snapshot table and the country detail chart.
    measures: &'static [&'static str],
    map_scale: MarkerScale,
}

const TABS: [TabConfig; 3] = [
    TabConfig {
        title: "Cases",
        incremental: Some(NEW_CASES),
        cumulative: CUMULATIVE_CASES,
        measures: &[NEW_CASES, CUMULATIVE_CASES, NEW_DEATHS, CUMULATIVE_DEATHS],
        map_scale: CASES_MAP_SCALE,
    },
    TabConfig {
        title: "Deaths",
        incremental: Some(NEW_DEATHS),
        cumulative: CUMULATIVE_DEATHS,
        measures: &[NEW_DEATHS, CUMULATIVE_DEATHS],
        map_scale: DEATHS_MAP_SCALE,
    },
    TabConfig {
        title: "Vaccines",
        incremental: None,
        cumulative: FIRST_DOSES,
        measures: &[FIRST_DOSES, BOOSTER_DOSES],
        map_scale: VACCINES_MAP_SCALE,
    },
];

fn default_schema(title: &str) -> DatasetSchema {
    match title {
        "Deaths" => DatasetSchema::localized_deaths(),
        "Vaccines" => DatasetSchema::vaccinations(),
        _ => DatasetSchema::who_global(),
    }
}

/// CSV loading result from background thread.
enum LoadResult {
    Complete { df: DataFrame },
    Error(String),
}

/// Calculation result from background thread.
enum CalcResult {
    Progress(f32, String),
    Complete(Box<ViewData>),
    Error(String),
}

/// Runtime state of one tab.
struct TabState {
    config: TabConfig,
    dataset: DatasetSchema,
    loader: DataLoader,
    control_panel: ControlPanel,
    view: DashboardView,

    load_rx: Option<Receiver<LoadResult>>,
    calc_rx: Option<Receiver<CalcResult>>,
    is_loading: bool,
    is_calculating: bool,
    needs_recompute: bool,
}

impl TabState {
    fn new(config: TabConfig) -> Self {
        let mut control_panel = ControlPanel::new();
        control_panel.has_incremental = config.incremental.is_some();
        Self {
            config,
            dataset: default_schema(config.title),
            loader: DataLoader::new(),
            control_panel,
            view: DashboardView::new(),
            load_rx: None,
            calc_rx: None,
            is_loading: false,
            is_calculating: false,
            needs_recompute: false,
        }
    }

    /// Handle CSV file selection and start a background load.
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel.settings.csv_path = Some(path.clone());
            self.start_load(path);
        }
    }

    fn start_load(&mut self, path: PathBuf) {
        self.view.clear();
        self.control_panel.set_progress(0.0, "Loading CSV file…");
        self.is_loading = true;

        let (tx, rx): (Sender<LoadResult>, Receiver<LoadResult>) = channel();
        self.load_rx = Some(rx);
        let dataset = self.dataset.clone();

        thread::spawn(move || {
            let result = match load_frame(&path, &dataset) {
                Ok(df) => LoadResult::Complete { df },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Handle column-mapping selection: parse the JSON file and reload the
    /// current CSV against the new mapping, if one is loaded.
    fn handle_browse_schema(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON Files", &["json"])
            .pick_file()
        else {
            return;
        };

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| DatasetSchema::from_json(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(dataset) => {
                self.dataset = dataset;
                if let Some(csv) = self.control_panel.settings.csv_path.clone() {
                    self.start_load(csv);
                } else {
                    self.control_panel
                        .set_progress(0.0, "Column mapping loaded");
                }
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Mapping error: {e}"));
            }
        }
    }

    /// Check for CSV loading results.
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Complete { df } => {
                        let regions = unique_values(&df, schema::CONTINENT);
                        let countries = unique_values(&df, schema::COUNTRY);
                        let span = Aggregator::date_span(&df);
                        let rows = df.height();
                        self.loader.set_dataframe(df);
                        self.control_panel.update_data(regions, countries, span);
                        self.control_panel
                            .set_progress(0.0, &format!("Loaded {} rows", format_count(rows as f64)));
                        self.is_loading = false;
                        self.needs_recompute = true;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {error}"));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Start recomputing the view in a background thread.
    fn start_calculation(&mut self) {
        let Some(df) = self.loader.get_dataframe().cloned() else {
            return;
        };
        let settings = self.control_panel.settings.clone();
        let config = self.config;

        let (tx, rx) = channel();
        self.calc_rx = Some(rx);
        self.is_calculating = true;
        self.needs_recompute = false;
        self.control_panel.set_progress(5.0, "Filtering data…");

        thread::spawn(move || {
            let _ = tx.send(CalcResult::Progress(30.0, "Aggregating…".to_string()));
            match compute_view(&df, &settings, config) {
                Ok(view) => {
                    let _ = tx.send(CalcResult::Complete(Box::new(view)));
                }
                Err(e) => {
                    let _ = tx.send(CalcResult::Error(e));
                }
            }
        });
    }

    /// Check for calculation results.
    fn check_calculation_results(&mut self) {
        let rx = self.calc_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    CalcResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    CalcResult::Complete(view) => {
                        self.control_panel.set_progress(100.0, "Up to date");
                        self.view.set_data(*view);
                        self.is_calculating = false;
                        should_keep_receiver = false;
                    }
                    CalcResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {error}"));
                        self.is_calculating = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.calc_rx = Some(rx);
            }
        }
    }

    /// Export the current trend and ranking charts to a PNG file.
    fn handle_export(&mut self) {
        let Some(data) = &self.view.data else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("epidash_{}.png", self.config.title.to_lowercase()))
            .save_file()
        else {
            return;
        };

        match export_overview_png(&path, self.config.title, &data.trend, &data.top) {
            Ok(()) => {
                self.control_panel
                    .set_progress(100.0, &format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    tracing::warn!("Could not open exported chart: {e}");
                }
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Export error: {e}"));
            }
        }
    }
}

fn measure_label(name: &str) -> String {
    let text = name.replace('_', " ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => text,
    }
}

/// One full render pass: filter, aggregate, and shape the active dataset.
/// Pure function of (frame, settings, config).
fn compute_view(
    df: &DataFrame,
    settings: &UserSettings,
    config: TabConfig,
) -> Result<ViewData, String> {
    let Some((min_date, _)) = Aggregator::date_span(df) else {
        return Ok(ViewData::default());
    };

    let from = min_date + Duration::days(settings.from_offset);
    let until = min_date + Duration::days(settings.until_offset);
    let mut criteria = FilterCriteria::new(from, until)
        .with_region(RegionFilter::from_selection(&settings.region, ALL_REGIONS));
    if settings.exclude_zero_coordinates {
        criteria = criteria.excluding_zero_coordinates();
    }
    let filtered = criteria.apply(df).map_err(|e| e.to_string())?;

    let metric = if config.incremental.is_some() {
        settings.metric
    } else {
        MetricKind::Cumulative
    };
    let map_measure = match (metric, config.incremental) {
        (MetricKind::Incremental, Some(measure)) => measure,
        _ => config.cumulative,
    };
    // Running totals dwarf per-period counts; the cumulative view of a
    // dataset that also has an incremental measure uses the heavier divisor.
    let map_scale = match (metric, config.incremental) {
        (MetricKind::Cumulative, Some(_)) => WORLD_OVERVIEW_SCALE,
        _ => config.map_scale,
    };

    let totals =
        Aggregator::entity_totals(&filtered, map_measure, metric).map_err(|e| e.to_string())?;
    let markers = map_markers(&totals, map_scale).map_err(|e| e.to_string())?;

    let latest = Aggregator::date_span(&filtered).map(|(_, max)| max);
    let (trend, top) = match latest {
        Some(latest_date) => {
            let window_start = latest_date - Duration::days(settings.recent_window - 1);
            let recent = FilterCriteria::new(window_start.max(from), latest_date)
                .apply(&filtered)
                .map_err(|e| e.to_string())?;

            let trend_measure = config.incremental.unwrap_or(config.cumulative);
            let trend_frame =
                Aggregator::daily_trend(&recent, trend_measure).map_err(|e| e.to_string())?;
            let trend = trend_points(&trend_frame).map_err(|e| e.to_string())?;

            let top_frame = match config.incremental {
                Some(measure) => Aggregator::top_entities(&recent, measure, settings.top_n)
                    .map_err(|e| e.to_string())?,
                None => Aggregator::top_entities_latest(&filtered, config.cumulative, settings.top_n)
                    .map_err(|e| e.to_string())?,
            };
            let top = ranked_entities(&top_frame, schema::COUNTRY).map_err(|e| e.to_string())?;

            (trend, top)
        }
        None => (Vec::new(), Vec::new()),
    };

    let region_frame =
        Aggregator::region_totals(&filtered, config.cumulative).map_err(|e| e.to_string())?;
    let region_totals =
        ranked_entities(&region_frame, schema::CONTINENT).map_err(|e| e.to_string())?;

    let snapshot_frame = Aggregator::latest_snapshot(&filtered).map_err(|e| e.to_string())?;
    let snapshot = snapshot_rows(&snapshot_frame, config.measures).map_err(|e| e.to_string())?;
    let measure_labels = config.measures.iter().map(|m| measure_label(m)).collect();

    let (country_series, country_metrics) = if settings.country != NO_COUNTRY {
        let series_frame =
            Aggregator::entity_series(&filtered, &settings.country).map_err(|e| e.to_string())?;
        let series: Vec<(String, Vec<TrendPoint>)> = config
            .measures
            .par_iter()
            .map(|measure| {
                let points = series_points(&series_frame, measure).unwrap_or_default();
                (measure_label(measure), points)
            })
            .collect();
        let metrics = country_metrics_from(&snapshot_frame, settings, config);
        (series, metrics)
    } else {
        (Vec::new(), None)
    };

    Ok(ViewData {
        markers,
        trend,
        trend_title: format!("Recent trend ({}d)", settings.recent_window),
        top,
        top_title: format!("Top {} countries", settings.top_n),
        region_totals,
        snapshot,
        measure_labels,
        country_series,
        country_metrics,
        latest_date: latest,
        filtered_rows: filtered.height(),
    })
}

fn country_metrics_from(
    snapshot: &DataFrame,
    settings: &UserSettings,
    config: TabConfig,
) -> Option<CountryMetrics> {
    let names = Aggregator::column_str(snapshot, schema::COUNTRY).ok()?;
    let index = names
        .iter()
        .position(|n| n.as_deref() == Some(settings.country.as_str()))?;

    let regions = Aggregator::column_str(snapshot, schema::CONTINENT).ok()?;
    let cumulative = Aggregator::column_f64(snapshot, config.cumulative).ok()?[index]?;
    let latest_new = config
        .incremental
        .and_then(|m| Aggregator::column_f64(snapshot, m).ok())
        .and_then(|values| values[index]);

    Some(CountryMetrics {
        name: settings.country.clone(),
        region: regions[index].clone().unwrap_or_default(),
        cumulative,
        latest_new,
    })
}

/// Main application window.
pub struct EpidashApp {
    tabs: Vec<TabState>,
    active: usize,
}

impl EpidashApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            tabs: TABS.iter().map(|config| TabState::new(*config)).collect(),
            active: 0,
        }
    }
}

impl eframe::App for EpidashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results on every tab, not just the visible one.
        for tab in &mut self.tabs {
            tab.check_load_results();
            tab.check_calculation_results();
            if tab.needs_recompute && !tab.is_calculating && !tab.is_loading {
                tab.start_calculation();
            }
        }

        if self.tabs.iter().any(|t| t.is_loading || t.is_calculating) {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (i, tab) in self.tabs.iter().enumerate() {
                    if ui
                        .selectable_label(self.active == i, tab.config.title)
                        .clicked()
                    {
                        self.active = i;
                    }
                }
            });
        });

        let tab = &mut self.tabs[self.active];

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = tab.control_panel.show(ui);
                    match action {
                        ControlPanelAction::BrowseCsv => tab.handle_browse_csv(),
                        ControlPanelAction::BrowseSchema => tab.handle_browse_schema(),
                        ControlPanelAction::SettingsChanged => tab.needs_recompute = true,
                        ControlPanelAction::ExportPng => tab.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            tab.view.show(ui);
        });
    }
}
