//! Charts module - presentation shaping and rendering

mod export;
mod map_layer;
pub mod palette;
mod plotter;

pub use export::export_overview_png;
pub use map_layer::{
    map_markers, ranked_entities, series_points, snapshot_rows, trend_points, MapMarker,
    MarkerScale, RankedEntity, SnapshotRow, TrendPoint, CASES_MAP_SCALE, DEATHS_MAP_SCALE,
    VACCINES_MAP_SCALE, WORLD_OVERVIEW_SCALE,
};
pub use plotter::ChartPlotter;
