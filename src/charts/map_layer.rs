//! Presentation Adapter Module
//! Shapes aggregate frames into the typed rows the map and chart widgets
//! consume: derived marker radius, region color, plain value rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use egui::Color32;
use polars::prelude::DataFrame;

use crate::charts::palette::{region_color, FALLBACK_REGION_COLOR};
use crate::data::schema;
use crate::stats::{AggregateError, Aggregator, VALUE};

/// Linear marker sizing for one view: radius = value / divisor, floored at
/// `min_radius` so small entities stay visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerScale {
    pub divisor: f64,
    pub min_radius: f64,
}

/// Per-view scales, tuned for the typical magnitude of each measure.
pub const CASES_MAP_SCALE: MarkerScale = MarkerScale {
    divisor: 20.0,
    min_radius: 1.0,
};
pub const DEATHS_MAP_SCALE: MarkerScale = MarkerScale {
    divisor: 50.0,
    min_radius: 1.0,
};
pub const VACCINES_MAP_SCALE: MarkerScale = MarkerScale {
    divisor: 300.0,
    min_radius: 1.0,
};
pub const WORLD_OVERVIEW_SCALE: MarkerScale = MarkerScale {
    divisor: 1000.0,
    min_radius: 1.0,
};

impl MarkerScale {
    pub fn radius(&self, value: f64) -> f64 {
        (value / self.divisor).max(self.min_radius)
    }
}

/// One map marker: an entity's position, reduced value, and derived
/// radius/color fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub code: String,
    pub name: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
    pub radius: f64,
    pub color: Color32,
}

/// One point of a date-keyed time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One entry of a ranked (top-N or per-region) bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntity {
    pub name: String,
    pub value: f64,
}

/// One row of the latest-snapshot table.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub name: String,
    pub region: String,
    pub values: Vec<Option<f64>>,
}

/// Shape an entity-totals frame into map markers. Rows missing coordinates
/// or a value are skipped; a region outside the fixed palette falls back to
/// a neutral color and is logged once per pass.
pub fn map_markers(totals: &DataFrame, scale: MarkerScale) -> Result<Vec<MapMarker>, AggregateError> {
    let codes = Aggregator::column_str(totals, schema::COUNTRY_CODE)?;
    let names = Aggregator::column_str(totals, schema::COUNTRY)?;
    let regions = Aggregator::column_str(totals, schema::CONTINENT)?;
    let latitudes = Aggregator::column_f64(totals, schema::LATITUDE)?;
    let longitudes = Aggregator::column_f64(totals, schema::LONGITUDE)?;
    let values = Aggregator::column_f64(totals, VALUE)?;

    let mut unmapped: HashSet<String> = HashSet::new();
    let mut markers = Vec::with_capacity(totals.height());

    for i in 0..totals.height() {
        let (Some(latitude), Some(longitude), Some(value)) =
            (latitudes[i], longitudes[i], values[i])
        else {
            continue;
        };
        let region = regions[i].clone().unwrap_or_default();

        let color = region_color(&region).unwrap_or_else(|| {
            if unmapped.insert(region.clone()) {
                tracing::warn!("No palette entry for region '{}', using fallback", region);
            }
            FALLBACK_REGION_COLOR
        });

        markers.push(MapMarker {
            code: codes[i].clone().unwrap_or_default(),
            name: names[i].clone().unwrap_or_default(),
            region,
            latitude,
            longitude,
            value,
            radius: scale.radius(value),
            color,
        });
    }

    Ok(markers)
}

/// Shape a date-grouped frame (a `value` column keyed by date) into a series.
pub fn trend_points(trend: &DataFrame) -> Result<Vec<TrendPoint>, AggregateError> {
    series_points(trend, VALUE)
}

/// Shape one measure of an entity-series frame into a dated series.
pub fn series_points(df: &DataFrame, measure: &str) -> Result<Vec<TrendPoint>, AggregateError> {
    let dates = Aggregator::column_dates(df, schema::DATE)?;
    let values = Aggregator::column_f64(df, measure)?;

    Ok(dates
        .into_iter()
        .zip(values)
        .filter_map(|(date, value)| {
            Some(TrendPoint {
                date: date?,
                value: value?,
            })
        })
        .collect())
}

/// Shape a ranked frame (top-N or region totals) into bar entries, keeping
/// the frame's order.
pub fn ranked_entities(ranked: &DataFrame, name_col: &str) -> Result<Vec<RankedEntity>, AggregateError> {
    let names = Aggregator::column_str(ranked, name_col)?;
    let values = Aggregator::column_f64(ranked, VALUE)?;

    Ok(names
        .into_iter()
        .zip(values)
        .filter_map(|(name, value)| {
            Some(RankedEntity {
                name: name?,
                value: value?,
            })
        })
        .collect())
}

/// Shape the latest snapshot into table rows carrying the given measures.
pub fn snapshot_rows(
    snapshot: &DataFrame,
    measures: &[&str],
) -> Result<Vec<SnapshotRow>, AggregateError> {
    let names = Aggregator::column_str(snapshot, schema::COUNTRY)?;
    let regions = Aggregator::column_str(snapshot, schema::CONTINENT)?;
    let mut measure_columns = Vec::with_capacity(measures.len());
    for measure in measures {
        measure_columns.push(Aggregator::column_f64(snapshot, measure)?);
    }

    let mut rows = Vec::with_capacity(snapshot.height());
    for i in 0..snapshot.height() {
        rows.push(SnapshotRow {
            name: names[i].clone().unwrap_or_default(),
            region: regions[i].clone().unwrap_or_default(),
            values: measure_columns.iter().map(|c| c[i]).collect(),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn radius_is_linear_with_a_floor() {
        assert_eq!(CASES_MAP_SCALE.radius(200.0), 10.0);
        assert_eq!(CASES_MAP_SCALE.radius(0.0), 1.0);
        assert_eq!(VACCINES_MAP_SCALE.radius(900.0), 3.0);
        assert_eq!(WORLD_OVERVIEW_SCALE.radius(500.0), 1.0);
    }

    fn totals_frame() -> DataFrame {
        df![
            schema::COUNTRY_CODE => ["US", "FR", "ZZ"],
            schema::COUNTRY => ["United States", "France", "Nowhere"],
            schema::CONTINENT => ["NORTH_AMERICA", "Europe", "ATLANTIS"],
            schema::LATITUDE => [38.0, 46.2, 1.0],
            schema::LONGITUDE => [-97.0, 2.2, 1.0],
            VALUE => [200.0, 40.0, 10.0],
        ]
        .unwrap()
    }

    #[test]
    fn markers_carry_region_colors_with_fallback() {
        let markers = map_markers(&totals_frame(), CASES_MAP_SCALE).unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].color, region_color("NORTH_AMERICA").unwrap());
        // Mixed-case label still resolves.
        assert_eq!(markers[1].color, region_color("EUROPE").unwrap());
        // Unmapped region renders with the fallback, it is not dropped.
        assert_eq!(markers[2].color, FALLBACK_REGION_COLOR);
        assert_eq!(markers[0].radius, 10.0);
    }

    #[test]
    fn markers_skip_rows_without_a_value() {
        let totals = df![
            schema::COUNTRY_CODE => ["US", "FR"],
            schema::COUNTRY => ["United States", "France"],
            schema::CONTINENT => ["NORTH_AMERICA", "EUROPE"],
            schema::LATITUDE => [38.0, 46.2],
            schema::LONGITUDE => [-97.0, 2.2],
            VALUE => [Some(200.0), None],
        ]
        .unwrap();
        let markers = map_markers(&totals, CASES_MAP_SCALE).unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code, "US");
    }

    #[test]
    fn ranked_entities_keep_frame_order() {
        let ranked = df![
            schema::COUNTRY => ["Beta", "Alpha"],
            VALUE => [9.0, 4.0],
        ]
        .unwrap();
        let entities = ranked_entities(&ranked, schema::COUNTRY).unwrap();
        assert_eq!(entities[0].name, "Beta");
        assert_eq!(entities[1].name, "Alpha");
    }
}
