//! Aggregation Stage Module
//! Reduces the filtered table into per-entity, per-date, and per-region
//! summaries ready for chart/map handoff.
//!
//! All operations assume the frame is sorted ascending by date, as produced
//! by the loader; filtering preserves that order.

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use crate::data::schema;

/// Canonical name of the reduced measure column in aggregate outputs.
pub const VALUE: &str = "value";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// How a measure is reduced per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Per-period counts (e.g. new cases): summed across the filtered range.
    Incremental,
    /// Running totals: the latest reported value is authoritative and is
    /// taken from the row at the entity's maximum date, never re-summed.
    Cumulative,
}

impl Default for MetricKind {
    fn default() -> Self {
        MetricKind::Incremental
    }
}

/// Handles the group/reduce operations of one render pass.
pub struct Aggregator;

impl Aggregator {
    /// One row per entity with the reduced measure in `value`. Continent and
    /// coordinates are constant per entity and pass through as group keys.
    pub fn entity_totals(
        df: &DataFrame,
        measure: &str,
        kind: MetricKind,
    ) -> Result<DataFrame, AggregateError> {
        let reduced = match kind {
            MetricKind::Incremental => col(measure).sum().alias(VALUE),
            MetricKind::Cumulative => col(measure).last().alias(VALUE),
        };

        let totals = df
            .clone()
            .lazy()
            .group_by_stable([
                col(schema::COUNTRY_CODE),
                col(schema::COUNTRY),
                col(schema::CONTINENT),
                col(schema::LATITUDE),
                col(schema::LONGITUDE),
            ])
            .agg([reduced])
            .collect()?;
        Ok(totals)
    }

    /// Time series: group by date only (entities ignored) and sum the
    /// measure, sorted by date.
    pub fn daily_trend(df: &DataFrame, measure: &str) -> Result<DataFrame, AggregateError> {
        let trend = df
            .clone()
            .lazy()
            .group_by_stable([col(schema::DATE)])
            .agg([col(measure).sum().alias(VALUE)])
            .sort([schema::DATE], SortMultipleOptions::default())
            .collect()?;
        Ok(trend)
    }

    /// The `n` entities with the largest summed measure, descending; ties
    /// keep their input order.
    pub fn top_entities(
        df: &DataFrame,
        measure: &str,
        n: usize,
    ) -> Result<DataFrame, AggregateError> {
        let ranked = df
            .clone()
            .lazy()
            .group_by_stable([col(schema::COUNTRY)])
            .agg([col(measure).sum().alias(VALUE)])
            .sort(
                [VALUE],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(n as IdxSize)
            .collect()?;
        Ok(ranked)
    }

    /// The `n` entities with the largest latest-reported value, descending.
    /// Used for cumulative measures, where summing across days would
    /// double-count.
    pub fn top_entities_latest(
        df: &DataFrame,
        measure: &str,
        n: usize,
    ) -> Result<DataFrame, AggregateError> {
        let ranked = df
            .clone()
            .lazy()
            .group_by_stable([col(schema::COUNTRY)])
            .agg([col(measure).last().alias(VALUE)])
            .sort(
                [VALUE],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(n as IdxSize)
            .collect()?;
        Ok(ranked)
    }

    /// One row per entity, taken at that entity's maximum date in range.
    pub fn latest_snapshot(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let snapshot = df
            .clone()
            .lazy()
            .group_by_stable([col(schema::COUNTRY_CODE)])
            .agg([all().last()])
            .collect()?;
        Ok(snapshot)
    }

    /// Continental breakdown: the latest snapshot grouped by region, summed.
    pub fn region_totals(df: &DataFrame, measure: &str) -> Result<DataFrame, AggregateError> {
        let snapshot = Self::latest_snapshot(df)?;
        let totals = snapshot
            .lazy()
            .group_by_stable([col(schema::CONTINENT)])
            .agg([col(measure).sum().alias(VALUE)])
            .sort([schema::CONTINENT], SortMultipleOptions::default())
            .collect()?;
        Ok(totals)
    }

    /// All rows of a single entity, by name (per-country detail chart).
    pub fn entity_series(df: &DataFrame, country: &str) -> Result<DataFrame, AggregateError> {
        let series = df
            .clone()
            .lazy()
            .filter(col(schema::COUNTRY).eq(lit(country)))
            .collect()?;
        Ok(series)
    }

    /// Float column as positionally-aligned optional values.
    pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AggregateError> {
        let values = df
            .column(name)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .collect();
        Ok(values)
    }

    /// String column as positionally-aligned optional values.
    pub fn column_str(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, AggregateError> {
        let values = df
            .column(name)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(values)
    }

    /// Date column as positionally-aligned optional calendar dates.
    pub fn column_dates(
        df: &DataFrame,
        name: &str,
    ) -> Result<Vec<Option<NaiveDate>>, AggregateError> {
        let values = df
            .column(name)?
            .as_materialized_series()
            .date()?
            .as_date_iter()
            .collect();
        Ok(values)
    }

    /// Minimum and maximum date present in the frame, if any rows exist.
    pub fn date_span(df: &DataFrame) -> Option<(NaiveDate, NaiveDate)> {
        let dates: Vec<NaiveDate> = Self::column_dates(df, schema::DATE)
            .ok()?
            .into_iter()
            .flatten()
            .collect();
        let min = dates.iter().min()?;
        let max = dates.iter().max()?;
        Some((*min, *max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FilterCriteria;
    use polars::prelude::*;

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    // The worked example: two US rows and one FR row over two days.
    fn sample_frame() -> DataFrame {
        let df = df![
            schema::COUNTRY_CODE => ["US", "FR", "US"],
            schema::COUNTRY => ["United States", "France", "United States"],
            schema::CONTINENT => ["NORTH_AMERICA", "EUROPE", "NORTH_AMERICA"],
            schema::DATE => ["2021-01-01", "2021-01-01", "2021-01-02"],
            schema::LATITUDE => [38.0, 46.2, 38.0],
            schema::LONGITUDE => [-97.0, 2.2, -97.0],
            schema::NEW_CASES => [10.0, 3.0, 5.0],
            schema::CUMULATIVE_CASES => [10.0, 3.0, 15.0],
        ]
        .unwrap();

        df.lazy()
            .with_columns([col(schema::DATE).str().to_date(StrptimeOptions {
                format: Some("%Y-%m-%d".into()),
                strict: true,
                ..Default::default()
            })])
            .sort([schema::DATE], SortMultipleOptions::default())
            .collect()
            .unwrap()
    }

    fn value_for(df: &DataFrame, key_col: &str, key: &str) -> Option<f64> {
        let keys = Aggregator::column_str(df, key_col).unwrap();
        let values = Aggregator::column_f64(df, VALUE).unwrap();
        keys.iter()
            .position(|k| k.as_deref() == Some(key))
            .and_then(|i| values[i])
    }

    #[test]
    fn incremental_totals_sum_the_filtered_rows() {
        let df = sample_frame();
        let totals =
            Aggregator::entity_totals(&df, schema::NEW_CASES, MetricKind::Incremental).unwrap();
        assert_eq!(totals.height(), 2);
        assert_eq!(value_for(&totals, schema::COUNTRY_CODE, "US"), Some(15.0));
        assert_eq!(value_for(&totals, schema::COUNTRY_CODE, "FR"), Some(3.0));
    }

    #[test]
    fn cumulative_totals_take_the_latest_reported_value() {
        let df = sample_frame();
        let totals =
            Aggregator::entity_totals(&df, schema::CUMULATIVE_CASES, MetricKind::Cumulative)
                .unwrap();
        assert_eq!(value_for(&totals, schema::COUNTRY_CODE, "US"), Some(15.0));
        assert_eq!(value_for(&totals, schema::COUNTRY_CODE, "FR"), Some(3.0));
    }

    #[test]
    fn cumulative_totals_ignore_the_lower_bound_while_max_date_stays() {
        let df = sample_frame();
        let narrow = FilterCriteria::new(date("2021-01-02"), date("2021-01-02"))
            .apply(&df)
            .unwrap();
        let totals =
            Aggregator::entity_totals(&narrow, schema::CUMULATIVE_CASES, MetricKind::Cumulative)
                .unwrap();
        assert_eq!(value_for(&totals, schema::COUNTRY_CODE, "US"), Some(15.0));
    }

    #[test]
    fn daily_trend_sums_across_entities() {
        let df = sample_frame();
        let trend = Aggregator::daily_trend(&df, schema::NEW_CASES).unwrap();
        assert_eq!(trend.height(), 2);

        let values = Aggregator::column_f64(&trend, VALUE).unwrap();
        assert_eq!(values, vec![Some(13.0), Some(5.0)]);

        let dates = Aggregator::column_dates(&trend, schema::DATE).unwrap();
        assert_eq!(dates[0], Some(date("2021-01-01")));
        assert_eq!(dates[1], Some(date("2021-01-02")));
    }

    #[test]
    fn top_entities_sorts_descending_and_caps_at_n() {
        let df = sample_frame();
        let top = Aggregator::top_entities(&df, schema::NEW_CASES, 5).unwrap();
        assert_eq!(top.height(), 2);
        let names = Aggregator::column_str(&top, schema::COUNTRY).unwrap();
        assert_eq!(names[0].as_deref(), Some("United States"));
        assert_eq!(names[1].as_deref(), Some("France"));

        let capped = Aggregator::top_entities(&df, schema::NEW_CASES, 1).unwrap();
        assert_eq!(capped.height(), 1);
    }

    #[test]
    fn top_entities_breaks_ties_by_input_order() {
        let df = df![
            schema::COUNTRY_CODE => ["AA", "BB", "CC"],
            schema::COUNTRY => ["Alpha", "Beta", "Gamma"],
            schema::CONTINENT => ["ASIA", "ASIA", "ASIA"],
            schema::DATE => ["2021-01-01", "2021-01-01", "2021-01-01"],
            schema::LATITUDE => [1.0, 2.0, 3.0],
            schema::LONGITUDE => [1.0, 2.0, 3.0],
            schema::NEW_CASES => [4.0, 9.0, 4.0],
        ]
        .unwrap()
        .lazy()
        .with_columns([col(schema::DATE).str().to_date(StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: true,
            ..Default::default()
        })])
        .collect()
        .unwrap();

        let top = Aggregator::top_entities(&df, schema::NEW_CASES, 3).unwrap();
        let names = Aggregator::column_str(&top, schema::COUNTRY).unwrap();
        assert_eq!(names[0].as_deref(), Some("Beta"));
        // Alpha and Gamma tie at 4.0; Alpha appeared first in the input.
        assert_eq!(names[1].as_deref(), Some("Alpha"));
        assert_eq!(names[2].as_deref(), Some("Gamma"));
    }

    #[test]
    fn top_entities_latest_ranks_by_latest_value_not_sum() {
        let df = sample_frame();
        let top =
            Aggregator::top_entities_latest(&df, schema::CUMULATIVE_CASES, 10).unwrap();
        assert_eq!(value_for(&top, schema::COUNTRY, "United States"), Some(15.0));
        assert_eq!(value_for(&top, schema::COUNTRY, "France"), Some(3.0));

        let names = Aggregator::column_str(&top, schema::COUNTRY).unwrap();
        assert_eq!(names[0].as_deref(), Some("United States"));
    }

    #[test]
    fn latest_snapshot_is_one_row_per_entity_at_max_date() {
        let df = sample_frame();
        let snapshot = Aggregator::latest_snapshot(&df).unwrap();
        assert_eq!(snapshot.height(), 2);
        assert_eq!(
            value_for_measure(&snapshot, "US", schema::CUMULATIVE_CASES),
            Some(15.0)
        );
        assert_eq!(
            value_for_measure(&snapshot, "FR", schema::CUMULATIVE_CASES),
            Some(3.0)
        );
    }

    fn value_for_measure(df: &DataFrame, code: &str, measure: &str) -> Option<f64> {
        let codes = Aggregator::column_str(df, schema::COUNTRY_CODE).unwrap();
        let values = Aggregator::column_f64(df, measure).unwrap();
        codes
            .iter()
            .position(|k| k.as_deref() == Some(code))
            .and_then(|i| values[i])
    }

    #[test]
    fn region_totals_sum_the_snapshot_per_continent() {
        let df = sample_frame();
        let totals = Aggregator::region_totals(&df, schema::CUMULATIVE_CASES).unwrap();
        assert_eq!(value_for(&totals, schema::CONTINENT, "EUROPE"), Some(3.0));
        assert_eq!(
            value_for(&totals, schema::CONTINENT, "NORTH_AMERICA"),
            Some(15.0)
        );
    }

    #[test]
    fn empty_input_flows_through_every_aggregation() {
        let df = sample_frame();
        let empty = FilterCriteria::new(date("2019-01-01"), date("2019-01-01"))
            .apply(&df)
            .unwrap();
        assert_eq!(empty.height(), 0);

        let totals =
            Aggregator::entity_totals(&empty, schema::NEW_CASES, MetricKind::Incremental).unwrap();
        assert_eq!(totals.height(), 0);
        assert_eq!(Aggregator::daily_trend(&empty, schema::NEW_CASES).unwrap().height(), 0);
        assert_eq!(Aggregator::top_entities(&empty, schema::NEW_CASES, 10).unwrap().height(), 0);
        assert_eq!(Aggregator::latest_snapshot(&empty).unwrap().height(), 0);
        assert!(Aggregator::date_span(&empty).is_none());
    }

    #[test]
    fn entity_series_selects_one_country_in_date_order() {
        let df = sample_frame();
        let series = Aggregator::entity_series(&df, "United States").unwrap();
        assert_eq!(series.height(), 2);
        let values = Aggregator::column_f64(&series, schema::NEW_CASES).unwrap();
        assert_eq!(values, vec![Some(10.0), Some(5.0)]);
    }

    #[test]
    fn date_span_reports_min_and_max() {
        let df = sample_frame();
        assert_eq!(
            Aggregator::date_span(&df),
            Some((date("2021-01-01"), date("2021-01-02")))
        );
    }
}
