//! Filter Stage Module
//! Applies coordinate, date-range and region predicates to the loaded table.

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use crate::data::schema;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Region selector: everything, or a single continent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Only(String),
}

impl RegionFilter {
    /// Parse a UI selection where `label` is the "all regions" entry.
    pub fn from_selection(selected: &str, all_label: &str) -> Self {
        if selected == all_label {
            RegionFilter::All
        } else {
            RegionFilter::Only(selected.to_string())
        }
    }
}

/// Immutable filter criteria for one render pass.
///
/// Constructed from user input at the start of the pass and discarded after.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive date range, compared at day granularity.
    pub from: NaiveDate,
    pub until: NaiveDate,
    pub region: RegionFilter,
    /// Drop rows whose latitude is exactly zero, the dataset's sentinel for
    /// an unknown location.
    pub require_coordinates: bool,
}

impl FilterCriteria {
    pub fn new(from: NaiveDate, until: NaiveDate) -> Self {
        Self {
            from,
            until,
            region: RegionFilter::All,
            require_coordinates: false,
        }
    }

    pub fn with_region(mut self, region: RegionFilter) -> Self {
        self.region = region;
        self
    }

    pub fn excluding_zero_coordinates(mut self) -> Self {
        self.require_coordinates = true;
        self
    }

    /// Produce the working subset as a new frame. Input row ordering is
    /// preserved; an empty result is valid, not an error.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, FilterError> {
        let mut predicate = col(schema::DATE)
            .gt_eq(lit(self.from))
            .and(col(schema::DATE).lt_eq(lit(self.until)));

        if self.require_coordinates {
            predicate = col(schema::LATITUDE).neq(lit(0.0)).and(predicate);
        }

        if let RegionFilter::Only(region) = &self.region {
            predicate = predicate.and(col(schema::CONTINENT).eq(lit(region.as_str())));
        }

        let filtered = df.clone().lazy().filter(predicate).collect()?;
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    fn sample_frame() -> DataFrame {
        let df = df![
            schema::COUNTRY_CODE => ["US", "US", "FR", "XX"],
            schema::COUNTRY => ["United States", "United States", "France", "Unknown"],
            schema::CONTINENT => ["NORTH_AMERICA", "NORTH_AMERICA", "EUROPE", "EUROPE"],
            schema::DATE => ["2021-01-01", "2021-01-02", "2021-01-01", "2021-01-02"],
            schema::LATITUDE => [38.0, 38.0, 46.2, 0.0],
            schema::LONGITUDE => [-97.0, -97.0, 2.2, 0.0],
            schema::NEW_CASES => [10.0, 5.0, 3.0, 7.0],
        ]
        .unwrap();

        df.lazy()
            .with_columns([col(schema::DATE).str().to_date(StrptimeOptions {
                format: Some("%Y-%m-%d".into()),
                strict: true,
                ..Default::default()
            })])
            .collect()
            .unwrap()
    }

    #[test]
    fn date_range_is_inclusive_both_ends() {
        let df = sample_frame();
        let filtered = FilterCriteria::new(date("2021-01-01"), date("2021-01-02"))
            .apply(&df)
            .unwrap();
        assert_eq!(filtered.height(), 4);

        let single_day = FilterCriteria::new(date("2021-01-02"), date("2021-01-02"))
            .apply(&df)
            .unwrap();
        assert_eq!(single_day.height(), 2);
    }

    #[test]
    fn region_filter_keeps_only_matching_rows() {
        let df = sample_frame();
        let filtered = FilterCriteria::new(date("2021-01-01"), date("2021-01-02"))
            .with_region(RegionFilter::Only("EUROPE".to_string()))
            .apply(&df)
            .unwrap();
        assert_eq!(filtered.height(), 2);

        let codes = filtered.column(schema::COUNTRY_CODE).unwrap();
        let codes = codes.as_materialized_series().str().unwrap();
        assert_eq!(codes.get(0), Some("FR"));
        assert_eq!(codes.get(1), Some("XX"));
    }

    #[test]
    fn all_region_equals_unfiltered_set() {
        let df = sample_frame();
        let all = FilterCriteria::new(date("2021-01-01"), date("2021-01-02"))
            .with_region(RegionFilter::All)
            .apply(&df)
            .unwrap();
        let plain = FilterCriteria::new(date("2021-01-01"), date("2021-01-02"))
            .apply(&df)
            .unwrap();
        assert_eq!(all, plain);
    }

    #[test]
    fn zero_latitude_rows_are_dropped_when_requested() {
        let df = sample_frame();
        let filtered = FilterCriteria::new(date("2021-01-01"), date("2021-01-02"))
            .excluding_zero_coordinates()
            .apply(&df)
            .unwrap();
        assert_eq!(filtered.height(), 3);

        let lats = filtered.column(schema::LATITUDE).unwrap();
        assert!(lats
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .all(|v| v != 0.0));
    }

    #[test]
    fn collapsed_range_outside_data_yields_empty_not_error() {
        let df = sample_frame();
        let filtered = FilterCriteria::new(date("2020-06-01"), date("2020-06-01"))
            .apply(&df)
            .unwrap();
        assert_eq!(filtered.height(), 0);
    }

    #[test]
    fn region_selection_parses_all_label() {
        assert_eq!(RegionFilter::from_selection("All", "All"), RegionFilter::All);
        assert_eq!(
            RegionFilter::from_selection("ASIA", "All"),
            RegionFilter::Only("ASIA".to_string())
        );
    }
}
