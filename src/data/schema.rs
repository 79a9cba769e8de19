//! Dataset Column Mapping
//! Maps the column roles the pipeline needs onto the actual CSV headers,
//! which differ between dataset variants (WHO export vs. localized files).

use serde::{Deserialize, Serialize};

/// Canonical column names used throughout the pipeline after loading.
pub const COUNTRY_CODE: &str = "country_code";
pub const COUNTRY: &str = "country";
pub const CONTINENT: &str = "continent";
pub const DATE: &str = "date";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// Canonical measure names.
pub const NEW_CASES: &str = "new_cases";
pub const CUMULATIVE_CASES: &str = "cumulative_cases";
pub const NEW_DEATHS: &str = "new_deaths";
pub const CUMULATIVE_DEATHS: &str = "cumulative_deaths";
pub const FIRST_DOSES: &str = "first_doses";
pub const BOOSTER_DOSES: &str = "booster_doses";

/// One numeric measure column: the CSV header it is read from and the
/// canonical name it carries after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureMapping {
    pub header: String,
    pub name: String,
}

impl MeasureMapping {
    pub fn new(header: &str, name: &str) -> Self {
        Self {
            header: header.to_string(),
            name: name.to_string(),
        }
    }
}

/// Column-role mapping for one dataset variant.
///
/// `entity_code` is optional: some exports only carry a country name, in
/// which case the name column doubles as the grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub entity_code: Option<String>,
    pub entity_name: String,
    pub region: String,
    pub date: String,
    pub date_format: String,
    pub latitude: String,
    pub longitude: String,
    pub measures: Vec<MeasureMapping>,
}

impl DatasetSchema {
    /// WHO global data export with English headers.
    pub fn who_global() -> Self {
        Self {
            entity_code: Some("Country_code".to_string()),
            entity_name: "Country".to_string(),
            region: "continent".to_string(),
            date: "Date_reported".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            measures: vec![
                MeasureMapping::new("New_cases", NEW_CASES),
                MeasureMapping::new("Cumulative_cases", CUMULATIVE_CASES),
                MeasureMapping::new("New_deaths", NEW_DEATHS),
                MeasureMapping::new("Cumulative_deaths", CUMULATIVE_DEATHS),
            ],
        }
    }

    /// Localized deaths dataset (Korean headers, no country-code column).
    pub fn localized_deaths() -> Self {
        Self {
            entity_code: None,
            entity_name: "국가".to_string(),
            region: "대륙".to_string(),
            date: "날짜".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            latitude: "위도".to_string(),
            longitude: "경도".to_string(),
            measures: vec![
                MeasureMapping::new("신규_사망자", NEW_DEATHS),
                MeasureMapping::new("누적_사망자", CUMULATIVE_DEATHS),
            ],
        }
    }

    /// Vaccination dataset (first-dose and booster running totals).
    pub fn vaccinations() -> Self {
        Self {
            entity_code: Some("COUNTRY_CD".to_string()),
            entity_name: "COUNTRY_NM".to_string(),
            region: "AREA".to_string(),
            date: "DATE".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            measures: vec![
                MeasureMapping::new("총 1차 접종자 수", FIRST_DOSES),
                MeasureMapping::new("총 부스터 접종자 수", BOOSTER_DOSES),
            ],
        }
    }

    /// Parse a mapping from JSON, so a new dataset variant can be described
    /// in a config file instead of a code change.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Every (role, header) pair that must be present in the CSV.
    pub fn required_columns(&self) -> Vec<(&'static str, &str)> {
        let mut required: Vec<(&'static str, &str)> = Vec::new();
        if let Some(code) = &self.entity_code {
            required.push(("entity code", code));
        }
        required.push(("entity name", &self.entity_name));
        required.push(("region", &self.region));
        required.push(("date", &self.date));
        required.push(("latitude", &self.latitude));
        required.push(("longitude", &self.longitude));
        for m in &self.measures {
            required.push(("measure", &m.header));
        }
        required
    }

    /// Canonical names of the mapped measures, in mapping order.
    pub fn measure_names(&self) -> Vec<&str> {
        self.measures.iter().map(|m| m.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn who_schema_requires_every_mapped_header() {
        let schema = DatasetSchema::who_global();
        let required = schema.required_columns();
        assert!(required.iter().any(|(_, h)| *h == "Country_code"));
        assert!(required.iter().any(|(_, h)| *h == "Date_reported"));
        assert!(required.iter().any(|(_, h)| *h == "Cumulative_deaths"));
        assert_eq!(required.len(), 10);
    }

    #[test]
    fn schema_without_code_column_skips_it() {
        let schema = DatasetSchema::localized_deaths();
        assert!(schema
            .required_columns()
            .iter()
            .all(|(role, _)| *role != "entity code"));
    }

    #[test]
    fn json_round_trip() {
        let schema = DatasetSchema::vaccinations();
        let text = serde_json::to_string(&schema).unwrap();
        let parsed = DatasetSchema::from_json(&text).unwrap();
        assert_eq!(parsed, schema);
        assert_eq!(parsed.measure_names(), vec![FIRST_DOSES, BOOSTER_DOSES]);
    }
}
