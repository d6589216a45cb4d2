use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_county_field() -> String { "County".to_string() }

fn default_name_properties() -> Vec<String> { vec!["NAME".to_string(), "name".to_string()] }

/// One tabular source and how its columns map onto metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// File path (relative to the config directory) or http(s) URL.
    pub path: String,
    /// Header of the column holding the county name.
    #[serde(default = "default_county_field")]
    pub county_field: String,
    /// Optional renames: CSV header -> metric name. Unlisted headers keep their text.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    /// Metric identifiers offered for selection from this source.
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl SourceSpec {
    pub fn new(path: impl Into<String>, metrics: &[&str]) -> Self {
        Self {
            path: path.into(),
            county_field: default_county_field(),
            columns: BTreeMap::new(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_county_field(mut self, field: impl Into<String>) -> Self {
        self.county_field = field.into();
        self
    }

    pub fn with_column(mut self, header: impl Into<String>, metric: impl Into<String>) -> Self {
        self.columns.insert(header.into(), metric.into());
        self
    }

    /// Metric name a CSV header resolves to.
    pub fn metric_name<'a>(&'a self, header: &'a str) -> &'a str {
        self.columns.get(header).map(String::as_str).unwrap_or(header)
    }
}

/// Which geography to draw and where each selectable metric comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub geography: String,
    /// Feature property keys holding the county name, checked in order.
    #[serde(default = "default_name_properties")]
    pub name_properties: Vec<String>,
    pub sources: Vec<SourceSpec>,
}

impl MapConfig {
    /// Layout of the California county map: CalEnviroScreen percentiles plus
    /// three housing-assistance tables.
    pub fn california() -> Self {
        Self {
            geography: "data/california-counties.geojson".to_string(),
            name_properties: default_name_properties(),
            sources: vec![
                SourceSpec::new("data/calenviroscreen.csv", &[
                    "Ozone Pctl",
                    "Drinking Water Pctl",
                    "Lead Pctl",
                    "Pollution Burden Pctl",
                    "Poverty Pctl",
                ]),
                SourceSpec::new("data/lowincome.csv", &["lowincome"]),
                SourceSpec::new("data/section8.csv", &["section8"]),
                SourceSpec::new("data/section221.csv", &["section221"]),
            ],
        }
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::from_json_str(&text, &path.display().to_string())
    }

    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_str(text)
            .map_err(|source| ConfigError::Parse { path: origin.to_string(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs where a metric identifier would be ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() { return Err(ConfigError::NoSources) }

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for source in &self.sources {
            for metric in &source.metrics {
                if let Some(first) = seen.insert(metric.as_str(), source.path.as_str()) {
                    if first != source.path.as_str() {
                        return Err(ConfigError::DuplicateMetric {
                            metric: metric.clone(),
                            first: first.to_string(),
                            second: source.path.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Selectable metric identifiers in declaration order.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().flat_map(|s| s.metrics.iter().map(String::as_str))
    }

    /// Position of the source declaring `metric`.
    pub fn source_index(&self, metric: &str) -> Result<usize, ConfigError> {
        self.sources.iter()
            .position(|s| s.metrics.iter().any(|m| m == metric))
            .ok_or_else(|| ConfigError::UnknownMetric(metric.to_string()))
    }

    pub fn source_for(&self, metric: &str) -> Result<&SourceSpec, ConfigError> {
        Ok(&self.sources[self.source_index(metric)?])
    }
}

impl Default for MapConfig {
    fn default() -> Self { Self::california() }
}
