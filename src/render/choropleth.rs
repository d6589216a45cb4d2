use ahash::AHashSet;
use serde_json::Value;

use crate::{
    data::{Lookup, MetricIndex},
    geom::{Feature, FeatureStyle},
    normalize::{normalize, CountyKey},
    render::{ColorScale, NO_DATA},
};

/// Remembers which unmatched county keys were already reported, so a
/// mismatch is logged once per session rather than once per render.
#[derive(Debug, Default, Clone)]
pub struct KeyDiagnostics {
    warned: AHashSet<CountyKey>,
}

impl KeyDiagnostics {
    pub fn new() -> Self { Self::default() }

    /// Returns true the first time `key` is reported.
    fn report(&mut self, key: &CountyKey, name: &str) -> bool {
        if self.warned.contains(key) { return false }
        if key.is_empty() {
            tracing::warn!(name, "feature has no usable county name; styling as no data");
        } else {
            tracing::warn!(name, key = %key, "feature has no matching row in any loaded table");
        }
        self.warned.insert(key.clone());
        true
    }

    pub fn was_reported(&self, key: &CountyKey) -> bool { self.warned.contains(key) }

    pub fn reported(&self) -> usize { self.warned.len() }
}

/// Per-render tallies, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    /// Features colored from a finite value.
    pub colored: usize,
    /// Features whose county has a row but an unusable value.
    pub invalid: usize,
    /// Features with no row for this metric at all.
    pub unmatched: usize,
}

/// Style every feature for `metric`.
///
/// Each feature is normalized and looked up exactly once. Finite values get
/// `scale.color(v)` and `"<name>: <v>"`; missing or invalid values, or an
/// undefined domain, get [`NO_DATA`] and `"<name>: N/A"`. The displayed value
/// is written into the feature's properties under the metric name (`null`
/// when not shown). Rendering twice with the same inputs is a no-op.
pub fn render(
    features: &mut [Feature],
    name_keys: &[String],
    index: &MetricIndex,
    metric: &str,
    scale: &ColorScale,
    diagnostics: &mut KeyDiagnostics,
) -> RenderSummary {
    let mut summary = RenderSummary::default();

    for feature in features.iter_mut() {
        let name = feature.name(name_keys).map(str::trim).unwrap_or("").to_string();
        let key = normalize(&name);

        let lookup = if key.is_empty() { Lookup::Unmatched } else { index.lookup(&key, metric) };
        match lookup {
            Lookup::Value(_) => {}
            Lookup::Invalid(_) => summary.invalid += 1,
            Lookup::Absent => summary.unmatched += 1,
            Lookup::Unmatched => {
                summary.unmatched += 1;
                diagnostics.report(&key, &name);
            }
        }

        let shown = lookup.value().filter(|_| scale.domain().is_some());
        let style = match shown {
            Some(value) => {
                summary.colored += 1;
                FeatureStyle { fill: scale.color(value), label: format!("{name}: {value}") }
            }
            None => FeatureStyle { fill: NO_DATA, label: format!("{name}: N/A") },
        };

        feature.properties.insert(metric.to_string(), shown.map(Value::from).unwrap_or(Value::Null));
        feature.style = Some(style);
    }

    tracing::debug!(metric, colored = summary.colored, invalid = summary.invalid, unmatched = summary.unmatched, "rendered choropleth");
    summary
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};
    use serde_json::{json, Map};

    use super::*;
    use crate::{config::SourceSpec, data::RowTable, render::{compute_domain, Domain}};

    fn county(name: &str) -> Feature {
        let mut props = Map::new();
        props.insert("NAME".into(), json!(name));
        Feature::new(MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)]]), props)
    }

    fn keys() -> Vec<String> { vec!["NAME".to_string(), "name".to_string()] }

    fn index(csv: &str) -> MetricIndex {
        let spec = SourceSpec::new("t.csv", &[]);
        let table = RowTable::from_csv_bytes("t.csv", csv.as_bytes()).unwrap();
        MetricIndex::build([(&spec, &table)])
    }

    #[test]
    fn san_francisco_joins_and_renders_its_value() {
        let index = index("County,OzonePctl\nSan Francisco,42.5\nAlpine,10\n");
        let scale = ColorScale::new(compute_domain(&index, "OzonePctl"));
        let mut features = vec![county("San Francisco County")];
        let mut diag = KeyDiagnostics::new();

        let summary = render(&mut features, &keys(), &index, "OzonePctl", &scale, &mut diag);

        let style = features[0].style.as_ref().unwrap();
        assert_eq!(style.label, "San Francisco County: 42.5");
        assert_eq!(style.fill, scale.color(42.5));
        assert_ne!(style.fill, NO_DATA);
        assert_eq!(features[0].properties["OzonePctl"], json!(42.5));
        assert_eq!(summary, RenderSummary { colored: 1, invalid: 0, unmatched: 0 });
    }

    #[test]
    fn missing_and_invalid_values_render_as_no_data() {
        let index = index("County,m\nAlpine,5\nKings,n/a\n");
        let scale = ColorScale::new(compute_domain(&index, "m"));
        let mut features = vec![county("Kings"), county("Atlantis")];
        let mut diag = KeyDiagnostics::new();

        let summary = render(&mut features, &keys(), &index, "m", &scale, &mut diag);

        for feature in &features {
            assert_eq!(feature.style.as_ref().unwrap().fill, NO_DATA);
            assert_eq!(feature.properties["m"], Value::Null);
        }
        assert_eq!(features[0].style.as_ref().unwrap().label, "Kings: N/A");
        assert_eq!(summary, RenderSummary { colored: 0, invalid: 1, unmatched: 1 });
        assert!(diag.was_reported(&normalize("Atlantis")));
        assert!(!diag.was_reported(&normalize("Kings")));
    }

    #[test]
    fn known_county_missing_the_metric_is_not_reported() {
        let index = index("County,m,n\nAlpine,5,1\n");
        let scale = ColorScale::new(compute_domain(&index, "other"));
        let mut features = vec![county("Alpine"), county("Atlantis")];
        let mut diag = KeyDiagnostics::new();

        let summary = render(&mut features, &keys(), &index, "other", &scale, &mut diag);

        assert_eq!(summary, RenderSummary { colored: 0, invalid: 0, unmatched: 2 });
        assert!(!diag.was_reported(&normalize("Alpine")));
        assert!(diag.was_reported(&normalize("Atlantis")));
    }

    #[test]
    fn undefined_domain_paints_everything_gray() {
        let index = index("County,m\nAlpine,\nKings,\n");
        let scale = ColorScale::new(compute_domain(&index, "m"));
        assert_eq!(scale.domain(), None);

        let mut features = vec![county("Alpine"), county("Kings")];
        render(&mut features, &keys(), &index, "m", &scale, &mut KeyDiagnostics::new());
        assert!(features.iter().all(|f| f.style.as_ref().unwrap().fill == NO_DATA));
    }

    #[test]
    fn render_is_idempotent_and_warns_once() {
        let index = index("County,m\nAlpine,1\nKings,3\n");
        let scale = ColorScale::new(Some(Domain::new(1.0, 3.0)));
        let mut features = vec![county("Alpine"), county("Kings"), county("Atlantis"), county("")];
        let mut diag = KeyDiagnostics::new();

        render(&mut features, &keys(), &index, "m", &scale, &mut diag);
        let first = features.clone();
        render(&mut features, &keys(), &index, "m", &scale, &mut diag);

        assert_eq!(features, first);
        assert_eq!(diag.reported(), 2);
    }

    #[test]
    fn empty_upper_name_falls_back_to_lowercase_property() {
        let index = index("County,m\nAlpine,4\n");
        let scale = ColorScale::new(compute_domain(&index, "m"));
        let mut props = Map::new();
        props.insert("NAME".into(), json!(""));
        props.insert("name".into(), json!("Alpine"));
        let mut features = vec![Feature::new(MultiPolygon(vec![]), props)];
        let mut diag = KeyDiagnostics::new();

        render(&mut features, &keys(), &index, "m", &scale, &mut diag);
        assert_eq!(features[0].style.as_ref().unwrap().label, "Alpine: 4");
        assert_eq!(diag.reported(), 0);
    }

    #[test]
    fn name_falls_back_to_lowercase_property() {
        let index = index("County,m\nKings,2\n");
        let scale = ColorScale::new(compute_domain(&index, "m"));
        let mut props = Map::new();
        props.insert("name".into(), json!("Kings"));
        let mut features = vec![Feature::new(MultiPolygon(vec![]), props)];

        render(&mut features, &keys(), &index, "m", &scale, &mut KeyDiagnostics::new());
        assert_eq!(features[0].style.as_ref().unwrap().label, "Kings: 2");
    }
}
