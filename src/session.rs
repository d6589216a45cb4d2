use std::sync::Arc;

use anyhow::Result;

use crate::{
    config::{MapConfig, SourceSpec},
    data::{DatasetLoader, Fetcher, MetricIndex, RowTable, SourceReader},
    error::{ConfigError, LoadError},
    geom::FeatureCollection,
    render::{compute_domain, render, ColorScale, KeyDiagnostics, Legend, RenderSummary},
};

/// A metric selection waiting for its source table.
///
/// Only the most recent selection may be applied; anything older is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    generation: u64,
    source: usize,
    metric: String,
}

impl Selection {
    pub fn metric(&self) -> &str { &self.metric }
}

/// What [`RenderSession::apply`] did with a fetch result.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The map and legend now show this selection.
    Rendered(RenderSummary),
    /// The table arrived but its metric failed to load; drawn as no data.
    Degraded(LoadError),
    /// A newer selection exists; nothing changed.
    Stale,
}

/// Owns all rendering state for one map: the features, the loaded tables,
/// the metric index, the shared color scale, the legend and the mismatch
/// side table.
///
/// Selection is split in two so fetches can complete out of order:
/// [`select`](Self::select) records the newest request and
/// [`apply`](Self::apply) repaints only if its selection is still the newest.
pub struct RenderSession {
    config: MapConfig,
    loader: DatasetLoader,
    features: FeatureCollection,
    index: MetricIndex,
    scale: ColorScale,
    legend: Option<Legend>,
    diagnostics: KeyDiagnostics,
    generation: u64,
    active: Option<String>,
}

impl RenderSession {
    /// Load the geography; tables are fetched on first selection.
    /// Failing to load the geography leaves nothing to draw, so it is fatal.
    pub fn open(config: MapConfig, reader: Arc<dyn SourceReader>) -> Result<Self, LoadError> {
        let loader = DatasetLoader::new(reader);
        let features = loader.fetcher().fetch_geography(&config.geography)?;
        Ok(Self::with_parts(config, loader, features))
    }

    /// Load the geography and every table up front. Table failures are
    /// returned alongside the session; their metrics render as no data.
    pub fn open_eager(config: MapConfig, reader: Arc<dyn SourceReader>) -> Result<(Self, Vec<LoadError>), LoadError> {
        let mut loader = DatasetLoader::new(reader);
        let report = loader.load_all(&config)?;
        let mut session = Self::with_parts(config, loader, report.geography);
        session.rebuild_index();
        Ok((session, report.failed))
    }

    fn with_parts(config: MapConfig, loader: DatasetLoader, features: FeatureCollection) -> Self {
        Self {
            config,
            loader,
            features,
            index: MetricIndex::default(),
            scale: ColorScale::default(),
            legend: None,
            diagnostics: KeyDiagnostics::new(),
            generation: 0,
            active: None,
        }
    }

    /// Record `metric` as the newest selection.
    pub fn select(&mut self, metric: &str) -> Result<Selection, ConfigError> {
        let source = self.config.source_index(metric)?;
        self.generation += 1;
        tracing::debug!(metric, generation = self.generation, "metric selected");
        Ok(Selection { generation: self.generation, source, metric: metric.to_string() })
    }

    pub fn is_current(&self, selection: &Selection) -> bool { selection.generation == self.generation }

    /// Source the selection's table comes from.
    pub fn source_spec(&self, selection: &Selection) -> &SourceSpec { &self.config.sources[selection.source] }

    /// Table for the selection if it is already cached, so no fetch is needed.
    pub fn cached_table(&self, selection: &Selection) -> Option<Arc<RowTable>> {
        self.loader.cached(&self.source_spec(selection).path)
    }

    /// Repaint for `selection` with its fetch result, unless a newer
    /// selection was made in the meantime.
    pub fn apply(&mut self, selection: &Selection, fetched: Result<Arc<RowTable>, LoadError>) -> Applied {
        if !self.is_current(selection) {
            tracing::debug!(metric = %selection.metric, generation = selection.generation, "discarding stale fetch");
            return Applied::Stale;
        }

        match fetched {
            Ok(table) => {
                let path = self.source_spec(selection).path.clone();
                if self.loader.cached(&path).is_none() {
                    self.loader.insert(&path, table);
                    self.rebuild_index();
                }
                Applied::Rendered(self.repaint(&selection.metric, true))
            }
            Err(e) => {
                tracing::warn!(metric = %selection.metric, error = %e, "metric source failed; rendering as no data");
                self.repaint(&selection.metric, false);
                Applied::Degraded(e)
            }
        }
    }

    /// Select `metric` and render it now, fetching its table if not cached.
    pub fn show(&mut self, metric: &str) -> Result<Applied> {
        let selection = self.select(metric)?;
        let fetched = match self.cached_table(&selection) {
            Some(table) => Ok(table),
            None => self.loader.fetcher().fetch_table(self.source_spec(&selection)),
        };
        Ok(self.apply(&selection, fetched))
    }

    fn rebuild_index(&mut self) {
        self.index = MetricIndex::build(self.loader.tables_in_order(&self.config));
        tracing::debug!(counties = self.index.len(), "metric index rebuilt");
    }

    /// Domain, scale, features and legend for `metric`, in that order.
    fn repaint(&mut self, metric: &str, available: bool) -> RenderSummary {
        let domain = if available { compute_domain(&self.index, metric) } else { None };
        self.scale.set_domain(domain);

        let summary = render(
            &mut self.features.features,
            &self.config.name_properties,
            &self.index,
            metric,
            &self.scale,
            &mut self.diagnostics,
        );
        self.legend = Some(Legend::generate(metric, &self.scale));
        self.active = Some(metric.to_string());

        match domain {
            Some(d) => tracing::info!(metric, min = d.min, max = d.max, colored = summary.colored, "rendered metric"),
            None => tracing::info!(metric, "rendered metric with no data"),
        }
        summary
    }

    /// Handle for fetching off the session thread.
    pub fn fetcher(&self) -> Fetcher { self.loader.fetcher() }

    pub fn fetch_count(&self) -> usize { self.loader.fetch_count() }

    pub fn config(&self) -> &MapConfig { &self.config }

    pub fn features(&self) -> &FeatureCollection { &self.features }

    pub fn index(&self) -> &MetricIndex { &self.index }

    pub fn scale(&self) -> &ColorScale { &self.scale }

    pub fn legend(&self) -> Option<&Legend> { self.legend.as_ref() }

    pub fn diagnostics(&self) -> &KeyDiagnostics { &self.diagnostics }

    /// Metric currently drawn, if any.
    pub fn active_metric(&self) -> Option<&str> { self.active.as_deref() }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use super::*;
    use crate::{data::MemSource, render::NO_DATA};

    const GEO: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"NAME":"San Francisco"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
        {"type":"Feature","properties":{"name":"Alpine County"},
         "geometry":{"type":"Polygon","coordinates":[[[2,0],[3,0],[3,1],[2,0]]]}}]}"#;

    fn config() -> MapConfig {
        MapConfig {
            geography: "ca.geojson".into(),
            name_properties: vec!["NAME".into(), "name".into()],
            sources: vec![
                SourceSpec::new("ces.csv", &["OzonePctl", "LeadPctl"]),
                SourceSpec::new("low.csv", &["lowincome"]),
            ],
        }
    }

    fn reader() -> Arc<dyn SourceReader> {
        Arc::new(MemSource::new()
            .with("ca.geojson", GEO)
            .with("ces.csv", "County,OzonePctl,LeadPctl\nSan Francisco,42.5,\nAlpine,10,\n")
            .with("low.csv", "County,lowincome\nSan Francisco County,7\nAlpine,3\n"))
    }

    fn labels(session: &RenderSession) -> Vec<String> {
        session.features().features.iter().map(|f| f.style.as_ref().unwrap().label.clone()).collect()
    }

    #[test]
    fn show_renders_map_and_legend_together() {
        let mut session = RenderSession::open(config(), reader()).unwrap();
        let applied = session.show("OzonePctl").unwrap();

        assert!(matches!(applied, Applied::Rendered(s) if s.colored == 2));
        assert_eq!(labels(&session), vec!["San Francisco: 42.5", "Alpine County: 10"]);
        assert_eq!(session.scale().domain().map(|d| (d.min, d.max)), Some((10.0, 42.5)));
        let Some(Legend::Gradient { min_label, max_label, .. }) = session.legend() else { panic!() };
        assert_eq!((min_label.as_str(), max_label.as_str()), ("10.0", "42.5"));
        assert_eq!(session.active_metric(), Some("OzonePctl"));
    }

    #[test]
    fn blank_column_renders_no_data_everywhere() {
        let mut session = RenderSession::open(config(), reader()).unwrap();
        session.show("LeadPctl").unwrap();

        assert_eq!(session.scale().domain(), None);
        assert!(session.legend().unwrap().is_no_data());
        assert!(session.features().features.iter().all(|f| f.style.as_ref().unwrap().fill == NO_DATA));
        assert_eq!(labels(&session), vec!["San Francisco: N/A", "Alpine County: N/A"]);
    }

    #[test]
    fn switching_metrics_reuses_the_shared_table() {
        let mut session = RenderSession::open(config(), reader()).unwrap();
        session.show("OzonePctl").unwrap();
        session.show("LeadPctl").unwrap();
        session.show("OzonePctl").unwrap();
        assert_eq!(session.fetch_count(), 2);

        session.show("lowincome").unwrap();
        assert_eq!(session.fetch_count(), 3);
        assert_eq!(labels(&session), vec!["San Francisco: 7", "Alpine County: 3"]);
    }

    #[test]
    fn stale_fetch_never_overwrites_newer_selection() {
        let mut session = RenderSession::open(config(), reader()).unwrap();
        let fetcher = session.fetcher();

        let a = session.select("OzonePctl").unwrap();
        let b = session.select("lowincome").unwrap();
        let spec_a = session.source_spec(&a).clone();
        let spec_b = session.source_spec(&b).clone();

        let (tx, rx) = mpsc::channel();
        for (selection, spec, delay) in [(a, spec_a, 50), (b, spec_b, 0)] {
            let tx = tx.clone();
            let fetcher = fetcher.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(delay));
                tx.send((selection, fetcher.fetch_table(&spec))).unwrap();
            });
        }
        drop(tx);

        let outcomes = rx.iter()
            .map(|(selection, fetched)| (selection.metric().to_string(), session.apply(&selection, fetched)))
            .collect::<Vec<_>>();

        assert_eq!(outcomes.len(), 2);
        let stale = outcomes.iter().find(|(m, _)| m == "OzonePctl").unwrap();
        assert_eq!(stale.1, Applied::Stale);
        assert_eq!(session.active_metric(), Some("lowincome"));
        assert_eq!(labels(&session), vec!["San Francisco: 7", "Alpine County: 3"]);
        assert_eq!(session.legend().unwrap().metric(), "lowincome");
    }

    #[test]
    fn stale_result_is_discarded_even_when_it_arrives_last() {
        let mut session = RenderSession::open(config(), reader()).unwrap();
        let fetcher = session.fetcher();

        let a = session.select("OzonePctl").unwrap();
        let b = session.select("lowincome").unwrap();
        let fetched_b = fetcher.fetch_table(session.source_spec(&b));
        let fetched_a = fetcher.fetch_table(session.source_spec(&a));

        assert!(matches!(session.apply(&b, fetched_b), Applied::Rendered(_)));
        assert_eq!(session.apply(&a, fetched_a), Applied::Stale);
        assert_eq!(session.active_metric(), Some("lowincome"));
        assert!(session.index().metrics().iter().all(|m| *m != "OzonePctl"));
    }

    #[test]
    fn failed_metric_source_degrades_to_no_data() {
        let mut config = config();
        config.sources.push(SourceSpec::new("gone.csv", &["section8"]));
        let mut session = RenderSession::open(config, reader()).unwrap();

        let applied = session.show("section8").unwrap();
        assert!(matches!(applied, Applied::Degraded(ref e) if e.path == "gone.csv"));
        assert!(session.legend().unwrap().is_no_data());

        assert!(matches!(session.show("OzonePctl").unwrap(), Applied::Rendered(_)));
    }

    #[test]
    fn unknown_metric_and_missing_geography_are_errors() {
        let mut session = RenderSession::open(config(), reader()).unwrap();
        assert!(session.select("nope").is_err());

        let mut config = config();
        config.geography = "nope.geojson".into();
        assert!(RenderSession::open(config, reader()).is_err());
    }

    #[test]
    fn eager_open_indexes_every_table() {
        let (mut session, failed) = RenderSession::open_eager(config(), reader()).unwrap();
        assert!(failed.is_empty());
        assert_eq!(session.index().metrics(), vec!["LeadPctl", "OzonePctl", "lowincome"]);
        session.show("lowincome").unwrap();
        assert_eq!(session.fetch_count(), 3);
    }
}
