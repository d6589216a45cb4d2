use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};

use ahash::AHashMap;

use crate::{
    config::{MapConfig, SourceSpec},
    data::{RowTable, SourceReader},
    error::LoadError,
    geom::{read_feature_collection, FeatureCollection},
};

/// Cloneable, thread-safe handle that reads and parses sources.
///
/// Holds no cache; use it to fetch off the session thread and hand the
/// result back through [`crate::RenderSession::apply`].
#[derive(Clone)]
pub struct Fetcher {
    reader: Arc<dyn SourceReader>,
    fetches: Arc<AtomicUsize>,
}

impl Fetcher {
    pub fn new(reader: Arc<dyn SourceReader>) -> Self {
        Self { reader, fetches: Arc::new(AtomicUsize::new(0)) }
    }

    /// Read and parse a tabular source, checking its county column.
    pub fn fetch_table(&self, spec: &SourceSpec) -> Result<Arc<RowTable>, LoadError> {
        tracing::debug!(path = %spec.path, "fetching table");
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let bytes = self.reader.read(&spec.path)?;
        let table = RowTable::from_csv_bytes(&spec.path, &bytes)?;
        check_county_field(spec, &table)?;
        Ok(Arc::new(table))
    }

    pub fn fetch_geography(&self, path: &str) -> Result<FeatureCollection, LoadError> {
        tracing::debug!(path, "fetching geography");
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let bytes = self.reader.read(path)?;
        read_feature_collection(path, &bytes)
    }

    /// Reads issued so far, across every clone of this handle.
    pub fn fetch_count(&self) -> usize { self.fetches.load(Ordering::Relaxed) }
}

fn check_county_field(spec: &SourceSpec, table: &RowTable) -> Result<(), LoadError> {
    if table.has_column(&spec.county_field) { return Ok(()) }
    Err(LoadError::malformed(&spec.path, format!(
        "no county column {:?} (headers: {})", spec.county_field, table.headers().join(", "),
    )))
}

/// Result of loading everything a config names.
#[derive(Debug)]
pub struct LoadReport {
    pub geography: FeatureCollection,
    /// Tabular sources that failed; their metrics render as no data.
    pub failed: Vec<LoadError>,
}

/// Fetches sources through a [`Fetcher`] and caches tables by path, so each
/// distinct path is read at most once however many metrics share it.
pub struct DatasetLoader {
    fetcher: Fetcher,
    cache: AHashMap<String, Arc<RowTable>>,
}

impl DatasetLoader {
    pub fn new(reader: Arc<dyn SourceReader>) -> Self {
        Self { fetcher: Fetcher::new(reader), cache: AHashMap::new() }
    }

    pub fn fetcher(&self) -> Fetcher { self.fetcher.clone() }

    pub fn fetch_count(&self) -> usize { self.fetcher.fetch_count() }

    /// Load the geography and every distinct tabular source of `config`.
    ///
    /// A geography failure is returned as the error; table failures are
    /// collected in the report.
    pub fn load_all(&mut self, config: &MapConfig) -> Result<LoadReport, LoadError> {
        let geography = self.fetcher.fetch_geography(&config.geography)?;

        let mut failed = Vec::new();
        for spec in &config.sources {
            if let Err(e) = self.table(spec) {
                tracing::warn!(error = %e, "tabular source failed to load");
                failed.push(e);
            }
        }

        tracing::info!(
            features = geography.len(),
            tables = self.cache.len(),
            failed = failed.len(),
            "loaded sources"
        );
        Ok(LoadReport { geography, failed })
    }

    /// Cached table for `spec`, fetching it on first use.
    pub fn table(&mut self, spec: &SourceSpec) -> Result<Arc<RowTable>, LoadError> {
        if let Some(table) = self.cache.get(&spec.path) {
            check_county_field(spec, table)?;
            return Ok(table.clone());
        }
        let table = self.fetcher.fetch_table(spec)?;
        self.cache.insert(spec.path.clone(), table.clone());
        Ok(table)
    }

    pub fn table_for_metric(&mut self, config: &MapConfig, metric: &str) -> anyhow::Result<Arc<RowTable>> {
        let spec = config.source_for(metric)?;
        Ok(self.table(spec)?)
    }

    pub fn cached(&self, path: &str) -> Option<Arc<RowTable>> { self.cache.get(path).cloned() }

    /// Store a table fetched elsewhere (e.g. by a background [`Fetcher`]).
    /// An already cached path keeps its first table.
    pub fn insert(&mut self, path: &str, table: Arc<RowTable>) -> Arc<RowTable> {
        self.cache.entry(path.to_string()).or_insert(table).clone()
    }

    /// Cached tables paired with their specs, in config declaration order.
    pub fn tables_in_order<'a>(&'a self, config: &'a MapConfig) -> Vec<(&'a SourceSpec, &'a RowTable)> {
        config.sources.iter()
            .filter_map(|spec| self.cache.get(&spec.path).map(|table| (spec, table.as_ref())))
            .collect()
    }
}
