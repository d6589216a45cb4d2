use ahash::AHashMap;

use crate::{config::SourceSpec, data::RowTable, normalize::{normalize, CountyKey}};

/// A parsed metric cell.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Always finite.
    Number(f64),
    /// Blank, non-numeric or non-finite cell; `raw` is the original text.
    Invalid { raw: String },
}

impl MetricValue {
    /// Trimmed `f64` parse; anything that is not a finite number is invalid.
    pub fn parse(raw: Option<&str>) -> Self {
        let text = raw.unwrap_or("").trim();
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => MetricValue::Number(v),
            _ => MetricValue::Invalid { raw: text.to_string() },
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            MetricValue::Invalid { .. } => None,
        }
    }
}

/// Outcome of looking up a (county, metric) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Value(f64),
    /// The county has a cell for this metric but it did not parse.
    Invalid(&'a str),
    /// The county has rows, but none of them carry this metric.
    Absent,
    /// No loaded table has a row for this county.
    Unmatched,
}

impl Lookup<'_> {
    pub fn value(&self) -> Option<f64> {
        match self {
            Lookup::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// County key -> metric name -> value, joined across every loaded table.
///
/// Tables are folded in the order given. For a county present in several
/// tables, metrics are merged; when two tables (or two rows of one table)
/// define the same metric for the same county, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct MetricIndex {
    records: AHashMap<CountyKey, AHashMap<String, MetricValue>>,
    skipped_rows: usize,
}

impl MetricIndex {
    pub fn build<'a>(tables: impl IntoIterator<Item = (&'a SourceSpec, &'a RowTable)>) -> Self {
        let mut index = MetricIndex::default();
        for (spec, table) in tables {
            index.merge_table(spec, table);
        }
        index
    }

    fn merge_table(&mut self, spec: &SourceSpec, table: &RowTable) {
        let Some(counties) = table.column(&spec.county_field) else {
            tracing::warn!(path = table.path(), field = %spec.county_field, "table has no county column, skipping");
            return;
        };

        let metric_columns = table.headers().iter()
            .filter(|h| **h != spec.county_field)
            .map(|h| (spec.metric_name(h).to_string(), table.column(h).unwrap_or_default()))
            .collect::<Vec<_>>();

        for (row, county) in counties.iter().enumerate() {
            let key = normalize(county.as_deref().unwrap_or(""));
            if key.is_empty() {
                self.skipped_rows += 1;
                continue;
            }

            let record = self.records.entry(key).or_default();
            for (metric, cells) in &metric_columns {
                let cell = cells.get(row).and_then(|c| c.as_deref());
                record.insert(metric.clone(), MetricValue::parse(cell));
            }
        }

        tracing::debug!(path = table.path(), rows = table.len(), metrics = metric_columns.len(), "merged table into metric index");
    }

    pub fn lookup(&self, key: &CountyKey, metric: &str) -> Lookup<'_> {
        let Some(record) = self.records.get(key) else { return Lookup::Unmatched };
        match record.get(metric) {
            Some(MetricValue::Number(v)) => Lookup::Value(*v),
            Some(MetricValue::Invalid { raw }) => Lookup::Invalid(raw),
            None => Lookup::Absent,
        }
    }

    pub fn contains_key(&self, key: &CountyKey) -> bool { self.records.contains_key(key) }

    /// Every (county, value) pair recorded for `metric`, valid or not.
    pub fn values<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = (&'a CountyKey, &'a MetricValue)> + 'a {
        self.records.iter()
            .filter_map(move |(key, record)| record.get(metric).map(|value| (key, value)))
    }

    /// County keys, sorted.
    pub fn keys(&self) -> Vec<&CountyKey> {
        let mut keys = self.records.keys().collect::<Vec<_>>();
        keys.sort();
        keys
    }

    /// Metric names present for at least one county, sorted.
    pub fn metrics(&self) -> Vec<&str> {
        let mut metrics = self.records.values()
            .flat_map(|record| record.keys().map(String::as_str))
            .collect::<Vec<_>>();
        metrics.sort_unstable();
        metrics.dedup();
        metrics
    }

    pub fn invalid_count(&self, metric: &str) -> usize {
        self.values(metric).filter(|(_, v)| matches!(v, MetricValue::Invalid { .. })).count()
    }

    /// Rows dropped because their county name normalized to nothing.
    pub fn skipped_rows(&self) -> usize { self.skipped_rows }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(path: &str, csv: &str) -> RowTable {
        RowTable::from_csv_bytes(path, csv.as_bytes()).unwrap()
    }

    #[test]
    fn joins_on_normalized_county_names() {
        let spec = SourceSpec::new("ces.csv", &["OzonePctl"]);
        let t = table("ces.csv", "County,OzonePctl\nSan Francisco,42.5\n");
        let index = MetricIndex::build([(&spec, &t)]);

        assert_eq!(index.lookup(&normalize("San Francisco County"), "OzonePctl"), Lookup::Value(42.5));
        assert_eq!(index.keys(), vec![&normalize("san francisco")]);
    }

    #[test]
    fn invalid_cells_are_distinct_from_absent_pairs() {
        let spec = SourceSpec::new("t.csv", &["a", "b"]);
        let t = table("t.csv", "County,a,b\nAlpine,,x\nKings,1e2,inf\n");
        let index = MetricIndex::build([(&spec, &t)]);

        assert_eq!(index.lookup(&normalize("Alpine"), "a"), Lookup::Invalid(""));
        assert_eq!(index.lookup(&normalize("Alpine"), "b"), Lookup::Invalid("x"));
        assert_eq!(index.lookup(&normalize("Kings"), "a"), Lookup::Value(100.0));
        assert_eq!(index.lookup(&normalize("Kings"), "b"), Lookup::Invalid("inf"));
        assert_eq!(index.lookup(&normalize("Kings"), "c"), Lookup::Absent);
        assert_eq!(index.lookup(&normalize("Lassen"), "a"), Lookup::Unmatched);
        assert_eq!(index.invalid_count("b"), 2);
    }

    #[test]
    fn later_tables_merge_and_win_conflicts() {
        let first = SourceSpec::new("one.csv", &["x", "shared"]);
        let second = SourceSpec::new("two.csv", &["y"]);
        let t1 = table("one.csv", "County,x,shared\nAlpine,1,10\n");
        let t2 = table("two.csv", "County,y,shared\nAlpine County,2,20\n");

        let index = MetricIndex::build([(&first, &t1), (&second, &t2)]);
        let alpine = normalize("alpine");
        assert_eq!(index.lookup(&alpine, "x"), Lookup::Value(1.0));
        assert_eq!(index.lookup(&alpine, "y"), Lookup::Value(2.0));
        assert_eq!(index.lookup(&alpine, "shared"), Lookup::Value(20.0));

        let reversed = MetricIndex::build([(&second, &t2), (&first, &t1)]);
        assert_eq!(reversed.lookup(&alpine, "shared"), Lookup::Value(10.0));
    }

    #[test]
    fn field_mapping_renames_columns_and_county_field() {
        let spec = SourceSpec::new("low.csv", &["lowincome"])
            .with_county_field("NAME")
            .with_column("LOWINC", "lowincome");
        let t = table("low.csv", "NAME,LOWINC\nYolo,33\n,5\n");
        let index = MetricIndex::build([(&spec, &t)]);

        assert_eq!(index.lookup(&normalize("Yolo"), "lowincome"), Lookup::Value(33.0));
        assert_eq!(index.lookup(&normalize("Yolo"), "LOWINC"), Lookup::Absent);
        assert_eq!(index.metrics(), vec!["lowincome"]);
        assert_eq!(index.skipped_rows(), 1);
    }

    #[test]
    fn table_without_county_column_contributes_nothing() {
        let spec = SourceSpec::new("t.csv", &["a"]);
        let t = table("t.csv", "Name,a\nAlpine,1\n");
        assert!(MetricIndex::build([(&spec, &t)]).is_empty());
    }
}
