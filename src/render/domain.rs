use crate::data::MetricIndex;

/// Value range of the active metric. Both ends finite, `min <= max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min.is_finite() && max.is_finite() && min <= max, "invalid domain [{min}, {max}]");
        Self { min, max }
    }

    pub fn is_constant(&self) -> bool { self.min == self.max }

    /// `count` evenly spaced values from `min` to `max` inclusive.
    pub fn samples(&self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                let half_step = (self.max / 2.0 - self.min / 2.0) / (count - 1) as f64;
                (0..count)
                    .map(|i| if i + 1 == count { self.max } else { 2.0 * (self.min / 2.0 + half_step * i as f64) })
                    .collect()
            }
        }
    }
}

/// Min and max of the finite values of `metric`; `None` when there are none.
pub fn compute_domain(index: &MetricIndex, metric: &str) -> Option<Domain> {
    index.values(metric)
        .filter_map(|(_, value)| value.as_f64())
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<Domain>, v| match acc {
            None => Some(Domain { min: v, max: v }),
            Some(d) => Some(Domain { min: d.min.min(v), max: d.max.max(v) }),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SourceSpec, data::RowTable};

    fn index(csv: &str) -> MetricIndex {
        let spec = SourceSpec::new("t.csv", &[]);
        let table = RowTable::from_csv_bytes("t.csv", csv.as_bytes()).unwrap();
        MetricIndex::build([(&spec, &table)])
    }

    #[test]
    fn domain_is_min_max_of_finite_values() {
        let index = index("County,m\nA,3\nB,-1.5\nC,n/a\nD,12\nE,\n");
        assert_eq!(compute_domain(&index, "m"), Some(Domain::new(-1.5, 12.0)));
    }

    #[test]
    fn no_finite_values_gives_no_domain() {
        let index = index("County,m,n\nA,,1\nB,--,2\n");
        assert_eq!(compute_domain(&index, "m"), None);
        assert_eq!(compute_domain(&index, "missing"), None);
    }

    #[test]
    fn constant_metric_is_a_legal_domain() {
        let index = index("County,m\nA,7\nB,7\n");
        let domain = compute_domain(&index, "m").unwrap();
        assert!(domain.is_constant());
        assert_eq!(domain.samples(3), vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn samples_stay_finite_near_f64_limits() {
        let index = index("County,m\nA,-1e308\nB,1e308\nC,0\n");
        let domain = compute_domain(&index, "m").unwrap();
        assert_eq!(domain, Domain::new(-1e308, 1e308));

        let samples = domain.samples(3);
        assert_eq!(samples, vec![-1e308, 0.0, 1e308]);
        assert!(domain.samples(10).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn samples_hit_both_ends() {
        let samples = Domain::new(0.0, 90.0).samples(10);
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[9], 90.0);
        assert_eq!(samples[3], 30.0);
    }
}
