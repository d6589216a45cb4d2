use crate::render::{ColorScale, Rgb};

/// Number of gradient samples drawn between the domain bounds.
pub const LEGEND_STOPS: usize = 10;

/// Legend overlay content for the active metric.
#[derive(Debug, Clone, PartialEq)]
pub enum Legend {
    /// No finite values: a notice and no gradient.
    NoData { metric: String },
    Gradient {
        metric: String,
        /// `(value, color)` pairs from min to max.
        stops: Vec<(f64, Rgb)>,
        min_label: String,
        max_label: String,
    },
}

impl Legend {
    /// Build the legend from the same scale the renderer used.
    pub fn generate(metric: &str, scale: &ColorScale) -> Self {
        let Some(domain) = scale.domain() else {
            return Legend::NoData { metric: metric.to_string() };
        };

        Legend::Gradient {
            metric: metric.to_string(),
            stops: domain.samples(LEGEND_STOPS).into_iter().map(|v| (v, scale.color(v))).collect(),
            min_label: format!("{:.1}", domain.min),
            max_label: format!("{:.1}", domain.max),
        }
    }

    pub fn metric(&self) -> &str {
        match self {
            Legend::NoData { metric } | Legend::Gradient { metric, .. } => metric,
        }
    }

    pub fn is_no_data(&self) -> bool { matches!(self, Legend::NoData { .. }) }

    /// Notice shown in place of the gradient.
    pub fn notice(&self) -> Option<String> {
        match self {
            Legend::NoData { metric } => Some(format!("No data for {metric}")),
            Legend::Gradient { .. } => None,
        }
    }
}
