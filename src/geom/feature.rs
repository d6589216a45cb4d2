use geo::{BoundingRect, MultiPolygon, Rect};
use serde_json::{Map, Value};

use crate::render::Rgb;

/// Display state the renderer attaches to a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStyle {
    pub fill: Rgb,
    /// Popup / tooltip text, "<name>: <value>" or "<name>: N/A".
    pub label: String,
}

/// One county polygon plus its property bag.
///
/// Geometry is fixed at load time; the renderer only touches `properties`
/// (the displayed metric value) and `style`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
    pub style: Option<FeatureStyle>,
}

impl Feature {
    pub fn new(geometry: MultiPolygon<f64>, properties: Map<String, Value>) -> Self {
        Self { geometry, properties, style: None }
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    /// First non-blank string property among `keys`.
    pub fn name<'a>(&'a self, keys: &[String]) -> Option<&'a str> {
        keys.iter().find_map(|key| {
            self.properties.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        })
    }
}

/// The geographic source: every county feature, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self { Self { features } }

    pub fn len(&self) -> usize { self.features.len() }

    pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Bounding box of all geometries, or `None` for an empty collection.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features.iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|a, b| Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            ))
    }
}
