mod feature;
mod geojson;

pub use feature::{Feature, FeatureCollection, FeatureStyle};
pub use geojson::{read_feature_collection, write_feature_collection};
