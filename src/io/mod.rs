//! Output formats for a rendered session.
//!
//! - `svg` - standalone SVG map with legend overlay
//! - `geojson` - styled FeatureCollection for web maps

pub(crate) mod geojson;
pub(crate) mod svg;
