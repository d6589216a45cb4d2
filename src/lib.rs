#![doc = "countymap public API"]
mod config;
mod data;
mod error;
mod geom;
mod io;
mod normalize;
mod render;
mod session;

#[doc(inline)]
pub use config::{MapConfig, SourceSpec};

#[doc(inline)]
pub use data::{AutoSource, DatasetLoader, DiskSource, Fetcher, LoadReport, Lookup, MemSource, MetricIndex, MetricValue, RowTable, SourceReader};

#[cfg(feature = "download")]
#[doc(inline)]
pub use data::HttpSource;

#[doc(inline)]
pub use error::{ConfigError, LoadError, LoadErrorKind};

#[doc(inline)]
pub use geom::{read_feature_collection, write_feature_collection, Feature, FeatureCollection, FeatureStyle};

#[doc(inline)]
pub use normalize::{normalize, CountyKey};

#[doc(inline)]
pub use render::{compute_domain, interpolate_or_rd, render, ColorScale, Domain, KeyDiagnostics, Legend, RenderSummary, Rgb, LEGEND_STOPS, NO_DATA};

#[doc(inline)]
pub use session::{Applied, RenderSession, Selection};
