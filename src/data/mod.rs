mod index;
mod loader;
mod source;
mod table;

pub use index::{Lookup, MetricIndex, MetricValue};
pub use loader::{DatasetLoader, Fetcher, LoadReport};
#[cfg(feature = "download")]
pub use source::HttpSource;
pub use source::{AutoSource, DiskSource, MemSource, SourceReader};
pub use table::RowTable;
