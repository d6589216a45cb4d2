mod choropleth;
mod color;
mod domain;
mod legend;

pub use choropleth::{render, KeyDiagnostics, RenderSummary};
pub use color::{interpolate_or_rd, ColorScale, Rgb, NO_DATA};
pub use domain::{compute_domain, Domain};
pub use legend::{Legend, LEGEND_STOPS};
