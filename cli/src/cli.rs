use std::path::PathBuf;

/// County choropleth CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "countymap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Map configuration (JSON); defaults to the built-in California layout
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render one metric as an SVG map or styled GeoJSON
    Render(RenderArgs),

    /// List the selectable metric identifiers
    Metrics,

    /// Load every source and report county names that fail to join
    Check,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Svg,
    Geojson,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Metric identifier, e.g. "Ozone Pctl"
    #[arg(short, long)]
    pub metric: String,

    /// Output file, defaults to "./map.svg" (or "./map.geojson")
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    /// SVG width in pixels
    #[arg(long, default_value_t = 900)]
    pub width: u32,

    /// Load every source before rendering instead of only the metric's own
    #[arg(long)]
    pub eager: bool,
}
