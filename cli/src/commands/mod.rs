pub mod check;
pub mod metrics;
pub mod render;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use countymap::{AutoSource, HttpSource, MapConfig, SourceReader};

/// Config from `--config` (paths relative to its directory), or the built-in
/// California layout relative to the working directory.
pub fn load_config(cli: &crate::cli::Cli) -> Result<(MapConfig, Arc<dyn SourceReader>)> {
    match &cli.config {
        Some(path) => {
            let config = MapConfig::from_json_file(path)
                .with_context(|| format!("[config] loading {}", path.display()))?;
            let root = path.parent().unwrap_or(Path::new("."));
            Ok((config, reader(root)?))
        }
        None => Ok((MapConfig::california(), reader(Path::new("."))?)),
    }
}

/// Disk reader rooted at `root`, sharing one HTTP client for remote paths.
fn reader(root: &Path) -> Result<Arc<dyn SourceReader>> {
    let http = HttpSource::new().context("[config] building http client")?;
    Ok(Arc::new(AutoSource::new(root).with_http(http)))
}
