use std::{fs::File, io::{BufWriter, Write}, path::Path};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::{geom::write_feature_collection, session::RenderSession};

impl RenderSession {
    /// Styled features as a GeoJSON FeatureCollection: original properties,
    /// the displayed metric value, `fill` and `label`.
    pub fn to_geojson(&self) -> Value {
        write_feature_collection(self.features())
    }

    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("[io::geojson] Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.to_geojson())
            .context("[io::geojson] Failed to serialize features")?;
        writer.flush()?;
        Ok(())
    }
}
