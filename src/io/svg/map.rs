use std::{io::Write, path::Path};

use anyhow::{anyhow, Result};

use crate::{
    geom::FeatureCollection,
    io::svg::{escape_xml, write_svg_footer, write_svg_header, write_svg_styles, Projection, SvgStringWriter, SvgWriter},
    render::{Legend, NO_DATA},
    session::RenderSession,
};

const LEGEND_WIDTH: f64 = 220.0;
const LEGEND_HEIGHT: f64 = 64.0;
const SWATCH_HEIGHT: f64 = 12.0;
const LEGEND_PAD: f64 = 10.0;

/// Draw every county as a filled path with its label as a hover `<title>`.
fn draw_counties(writer: &mut impl Write, features: &FeatureCollection, proj: &Projection) -> Result<()> {
    for feature in &features.features {
        let (fill, label) = match &feature.style {
            Some(style) => (style.fill.to_hex(), style.label.as_str()),
            None => (NO_DATA.to_hex(), "Loading…"),
        };
        writeln!(writer, r#"<path class="county" d="{}" style="fill:{}"><title>{}</title></path>"#,
            proj.multipolygon_to_path(feature.geometry()),
            fill,
            escape_xml(label),
        )?;
    }
    Ok(())
}

/// Legend overlay, pinned to the lower-left corner.
fn draw_legend(writer: &mut impl Write, legend: &Legend, height: f64) -> Result<()> {
    let x = LEGEND_PAD;
    let y = (height - LEGEND_HEIGHT - LEGEND_PAD).max(0.0);

    writeln!(writer, r#"<g class="legend" transform="translate({x:.1},{y:.1})">"#)?;
    writeln!(writer, r#"<rect class="legend-box" width="{LEGEND_WIDTH}" height="{LEGEND_HEIGHT}" rx="4"/>"#)?;
    writeln!(writer, r#"<text class="legend-title" x="{LEGEND_PAD}" y="18">{}</text>"#, escape_xml(legend.metric()))?;

    match legend {
        Legend::NoData { .. } => {
            let notice = legend.notice().unwrap_or_default();
            writeln!(writer, r#"<text class="legend-label" x="{LEGEND_PAD}" y="42">{}</text>"#, escape_xml(&notice))?;
        }
        Legend::Gradient { stops, min_label, max_label, .. } => {
            let inner = LEGEND_WIDTH - 2.0 * LEGEND_PAD;
            let step = inner / stops.len().max(1) as f64;
            for (i, (_, color)) in stops.iter().enumerate() {
                writeln!(writer, r#"<rect x="{:.2}" y="26" width="{:.2}" height="{SWATCH_HEIGHT}" style="fill:{}"/>"#,
                    LEGEND_PAD + step * i as f64,
                    step + 0.5, // overlap to hide seams
                    color.to_hex(),
                )?;
            }
            writeln!(writer, r#"<text class="legend-label" x="{LEGEND_PAD}" y="54">{}</text>"#, escape_xml(min_label))?;
            writeln!(writer, r#"<text class="legend-label" x="{:.1}" y="54" text-anchor="end">{}</text>"#,
                LEGEND_WIDTH - LEGEND_PAD,
                escape_xml(max_label),
            )?;
        }
    }

    writeln!(writer, "</g>")?;
    Ok(())
}

fn write_document(writer: &mut impl Write, session: &RenderSession, width: f64, margin: f64) -> Result<()> {
    let features = session.features();
    let bounds = features.bounds()
        .ok_or_else(|| anyhow!("[to_svg] Could not determine bounds; nothing to draw."))?;
    let proj = Projection::fit(bounds, width, margin);

    write_svg_header(writer, proj.width, proj.height, &bounds)?;
    write_svg_styles(writer)?;
    draw_counties(writer, features, &proj)?;
    if let Some(legend) = session.legend() {
        draw_legend(writer, legend, proj.height)?;
    }
    write_svg_footer(writer)?;
    Ok(())
}

impl RenderSession {
    /// Small wrapper with defaults.
    pub fn to_svg(&self, path: &Path) -> Result<()> {
        self.to_svg_with_size(path, 900, 10)
    }

    /// Write the current map (county fills, hover labels, legend) as SVG.
    pub fn to_svg_with_size(&self, path: &Path, width: u32, margin: u32) -> Result<()> {
        let mut writer = SvgWriter::new(path)?;
        write_document(&mut writer, self, width as f64, margin as f64)?;
        writer.flush()?;
        Ok(())
    }

    /// Same document as [`to_svg`](Self::to_svg), returned as a string.
    pub fn to_svg_string(&self, width: u32, margin: u32) -> Result<String> {
        let mut writer = SvgStringWriter::new();
        write_document(&mut writer, self, width as f64, margin as f64)?;
        writer.into_string()
    }
}
