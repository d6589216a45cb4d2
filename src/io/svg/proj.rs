use geo::{Coord, CoordsIter, LineString, MultiPolygon, Rect};

/// Lon/lat -> SVG pixel mapping that preserves aspect ratio (Y down).
///
/// Longitudes are shrunk by the cosine of the mid latitude, so a state at
/// ~37°N does not come out stretched east-west.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Projection {
    bounds: Rect<f64>,
    margin: f64,
    scale: f64,
    x_factor: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl Projection {
    pub(crate) fn fit(bounds: Rect<f64>, width: f64, margin: f64) -> Self {
        let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
        let x_factor = mid_lat.to_radians().cos().clamp(0.1, 1.0);
        let span_x = (bounds.width() * x_factor).max(f64::EPSILON);
        let scale = (width - 2.0 * margin) / span_x;
        let height = bounds.height() * scale + 2.0 * margin;
        Self { bounds, margin, scale, x_factor, width, height }
    }

    pub(crate) fn project(&self, coord: &Coord<f64>) -> (f64, f64) {
        let x = self.margin + (coord.x - self.bounds.min().x) * self.x_factor * self.scale;
        let y = self.margin + (self.bounds.max().y - coord.y) * self.scale; // invert vertically
        (x, y)
    }

    /// Compact SVG path data for a MultiPolygon (exteriors + holes).
    pub(crate) fn multipolygon_to_path(&self, shape: &MultiPolygon<f64>) -> String {
        let mut out = String::new();
        for polygon in &shape.0 {
            self.push_ring(polygon.exterior(), &mut out);
            for interior in polygon.interiors() {
                self.push_ring(interior, &mut out);
            }
        }
        out
    }

    /// Append a ring as an SVG subpath: "M x,y L x,y ... Z"
    fn push_ring(&self, ring: &LineString<f64>, out: &mut String) {
        let mut coords = ring.coords_iter().map(|coord| self.project(&coord));
        if let Some((x, y)) = coords.next() {
            out.push_str(&format!(" M{x:.3},{y:.3}"));
            for (x, y) in coords {
                out.push_str(&format!(" L{x:.3},{y:.3}"));
            }
            out.push('Z');
        }
    }
}
