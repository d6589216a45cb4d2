use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};

use crate::{error::LoadError, geom::{Feature, FeatureCollection}};

/// Parse a GeoJSON FeatureCollection of Polygon / MultiPolygon features.
///
/// Features without a polygonal geometry are skipped with a warning; a
/// document that is not a FeatureCollection is malformed.
pub fn read_feature_collection(path: &str, bytes: &[u8]) -> Result<FeatureCollection, LoadError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| LoadError::malformed(path, e))?;

    let features = value.get("features").and_then(Value::as_array)
        .ok_or_else(|| LoadError::malformed(path, "expected a FeatureCollection with a `features` array"))?;

    let mut out = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let properties = feature.get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let geometry = match feature.get("geometry").filter(|g| !g.is_null()) {
            Some(geometry) => parse_geometry(geometry)
                .map_err(|reason| LoadError::malformed(path, format!("feature {idx}: {reason}")))?,
            None => None,
        };

        match geometry {
            Some(geometry) => out.push(Feature::new(geometry, properties)),
            None => tracing::warn!(path, feature = idx, "skipping feature without polygon geometry"),
        }
    }

    Ok(FeatureCollection::new(out))
}

/// `Ok(None)` for valid but non-polygonal geometry types.
fn parse_geometry(geometry: &Value) -> Result<Option<MultiPolygon<f64>>, String> {
    let coords = || geometry.get("coordinates").and_then(Value::as_array)
        .ok_or_else(|| "geometry has no coordinates array".to_string());

    match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => Ok(Some(MultiPolygon(vec![parse_polygon(coords()?)?]))),
        Some("MultiPolygon") => {
            let polygons = coords()?.iter()
                .map(|p| p.as_array().ok_or_else(|| "polygon must be an array of rings".to_string())
                    .and_then(|rings| parse_polygon(rings)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(MultiPolygon(polygons)))
        }
        Some(_) => Ok(None),
        None => Err("geometry has no type".to_string()),
    }
}

/// Rings: first exterior, rest holes.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| "ring must be an array of positions".to_string())
            .and_then(|positions| parse_ring(positions))
    });

    let exterior = rings.next().ok_or_else(|| "polygon has no exterior ring".to_string())??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Positions `[x, y, ...]`; extra ordinates are ignored.
fn parse_ring(positions: &[Value]) -> Result<LineString<f64>, String> {
    let points = positions.iter()
        .map(|pos| {
            let pair = pos.as_array().filter(|a| a.len() >= 2)
                .ok_or_else(|| "position must have at least two numbers".to_string())?;
            match (pair[0].as_f64(), pair[1].as_f64()) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err("position ordinates must be numbers".to_string()),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Polygon::new closes the ring if needed.
    Ok(LineString(points))
}

fn ring_to_json(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn multipolygon_to_json(shape: &MultiPolygon<f64>) -> Value {
    let polygons = shape.0.iter()
        .map(|polygon| {
            let mut rings = vec![ring_to_json(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_to_json));
            Value::Array(rings)
        })
        .collect();
    json!({ "type": "MultiPolygon", "coordinates": Value::Array(polygons) })
}

/// Export features as a GeoJSON FeatureCollection. Rendered features carry
/// `fill` (CSS hex) and `label` alongside their original properties.
pub fn write_feature_collection(collection: &FeatureCollection) -> Value {
    let features = collection.features.iter()
        .map(|feature| {
            let mut properties: Map<String, Value> = feature.properties.clone();
            if let Some(style) = &feature.style {
                properties.insert("fill".into(), json!(style.fill.to_hex()));
                properties.insert("label".into(), json!(style.label));
            }
            json!({
                "type": "Feature",
                "geometry": multipolygon_to_json(feature.geometry()),
                "properties": properties,
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": Value::Array(features) })
}
