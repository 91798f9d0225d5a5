use serde_json::Value;

use super::GeoError;

/// A `[lng, lat]` position as it appears in GeoJSON
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

/// Collect the positions that frame a GeoJSON object.
///
/// Polygons contribute only their outer ring. Feature, FeatureCollection and
/// GeometryCollection wrappers are unwrapped; a null geometry yields nothing.
pub fn extract(geojson: &Value) -> Result<Vec<Position>, GeoError> {
    let mut out = Vec::new();
    collect(geojson, &mut out)?;
    Ok(out)
}

fn collect(node: &Value, out: &mut Vec<Position>) -> Result<(), GeoError> {
    let kind = node
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GeoError::MissingType)?;

    match kind {
        "Feature" => match node.get("geometry") {
            None | Some(Value::Null) => Ok(()),
            Some(geometry) => collect(geometry, out),
        },
        "FeatureCollection" => {
            for feature in array_member(node, "features")? {
                collect(feature, out)?;
            }
            Ok(())
        }
        "GeometryCollection" => {
            for geometry in array_member(node, "geometries")? {
                collect(geometry, out)?;
            }
            Ok(())
        }
        "Point" => {
            out.push(position(coordinates(node)?)?);
            Ok(())
        }
        "LineString" | "MultiPoint" => positions(coordinates(node)?, out),
        "MultiLineString" => {
            for line in as_array(coordinates(node)?)? {
                positions(line, out)?;
            }
            Ok(())
        }
        "Polygon" => outer_ring(coordinates(node)?, out),
        "MultiPolygon" => {
            for polygon in as_array(coordinates(node)?)? {
                outer_ring(polygon, out)?;
            }
            Ok(())
        }
        other => Err(GeoError::UnsupportedType(other.to_string())),
    }
}

fn coordinates(node: &Value) -> Result<&Value, GeoError> {
    node.get("coordinates").ok_or(GeoError::MissingCoordinates)
}

fn array_member<'a>(node: &'a Value, key: &str) -> Result<&'a Vec<Value>, GeoError> {
    node.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| GeoError::InvalidCoordinates(format!("'{}' must be an array", key)))
}

fn as_array(value: &Value) -> Result<&Vec<Value>, GeoError> {
    value
        .as_array()
        .ok_or_else(|| GeoError::InvalidCoordinates(format!("expected array, got {}", value)))
}

fn outer_ring(polygon: &Value, out: &mut Vec<Position>) -> Result<(), GeoError> {
    match as_array(polygon)?.first() {
        Some(ring) => positions(ring, out),
        None => Ok(()),
    }
}

fn positions(list: &Value, out: &mut Vec<Position>) -> Result<(), GeoError> {
    for item in as_array(list)? {
        out.push(position(item)?);
    }
    Ok(())
}

fn position(value: &Value) -> Result<Position, GeoError> {
    let pair = as_array(value)?;
    match (pair.first().and_then(Value::as_f64), pair.get(1).and_then(Value::as_f64)) {
        (Some(lng), Some(lat)) => Ok(Position { lng, lat }),
        _ => Err(GeoError::InvalidCoordinates(format!("bad position {}", value))),
    }
}
