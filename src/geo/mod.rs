//! Bounding boxes over the GeoJSON stored in `project_maps.map`.

pub mod bounds;
pub mod coordinates;

use serde::Serialize;
use serde_json::Value;

pub use bounds::BoundingBox;
pub use coordinates::{extract, Position};

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Map column is empty")]
    MissingMap,
    #[error("Map is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("GeoJSON object has no 'type'")]
    MissingType,
    #[error("GeoJSON geometry has no 'coordinates'")]
    MissingCoordinates,
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Unsupported GeoJSON type '{0}'")]
    UnsupportedType(String),
}

/// Map rows plus the box that frames all of them
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAggregate {
    pub data: Vec<Value>,
    pub bounding_box: Option<BoundingBox>,
}

/// The `map` column holds serialized GeoJSON; rows written by older clients
/// may already hold an object.
pub fn parse_map(value: &Value) -> Result<Value, GeoError> {
    match value {
        Value::String(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
        Value::Object(_) => Ok(value.clone()),
        _ => Err(GeoError::MissingMap),
    }
}

/// Parse each row's map, drop rows that fail, and reduce every coordinate
/// into one bounding box. Kept rows carry the parsed GeoJSON in `map`.
pub fn aggregate(rows: Vec<Value>) -> MapAggregate {
    let mut data = Vec::with_capacity(rows.len());
    let mut positions = Vec::new();

    for mut row in rows {
        let parsed = row
            .get("map")
            .ok_or(GeoError::MissingMap)
            .and_then(parse_map)
            .and_then(|geojson| extract(&geojson).map(|found| (geojson, found)));

        match parsed {
            Ok((geojson, found)) => {
                positions.extend(found);
                row["map"] = geojson;
                data.push(row);
            }
            Err(e) => {
                tracing::warn!("Dropping project map {}: {}", row.get("id").unwrap_or(&serde_json::Value::Null), e);
            }
        }
    }

    MapAggregate {
        data,
        bounding_box: BoundingBox::from_positions(positions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map_row(id: i64, geojson: &str) -> Value {
        json!({"id": id, "projectId": 1, "map": geojson})
    }

    #[test]
    fn boxes_two_point_features() {
        let rows = vec![
            map_row(1, r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}"#),
            map_row(2, r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[3,4]}}"#),
        ];
        let result = serde_json::to_value(aggregate(rows)).unwrap();
        assert_eq!(result["boundingBox"], json!({"minLat": 2.0, "minLng": 1.0, "maxLat": 4.0, "maxLng": 3.0}));
        assert_eq!(result["data"].as_array().unwrap().len(), 2);
        assert_eq!(result["data"][0]["map"]["type"], "Feature");
    }

    #[test]
    fn no_rows_gives_null_box() {
        let result = serde_json::to_value(aggregate(vec![])).unwrap();
        assert_eq!(result, json!({"data": [], "boundingBox": null}));
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let rows = vec![
            map_row(1, "{not json"),
            map_row(2, r#"{"type":"Point","coordinates":[10,20]}"#),
            json!({"id": 3, "projectId": 1, "map": null}),
        ];
        let result = aggregate(rows);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0]["id"], 2);
        assert_eq!(
            result.bounding_box,
            Some(BoundingBox { min_lat: 20.0, min_lng: 10.0, max_lat: 20.0, max_lng: 10.0 })
        );
    }

    #[test]
    fn rows_without_coordinates_give_null_box() {
        let rows = vec![map_row(1, r#"{"type":"FeatureCollection","features":[]}"#)];
        let result = aggregate(rows);
        assert_eq!(result.data.len(), 1);
        assert!(result.bounding_box.is_none());
    }
}
