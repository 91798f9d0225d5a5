use serde_json::{Map, Value};

use crate::resources::ResourceDef;

/// System fields that are maintained by the server, never by API input
const SYSTEM_FIELDS: &[&str] = &["voided", "voidedBy", "createdAt", "updatedAt"];

/// Operation type for payload processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Errors that can occur while turning a payload into column values
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set via API")]
    SystemFieldNotAllowed(String),
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),
    #[error("No updatable fields supplied")]
    NoUpdatableFields,
}

/// Column values extracted from a request body, in resource column order
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub fields: Vec<(&'static str, Value)>,
    pub user_id: Option<Value>,
    /// Keys present in the payload that the resource does not know
    pub ignored: Vec<String>,
}

impl Record {
    /// Build a record from a JSON object body.
    ///
    /// `id` is ignored, unknown keys are collected into `ignored`, and for
    /// `Create` every required column must be present and non-empty.
    pub fn from_payload(def: &ResourceDef, payload: &Value, operation: Operation) -> Result<Self, RecordError> {
        let map: &Map<String, Value> = payload
            .as_object()
            .ok_or_else(|| RecordError::InvalidJson("Expected JSON object".to_string()))?;

        let mut record = Record::default();
        for (key, value) in map {
            if SYSTEM_FIELDS.contains(&key.as_str()) {
                return Err(RecordError::SystemFieldNotAllowed(key.clone()));
            }
            if key == "id" {
                continue;
            }
            if key == "userId" {
                record.user_id = Some(value.clone());
                continue;
            }
            if def.column(key).is_none() {
                record.ignored.push(key.clone());
            }
        }

        // Walk the definition so values land in a stable column order
        for column in def.columns {
            if let Some(value) = map.get(column.name) {
                record.fields.push((column.name, normalize(value)));
            }
        }

        match operation {
            Operation::Create => {
                let missing: Vec<String> = def
                    .columns
                    .iter()
                    .filter(|c| c.required)
                    .filter(|c| record.get(c.name).map_or(true, is_blank))
                    .map(|c| c.name.to_string())
                    .collect();
                if !missing.is_empty() {
                    return Err(RecordError::MissingRequiredFields(missing));
                }
            }
            Operation::Update => {
                if record.fields.is_empty() {
                    return Err(RecordError::NoUpdatableFields);
                }
            }
        }

        if !record.ignored.is_empty() {
            tracing::debug!("Ignoring unknown {} fields: {:?}", def.name, record.ignored);
        }

        Ok(record)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Empty strings become NULL so optional typed columns accept form-style input.
fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        other => other.clone(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::find;
    use serde_json::json;

    #[test]
    fn create_requires_required_columns() {
        let def = find("subcounties").unwrap();
        let err = Record::from_payload(def, &json!({"name": "Kisumu East"}), Operation::Create).unwrap_err();
        match err {
            RecordError::MissingRequiredFields(fields) => assert_eq!(fields, vec!["countyId".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let def = find("counties").unwrap();
        let err = Record::from_payload(def, &json!({"name": "  "}), Operation::Create).unwrap_err();
        assert!(matches!(err, RecordError::MissingRequiredFields(_)));
    }

    #[test]
    fn keeps_column_order_and_ignores_unknown_keys() {
        let def = find("wards").unwrap();
        let record = Record::from_payload(
            def,
            &json!({"code": "W1", "name": "Central", "subcountyId": 3, "colour": "red", "id": 99}),
            Operation::Create,
        )
        .unwrap();
        let names: Vec<_> = record.fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["subcountyId", "name", "code"]);
        assert_eq!(record.ignored, vec!["colour".to_string()]);
    }

    #[test]
    fn rejects_system_fields() {
        let def = find("counties").unwrap();
        let err = Record::from_payload(def, &json!({"name": "X", "voided": true}), Operation::Update).unwrap_err();
        assert!(matches!(err, RecordError::SystemFieldNotAllowed(f) if f == "voided"));
    }

    #[test]
    fn update_needs_at_least_one_field() {
        let def = find("counties").unwrap();
        let err = Record::from_payload(def, &json!({"id": 4}), Operation::Update).unwrap_err();
        assert!(matches!(err, RecordError::NoUpdatableFields));
    }

    #[test]
    fn user_id_is_captured_separately() {
        let def = find("counties").unwrap();
        let record = Record::from_payload(def, &json!({"name": "Nakuru", "userId": 12}), Operation::Create).unwrap();
        assert_eq!(record.user_id, Some(json!(12)));
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn empty_optional_strings_become_null() {
        let def = find("projects").unwrap();
        let record = Record::from_payload(def, &json!({"projectName": "Dam", "startDate": ""}), Operation::Create).unwrap();
        assert_eq!(record.get("startDate"), Some(&Value::Null));
    }
}
