use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use serde_json::{Map, Value};

use super::headers::HeaderMap;
use super::ImportError;

/// Rows shown back to the user before anything is written
pub const PREVIEW_ROWS: usize = 10;

/// Result of parsing an uploaded workbook
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub unrecognized_headers: Vec<String>,
    pub preview_data: Vec<Map<String, Value>>,
    pub full_data: Vec<Map<String, Value>>,
}

/// Parse the first sheet of an `.xlsx`/`.xls`/`.ods` workbook.
///
/// Row one holds the headers. Rows whose mapped cells are all empty are skipped.
pub fn preview(bytes: Vec<u8>) -> Result<ImportPreview, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(ImportError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(ImportError::MissingHeaderRow)?;
    let headers: Vec<String> = header_row.iter().map(header_text).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::MissingHeaderRow);
    }

    let map = HeaderMap::resolve(headers);
    let full_data: Vec<Map<String, Value>> = rows
        .filter_map(|cells| map.map_row(cells.iter().map(cell_value).collect()))
        .collect();

    tracing::info!(
        "Parsed import workbook: {} rows, {} unrecognized headers",
        full_data.len(),
        map.unrecognized().len()
    );

    Ok(ImportPreview {
        unrecognized_headers: map.unrecognized(),
        preview_data: full_data.iter().take(PREVIEW_ROWS).cloned().collect(),
        full_data,
        headers: map.headers,
    })
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() { Value::Null } else { Value::String(trimmed.to_string()) }
        }
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9.0e15 {
                Value::from(*f as i64)
            } else {
                serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_date(dt.as_f64()).map(Value::String).unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

/// Excel serial day number to `YYYY-MM-DD` (1900 date system)
fn excel_date(serial: f64) -> Option<String> {
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(chrono::Duration::days(serial.floor() as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}
